//! The customer's cart: in-memory line items with durable, fire-and-forget
//! persistence.
//!
//! Mutations are synchronous; after each one the full item list is published
//! to a background writer task, so at most one save is in flight and
//! back-to-back mutations coalesce into the latest snapshot. A failed save is
//! logged and retried on the next mutation - it never rolls back or surfaces
//! to the caller.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::warn;

use crate::error::Error;
use crate::models::{CartItem, CatalogService};

/// Durable key-value store for the current profile's cart contents.
///
/// Injectable so tests (and the integration suite) can substitute
/// [`MemoryCartRepository`] for the SQLite-backed store.
#[async_trait]
pub trait CartRepository: Send + Sync {
    async fn load(&self) -> Result<Vec<CartItem>, Error>;
    async fn save(&self, items: &[CartItem]) -> Result<(), Error>;
}

/// In-memory repository. The test double, and handy for seeding carts.
#[derive(Default)]
pub struct MemoryCartRepository {
    items: Mutex<Vec<CartItem>>,
}

impl MemoryCartRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(items: Vec<CartItem>) -> Self {
        Self {
            items: Mutex::new(items),
        }
    }
}

#[async_trait]
impl CartRepository for MemoryCartRepository {
    async fn load(&self) -> Result<Vec<CartItem>, Error> {
        Ok(self.items.lock().expect("cart lock poisoned").clone())
    }

    async fn save(&self, items: &[CartItem]) -> Result<(), Error> {
        *self.items.lock().expect("cart lock poisoned") = items.to_vec();
        Ok(())
    }
}

/// The cart for the active session. Items are unique by service id.
pub struct CartStore {
    items: Vec<CartItem>,
    repo: Arc<dyn CartRepository>,
    snapshots: watch::Sender<Vec<CartItem>>,
}

impl CartStore {
    /// Restore the persisted cart and start the background writer. A load
    /// failure is logged and degrades to an empty cart - the store keeps
    /// working in memory for the session.
    pub async fn open(repo: Arc<dyn CartRepository>) -> Self {
        let items = match repo.load().await {
            Ok(items) => items,
            Err(err) => {
                warn!("failed to restore persisted cart, starting empty: {err}");
                Vec::new()
            }
        };

        let (snapshots, mut changes) = watch::channel(items.clone());
        let writer_repo = Arc::clone(&repo);
        tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                let snapshot = changes.borrow_and_update().clone();
                if let Err(err) = writer_repo.save(&snapshot).await {
                    warn!("cart write failed, will retry on next change: {err}");
                }
            }
        });

        Self {
            items,
            repo,
            snapshots,
        }
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add `quantity` units of a service. Re-adding a service already in the
    /// cart merges into the existing line instead of duplicating it.
    /// Non-positive quantities are ignored.
    pub fn add_item(&mut self, service: &CatalogService, quantity: i64) {
        if quantity < 1 {
            return;
        }
        if let Some(existing) = self.items.iter_mut().find(|i| i.service_id == service.id) {
            existing.quantity += quantity;
        } else {
            self.items.push(CartItem::from_service(service, quantity));
        }
        self.publish();
    }

    /// Remove a line entirely. No-op when the service is not in the cart.
    pub fn remove_item(&mut self, service_id: &str) {
        let before = self.items.len();
        self.items.retain(|i| i.service_id != service_id);
        if self.items.len() != before {
            self.publish();
        }
    }

    /// Set a line to an exact quantity. Values below 1 are a no-op - removal
    /// is the only way to take a line to zero.
    pub fn set_quantity(&mut self, service_id: &str, quantity: i64) {
        if quantity < 1 {
            return;
        }
        if let Some(item) = self.items.iter_mut().find(|i| i.service_id == service_id) {
            item.quantity = quantity;
            self.publish();
        }
    }

    /// Empty the cart (after successful checkout, or on explicit clear).
    pub fn clear(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.items.clear();
        self.publish();
    }

    pub fn total_item_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Sum of `(unit_price - unit_discount) * quantity` across lines.
    pub fn subtotal(&self) -> i64 {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Best-effort synchronous write, used at shutdown.
    pub async fn flush(&self) -> Result<(), Error> {
        self.repo.save(&self.items).await
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.items.clone());
    }
}
