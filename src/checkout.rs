//! Checkout orchestration.
//!
//! Two entry modes - one service booked straight from its detail view, or
//! the whole cart - unified into a single [`BookingRequest`] at submission.
//! Local validation (address, quantity, slot) runs before any network call;
//! a backend rejection propagates verbatim and leaves cart, coupon, and
//! selection untouched for a retry.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::info;
use uuid::Uuid;

use crate::api::{AddressBackend, BookingBackend};
use crate::cart::CartStore;
use crate::coupon::CouponSession;
use crate::error::Error;
use crate::models::{
    Address, BookingRequest, CartItem, CatalogService, PaymentMethod, PriceBreakdown,
    RequestedItem,
};
use crate::pricing::{compute_breakdown, FeeSchedule};
use crate::schedule;

/// Address, provider, and payment selections shared by both checkout modes.
#[derive(Debug, Clone, Default)]
pub struct CheckoutDetails {
    pub address_id: Option<String>,
    pub provider_id: Option<String>,
    pub payment_method: PaymentMethod,
}

/// What the confirmation view renders after a successful checkout: the
/// booking reference plus a snapshot of what was booked and for how much.
#[derive(Debug, Clone)]
pub struct Confirmation {
    pub booking_number: String,
    pub items: Vec<CartItem>,
    pub breakdown: PriceBreakdown,
    /// Backend-confirmed amount due.
    pub amount_due: i64,
}

pub struct CheckoutFlow {
    backend: Arc<dyn BookingBackend>,
    addresses: Arc<dyn AddressBackend>,
    fees: FeeSchedule,
}

impl CheckoutFlow {
    pub fn new(
        backend: Arc<dyn BookingBackend>,
        addresses: Arc<dyn AddressBackend>,
        fees: FeeSchedule,
    ) -> Self {
        Self {
            backend,
            addresses,
            fees,
        }
    }

    /// The address preselected at checkout: the primary one when set,
    /// otherwise the first on file.
    pub async fn default_address(&self) -> Result<Option<Address>, Error> {
        let mut addresses = self.addresses.list().await?;
        if addresses.is_empty() {
            return Ok(None);
        }
        let primary = addresses.iter().position(|a| a.is_primary).unwrap_or(0);
        Ok(Some(addresses.swap_remove(primary)))
    }

    /// Book one service directly from its detail view, with an explicit
    /// schedule.
    pub async fn checkout_service(
        &self,
        service: &CatalogService,
        quantity: i64,
        date: NaiveDate,
        slot: &str,
        details: &CheckoutDetails,
        coupon: &CouponSession,
    ) -> Result<Confirmation, Error> {
        if quantity < 1 {
            return Err(Error::validation("quantity must be at least 1"));
        }
        let items = vec![CartItem::from_service(service, quantity)];
        self.submit(items, date, slot, details, coupon).await
    }

    /// Book everything in the cart. This flow collects no per-item schedule,
    /// so the booking is stamped with today's date and the default slot. The
    /// cart is cleared only after the backend accepts.
    pub async fn checkout_cart(
        &self,
        cart: &mut CartStore,
        details: &CheckoutDetails,
        coupon: &CouponSession,
    ) -> Result<Confirmation, Error> {
        if cart.is_empty() {
            return Err(Error::validation("cart is empty"));
        }
        let items = cart.items().to_vec();
        let today = Local::now().date_naive();
        let confirmation = self
            .submit(items, today, schedule::DEFAULT_SLOT, details, coupon)
            .await?;
        cart.clear();
        Ok(confirmation)
    }

    async fn submit(
        &self,
        items: Vec<CartItem>,
        date: NaiveDate,
        slot: &str,
        details: &CheckoutDetails,
        coupon: &CouponSession,
    ) -> Result<Confirmation, Error> {
        let address_id = details
            .address_id
            .as_deref()
            .ok_or_else(|| Error::validation("select a service address before checking out"))?;
        let time = schedule::parse_twelve_hour(slot)?;

        let base_amount: i64 = items.iter().map(CartItem::line_total).sum();
        let breakdown = compute_breakdown(base_amount, coupon.discount(), &self.fees);

        let request = BookingRequest {
            request_id: Uuid::new_v4(),
            address_id: address_id.to_string(),
            provider_id: details.provider_id.clone(),
            date_time: schedule::combine(date, time),
            payment_method: details.payment_method,
            // attached only while a positive discount is in effect
            coupon_code: coupon.active_code(),
            items: items
                .iter()
                .map(|i| RequestedItem {
                    service_id: i.service_id.clone(),
                    quantity: i.quantity,
                })
                .collect(),
        };

        let receipt = self.backend.create(&request).await?;
        coupon.reset();
        info!(
            booking_number = %receipt.booking_number,
            total = receipt.total_amount,
            "booking confirmed"
        );

        Ok(Confirmation {
            booking_number: receipt.booking_number,
            items,
            breakdown,
            amount_due: receipt.total_amount,
        })
    }
}
