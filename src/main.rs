//! # Servease Engine Diagnostic
//!
//! Boots the engine the way the app shell does: load configuration, restore
//! the persisted cart, price it, and probe the backend address book. Useful
//! for checking a profile's durable state and backend connectivity without
//! the UI.

use std::sync::Arc;

use tracing::{info, warn};

use servease_engine::api::http::MarketplaceApi;
use servease_engine::api::AddressBackend;
use servease_engine::cart::CartStore;
use servease_engine::config::Config;
use servease_engine::persist::SqliteCartRepository;
use servease_engine::pricing::compute_breakdown;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "servease_engine=debug".into()),
        )
        .init();

    let config = Config::from_env();
    info!("Starting Servease engine against {}", config.backend_url);

    let repo = SqliteCartRepository::open(&config.cart_db_path, &config.profile_key).await?;
    let cart = CartStore::open(Arc::new(repo)).await;
    let breakdown = compute_breakdown(cart.subtotal(), 0, &config.fees);
    info!(
        "Cart restored for profile '{}': {} items, subtotal={}, fee={}, tax={}, payable={}",
        config.profile_key,
        cart.total_item_count(),
        breakdown.subtotal,
        breakdown.platform_fee,
        breakdown.tax_amount,
        breakdown.total_amount
    );

    let api = MarketplaceApi::new(config.backend_url.clone());
    match api.list().await {
        Ok(addresses) => {
            let primary = addresses.iter().find(|a| a.is_primary);
            info!(
                "Address book reachable: {} on file, primary={:?}",
                addresses.len(),
                primary.map(|a| a.label.as_str())
            );
        }
        Err(err) => warn!("address book unreachable: {err}"),
    }

    if let Err(err) = cart.flush().await {
        warn!("final cart flush failed: {err}");
    }
    Ok(())
}
