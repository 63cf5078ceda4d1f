//! Collaborator boundary: the contracts the engine consumes.
//!
//! The marketplace backend owns coupon rules, bookings, and the address
//! book. The engine only ever talks to these traits; [`http::MarketplaceApi`]
//! is the production implementation, and the integration suite substitutes
//! in-memory fakes.

pub mod http;
pub mod wire;

use async_trait::async_trait;

use crate::error::Error;
use crate::lifecycle::ProviderAction;
use crate::models::{
    Address, Booking, BookingReceipt, BookingRequest, BookingStatus, CouponCheck, NewAddress,
};

/// Coupon validation, delegated to the backend rule engine.
#[async_trait]
pub trait CouponService: Send + Sync {
    async fn validate(&self, code: &str, order_value: i64) -> Result<CouponCheck, Error>;
}

/// Booking creation, reads, and lifecycle transitions.
#[async_trait]
pub trait BookingBackend: Send + Sync {
    async fn create(&self, request: &BookingRequest) -> Result<BookingReceipt, Error>;
    async fn fetch(&self, id: &str) -> Result<Booking, Error>;
    /// Administrative direct status write.
    async fn update_status(&self, id: &str, status: BookingStatus) -> Result<Booking, Error>;
    /// Provider accept/reject/start/complete endpoints.
    async fn provider_action(
        &self,
        id: &str,
        action: ProviderAction,
        reason: Option<&str>,
    ) -> Result<Booking, Error>;
    async fn assign_provider(&self, id: &str, provider_id: &str) -> Result<Booking, Error>;
    async fn bookings_for_customer(&self, customer_id: &str) -> Result<Vec<Booking>, Error>;
    async fn jobs_for_provider(&self, provider_id: &str) -> Result<Vec<Booking>, Error>;
}

/// The customer's saved addresses.
#[async_trait]
pub trait AddressBackend: Send + Sync {
    async fn list(&self) -> Result<Vec<Address>, Error>;
    async fn add(&self, address: &NewAddress) -> Result<Address, Error>;
}
