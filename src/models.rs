//! Domain models for the booking engine.
//!
//! Monetary values are whole-currency-unit integers throughout; percentages
//! are expressed 0-100. Catalog entries carry a percentage discount used by
//! the service detail flow, while cart lines carry an absolute per-unit
//! discount. The two representations meet exactly once, in
//! [`CartItem::from_service`] - nothing downstream re-derives discount
//! semantics.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Catalog & cart
// ============================================================================

/// A bookable service as listed in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogService {
    pub id: String,
    pub name: String,
    /// Listed per-unit price.
    pub price: i64,
    /// Catalog discount, percentage 0-100.
    pub discount_percent: i64,
}

impl CatalogService {
    /// Per-unit price after the catalog percentage discount, rounded
    /// half-away-from-zero to whole currency units.
    pub fn discounted_unit_price(&self) -> i64 {
        let cut = (self.price as f64 * self.discount_percent as f64 / 100.0).round() as i64;
        (self.price - cut).max(0)
    }
}

/// One line in the customer's cart, unique by `service_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub service_id: String,
    pub name: String,
    pub unit_price: i64,
    /// Absolute per-unit discount, already resolved from whatever
    /// representation the catalog used.
    pub unit_discount: i64,
    pub quantity: i64,
}

impl CartItem {
    /// The single percentage-to-absolute normalization point.
    pub fn from_service(service: &CatalogService, quantity: i64) -> Self {
        Self {
            service_id: service.id.clone(),
            name: service.name.clone(),
            unit_price: service.price,
            unit_discount: service.price - service.discounted_unit_price(),
            quantity,
        }
    }

    pub fn effective_unit_price(&self) -> i64 {
        (self.unit_price - self.unit_discount).max(0)
    }

    pub fn line_total(&self) -> i64 {
        self.effective_unit_price() * self.quantity
    }
}

// ============================================================================
// Pricing
// ============================================================================

/// Itemized amounts for a prospective or completed order. Derived and
/// ephemeral: recomputed from current cart/coupon state, never persisted
/// client-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub subtotal: i64,
    pub platform_fee: i64,
    pub tax_amount: i64,
    pub coupon_discount: i64,
    pub total_amount: i64,
}

/// Result of validating a coupon code against an order value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponCheck {
    pub valid: bool,
    pub calculated_discount: i64,
    pub message: String,
}

// ============================================================================
// Booking
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cod,
    Online,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cod => "cod",
            PaymentMethod::Online => "online",
        }
    }
}

/// Lifecycle states of a submitted booking. `Completed` and `Cancelled` are
/// terminal; bookings are never deleted, only transitioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One requested service line inside a booking request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestedItem {
    pub service_id: String,
    pub quantity: i64,
}

/// A checkout submission. Constructed once per attempt, immutable once
/// submitted; `request_id` is client-generated so the backend can dedupe a
/// re-clicked submit.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub request_id: Uuid,
    pub address_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    pub date_time: NaiveDateTime,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
    pub items: Vec<RequestedItem>,
}

/// What the backend acknowledges a created booking with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingReceipt {
    pub booking_number: String,
    pub total_amount: i64,
}

/// A service line snapshotted onto a booking at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingItem {
    pub service_id: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: i64,
}

/// A persisted booking as the backend reports it. The monetary fields are a
/// snapshot taken at creation; later fee/tax/coupon configuration changes
/// never alter them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    /// Human-readable reference, distinct from the internal id.
    pub booking_number: String,
    pub status: BookingStatus,
    pub provider_id: Option<String>,
    pub items: Vec<BookingItem>,
    pub subtotal: i64,
    pub platform_fee: i64,
    pub tax_amount: i64,
    pub coupon_discount: i64,
    pub total_amount: i64,
    pub date_time: NaiveDateTime,
    pub payment_method: PaymentMethod,
    pub cancel_reason: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Addresses
// ============================================================================

/// A saved customer address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    pub id: String,
    pub label: String,
    pub line: String,
    pub city: String,
    pub pincode: String,
    pub is_primary: bool,
}

/// Payload for adding an address to the customer's book.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAddress {
    pub label: String,
    pub line: String,
    pub city: String,
    pub pincode: String,
    pub is_primary: bool,
}
