//! Wire-format DTOs and response decoding for the marketplace backend.
//!
//! Deployments of the backend are inconsistent about key casing (camelCase,
//! snake_case, Mongo-style `_id`). Every tolerated spelling is declared here
//! as a serde alias so nothing outside this module depends on the casing
//! convention of any particular backend.

use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::Error;
use crate::models::{
    Address, Booking, BookingItem, BookingReceipt, BookingStatus, CouponCheck, PaymentMethod,
};

/// Standard `{ data, message }` response envelope.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Decode a backend response body.
///
/// 2xx bodies unwrap the envelope; 409 maps to [`Error::Conflict`]; any other
/// failure surfaces the backend `message` verbatim (raw body as fallback).
pub fn parse_response<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, Error> {
    if status.is_success() {
        let envelope: Envelope<T> = serde_json::from_str(body)
            .map_err(|err| Error::service(format!("malformed backend response: {err}")))?;
        return Ok(envelope.data);
    }

    let message = error_message(status, body);
    if status == StatusCode::CONFLICT {
        Err(Error::Conflict {
            message,
            latest: None,
        })
    } else {
        Err(Error::Service(message))
    }
}

fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("backend returned {status}")
            } else {
                body.trim().to_string()
            }
        })
}

// ============================================================================
// DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CouponCheckWire {
    #[serde(default)]
    pub valid: bool,
    #[serde(default, alias = "calculatedDiscount", alias = "discount")]
    pub calculated_discount: i64,
    #[serde(default)]
    pub message: String,
}

impl From<CouponCheckWire> for CouponCheck {
    fn from(wire: CouponCheckWire) -> Self {
        Self {
            valid: wire.valid,
            calculated_discount: wire.calculated_discount,
            message: wire.message,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BookingReceiptWire {
    #[serde(alias = "bookingNumber")]
    pub booking_number: String,
    #[serde(default, alias = "totalAmount")]
    pub total_amount: i64,
}

impl From<BookingReceiptWire> for BookingReceipt {
    fn from(wire: BookingReceiptWire) -> Self {
        Self {
            booking_number: wire.booking_number,
            total_amount: wire.total_amount,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BookingItemWire {
    #[serde(alias = "serviceId")]
    pub service_id: String,
    #[serde(default)]
    pub name: String,
    pub quantity: i64,
    #[serde(default, alias = "unitPrice")]
    pub unit_price: i64,
}

#[derive(Debug, Deserialize)]
pub struct BookingWire {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(alias = "bookingNumber")]
    pub booking_number: String,
    pub status: BookingStatus,
    #[serde(default, alias = "providerId", alias = "provider")]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub items: Vec<BookingItemWire>,
    #[serde(default)]
    pub subtotal: i64,
    #[serde(default, alias = "platformFee")]
    pub platform_fee: i64,
    #[serde(default, alias = "taxAmount")]
    pub tax_amount: i64,
    #[serde(default, alias = "couponDiscount")]
    pub coupon_discount: i64,
    #[serde(default, alias = "totalAmount")]
    pub total_amount: i64,
    #[serde(alias = "dateTime")]
    pub date_time: NaiveDateTime,
    #[serde(default, alias = "paymentMethod")]
    pub payment_method: PaymentMethod,
    #[serde(default, alias = "cancelReason")]
    pub cancel_reason: Option<String>,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<BookingWire> for Booking {
    fn from(wire: BookingWire) -> Self {
        Self {
            id: wire.id,
            booking_number: wire.booking_number,
            status: wire.status,
            provider_id: wire.provider_id,
            items: wire
                .items
                .into_iter()
                .map(|i| BookingItem {
                    service_id: i.service_id,
                    name: i.name,
                    quantity: i.quantity,
                    unit_price: i.unit_price,
                })
                .collect(),
            subtotal: wire.subtotal,
            platform_fee: wire.platform_fee,
            tax_amount: wire.tax_amount,
            coupon_discount: wire.coupon_discount,
            total_amount: wire.total_amount,
            date_time: wire.date_time,
            payment_method: wire.payment_method,
            cancel_reason: wire.cancel_reason,
            created_at: wire.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddressWire {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, alias = "addressLine", alias = "line1")]
    pub line: String,
    #[serde(default)]
    pub city: String,
    #[serde(default, alias = "pinCode", alias = "zip")]
    pub pincode: String,
    #[serde(default, alias = "isPrimary", alias = "primary")]
    pub is_primary: bool,
}

impl From<AddressWire> for Address {
    fn from(wire: AddressWire) -> Self {
        Self {
            id: wire.id,
            label: wire.label,
            line: wire.line,
            city: wire.city,
            pincode: wire.pincode,
            is_primary: wire.is_primary,
        }
    }
}
