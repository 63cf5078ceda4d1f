//! Price breakdown computation.
//!
//! Pure functions over whole-currency-unit amounts. Discount resolution
//! happens upstream at the item boundary (see [`crate::models::CartItem`]);
//! the calculator only ever sees absolute, already-discounted base amounts
//! from either checkout flow.

use serde::{Deserialize, Serialize};

use crate::models::PriceBreakdown;

/// Platform-configured fee parameters applied at checkout.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Flat fee added to every order.
    pub platform_fee: i64,
    /// Tax rate applied to subtotal + platform fee.
    pub tax_rate: f64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            platform_fee: 49,
            tax_rate: 0.18,
        }
    }
}

/// Compute the customer-facing breakdown for an order.
///
/// `tax_amount = round((base + fee) * rate)`, rounded half-away-from-zero to
/// whole currency units. The grand total is clamped at zero: an oversized
/// coupon (or a negative base, both invalid inputs) can never produce a
/// negative amount due.
pub fn compute_breakdown(
    base_amount: i64,
    coupon_discount: i64,
    fees: &FeeSchedule,
) -> PriceBreakdown {
    let subtotal = base_amount.max(0);
    let coupon_discount = coupon_discount.max(0);
    let platform_fee = fees.platform_fee;
    let tax_amount = ((subtotal + platform_fee) as f64 * fees.tax_rate).round() as i64;
    let total_amount = (subtotal + platform_fee + tax_amount - coupon_discount).max(0);
    PriceBreakdown {
        subtotal,
        platform_fee,
        tax_amount,
        coupon_discount,
        total_amount,
    }
}
