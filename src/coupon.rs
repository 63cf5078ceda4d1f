//! Client-side coupon state for a checkout surface.
//!
//! The backend owns the rule engine; the session owns exactly one thing -
//! the last validation result for the active code. Callers reset the session
//! whenever cart contents change; checkout resets it on completion.

use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::api::CouponService;
use crate::error::Error;

/// Outcome of one explicit "apply coupon" action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CouponOutcome {
    /// The code is active for this order value; the discount is in effect.
    Applied { discount: i64, message: String },
    /// The backend rejected the code; any previous discount is gone.
    Rejected { message: String },
    /// A newer apply started while this one was in flight; its result was
    /// discarded.
    Superseded,
}

#[derive(Default)]
struct AppliedCoupon {
    seq: u64,
    code: Option<String>,
    discount: i64,
}

pub struct CouponSession {
    service: Arc<dyn CouponService>,
    state: Mutex<AppliedCoupon>,
}

impl CouponSession {
    pub fn new(service: Arc<dyn CouponService>) -> Self {
        Self {
            service,
            state: Mutex::new(AppliedCoupon::default()),
        }
    }

    /// The discount currently in effect (0 when no valid coupon is active).
    pub fn discount(&self) -> i64 {
        self.state.lock().expect("coupon lock poisoned").discount
    }

    /// The active code, only while it confers a positive discount.
    pub fn active_code(&self) -> Option<String> {
        let state = self.state.lock().expect("coupon lock poisoned");
        if state.discount > 0 {
            state.code.clone()
        } else {
            None
        }
    }

    /// Drop any applied coupon (cart contents changed, or checkout finished).
    pub fn reset(&self) {
        let mut state = self.state.lock().expect("coupon lock poisoned");
        state.code = None;
        state.discount = 0;
    }

    /// Validate `code` against `order_value` - exactly one backend call per
    /// explicit apply action.
    ///
    /// The newest apply always wins: a slower response from an earlier apply
    /// is discarded rather than allowed to overwrite fresher state. A failed
    /// validation (invalid code or transport failure) never leaves a stale
    /// discount active.
    pub async fn apply(&self, code: &str, order_value: i64) -> Result<CouponOutcome, Error> {
        let code = code.trim();
        if code.is_empty() {
            return Err(Error::validation("enter a coupon code first"));
        }

        let seq = {
            let mut state = self.state.lock().expect("coupon lock poisoned");
            state.seq += 1;
            state.seq
        };

        let result = self.service.validate(code, order_value).await;

        let mut state = self.state.lock().expect("coupon lock poisoned");
        if state.seq != seq {
            return Ok(CouponOutcome::Superseded);
        }
        match result {
            Ok(check) if check.valid => {
                state.code = Some(code.to_string());
                state.discount = check.calculated_discount.max(0);
                info!(code, discount = state.discount, "coupon applied");
                Ok(CouponOutcome::Applied {
                    discount: state.discount,
                    message: check.message,
                })
            }
            Ok(check) => {
                state.code = None;
                state.discount = 0;
                Ok(CouponOutcome::Rejected {
                    message: check.message,
                })
            }
            Err(err) => {
                state.code = None;
                state.discount = 0;
                warn!(code, "coupon validation failed: {err}");
                Err(err)
            }
        }
    }
}
