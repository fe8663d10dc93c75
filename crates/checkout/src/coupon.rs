//! Coupon definitions and the pure discount evaluator.
//!
//! The evaluator is deterministic and side-effect free: given a coupon, a
//! subtotal, and an explicit `now`, it either produces a discount amount or
//! a [`CouponRejection`]. The cart store never holds a coupon definition,
//! only the resolved code and the computed discount, so rule changes cannot
//! leave a stale discount behind.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use marigold_core::Money;

use crate::error::CouponRejection;

/// The discount a coupon grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponValue {
    /// Percentage of the subtotal (0-100), rounded half up.
    Percentage(u8),
    /// Fixed amount, clamped to the subtotal.
    Fixed(Money),
}

/// A named discount rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    /// Coupon code as entered by customers; matching is case-insensitive.
    pub code: String,
    /// Discount kind and value.
    pub value: CouponValue,
    /// Minimum subtotal required, if any.
    pub min_subtotal: Option<Money>,
    /// Expiry instant, if any.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Evaluate a coupon against a cart subtotal.
///
/// # Errors
///
/// Returns a [`CouponRejection`] if the coupon has expired or the subtotal
/// is below the coupon's minimum. The returned discount never exceeds the
/// subtotal.
pub fn evaluate(
    coupon: &Coupon,
    subtotal: Money,
    now: DateTime<Utc>,
) -> Result<Money, CouponRejection> {
    if let Some(expires_at) = coupon.expires_at
        && expires_at <= now
    {
        return Err(CouponRejection::Expired);
    }

    if let Some(min_subtotal) = coupon.min_subtotal
        && subtotal < min_subtotal
    {
        return Err(CouponRejection::BelowMinimum);
    }

    let discount = match coupon.value {
        CouponValue::Percentage(pct) => subtotal.percent(pct.min(100)),
        CouponValue::Fixed(amount) => amount,
    };

    Ok(discount.min(subtotal).max(Money::ZERO))
}

/// Registry of coupon definitions, keyed by normalized code.
///
/// The cart store resolves customer-entered codes through this registry;
/// in online mode the gateway additionally records the applied code on its
/// side of the cart.
#[derive(Debug, Clone, Default)]
pub struct CouponBook {
    coupons: HashMap<String, Coupon>,
}

impl CouponBook {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a coupon definition.
    pub fn insert(&mut self, coupon: Coupon) {
        self.coupons.insert(normalize(&coupon.code), coupon);
    }

    /// Resolve a customer-entered code to its definition.
    #[must_use]
    pub fn resolve(&self, code: &str) -> Option<&Coupon> {
        self.coupons.get(&normalize(code))
    }

    /// Number of registered coupons.
    #[must_use]
    pub fn len(&self) -> usize {
        self.coupons.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coupons.is_empty()
    }
}

impl FromIterator<Coupon> for CouponBook {
    fn from_iter<I: IntoIterator<Item = Coupon>>(iter: I) -> Self {
        let mut book = Self::new();
        for coupon in iter {
            book.insert(coupon);
        }
        book
    }
}

/// Codes are matched ignoring case and surrounding whitespace.
fn normalize(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
