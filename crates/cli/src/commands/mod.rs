//! CLI command implementations.

pub mod demo;
pub mod quote;

use chrono::{Duration, Utc};
use marigold_checkout::{Coupon, CouponBook, CouponValue};
use marigold_core::Money;

/// The retailer's well-known demo codes.
///
/// `WELCOME10` exercises the percentage branch of the evaluator, `FLAT500`
/// the fixed branch.
pub(crate) fn demo_coupons() -> CouponBook {
    [
        Coupon {
            code: "WELCOME10".to_string(),
            value: CouponValue::Percentage(10),
            min_subtotal: Some(Money::from_minor(49_900)),
            expires_at: None,
        },
        Coupon {
            code: "FLAT500".to_string(),
            value: CouponValue::Fixed(Money::from_minor(500)),
            min_subtotal: None,
            expires_at: Some(Utc::now() + Duration::days(30)),
        },
    ]
    .into_iter()
    .collect()
}
