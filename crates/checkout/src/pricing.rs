//! Shipping policy and cart total recomputation.
//!
//! Shipping is a pure function of the subtotal: free above a threshold, a
//! flat fee otherwise, and always zero for an empty cart (there is no such
//! thing as a shipping-only cart). Totals are recomputed from scratch after
//! every cart mutation; nothing here is stored independently of its inputs.

use serde::{Deserialize, Serialize};

use marigold_core::Money;

/// Flat-fee shipping with a free-shipping threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingPolicy {
    /// Subtotals at or above this amount ship free.
    pub free_over: Money,
    /// Fee charged below the threshold.
    pub flat_fee: Money,
}

impl Default for ShippingPolicy {
    /// Free shipping over ₹999.00, otherwise ₹49.00.
    fn default() -> Self {
        Self {
            free_over: Money::from_minor(99_900),
            flat_fee: Money::from_minor(4_900),
        }
    }
}

impl ShippingPolicy {
    /// Shipping fee for a cart with the given subtotal.
    #[must_use]
    pub fn quote(&self, subtotal: Money) -> Money {
        if subtotal.is_zero() || subtotal >= self.free_over {
            Money::ZERO
        } else {
            self.flat_fee
        }
    }
}

/// Derived monetary totals for a cart.
///
/// Invariants: `discount <= subtotal`, `total >= 0`, and
/// `total = subtotal - discount + shipping`. All fields are integers in
/// minor currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: Money,
    pub discount: Money,
    pub shipping: Money,
    pub total: Money,
}

impl Totals {
    /// Recompute totals from a subtotal and a candidate discount.
    ///
    /// The discount is clamped to the subtotal and the total is floored at
    /// zero, so no coupon combination can produce a negative amount.
    #[must_use]
    pub fn compute(subtotal: Money, discount: Money, policy: &ShippingPolicy) -> Self {
        let discount = discount.min(subtotal);
        let shipping = policy.quote(subtotal);
        let total = subtotal
            .saturating_sub(discount)
            .saturating_add(shipping)
            .max(Money::ZERO);
        Self {
            subtotal,
            discount,
            shipping,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> ShippingPolicy {
        ShippingPolicy {
            free_over: Money::from_minor(4_999),
            flat_fee: Money::from_minor(4_900),
        }
    }

    #[test]
    fn test_shipping_free_above_threshold() {
        let p = policy();
        assert_eq!(p.quote(Money::from_minor(4_999)), Money::ZERO);
        assert_eq!(p.quote(Money::from_minor(10_000)), Money::ZERO);
    }

    #[test]
    fn test_shipping_flat_fee_below_threshold() {
        assert_eq!(policy().quote(Money::from_minor(4_998)), Money::from_minor(4_900));
    }

    #[test]
    fn test_shipping_waived_on_empty_cart() {
        assert_eq!(policy().quote(Money::ZERO), Money::ZERO);
    }

    #[test]
    fn test_totals_fixed_coupon_scenario() {
        // One item at 59.99, fixed coupon of 5.00, free shipping threshold met.
        let totals = Totals::compute(Money::from_minor(5_999), Money::from_minor(500), &policy());
        assert_eq!(totals.subtotal, Money::from_minor(5_999));
        assert_eq!(totals.discount, Money::from_minor(500));
        assert_eq!(totals.shipping, Money::ZERO);
        assert_eq!(totals.total, Money::from_minor(5_499));
    }

    #[test]
    fn test_totals_empty_cart() {
        let totals = Totals::compute(Money::ZERO, Money::ZERO, &policy());
        assert_eq!(totals, Totals::default());
    }

    #[test]
    fn test_totals_discount_clamped_to_subtotal() {
        let totals = Totals::compute(
            Money::from_minor(1_000),
            Money::from_minor(50_000),
            &policy(),
        );
        assert_eq!(totals.discount, Money::from_minor(1_000));
        // Subtotal fully discounted; only the shipping fee remains.
        assert_eq!(totals.total, Money::from_minor(4_900));
    }

    #[test]
    fn test_totals_never_negative() {
        let totals = Totals::compute(Money::from_minor(100), Money::from_minor(100), &policy());
        assert!(totals.total >= Money::ZERO);
    }
}
