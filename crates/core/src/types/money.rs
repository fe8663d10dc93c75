//! Integer money arithmetic in minor currency units.
//!
//! Every monetary amount in Marigold is an integer count of the smallest
//! currency unit (paise for INR, cents for USD). Cart totals, discounts, and
//! shipping fees never pass through floating point, so repeated
//! recomputation cannot drift.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A monetary amount in minor currency units.
///
/// `Money` is currency-agnostic; the currency is carried separately (in
/// configuration and on orders) as a [`CurrencyCode`]. Arithmetic saturates
/// rather than wrapping - a cart that overflows `i64` paise is not a cart
/// we need to price accurately.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero in any currency.
    pub const ZERO: Self = Self(0);

    /// Create an amount from minor units (paise, cents).
    #[must_use]
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Get the amount in minor units.
    #[must_use]
    pub const fn as_minor(self) -> i64 {
        self.0
    }

    /// Whether the amount is exactly zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Line total for `quantity` items at this unit price.
    #[must_use]
    pub const fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(quantity as i64))
    }

    /// Saturating addition.
    #[must_use]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// Saturating subtraction. May go negative; callers that need a floor
    /// at zero combine this with [`Ord::max`] against [`Money::ZERO`].
    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// A percentage of this amount, rounded half up.
    ///
    /// Computed in 128-bit intermediate precision so even pathological
    /// amounts cannot overflow mid-multiplication.
    #[must_use]
    pub const fn percent(self, pct: u8) -> Self {
        let scaled = self.0 as i128 * pct as i128;
        #[allow(clippy::cast_possible_truncation)] // result is <= |self.0| for pct <= 100
        let minor = ((scaled + 50) / 100) as i64;
        Self(minor)
    }

    /// Display in major units with the currency symbol (e.g., "₹59.99").
    #[must_use]
    pub fn display(self, currency: CurrencyCode) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let minor = self.0.unsigned_abs();
        format!(
            "{sign}{}{}.{:02}",
            currency.symbol(),
            minor / 100,
            minor % 100
        )
    }
}

impl fmt::Display for Money {
    /// Major-unit decimal form without a currency symbol (e.g., "59.99").
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let minor = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", minor / 100, minor % 100)
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    INR,
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// Currency symbol for display.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::INR => "₹",
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// ISO 4217 alphabetic code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::INR => "INR",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INR" => Ok(Self::INR),
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            _ => Err(format!("unsupported currency code: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_times_is_integer_multiplication() {
        assert_eq!(Money::from_minor(5999).times(3), Money::from_minor(17_997));
        assert_eq!(Money::from_minor(5999).times(0), Money::ZERO);
    }

    #[test]
    fn test_times_saturates() {
        let huge = Money::from_minor(i64::MAX);
        assert_eq!(huge.times(2), Money::from_minor(i64::MAX));
    }

    #[test]
    fn test_percent_rounds_half_up() {
        // 10% of 99.99 = 9.999 -> 10.00
        assert_eq!(Money::from_minor(9999).percent(10), Money::from_minor(1000));
        // 15% of 0.01 = 0.0015 -> 0.00
        assert_eq!(Money::from_minor(1).percent(15), Money::ZERO);
        // 50% of 0.01 = 0.005 -> 0.01
        assert_eq!(Money::from_minor(1).percent(50), Money::from_minor(1));
        assert_eq!(Money::from_minor(5999).percent(100), Money::from_minor(5999));
        assert_eq!(Money::ZERO.percent(40), Money::ZERO);
    }

    #[test]
    fn test_saturating_sub_with_zero_floor() {
        let total = Money::from_minor(100)
            .saturating_sub(Money::from_minor(500))
            .max(Money::ZERO);
        assert_eq!(total, Money::ZERO);
    }

    #[test]
    fn test_display_major_units() {
        assert_eq!(Money::from_minor(5999).to_string(), "59.99");
        assert_eq!(Money::from_minor(5).to_string(), "0.05");
        assert_eq!(Money::ZERO.to_string(), "0.00");
        assert_eq!(Money::from_minor(-4900).to_string(), "-49.00");
    }

    #[test]
    fn test_display_with_currency() {
        assert_eq!(
            Money::from_minor(99_900).display(CurrencyCode::INR),
            "₹999.00"
        );
        assert_eq!(Money::from_minor(500).display(CurrencyCode::USD), "$5.00");
    }

    #[test]
    fn test_currency_code_round_trip() {
        assert_eq!("inr".parse::<CurrencyCode>().unwrap(), CurrencyCode::INR);
        assert_eq!(CurrencyCode::GBP.to_string(), "GBP");
        assert!("XAU".parse::<CurrencyCode>().is_err());
    }
}
