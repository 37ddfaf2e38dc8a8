//! Type-safe price representation using decimal arithmetic.
//!
//! Amounts are accumulated at full precision and only rounded to two
//! decimal places when formatted for display.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., rupees, not paisa).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in the store currency (PKR).
    #[must_use]
    pub const fn pkr(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::PKR)
    }

    /// Format for display (e.g., "Rs. 1250.00").
    #[must_use]
    pub fn display(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.2}",
            self.currency_code.symbol(),
            self.amount.round_dp(2)
        )
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    PKR,
}

impl CurrencyCode {
    /// Display symbol placed before the amount.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::PKR => "Rs.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_pads_to_two_places() {
        assert_eq!(Price::pkr(Decimal::from(2750)).display(), "Rs. 2750.00");
        assert_eq!(Price::pkr(Decimal::new(12_345, 1)).display(), "Rs. 1234.50");
    }

    #[test]
    fn test_display_rounds_only_at_the_end() {
        // 0.1 * 3 accumulated exactly, then rounded
        let amount = Decimal::new(1, 1) * Decimal::from(3);
        assert_eq!(Price::pkr(amount).display(), "Rs. 0.30");
        assert_eq!(
            Price::pkr(Decimal::new(1_005, 3)).display(),
            "Rs. 1.00"
        );
    }
}
