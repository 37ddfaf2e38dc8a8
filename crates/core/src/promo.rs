//! Promo and discount codes.
//!
//! Codes are matched case-insensitively against a fixed table. The store has
//! two tables that were never reconciled: one offered on the cart page and
//! one on the checkout page. They are kept separate here on purpose, and each
//! speaks of its codes the way its page does ("promo code" on the cart page,
//! "discount code" at checkout).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What a table calls its codes, which decides the customer-facing wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeKind {
    /// Cart page codes.
    Promo,
    /// Checkout page codes.
    Discount,
}

impl CodeKind {
    /// Prompt shown when the code input is blank.
    #[must_use]
    pub const fn empty_message(self) -> &'static str {
        match self {
            Self::Promo => "Please enter a promo code",
            Self::Discount => "Please enter a discount code",
        }
    }

    /// Message shown for a code that is not in the table.
    #[must_use]
    pub const fn invalid_message(self) -> &'static str {
        match self {
            Self::Promo => "Invalid promo code",
            Self::Discount => "✗ Invalid discount code",
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Promo => "Promo",
            Self::Discount => "Discount",
        }
    }
}

/// Errors from applying a promo code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromoError {
    /// No code was entered.
    #[error("{}", .0.empty_message())]
    Empty(CodeKind),

    /// The code is not in the table.
    #[error("{}", .kind.invalid_message())]
    Invalid { kind: CodeKind, code: String },

    /// A discount fraction outside `[0, 1]`.
    #[error("Discount rate must be between 0 and 1, got {0}")]
    RateOutOfRange(Decimal),
}

/// A discount fraction in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct DiscountRate(Decimal);

impl DiscountRate {
    /// Create a discount rate.
    ///
    /// # Errors
    ///
    /// Returns [`PromoError::RateOutOfRange`] if `value` is negative or
    /// greater than one.
    pub fn new(value: Decimal) -> Result<Self, PromoError> {
        if value < Decimal::ZERO || value > Decimal::ONE {
            return Err(PromoError::RateOutOfRange(value));
        }
        Ok(Self(value))
    }

    /// The fraction as a decimal.
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }

    /// Whole-number percentage, e.g. 20 for 0.20.
    #[must_use]
    pub fn percent(self) -> Decimal {
        (self.0 * Decimal::ONE_HUNDRED).round().normalize()
    }
}

impl TryFrom<Decimal> for DiscountRate {
    type Error = PromoError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DiscountRate> for Decimal {
    fn from(rate: DiscountRate) -> Self {
        rate.0
    }
}

/// The discount currently in effect.
///
/// `amount` is the discount the shopper was shown when the code was applied.
/// It is a snapshot only: summaries are always priced from `rate` against
/// the cart as it is now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedDiscount {
    /// Normalized (upper-case) code.
    pub code: String,
    /// Discount fraction.
    pub rate: DiscountRate,
    /// `subtotal * rate` at the time the code was applied.
    #[serde(default)]
    pub amount: Decimal,
}

/// A fixed mapping from code to discount rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoTable {
    kind: CodeKind,
    entries: Vec<(String, DiscountRate)>,
}

impl PromoTable {
    /// Build a table from `(code, percent)` pairs.
    ///
    /// Codes are normalized to upper case. Percentages above 100 are
    /// capped at 100.
    #[must_use]
    pub fn from_percentages(kind: CodeKind, entries: &[(&str, u32)]) -> Self {
        Self {
            kind,
            entries: entries
                .iter()
                .map(|&(code, percent)| {
                    let fraction = Decimal::new(i64::from(percent.min(100)), 2);
                    (normalize(code), DiscountRate(fraction))
                })
                .collect(),
        }
    }

    /// Codes offered on the cart page.
    #[must_use]
    pub fn cart_page() -> Self {
        Self::from_percentages(
            CodeKind::Promo,
            &[
                ("WELCOME10", 10),
                ("SAVE20", 20),
                ("BEAUTY15", 15),
                ("PINK50", 50),
            ],
        )
    }

    /// Codes offered on the checkout page.
    #[must_use]
    pub fn checkout() -> Self {
        Self::from_percentages(
            CodeKind::Discount,
            &[("WELCOME20", 20), ("SAVE10", 10), ("NEWUSER", 15)],
        )
    }

    /// Look up a code as typed by the customer and price it against
    /// `subtotal`.
    ///
    /// # Errors
    ///
    /// - [`PromoError::Empty`] if the input is blank
    /// - [`PromoError::Invalid`] if the code is not in the table
    pub fn lookup(&self, input: &str, subtotal: Decimal) -> Result<AppliedDiscount, PromoError> {
        let code = normalize(input);
        if code.is_empty() {
            return Err(PromoError::Empty(self.kind));
        }

        match self.entries.iter().find(|(known, _)| *known == code) {
            Some((known, rate)) => Ok(AppliedDiscount {
                code: known.clone(),
                rate: *rate,
                amount: subtotal.saturating_mul(rate.value()),
            }),
            None => Err(PromoError::Invalid {
                kind: self.kind,
                code,
            }),
        }
    }

    /// Confirmation line shown next to the code input.
    #[must_use]
    pub fn confirmation(&self, applied: &AppliedDiscount) -> String {
        format!(
            "✓ {} code applied! {}% off",
            self.kind.label(),
            applied.rate.percent()
        )
    }
}

fn normalize(code: &str) -> String {
    code.trim().to_uppercase()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let table = PromoTable::cart_page();
        let applied = table.lookup("  save20 ", Decimal::from(2500)).unwrap();
        assert_eq!(applied.code, "SAVE20");
        assert_eq!(applied.rate.value(), Decimal::new(20, 2));
        assert_eq!(applied.amount, Decimal::from(500));
    }

    #[test]
    fn test_lookup_empty() {
        let table = PromoTable::checkout();
        assert_eq!(
            table.lookup("", Decimal::ZERO),
            Err(PromoError::Empty(CodeKind::Discount))
        );
        assert_eq!(
            table.lookup("   ", Decimal::ZERO),
            Err(PromoError::Empty(CodeKind::Discount))
        );
    }

    #[test]
    fn test_lookup_unknown() {
        let table = PromoTable::checkout();
        assert_eq!(
            table.lookup("bogus", Decimal::ZERO),
            Err(PromoError::Invalid {
                kind: CodeKind::Discount,
                code: "BOGUS".to_string(),
            })
        );
    }

    #[test]
    fn test_tables_are_independent() {
        // PINK50 only exists on the cart page, NEWUSER only at checkout
        let subtotal = Decimal::from(1000);
        assert!(PromoTable::cart_page().lookup("PINK50", subtotal).is_ok());
        assert!(PromoTable::checkout().lookup("PINK50", subtotal).is_err());
        assert!(PromoTable::checkout().lookup("NEWUSER", subtotal).is_ok());
        assert!(PromoTable::cart_page().lookup("NEWUSER", subtotal).is_err());
    }

    #[test]
    fn test_rate_bounds() {
        assert!(DiscountRate::new(Decimal::ZERO).is_ok());
        assert!(DiscountRate::new(Decimal::ONE).is_ok());
        assert!(DiscountRate::new(Decimal::new(-1, 2)).is_err());
        assert!(DiscountRate::new(Decimal::new(101, 2)).is_err());
    }

    #[test]
    fn test_rate_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<DiscountRate>("\"0.15\"").is_ok());
        assert!(serde_json::from_str::<DiscountRate>("\"1.5\"").is_err());
    }

    #[test]
    fn test_each_page_uses_its_own_wording() {
        let checkout = PromoTable::checkout();
        let applied = checkout.lookup("welcome20", Decimal::ZERO).unwrap();
        assert_eq!(checkout.confirmation(&applied), "✓ Discount code applied! 20% off");
        assert_eq!(
            checkout.lookup("", Decimal::ZERO).unwrap_err().to_string(),
            "Please enter a discount code"
        );
        assert_eq!(
            checkout.lookup("nope", Decimal::ZERO).unwrap_err().to_string(),
            "✗ Invalid discount code"
        );

        let cart_page = PromoTable::cart_page();
        let applied = cart_page.lookup("beauty15", Decimal::ZERO).unwrap();
        assert_eq!(cart_page.confirmation(&applied), "✓ Promo code applied! 15% off");
        assert_eq!(
            cart_page.lookup(" ", Decimal::ZERO).unwrap_err().to_string(),
            "Please enter a promo code"
        );
        assert_eq!(
            cart_page.lookup("nope", Decimal::ZERO).unwrap_err().to_string(),
            "Invalid promo code"
        );
    }

    #[test]
    fn test_record_without_amount_still_loads() {
        let applied: AppliedDiscount =
            serde_json::from_str(r#"{"code":"SAVE10","rate":"0.10"}"#).unwrap();
        assert_eq!(applied.amount, Decimal::ZERO);
        assert_eq!(applied.rate.percent(), Decimal::from(10));
    }
}
