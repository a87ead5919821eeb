//! Decimal money amounts.
//!
//! Shopify sends prices as decimal strings (`"25.00"`); donations are stored
//! as Postgres `numeric`. Both map onto [`rust_decimal::Decimal`] so no
//! amount ever passes through floating point.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a money amount.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The amount string is not a decimal number.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    /// The currency code is not one we handle.
    #[error("unsupported currency: {0}")]
    UnsupportedCurrency(String),
}

/// ISO 4217 currency codes accepted by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Currency {
    #[default]
    USD,
    CAD,
    EUR,
    GBP,
    AUD,
}

impl Currency {
    /// Display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// Three-letter ISO code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::CAD => "CAD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::AUD => "AUD",
        }
    }
}

impl FromStr for Currency {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Self::USD),
            "CAD" => Ok(Self::CAD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            "AUD" => Ok(Self::AUD),
            other => Err(MoneyError::UnsupportedCurrency(other.to_string())),
        }
    }
}

/// An amount in a currency's standard unit (dollars, not cents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Decimal amount.
    pub amount: Decimal,
    /// Currency of the amount.
    pub currency: Currency,
}

impl Money {
    /// Create a new amount.
    #[must_use]
    pub const fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// A US dollar amount.
    #[must_use]
    pub const fn usd(amount: Decimal) -> Self {
        Self::new(amount, Currency::USD)
    }

    /// Parse a decimal string such as Shopify's `"12.50"`.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::InvalidAmount`] if the string is not a decimal.
    pub fn parse(amount: &str, currency: Currency) -> Result<Self, MoneyError> {
        let amount = parse_amount(amount)?;
        Ok(Self::new(amount, currency))
    }

    /// Format for display with two decimals, e.g. `$19.99`.
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{}", self.currency.symbol(), format_amount(self.amount))
    }
}

/// Parse a decimal amount string.
///
/// # Errors
///
/// Returns [`MoneyError::InvalidAmount`] if the string is not a decimal.
pub fn parse_amount(amount: &str) -> Result<Decimal, MoneyError> {
    Decimal::from_str(amount.trim()).map_err(|_| MoneyError::InvalidAmount(amount.to_string()))
}

/// Format a decimal with exactly two fraction digits (half away from zero).
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.2}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_pads_to_two_decimals() {
        assert_eq!(Money::usd(Decimal::new(25, 0)).display(), "$25.00");
        assert_eq!(Money::usd(Decimal::new(1, 2)).display(), "$0.01");
        assert_eq!(Money::usd(Decimal::new(10005, 3)).display(), "$10.01");
    }

    #[test]
    fn test_parse_shopify_amount() {
        let money = Money::parse("12.50", Currency::USD).unwrap();
        assert_eq!(money.amount, Decimal::new(1250, 2));
        assert!(Money::parse("twelve", Currency::USD).is_err());
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::USD);
        assert!(matches!(
            "JPY".parse::<Currency>(),
            Err(MoneyError::UnsupportedCurrency(_))
        ));
    }

    #[test]
    fn test_format_amount_large_values() {
        assert_eq!(format_amount(Decimal::new(12345, 1)), "1234.50");
    }
}
