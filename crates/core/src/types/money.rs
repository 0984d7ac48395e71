//! Monetary amounts with decimal-safe arithmetic.
//!
//! Shopify returns prices as decimal strings (`"19.99"`). [`Money`] keeps
//! that string as-is so nothing is lost on the way through the cart, and
//! only parses it into a [`Decimal`] when arithmetic is needed. Floating
//! point is never involved; rounding happens only in [`Money::display`].

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when a monetary amount cannot be used for arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// The amount string is not a valid decimal number.
    #[error("Invalid amount: {0:?}")]
    InvalidAmount(String),

    /// The result does not fit in a `Decimal`.
    #[error("Amount overflow")]
    Overflow,
}

/// A monetary amount with its ISO 4217 currency code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    /// Decimal amount as string (preserves precision).
    pub amount: String,
    /// ISO 4217 currency code.
    pub currency_code: String,
}

impl Money {
    /// Create a new amount from its string parts.
    #[must_use]
    pub fn new(amount: impl Into<String>, currency_code: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            currency_code: currency_code.into(),
        }
    }

    /// Create an amount from an already-parsed decimal.
    #[must_use]
    pub fn from_decimal(amount: Decimal, currency_code: impl Into<String>) -> Self {
        Self {
            amount: amount.to_string(),
            currency_code: currency_code.into(),
        }
    }

    /// A zero amount in the given currency.
    #[must_use]
    pub fn zero(currency_code: impl Into<String>) -> Self {
        Self::from_decimal(Decimal::new(0, 2), currency_code)
    }

    /// Parse the amount string.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::InvalidAmount`] if the amount is not a decimal number.
    pub fn decimal(&self) -> Result<Decimal, MoneyError> {
        Decimal::from_str(self.amount.trim())
            .map_err(|_| MoneyError::InvalidAmount(self.amount.clone()))
    }

    /// Multiply the amount by a quantity.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount does not parse or the product overflows.
    pub fn times(&self, quantity: u32) -> Result<Self, MoneyError> {
        let total = self
            .decimal()?
            .checked_mul(Decimal::from(quantity))
            .ok_or(MoneyError::Overflow)?;
        Ok(Self::from_decimal(total, self.currency_code.clone()))
    }

    /// The known currency, if the code is one we format specially.
    #[must_use]
    pub fn currency(&self) -> Option<CurrencyCode> {
        self.currency_code.parse().ok()
    }

    /// Format for display with two decimal places (e.g., "$19.99").
    ///
    /// Unknown currencies are suffixed with their code ("19.99 JPY"); an
    /// unparseable amount is shown verbatim.
    #[must_use]
    pub fn display(&self) -> String {
        let Ok(amount) = self.decimal() else {
            return format!("{} {}", self.amount, self.currency_code);
        };
        let amount = amount.round_dp(2);
        match self.currency() {
            Some(currency) => format!("{}{amount:.2}", currency.symbol()),
            None => format!("{amount:.2} {}", self.currency_code),
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes with dedicated display symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// Display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }
}

impl FromStr for CurrencyCode {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            "CAD" => Ok(Self::CAD),
            "AUD" => Ok(Self::AUD),
            _ => Err(MoneyError::InvalidAmount(s.to_owned())),
        }
    }
}
