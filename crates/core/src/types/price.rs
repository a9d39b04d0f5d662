//! Type-safe price representation using decimal arithmetic.
//!
//! The backend reports every monetary value as a decimal string plus an
//! ISO 4217 currency code. [`Price`] parses that pair into a [`Decimal`] so
//! display formatting and threshold math never go through floating point.

use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while parsing a price from backend strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("invalid currency code: {0}")]
    InvalidCurrency(String),
}

/// ISO 4217 currency code (three uppercase ASCII letters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// US dollars, the storefront's fallback currency.
    #[must_use]
    pub fn usd() -> Self {
        Self("USD".to_string())
    }

    /// The code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Currency symbol used by en-US formatting, if the currency has one.
    #[must_use]
    pub fn symbol(&self) -> Option<&'static str> {
        match self.0.as_str() {
            "USD" => Some("$"),
            "CAD" => Some("CA$"),
            "AUD" => Some("A$"),
            "EUR" => Some("€"),
            "GBP" => Some("£"),
            "JPY" => Some("¥"),
            _ => None,
        }
    }

    /// Number of minor-unit digits shown for this currency.
    #[must_use]
    pub fn minor_units(&self) -> u32 {
        match self.0.as_str() {
            "JPY" | "KRW" | "VND" | "CLP" | "ISK" => 0,
            _ => 2,
        }
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::usd()
    }
}

impl FromStr for CurrencyCode {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(code))
        } else {
            Err(PriceError::InvalidCurrency(s.to_string()))
        }
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = PriceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A price with currency information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
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

    /// A zero amount in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// Parse the backend's `{amount, currencyCode}` string pair.
    ///
    /// # Errors
    ///
    /// Returns `PriceError` if the amount is not a decimal number or the
    /// currency code is not three letters.
    pub fn parse(amount: &str, currency_code: &str) -> Result<Self, PriceError> {
        let amount = Decimal::from_str(amount.trim())
            .map_err(|_| PriceError::InvalidAmount(amount.to_string()))?;
        Ok(Self::new(amount, currency_code.parse()?))
    }

    /// Format for display (e.g., "$1,234.50").
    #[must_use]
    pub fn display(&self) -> String {
        format_price(self.amount, &self.currency_code)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// Format an amount the way an en-US currency formatter does.
///
/// Known currencies get their symbol (`$19.99`, `€5.00`); anything else is
/// prefixed with its code (`CHF 12.00`). Amounts are rounded half away from
/// zero to the currency's minor units and grouped by thousands.
#[must_use]
pub fn format_price(amount: Decimal, currency_code: &CurrencyCode) -> String {
    let dp = currency_code.minor_units();
    let mut rounded = amount
        .abs()
        .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(dp);

    let digits = rounded.to_string();
    let (whole, fraction) = digits
        .split_once('.')
        .map_or((digits.as_str(), None), |(w, f)| (w, Some(f)));

    let mut number = group_thousands(whole);
    if let Some(fraction) = fraction {
        number.push('.');
        number.push_str(fraction);
    }

    let sign = if amount.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };

    currency_code.symbol().map_or_else(
        || format!("{sign}{currency_code} {number}"),
        |symbol| format!("{sign}{symbol}{number}"),
    )
}

/// Insert `,` separators every three digits from the right.
fn group_thousands(whole: &str) -> String {
    let len = whole.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn usd() -> CurrencyCode {
        CurrencyCode::usd()
    }

    #[test]
    fn test_format_price_basic() {
        assert_eq!(format_price(Decimal::new(1999, 2), &usd()), "$19.99");
        assert_eq!(format_price(Decimal::new(5, 0), &usd()), "$5.00");
        assert_eq!(format_price(Decimal::ZERO, &usd()), "$0.00");
    }

    #[test]
    fn test_format_price_groups_thousands() {
        assert_eq!(format_price(Decimal::new(123_450, 2), &usd()), "$1,234.50");
        assert_eq!(
            format_price(Decimal::new(1_000_000, 0), &usd()),
            "$1,000,000.00"
        );
    }

    #[test]
    fn test_format_price_rounds_half_away_from_zero() {
        assert_eq!(format_price(Decimal::new(10_005, 3), &usd()), "$10.01");
        assert_eq!(format_price(Decimal::new(-10_005, 3), &usd()), "-$10.01");
    }

    #[test]
    fn test_format_price_other_currencies() {
        let eur: CurrencyCode = "eur".parse().unwrap();
        assert_eq!(format_price(Decimal::new(500, 2), &eur), "€5.00");

        let jpy: CurrencyCode = "JPY".parse().unwrap();
        assert_eq!(format_price(Decimal::new(1500, 0), &jpy), "¥1,500");

        let chf: CurrencyCode = "CHF".parse().unwrap();
        assert_eq!(format_price(Decimal::new(1200, 2), &chf), "CHF 12.00");
    }

    #[test]
    fn test_negative_zero_has_no_sign() {
        assert_eq!(format_price(Decimal::new(-1, 3), &usd()), "$0.00");
    }

    #[test]
    fn test_price_parse() {
        let price = Price::parse("24.0", "USD").unwrap();
        assert_eq!(price.amount, Decimal::new(24, 0));
        assert_eq!(price.display(), "$24.00");
    }

    #[test]
    fn test_price_parse_rejects_garbage() {
        assert!(matches!(
            Price::parse("abc", "USD"),
            Err(PriceError::InvalidAmount(_))
        ));
        assert!(matches!(
            Price::parse("1.00", "DOLLARS"),
            Err(PriceError::InvalidCurrency(_))
        ));
    }

    #[test]
    fn test_currency_code_serde_validates() {
        let code: CurrencyCode = serde_json::from_str("\"GBP\"").unwrap();
        assert_eq!(code.symbol(), Some("£"));
        assert!(serde_json::from_str::<CurrencyCode>("\"12\"").is_err());
    }
}
