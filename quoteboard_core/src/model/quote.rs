//! Quote data model.
//!
//! A `Quote` is one instrument's price/volume record. Required fields are checked by
//! [`Quote::validate`]; the only cross-field rule is that `change_percent` carries
//! the same sign as `change` (or both are zero).

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::BoardError;
use crate::result::Result;

/// Market quote for a single instrument.
///
/// Serialized with camelCase keys so seed files can be written in the same shape
/// web dashboards usually consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Symbol identifier. Unique within a snapshot, matched case-insensitively.
    pub symbol: String,
    /// Display name of the instrument.
    pub name: String,
    /// Last price, always positive.
    pub price: f64,
    /// Price delta versus the previous price.
    pub change: f64,
    /// `change / previous_price * 100`.
    pub change_percent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_close: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<u64>,
}

impl Quote {
    /// Creates a validated quote with no optional fields set.
    pub fn new(
        symbol: &str,
        name: &str,
        price: f64,
        change: f64,
        change_percent: f64,
    ) -> Result<Self> {
        let quote = Quote {
            symbol: symbol.trim().to_string(),
            name: name.trim().to_string(),
            price,
            change,
            change_percent,
            volume: None,
            high: None,
            low: None,
            open: None,
            previous_close: None,
            market_cap: None,
        };
        quote.validate()?;
        Ok(quote)
    }

    pub fn with_volume(mut self, volume: u64) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Sets the session's open, high and low prices.
    pub fn with_session(mut self, open: f64, high: f64, low: f64) -> Self {
        self.open = Some(open);
        self.high = Some(high);
        self.low = Some(low);
        self
    }

    pub fn with_previous_close(mut self, previous_close: f64) -> Self {
        self.previous_close = Some(previous_close);
        self
    }

    pub fn with_market_cap(mut self, market_cap: u64) -> Self {
        self.market_cap = Some(market_cap);
        self
    }

    /// Checks the quote against the data model invariants.
    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(BoardError::InvalidQuote("symbol is empty".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(BoardError::InvalidQuote(format!(
                "{}: name is empty",
                self.symbol
            )));
        }
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(BoardError::InvalidQuote(format!(
                "{}: price must be positive, got {}",
                self.symbol, self.price
            )));
        }
        if !self.change.is_finite() || !self.change_percent.is_finite() {
            return Err(BoardError::InvalidQuote(format!(
                "{}: change and change percent must be finite",
                self.symbol
            )));
        }
        if sign(self.change) != sign(self.change_percent) {
            return Err(BoardError::InvalidQuote(format!(
                "{}: change {} and change percent {} disagree in sign",
                self.symbol, self.change, self.change_percent
            )));
        }

        let optional = [
            ("high", self.high),
            ("low", self.low),
            ("open", self.open),
            ("previousClose", self.previous_close),
        ];
        for (field, value) in optional {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(BoardError::InvalidQuote(format!(
                        "{}: {} must be a non-negative number, got {}",
                        self.symbol, field, v
                    )));
                }
            }
        }
        Ok(())
    }

    /// Key used for uniqueness and matching: the lowercase symbol.
    pub fn symbol_key(&self) -> String {
        self.symbol.to_lowercase()
    }

    pub fn is_gainer(&self) -> bool {
        self.change_percent > 0.0
    }

    pub fn is_loser(&self) -> bool {
        self.change_percent < 0.0
    }
}

fn sign(value: f64) -> Ordering {
    value.partial_cmp(&0.0).unwrap_or(Ordering::Equal)
}

/// Rounds to two decimals, half-up on the magnitude.
///
/// Halves round away from zero: `0.355` becomes `0.36` and `-0.355` becomes
/// `-0.36`, so a negative figure rounds to the mirror of its positive twin.
///
/// Binary floats store values such as `0.355` slightly below the half, so the
/// scaled value is nudged by a tiny epsilon before rounding.
pub fn round_to_cents(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let scaled = value * 100.0;
    let nudged = scaled + scaled.signum() * 1e-9;
    let rounded = nudged.round() / 100.0;
    if rounded == 0.0 { 0.0 } else { rounded }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_valid_quote() {
        let quote = Quote::new(" AAPL ", "Apple Inc.", 175.43, 2.15, 1.24).unwrap();
        assert_eq!(quote.symbol, "AAPL");
        assert_eq!(quote.symbol_key(), "aapl");
        assert!(quote.is_gainer());
        assert!(!quote.is_loser());
    }

    #[test]
    fn test_rejects_non_positive_price() {
        let err = Quote::new("AAPL", "Apple Inc.", 0.0, 0.0, 0.0).unwrap_err();
        assert!(matches!(err, BoardError::InvalidQuote(_)));
        assert!(Quote::new("AAPL", "Apple Inc.", -1.0, 0.0, 0.0).is_err());
        assert!(Quote::new("AAPL", "Apple Inc.", f64::NAN, 0.0, 0.0).is_err());
    }

    #[test]
    fn test_rejects_sign_mismatch() {
        assert!(Quote::new("AAPL", "Apple Inc.", 10.0, 1.0, -1.0).is_err());
        assert!(Quote::new("AAPL", "Apple Inc.", 10.0, 0.0, 0.5).is_err());
        assert!(Quote::new("AAPL", "Apple Inc.", 10.0, -0.0, 0.0).is_ok());
    }

    #[test]
    fn test_rejects_blank_identity() {
        assert!(Quote::new("  ", "Apple Inc.", 10.0, 0.0, 0.0).is_err());
        assert!(Quote::new("AAPL", "", 10.0, 0.0, 0.0).is_err());
    }

    #[test]
    fn test_flat_quote_is_neither_gainer_nor_loser() {
        let quote = Quote::new("FLAT", "Flat Corp", 10.0, 0.0, 0.0).unwrap();
        assert!(!quote.is_gainer());
        assert!(!quote.is_loser());
    }

    #[test]
    fn test_deserializes_camel_case_with_optional_fields() {
        let json = r#"{
            "symbol": "MSFT",
            "name": "Microsoft Corporation",
            "price": 378.85,
            "change": 4.12,
            "changePercent": 1.10,
            "previousClose": 374.73,
            "marketCap": 2900000000000
        }"#;
        let quote: Quote = serde_json::from_str(json).unwrap();
        assert_eq!(quote.previous_close, Some(374.73));
        assert_eq!(quote.market_cap, Some(2_900_000_000_000));
        assert_eq!(quote.volume, None);
        assert!(quote.validate().is_ok());
    }

    #[test]
    fn test_round_to_cents_half_away_from_zero() {
        assert_eq!(round_to_cents(0.355), 0.36);
        assert_eq!(round_to_cents(-0.355), -0.36);
        assert_eq!(round_to_cents(1.234), 1.23);
        assert_eq!(round_to_cents(-0.001), 0.0);
        assert_eq!(round_to_cents(0.0), 0.0);
    }
}
