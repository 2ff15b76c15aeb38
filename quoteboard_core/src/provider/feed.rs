//! Upstream quote feeds and the validating boundary in front of them.
//!
//! Quote APIs in the "Global Quote" style answer with loosely typed JSON: every value
//! is a string, keys carry ordinal prefixes, and unknown symbols come back as an empty
//! object. [`RawQuoteRecord`] captures that shape verbatim, and `TryFrom` turns it
//! into a validated [`Quote`]. Only the validated form ever leaves this module.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BoardError;
use crate::model::{Quote, Snapshot};
use crate::provider::{SnapshotProvider, unavailable};
use crate::result::Result;

/// Key wrapping each record in upstream responses.
pub const GLOBAL_QUOTE_KEY: &str = "Global Quote";

/// One upstream quote record, exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawQuoteRecord {
    #[serde(rename = "01. symbol")]
    pub symbol: String,
    #[serde(rename = "02. open", default)]
    pub open: Option<String>,
    #[serde(rename = "03. high", default)]
    pub high: Option<String>,
    #[serde(rename = "04. low", default)]
    pub low: Option<String>,
    #[serde(rename = "05. price")]
    pub price: String,
    #[serde(rename = "06. volume", default)]
    pub volume: Option<String>,
    #[serde(rename = "07. latest trading day", default)]
    pub latest_trading_day: Option<String>,
    #[serde(rename = "08. previous close", default)]
    pub previous_close: Option<String>,
    #[serde(rename = "09. change")]
    pub change: String,
    #[serde(rename = "10. change percent")]
    pub change_percent: String,
}

impl TryFrom<RawQuoteRecord> for Quote {
    type Error = BoardError;

    fn try_from(raw: RawQuoteRecord) -> Result<Self> {
        let symbol = raw.symbol.trim();
        let price = parse_decimal(symbol, "price", &raw.price)?;
        let change = parse_decimal(symbol, "change", &raw.change)?;
        let mut change_percent = parse_decimal(
            symbol,
            "change percent",
            raw.change_percent.trim().trim_end_matches('%'),
        )?;
        let previous_close = parse_optional_decimal(symbol, "previous close", &raw.previous_close)?;

        // upstream rounds the percentage to 4 places; tiny moves on large prices print as 0
        if change != 0.0 && change_percent == 0.0 {
            if let Some(previous) = previous_close.filter(|p| *p > 0.0) {
                change_percent = change / previous * 100.0;
            }
        }

        // the upstream gives no company name
        let mut quote = Quote::new(symbol, symbol, price, change, change_percent)?;
        quote.open = parse_optional_decimal(symbol, "open", &raw.open)?;
        quote.high = parse_optional_decimal(symbol, "high", &raw.high)?;
        quote.low = parse_optional_decimal(symbol, "low", &raw.low)?;
        quote.previous_close = previous_close;
        quote.volume = match raw.volume.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(text) => Some(text.parse::<u64>().map_err(|e| {
                BoardError::InvalidQuote(format!("{symbol}: volume '{text}': {e}"))
            })?),
        };
        quote.validate()?;
        Ok(quote)
    }
}

fn parse_decimal(symbol: &str, field: &str, text: &str) -> Result<f64> {
    let text = text.trim();
    text.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| BoardError::InvalidQuote(format!("{symbol}: {field} '{text}' is not a number")))
}

fn parse_optional_decimal(symbol: &str, field: &str, text: &Option<String>) -> Result<Option<f64>> {
    match text.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => parse_decimal(symbol, field, text).map(Some),
    }
}

/// Parses an upstream response body.
///
/// Accepts a single `{"Global Quote": {...}}` object or an array of them. Empty
/// records (the upstream's answer for unknown symbols) are skipped.
pub fn parse_global_quotes(body: &str) -> Result<Vec<RawQuoteRecord>> {
    let document: Value = serde_json::from_str(body)?;
    let envelopes = match document {
        Value::Array(items) => items,
        single @ Value::Object(_) => vec![single],
        other => {
            return Err(BoardError::SourceUnavailable(format!(
                "unexpected response shape: {other}"
            )));
        }
    };

    let mut records = Vec::with_capacity(envelopes.len());
    for envelope in envelopes {
        let Some(inner) = envelope.get(GLOBAL_QUOTE_KEY) else {
            return Err(BoardError::SourceUnavailable(format!(
                "response entry lacks '{GLOBAL_QUOTE_KEY}'"
            )));
        };
        match inner {
            Value::Null => continue,
            Value::Object(map) if map.is_empty() => {
                debug!("Skipping empty quote record");
                continue;
            }
            _ => records.push(serde_json::from_value::<RawQuoteRecord>(inner.clone())?),
        }
    }
    Ok(records)
}

/// Upstream capability: fetch the current raw records.
pub trait QuoteFeed: Send {
    fn fetch(&mut self) -> Result<Vec<RawQuoteRecord>>;
}

/// Feed reading an upstream response document from disk on every fetch.
///
/// Useful for replaying captured responses, or for pointing at a file another
/// process keeps up to date.
#[derive(Debug, Clone)]
pub struct JsonFileFeed {
    path: PathBuf,
}

impl JsonFileFeed {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl QuoteFeed for JsonFileFeed {
    fn fetch(&mut self) -> Result<Vec<RawQuoteRecord>> {
        let body = fs::read_to_string(&self.path).map_err(|e| {
            BoardError::SourceUnavailable(format!("cannot read {:?}: {}", self.path, e))
        })?;
        parse_global_quotes(&body)
    }
}

/// Snapshot provider over an upstream [`QuoteFeed`].
///
/// Any failure, including a single malformed record, fails the whole fetch with
/// `SourceUnavailable` so a partial snapshot is never published.
pub struct FeedProvider<F: QuoteFeed> {
    feed: F,
}

impl<F: QuoteFeed> FeedProvider<F> {
    pub fn new(feed: F) -> Self {
        Self { feed }
    }
}

impl<F: QuoteFeed> SnapshotProvider for FeedProvider<F> {
    fn fetch_snapshot(&mut self) -> Result<Snapshot> {
        let records = self.feed.fetch().map_err(unavailable)?;
        let quotes = records
            .into_iter()
            .map(Quote::try_from)
            .collect::<Result<Vec<_>>>()
            .map_err(unavailable)?;
        if quotes.is_empty() {
            warn!("Upstream feed returned no quotes");
        }
        Snapshot::new(quotes).map_err(unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const IBM: &str = r#"{
        "Global Quote": {
            "01. symbol": "IBM",
            "02. open": "140.0000",
            "03. high": "141.5000",
            "04. low": "139.2000",
            "05. price": "140.5000",
            "06. volume": "3456789",
            "07. latest trading day": "2024-01-05",
            "08. previous close": "139.5000",
            "09. change": "1.0000",
            "10. change percent": "0.7168%"
        }
    }"#;

    #[test]
    fn test_parse_single_record() {
        let records = parse_global_quotes(IBM).unwrap();
        assert_eq!(records.len(), 1);
        let quote = Quote::try_from(records[0].clone()).unwrap();
        assert_eq!(quote.symbol, "IBM");
        assert_eq!(quote.name, "IBM");
        assert_eq!(quote.price, 140.5);
        assert_eq!(quote.change_percent, 0.7168);
        assert_eq!(quote.volume, Some(3_456_789));
        assert_eq!(quote.previous_close, Some(139.5));
    }

    #[test]
    fn test_parse_array_skips_empty_records() {
        let body = format!(r#"[{IBM}, {{"Global Quote": {{}}}}]"#);
        let records = parse_global_quotes(&body).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_malformed_number_is_rejected() {
        let body = IBM.replace("140.5000", "n/a");
        let records = parse_global_quotes(&body).unwrap();
        let err = Quote::try_from(records[0].clone()).unwrap_err();
        assert!(matches!(err, BoardError::InvalidQuote(_)));
    }

    #[test]
    fn test_zero_percent_is_recomputed_from_previous_close() {
        let body = IBM.replace("0.7168%", "0.0000%");
        let records = parse_global_quotes(&body).unwrap();
        let quote = Quote::try_from(records[0].clone()).unwrap();
        assert!((quote.change_percent - 1.0 / 139.5 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_unexpected_shape() {
        assert!(parse_global_quotes("42").is_err());
        assert!(parse_global_quotes(r#"{"Note": "rate limited"}"#).is_err());
    }

    #[test]
    fn test_file_feed_provider() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{IBM}").unwrap();

        let mut provider = FeedProvider::new(JsonFileFeed::new(file.path()));
        let snapshot = provider.fetch_snapshot().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.get("ibm").is_some());
    }

    #[test]
    fn test_failures_surface_as_source_unavailable() {
        let mut missing = FeedProvider::new(JsonFileFeed::new("missing_feed.json"));
        assert!(matches!(
            missing.fetch_snapshot(),
            Err(BoardError::SourceUnavailable(_))
        ));

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", IBM.replace("1.0000", "oops")).unwrap();
        let mut malformed = FeedProvider::new(JsonFileFeed::new(file.path()));
        assert!(matches!(
            malformed.fetch_snapshot(),
            Err(BoardError::SourceUnavailable(_))
        ));
    }
}
