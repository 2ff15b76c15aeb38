//! Seed quote sets for the simulated provider.
//!
//! The built-in seed holds ten large caps. A custom seed can be loaded from a JSON
//! array of quotes (camelCase keys, optional fields may be omitted).

use std::io::Read;

use crate::error::BoardError;
use crate::model::Quote;
use crate::model::snapshot::check_unique_symbols;
use crate::result::Result;

/// Trait providing file parsing for seed quotes.
pub trait QuoteParser {
    /// Parses a JSON array of quotes from a reader.
    ///
    /// Every entry is validated; the set must not repeat a symbol.
    fn parse_from_reader<R: Read>(reader: R) -> Result<Vec<Quote>>;
}

impl QuoteParser for Quote {
    fn parse_from_reader<R: Read>(reader: R) -> Result<Vec<Self>> {
        let quotes: Vec<Quote> = serde_json::from_reader(reader)
            .map_err(|e| BoardError::ParseSeedFile(e.to_string()))?;

        for (index, quote) in quotes.iter().enumerate() {
            quote
                .validate()
                .map_err(|e| BoardError::ParseSeedFile(format!("entry {index}: {e}")))?;
        }
        check_unique_symbols(&quotes).map_err(|e| BoardError::ParseSeedFile(e.to_string()))?;
        Ok(quotes)
    }
}

/// Built-in seed used when no seed file is configured.
pub fn default_seed() -> Vec<Quote> {
    let rows: [(&str, &str, f64, f64, f64, u64, [f64; 3], f64, u64); 10] = [
        ("AAPL", "Apple Inc.", 175.43, 2.15, 1.24, 45_678_900, [174.00, 176.80, 173.20], 173.28, 2_800_000_000_000),
        ("GOOGL", "Alphabet Inc.", 2847.52, -15.23, -0.53, 1_234_567, [2860.00, 2865.00, 2840.00], 2862.75, 1_800_000_000_000),
        ("MSFT", "Microsoft Corporation", 378.85, 4.12, 1.10, 23_456_789, [376.00, 380.50, 375.20], 374.73, 2_900_000_000_000),
        ("AMZN", "Amazon.com Inc.", 3342.88, -8.45, -0.25, 3_456_789, [3350.00, 3355.00, 3335.00], 3351.33, 1_700_000_000_000),
        ("TSLA", "Tesla Inc.", 1008.87, 25.43, 2.59, 18_765_432, [990.00, 1015.00, 985.50], 983.44, 1_000_000_000_000),
        ("META", "Meta Platforms Inc.", 331.26, -2.18, -0.65, 15_432_109, [333.50, 335.00, 329.50], 333.44, 850_000_000_000),
        ("NVDA", "NVIDIA Corporation", 220.89, 3.67, 1.69, 42_109_876, [219.00, 222.50, 218.00], 217.22, 550_000_000_000),
        ("NFLX", "Netflix Inc.", 398.42, -1.23, -0.31, 4_321_098, [400.00, 402.00, 396.50], 399.65, 180_000_000_000),
        ("CRM", "Salesforce Inc.", 154.32, 1.87, 1.23, 6_543_210, [153.00, 156.00, 152.50], 152.45, 150_000_000_000),
        ("ORCL", "Oracle Corporation", 108.76, -0.54, -0.49, 8_765_432, [109.50, 110.00, 108.20], 109.30, 300_000_000_000),
    ];

    rows.iter()
        .map(|&(symbol, name, price, change, change_percent, volume, [open, high, low], previous_close, market_cap)| Quote {
            symbol: symbol.to_string(),
            name: name.to_string(),
            price,
            change,
            change_percent,
            volume: Some(volume),
            high: Some(high),
            low: Some(low),
            open: Some(open),
            previous_close: Some(previous_close),
            market_cap: Some(market_cap),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Snapshot;
    use std::io::Cursor;

    #[test]
    fn test_default_seed_is_valid_and_unique() {
        let seed = default_seed();
        assert_eq!(seed.len(), 10);
        for quote in &seed {
            quote.validate().unwrap();
        }
        assert!(Snapshot::new(seed).is_ok());
    }

    #[test]
    fn test_parse_seed_array() {
        let json = r#"[
            {"symbol": "AAPL", "name": "Apple Inc.", "price": 175.43, "change": 2.15, "changePercent": 1.24, "volume": 100},
            {"symbol": "ORCL", "name": "Oracle Corporation", "price": 108.76, "change": -0.54, "changePercent": -0.49}
        ]"#;
        let quotes = Quote::parse_from_reader(Cursor::new(json)).unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].volume, Some(100));
        assert_eq!(quotes[1].volume, None);
    }

    #[test]
    fn test_parse_rejects_invalid_entry() {
        let json = r#"[{"symbol": "BAD", "name": "Bad", "price": -1.0, "change": 0, "changePercent": 0}]"#;
        let err = Quote::parse_from_reader(Cursor::new(json)).unwrap_err();
        assert!(matches!(err, BoardError::ParseSeedFile(_)));
    }

    #[test]
    fn test_parse_rejects_duplicates_and_garbage() {
        let json = r#"[
            {"symbol": "AAPL", "name": "Apple", "price": 1.0, "change": 0, "changePercent": 0},
            {"symbol": "aapl", "name": "Apple again", "price": 1.0, "change": 0, "changePercent": 0}
        ]"#;
        assert!(Quote::parse_from_reader(Cursor::new(json)).is_err());
        assert!(Quote::parse_from_reader(Cursor::new("not json")).is_err());
    }
}
