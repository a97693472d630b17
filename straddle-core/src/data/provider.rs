//! Quote provider trait and structured error types.
//!
//! The QuoteProvider trait abstracts over where option quotes come from
//! (an in-memory table, a CSV file, a remote CSV) so the runner can be
//! driven by any of them and mocked in tests.

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{OptionSide, QuoteRecord};

/// Structured error types for quote data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("HTTP {status} fetching {url}")]
    Http { status: u16, url: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parse error at line {line}: {reason}")]
    Parse { line: u64, reason: String },

    #[error("invalid quote at line {line}: {reason}")]
    InvalidQuote { line: u64, reason: String },

    #[error("no quotes for {ticker} {side} {strike} on {date}")]
    NoQuotes {
        date: NaiveDate,
        ticker: String,
        side: OptionSide,
        strike: f64,
    },

    #[error("dataset is empty")]
    EmptyDataset,
}

/// Filter for a single leg: one date, ticker, side and strike.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteQuery {
    pub date: NaiveDate,
    pub ticker: String,
    pub side: OptionSide,
    pub strike: f64,
}

impl QuoteQuery {
    pub fn matches(&self, quote: &QuoteRecord) -> bool {
        quote.timestamp.date() == self.date
            && quote.ticker == self.ticker
            && quote.side == self.side
            && quote.strike == self.strike
    }
}

/// Synchronous source of quote records.
///
/// Implementations return every record matching the query, in any order.
/// An empty result is not an error at this layer; the series builder
/// decides what an empty leg means.
pub trait QuoteProvider {
    fn quotes(&self, query: &QuoteQuery) -> Result<Vec<QuoteRecord>, DataError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(side: OptionSide, strike: f64, hour: u32) -> QuoteRecord {
        QuoteRecord {
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 8)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            ticker: "SPY".into(),
            side,
            strike,
            close: 1.0,
        }
    }

    #[test]
    fn query_matches_all_fields() {
        let q = QuoteQuery {
            date: NaiveDate::from_ymd_opt(2024, 3, 8).unwrap(),
            ticker: "SPY".into(),
            side: OptionSide::Call,
            strike: 515.0,
        };
        assert!(q.matches(&quote(OptionSide::Call, 515.0, 10)));
        assert!(!q.matches(&quote(OptionSide::Put, 515.0, 10)));
        assert!(!q.matches(&quote(OptionSide::Call, 510.0, 10)));
    }
}
