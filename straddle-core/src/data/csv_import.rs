//! CSV import of intraday option quotes.
//!
//! Expected header columns (any order, extra columns ignored):
//! `date`, `Ticker`, `Side`, `Strike`, `close`.
//! `date` is local exchange time as `MM/DD/YYYY HH:MM`; ISO
//! `YYYY-MM-DD HH:MM[:SS]` is accepted as well.

use std::io::Read;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::Deserialize;
use tracing::{debug, warn};

use super::provider::DataError;
use super::table::QuoteTable;
use crate::domain::{OptionSide, QuoteRecord};

const DATE_FORMATS: &[&str] = &[
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: String,
    #[serde(rename = "Ticker")]
    ticker: String,
    #[serde(rename = "Side")]
    side: String,
    #[serde(rename = "Strike")]
    strike: f64,
    close: f64,
}

/// Parse a quote timestamp in any of the accepted formats.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// Read quotes from any CSV source.
pub fn read_quotes<R: Read>(source: R) -> Result<QuoteTable, DataError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = rdr.headers().map_err(csv_error)?.clone();
    let mut record = csv::StringRecord::new();
    let mut quotes = Vec::new();

    while rdr.read_record(&mut record).map_err(csv_error)? {
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let row: CsvRow = record
            .deserialize(Some(&headers))
            .map_err(|e| DataError::Parse {
                line,
                reason: e.to_string(),
            })?;
        quotes.push(to_quote(row, line)?);
    }

    if quotes.is_empty() {
        return Err(DataError::EmptyDataset);
    }

    debug!(rows = quotes.len(), "imported quote CSV");
    Ok(QuoteTable::new(quotes))
}

/// Read quotes from a CSV file on disk.
pub fn load_csv(path: &Path) -> Result<QuoteTable, DataError> {
    let file = std::fs::File::open(path)?;
    read_quotes(std::io::BufReader::new(file))
}

fn to_quote(row: CsvRow, line: u64) -> Result<QuoteRecord, DataError> {
    let timestamp = parse_timestamp(&row.date).ok_or_else(|| DataError::Parse {
        line,
        reason: format!("unrecognized date '{}'", row.date),
    })?;
    let side = OptionSide::parse(&row.side).ok_or_else(|| DataError::Parse {
        line,
        reason: format!("unknown option side '{}'", row.side),
    })?;

    let quote = QuoteRecord {
        timestamp,
        ticker: row.ticker,
        side,
        strike: row.strike,
        close: row.close,
    };
    if !quote.is_valid() {
        warn!(line, close = quote.close, strike = quote.strike, "rejecting invalid quote");
        return Err(DataError::InvalidQuote {
            line,
            reason: format!("close {} / strike {} out of range", quote.close, quote.strike),
        });
    }
    Ok(quote)
}

fn csv_error(e: csv::Error) -> DataError {
    DataError::Parse {
        line: e.position().map(|p| p.line()).unwrap_or(0),
        reason: e.to_string(),
    }
}
