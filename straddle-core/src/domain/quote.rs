//! QuoteRecord: one closing price for one option contract at one timestamp.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Option side (one leg of the straddle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionSide {
    Call,
    Put,
}

impl OptionSide {
    /// Parse the side codes used by quote datasets (`C`, `P`, `CALL`, `PUT`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "C" | "CALL" => Some(Self::Call),
            "P" | "PUT" => Some(Self::Put),
            _ => None,
        }
    }

    /// Single-letter code, as it appears in the dataset.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Call => "C",
            Self::Put => "P",
        }
    }
}

impl fmt::Display for OptionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Call => write!(f, "call"),
            Self::Put => write!(f, "put"),
        }
    }
}

/// Intraday option quote as supplied by the quote provider. Never mutated.
///
/// `timestamp` is local exchange time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRecord {
    pub timestamp: NaiveDateTime,
    pub ticker: String,
    pub side: OptionSide,
    pub strike: f64,
    pub close: f64,
}

impl QuoteRecord {
    /// Close must be finite and non-negative; strike finite and positive.
    pub fn is_valid(&self) -> bool {
        self.close.is_finite() && self.close >= 0.0 && self.strike.is_finite() && self.strike > 0.0
    }
}
