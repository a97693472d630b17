//! StraddleObservation: call and put leg joined on one timestamp.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::quote::OptionSide;

/// Option contract multiplier applied to the summed leg prices.
pub const CONTRACT_MULTIPLIER: f64 = 100.0;

/// Both legs priced at the same timestamp.
///
/// `straddle_price = CONTRACT_MULTIPLIER * (put_price + call_price)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StraddleObservation {
    pub timestamp: NaiveDateTime,
    pub put_price: f64,
    pub call_price: f64,
    pub straddle_price: f64,
}

impl StraddleObservation {
    pub fn new(timestamp: NaiveDateTime, put_price: f64, call_price: f64) -> Self {
        Self {
            timestamp,
            put_price,
            call_price,
            straddle_price: CONTRACT_MULTIPLIER * (put_price + call_price),
        }
    }
}

/// The date/ticker/strike pair a single run evaluates.
///
/// The call is the upper strike and the put the lower one; they may coincide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StraddleSelection {
    pub date: NaiveDate,
    pub ticker: String,
    pub call_strike: f64,
    pub put_strike: f64,
}

impl StraddleSelection {
    /// Directory-safe label, e.g. `SPY_2024-03-08_515C_510P`.
    pub fn label(&self) -> String {
        format!(
            "{}_{}_{}{}_{}{}",
            self.ticker,
            self.date,
            self.call_strike,
            OptionSide::Call.code(),
            self.put_strike,
            OptionSide::Put.code()
        )
    }
}
