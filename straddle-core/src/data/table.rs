//! In-memory quote table with selection discovery.
//!
//! Holds the whole dataset and answers the questions a selection UI asks:
//! which session dates exist, which tickers traded on a date, and which
//! call/put strikes are quoted for a ticker on that date.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::provider::{DataError, QuoteProvider, QuoteQuery};
use crate::domain::{OptionSide, QuoteRecord, StraddleSelection};

#[derive(Debug, Clone, Default)]
pub struct QuoteTable {
    records: Vec<QuoteRecord>,
}

impl QuoteTable {
    pub fn new(records: Vec<QuoteRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[QuoteRecord] {
        &self.records
    }

    /// Distinct session dates, ascending.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.records
            .iter()
            .map(|q| q.timestamp.date())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Tickers quoted on `date`, in first-seen order.
    pub fn tickers(&self, date: NaiveDate) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for q in self.records.iter().filter(|q| q.timestamp.date() == date) {
            if !out.iter().any(|t| t == &q.ticker) {
                out.push(q.ticker.clone());
            }
        }
        out
    }

    /// Strikes quoted for `ticker`/`side` on `date`, in first-seen order.
    pub fn strikes(&self, date: NaiveDate, ticker: &str, side: OptionSide) -> Vec<f64> {
        let mut out: Vec<f64> = Vec::new();
        for q in self.records.iter().filter(|q| {
            q.timestamp.date() == date && q.ticker == ticker && q.side == side
        }) {
            if !out.contains(&q.strike) {
                out.push(q.strike);
            }
        }
        out
    }

    /// First ticker of the date, with its first call and first put strike.
    ///
    /// Returns `None` if that ticker lacks a call or a put quote on the date.
    pub fn default_selection(&self, date: NaiveDate) -> Option<StraddleSelection> {
        let ticker = self.tickers(date).into_iter().next()?;
        let call_strike = *self.strikes(date, &ticker, OptionSide::Call).first()?;
        let put_strike = *self.strikes(date, &ticker, OptionSide::Put).first()?;
        Some(StraddleSelection {
            date,
            ticker,
            call_strike,
            put_strike,
        })
    }
}

impl QuoteProvider for QuoteTable {
    fn quotes(&self, query: &QuoteQuery) -> Result<Vec<QuoteRecord>, DataError> {
        Ok(self
            .records
            .iter()
            .filter(|q| query.matches(q))
            .cloned()
            .collect())
    }
}
