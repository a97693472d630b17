//! Backtest runner: wires quote provider, series builder, simulator and metrics.
//!
//! Two entry points:
//! - `run_backtest()`: queries both legs from a `QuoteProvider`. Used by the CLI.
//! - `run_backtest_on_legs()`: takes pre-fetched legs, no I/O.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::config::{ConfigError, StrategyParameters};
use crate::data::{
    build_straddle_series, DataError, QuoteProvider, QuoteQuery, SeriesError, StraddleSeries,
};
use crate::domain::{OptionSide, QuoteRecord, StraddleSelection};
use crate::engine::{simulate, SimulationError, SimulationOutcome};
use crate::fingerprint::RunFingerprint;
use crate::metrics::{compute_metrics, MetricsError, MetricsResult};

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

/// Errors that abort a run. None of them is retried.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("series error: {0}")]
    Series(#[from] SeriesError),
    #[error("metrics error: {0}")]
    Metrics(#[from] MetricsError),
    #[error("fingerprint error: {0}")]
    Fingerprint(#[from] serde_json::Error),
}

/// What the simulator made of the series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Evaluation {
    /// No observation at the session start: nothing was entered.
    MissingEntryQuote { session_start: NaiveDateTime },
    Simulated {
        outcome: SimulationOutcome,
        metrics: MetricsResult,
    },
}

/// Everything the presentation layer needs for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub selection: StraddleSelection,
    pub params: StrategyParameters,
    pub fingerprint: RunFingerprint,
    pub series: StraddleSeries,
    pub daily_high_price: f64,
    pub daily_high_time: NaiveDateTime,
    pub evaluation: Evaluation,
}

impl BacktestReport {
    pub fn outcome(&self) -> Option<&SimulationOutcome> {
        match &self.evaluation {
            Evaluation::Simulated { outcome, .. } => Some(outcome),
            Evaluation::MissingEntryQuote { .. } => None,
        }
    }

    pub fn metrics(&self) -> Option<&MetricsResult> {
        match &self.evaluation {
            Evaluation::Simulated { metrics, .. } => Some(metrics),
            Evaluation::MissingEntryQuote { .. } => None,
        }
    }
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Query both legs of `selection` and run the backtest.
pub fn run_backtest(
    provider: &dyn QuoteProvider,
    selection: &StraddleSelection,
    params: &StrategyParameters,
) -> Result<BacktestReport, RunError> {
    params.validate()?;

    let calls = fetch_leg(provider, selection, OptionSide::Call)?;
    let puts = fetch_leg(provider, selection, OptionSide::Put)?;

    run_backtest_on_legs(&calls, &puts, selection, params)
}

/// One leg of the selection. An unquoted leg is an error, not an empty series.
fn fetch_leg(
    provider: &dyn QuoteProvider,
    selection: &StraddleSelection,
    side: OptionSide,
) -> Result<Vec<QuoteRecord>, DataError> {
    let query = leg_query(selection, side);
    let quotes = provider.quotes(&query)?;
    if quotes.is_empty() {
        return Err(DataError::NoQuotes {
            date: query.date,
            ticker: query.ticker,
            side,
            strike: query.strike,
        });
    }
    Ok(quotes)
}

/// Run the backtest on pre-fetched legs.
///
/// Quotes dated other than `selection.date` are ignored.
pub fn run_backtest_on_legs(
    calls: &[QuoteRecord],
    puts: &[QuoteRecord],
    selection: &StraddleSelection,
    params: &StrategyParameters,
) -> Result<BacktestReport, RunError> {
    params.validate()?;
    info!(
        ticker = %selection.ticker,
        date = %selection.date,
        call_strike = selection.call_strike,
        put_strike = selection.put_strike,
        "running straddle backtest"
    );

    let calls = on_date(calls, selection);
    let puts = on_date(puts, selection);
    let series = build_straddle_series(&calls, &puts, params.session())?;
    let fingerprint = RunFingerprint::compute(selection, params, &series)?;
    let (daily_high_price, daily_high_time) = series.daily_high();

    let evaluation = match simulate(&series, params) {
        Ok(outcome) => {
            let metrics = compute_metrics(
                &outcome,
                params.account_balance,
                params.cash_utilization_fraction,
            )?;
            info!(
                run_id = %fingerprint.run_id.short(),
                reason = ?outcome.exit_reason(),
                observations = series.len(),
                "backtest complete"
            );
            Evaluation::Simulated { outcome, metrics }
        }
        Err(SimulationError::MissingEntryQuote { session_start }) => {
            info!(%session_start, "no quote at entry time, position not entered");
            Evaluation::MissingEntryQuote { session_start }
        }
    };

    Ok(BacktestReport {
        schema_version: SCHEMA_VERSION,
        selection: selection.clone(),
        params: params.clone(),
        fingerprint,
        series,
        daily_high_price,
        daily_high_time,
        evaluation,
    })
}

fn leg_query(selection: &StraddleSelection, side: OptionSide) -> QuoteQuery {
    let strike = match side {
        OptionSide::Call => selection.call_strike,
        OptionSide::Put => selection.put_strike,
    };
    QuoteQuery {
        date: selection.date,
        ticker: selection.ticker.clone(),
        side,
        strike,
    }
}

fn on_date(quotes: &[QuoteRecord], selection: &StraddleSelection) -> Vec<QuoteRecord> {
    quotes
        .iter()
        .filter(|q| q.timestamp.date() == selection.date)
        .cloned()
        .collect()
}
