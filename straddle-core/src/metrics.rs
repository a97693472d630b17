//! Position metrics: pure functions from a simulation outcome to returns.
//!
//! Sizing buys as many whole straddles as the deployable cash allows.
//! Returns are reported for three reference prices: the actual exit, the
//! best price seen while the position was open, and the session high.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::SimulationOutcome;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricsError {
    /// Zero contracts: the deployable cash does not cover one straddle.
    #[error(
        "percent return undefined: cash to use {cash_to_use:.2} buys no straddle at {initial_price:.2}"
    )]
    DivisionUndefined { cash_to_use: f64, initial_price: f64 },
}

/// Sizing and returns for an exited position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionMetrics {
    pub contracts: u64,
    pub cash_to_use: f64,
    pub investment: f64,
    pub net_return: f64,
    pub percent_return: f64,
    pub max_gain_return: f64,
    pub max_gain_percent: f64,
    pub daily_high_return: f64,
    pub daily_high_percent: f64,
}

/// Why metrics were not produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoMetricsReason {
    /// Neither exit rule fired during the session.
    NoExit,
    NonPositiveEntryPrice,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetricsResult {
    Computed(PositionMetrics),
    NotComputed(NoMetricsReason),
}

impl MetricsResult {
    pub fn computed(&self) -> Option<&PositionMetrics> {
        match self {
            Self::Computed(m) => Some(m),
            Self::NotComputed(_) => None,
        }
    }
}

/// Whole straddles affordable with `cash_to_use` (floor).
pub fn contracts_for(cash_to_use: f64, initial_price: f64) -> u64 {
    (cash_to_use / initial_price).floor() as u64
}

/// Net return and percent return of `contracts` straddles valued at `price`.
pub fn position_return(price: f64, contracts: u64, investment: f64) -> (f64, f64) {
    let net = price * contracts as f64 - investment;
    (net, net / investment * 100.0)
}

pub fn compute_metrics(
    outcome: &SimulationOutcome,
    account_balance: f64,
    cash_utilization_fraction: f64,
) -> Result<MetricsResult, MetricsError> {
    let Some(exit_price) = outcome.exit_price() else {
        return Ok(MetricsResult::NotComputed(NoMetricsReason::NoExit));
    };
    let initial_price = outcome.initial_price;
    if initial_price <= 0.0 {
        return Ok(MetricsResult::NotComputed(
            NoMetricsReason::NonPositiveEntryPrice,
        ));
    }

    let cash_to_use = account_balance * cash_utilization_fraction;
    let contracts = contracts_for(cash_to_use, initial_price);
    let investment = initial_price * contracts as f64;
    if contracts == 0 || investment == 0.0 {
        return Err(MetricsError::DivisionUndefined {
            cash_to_use,
            initial_price,
        });
    }

    let (net_return, percent_return) = position_return(exit_price, contracts, investment);
    let (max_gain_return, max_gain_percent) =
        position_return(outcome.max_gain_price, contracts, investment);
    let (daily_high_return, daily_high_percent) =
        position_return(outcome.daily_high_price, contracts, investment);

    Ok(MetricsResult::Computed(PositionMetrics {
        contracts,
        cash_to_use,
        investment,
        net_return,
        percent_return,
        max_gain_return,
        max_gain_percent,
        daily_high_return,
        daily_high_percent,
    }))
}
