//! Backtest simulator: a single forward fold over the straddle series.
//!
//! Entry is the observation at exactly `session_start` on the series date.
//! From there the scan feeds each observation (the entry included) to
//! `ScanState::step` and stops at the first exit. There is no re-entry.

use std::ops::ControlFlow;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::state::{Exit, ExitReason, ScanState, Step};
use crate::config::StrategyParameters;
use crate::data::StraddleSeries;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// No observation at exactly the session start; no exit is evaluated.
    #[error("no straddle quote at entry time {session_start}")]
    MissingEntryQuote { session_start: NaiveDateTime },
}

/// Result of one simulation run. Built once by `simulate`, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    pub initial_price: f64,
    pub entry_time: NaiveDateTime,
    exit: Option<Exit>,
    pub max_gain_price: f64,
    pub max_gain_time: NaiveDateTime,
    /// Global maximum over the whole series, independent of entry.
    pub daily_high_price: f64,
    pub daily_high_time: NaiveDateTime,
}

impl SimulationOutcome {
    pub fn exit(&self) -> Option<Exit> {
        self.exit
    }

    pub fn exit_reason(&self) -> ExitReason {
        self.exit.map_or(ExitReason::None, |e| e.reason)
    }

    pub fn exit_price(&self) -> Option<f64> {
        self.exit.map(|e| e.price)
    }

    pub fn exit_time(&self) -> Option<NaiveDateTime> {
        self.exit.map(|e| e.time)
    }

    pub fn is_exited(&self) -> bool {
        self.exit.is_some()
    }
}

/// Entry timestamp: `session_start` on the date of the series.
pub fn entry_timestamp(series: &StraddleSeries, params: &StrategyParameters) -> NaiveDateTime {
    series.first().timestamp.date().and_time(params.session_start)
}

/// Run the entry/exit rules over `series`.
pub fn simulate(
    series: &StraddleSeries,
    params: &StrategyParameters,
) -> Result<SimulationOutcome, SimulationError> {
    let (armed, start) = arm(series, params)?;

    let scan = series.observations()[start..]
        .iter()
        .try_fold(armed, |state, obs| match state.step(obs, params) {
            Step::Continue(next) => {
                if next.threshold_hit && !state.threshold_hit {
                    debug!(
                        time = %obs.timestamp,
                        price = obs.straddle_price,
                        threshold = next.gain_threshold,
                        "gain threshold reached, trailing stop armed"
                    );
                }
                ControlFlow::Continue(next)
            }
            Step::Exit(last, exit) => ControlFlow::Break((last, exit)),
        });

    let (last, exit) = match scan {
        ControlFlow::Continue(state) => (state, None),
        ControlFlow::Break((state, exit)) => {
            debug!(
                reason = ?exit.reason,
                time = %exit.time,
                price = exit.price,
                "position closed"
            );
            (state, Some(exit))
        }
    };

    let (daily_high_price, daily_high_time) = series.daily_high();

    Ok(SimulationOutcome {
        initial_price: last.initial_price,
        entry_time: last.entry_time,
        exit,
        max_gain_price: last.max_gain_price,
        max_gain_time: last.max_gain_time,
        daily_high_price,
        daily_high_time,
    })
}

/// Every state visited by the scan, one per absorbed observation.
///
/// The last element is the state at exit (if one occurred) or at the end
/// of the series.
pub fn trace(
    series: &StraddleSeries,
    params: &StrategyParameters,
) -> Result<Vec<ScanState>, SimulationError> {
    let (mut state, start) = arm(series, params)?;
    let mut states = Vec::with_capacity(series.len() - start);

    for obs in &series.observations()[start..] {
        match state.step(obs, params) {
            Step::Continue(next) => {
                states.push(next);
                state = next;
            }
            Step::Exit(last, _) => {
                states.push(last);
                break;
            }
        }
    }
    Ok(states)
}

fn arm(
    series: &StraddleSeries,
    params: &StrategyParameters,
) -> Result<(ScanState, usize), SimulationError> {
    let session_start = entry_timestamp(series, params);
    let entry = series
        .at(session_start)
        .ok_or(SimulationError::MissingEntryQuote { session_start })?;
    Ok((
        ScanState::arm(entry, params),
        series.position_from(entry.timestamp),
    ))
}
