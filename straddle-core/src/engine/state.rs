//! Scan accumulator and the per-observation transition function.
//!
//! `ScanState` is the whole of the simulator's running state. It is a
//! `Copy` value: `step` consumes one observation and the prior state and
//! returns either the next state or a terminal exit. Check order inside a
//! step is fixed:
//!
//! 1. running max-gain update
//! 2. trailing-high update (only at or above the gain threshold)
//! 3. trailing take-profit check
//! 4. stop-loss check (only if 3 did not exit, only from the activation time)
//!
//! The trailing high starts at the gain threshold, not at the entry price.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::StrategyParameters;
use crate::domain::StraddleObservation;

/// Why the position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    TakeProfit,
    StopLoss,
    /// The scan exhausted the series without either rule firing.
    None,
}

/// Terminal exit point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Exit {
    pub price: f64,
    pub time: NaiveDateTime,
    pub reason: ExitReason,
}

/// Running state of an armed position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanState {
    pub initial_price: f64,
    pub entry_time: NaiveDateTime,
    /// `initial_price * take_profit_multiplier`.
    pub gain_threshold: f64,
    /// `initial_price * stop_loss_multiplier`.
    pub stop_loss_floor: f64,
    pub trailing_high: f64,
    pub trailing_stop: f64,
    pub threshold_hit: bool,
    pub max_gain_price: f64,
    pub max_gain_time: NaiveDateTime,
}

/// Result of feeding one observation to a `ScanState`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    Continue(ScanState),
    /// State after the exiting observation was absorbed, plus the exit.
    Exit(ScanState, Exit),
}

impl ScanState {
    /// Arm a position entered at `entry`.
    pub fn arm(entry: &StraddleObservation, params: &StrategyParameters) -> Self {
        let initial_price = entry.straddle_price;
        let gain_threshold = params.gain_threshold(initial_price);
        Self {
            initial_price,
            entry_time: entry.timestamp,
            gain_threshold,
            stop_loss_floor: params.stop_loss_floor(initial_price),
            trailing_high: gain_threshold,
            trailing_stop: gain_threshold * params.trailing_giveback_fraction,
            threshold_hit: false,
            max_gain_price: initial_price,
            max_gain_time: entry.timestamp,
        }
    }

    pub fn step(self, obs: &StraddleObservation, params: &StrategyParameters) -> Step {
        let price = obs.straddle_price;
        let mut next = self;

        if price > next.max_gain_price {
            next.max_gain_price = price;
            next.max_gain_time = obs.timestamp;
        }

        if price >= next.gain_threshold {
            next.trailing_high = next.trailing_high.max(price);
            next.trailing_stop = next.trailing_high * params.trailing_giveback_fraction;
            next.threshold_hit = true;
        }

        if next.threshold_hit && price <= next.trailing_stop {
            return Step::Exit(
                next,
                Exit {
                    price,
                    time: obs.timestamp,
                    reason: ExitReason::TakeProfit,
                },
            );
        }

        if obs.timestamp.time() >= params.stop_loss_activation_time && price <= next.stop_loss_floor
        {
            return Step::Exit(
                next,
                Exit {
                    price,
                    time: obs.timestamp,
                    reason: ExitReason::StopLoss,
                },
            );
        }

        Step::Continue(next)
    }
}
