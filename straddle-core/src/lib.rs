//! Straddle Core: single-session options straddle backtesting.
//!
//! This crate contains the whole engine:
//! - Domain types (quotes, straddle observations, selections, content hashes)
//! - Quote providers (in-memory table, CSV import, HTTP fetch)
//! - Straddle series builder (leg join, session window, data-quality checks)
//! - Simulator: entry at session start, trailing take-profit, time-gated stop-loss
//! - Position metrics (contract sizing, realized / max-gain / daily-high returns)
//! - Run fingerprinting and artifact export
//!
//! Every run is a pure function of (quotes, selection, parameters).

pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod export;
pub mod fingerprint;
pub mod metrics;
pub mod runner;

pub use config::{ConfigError, SessionWindow, StrategyParameters};
pub use data::{QuoteProvider, QuoteTable, StraddleSeries};
pub use engine::{simulate, ExitReason, SimulationOutcome};
pub use metrics::{compute_metrics, MetricsResult, PositionMetrics};
pub use runner::{run_backtest, run_backtest_on_legs, BacktestReport, Evaluation, RunError};
