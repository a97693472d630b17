//! Backtest simulator: entry at session start, trailing take-profit,
//! time-gated stop-loss, single pass, no re-entry.

pub mod simulator;
pub mod state;

pub use simulator::{entry_timestamp, simulate, trace, SimulationError, SimulationOutcome};
pub use state::{Exit, ExitReason, ScanState, Step};
