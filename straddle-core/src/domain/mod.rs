//! Domain types for single-session straddle backtests

pub mod ids;
pub mod observation;
pub mod quote;

pub use ids::{DatasetHash, ParamsHash, RunId};
pub use observation::{StraddleObservation, StraddleSelection, CONTRACT_MULTIPLIER};
pub use quote::{OptionSide, QuoteRecord};
