//! Run fingerprinting: deterministic identification of a backtest run.
//!
//! - `ParamsHash`: BLAKE3 over the canonical JSON of the strategy parameters.
//! - `DatasetHash`: BLAKE3 over the straddle series (see `StraddleSeries::dataset_hash`).
//! - `RunId`: BLAKE3 over selection + params hash + dataset hash.
//!
//! Same inputs, same fingerprint: the simulator is a pure function, so a
//! matching `run_id` means a matching outcome.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::StrategyParameters;
use crate::data::StraddleSeries;
use crate::domain::{DatasetHash, ParamsHash, RunId, StraddleSelection};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFingerprint {
    pub run_id: RunId,
    pub params_hash: ParamsHash,
    pub dataset_hash: DatasetHash,
    pub selection: StraddleSelection,
}

impl RunFingerprint {
    pub fn compute(
        selection: &StraddleSelection,
        params: &StrategyParameters,
        series: &StraddleSeries,
    ) -> Result<Self, serde_json::Error> {
        let params_hash = ParamsHash::from_bytes(&serde_json::to_vec(params)?);
        let dataset_hash = series.dataset_hash();

        let canonical = json!({
            "selection": selection,
            "params_hash": &params_hash.0,
            "dataset_hash": &dataset_hash.0,
        });
        let run_id = RunId(blake3::hash(canonical.to_string().as_bytes()).to_hex().to_string());

        Ok(Self {
            run_id,
            params_hash,
            dataset_hash,
            selection: selection.clone(),
        })
    }
}
