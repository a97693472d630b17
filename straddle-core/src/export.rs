//! Artifact export: JSON report and CSV series.
//!
//! - **JSON**: full round-trip serialization of `BacktestReport` with schema versioning
//! - **CSV**: the straddle series with both leg prices, for charting tools
//!
//! Persisted reports carry a `schema_version`; newer versions are rejected on load.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::data::StraddleSeries;
use crate::runner::{BacktestReport, SCHEMA_VERSION};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("unsupported schema version {found} (max supported: {max})")]
    UnsupportedSchema { found: u32, max: u32 },
    #[error("CSV output is not valid UTF-8")]
    Utf8,
}

// ─── JSON ───────────────────────────────────────────────────────────

pub fn export_json(report: &BacktestReport) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Deserialize a report, rejecting schema versions newer than this build.
pub fn import_json(json: &str) -> Result<BacktestReport, ExportError> {
    let report: BacktestReport = serde_json::from_str(json)?;
    if report.schema_version > SCHEMA_VERSION {
        return Err(ExportError::UnsupportedSchema {
            found: report.schema_version,
            max: SCHEMA_VERSION,
        });
    }
    Ok(report)
}

// ─── CSV ────────────────────────────────────────────────────────────

/// Columns: timestamp, put_price, call_price, straddle_price
pub fn export_series_csv(series: &StraddleSeries) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "put_price", "call_price", "straddle_price"])?;
    for o in series.observations() {
        wtr.write_record([
            &o.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            &format!("{:.4}", o.put_price),
            &format!("{:.4}", o.call_price),
            &format!("{:.2}", o.straddle_price),
        ])?;
    }
    let data = wtr
        .into_inner()
        .map_err(|e| ExportError::Csv(e.into_error().into()))?;
    String::from_utf8(data).map_err(|_| ExportError::Utf8)
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write `report.json` and `series.csv` under `output_dir/<selection label>/`.
///
/// Returns the created directory.
pub fn save_artifacts(report: &BacktestReport, output_dir: &Path) -> Result<PathBuf, ExportError> {
    let run_dir = output_dir.join(report.selection.label());
    std::fs::create_dir_all(&run_dir).map_err(|source| io_error(&run_dir, source))?;

    let json_path = run_dir.join("report.json");
    std::fs::write(&json_path, export_json(report)?).map_err(|source| io_error(&json_path, source))?;

    let csv_path = run_dir.join("series.csv");
    std::fs::write(&csv_path, export_series_csv(&report.series)?)
        .map_err(|source| io_error(&csv_path, source))?;

    Ok(run_dir)
}

/// Load a report from an artifact directory.
pub fn load_artifacts(dir: &Path) -> Result<BacktestReport, ExportError> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path).map_err(|source| io_error(&path, source))?;
    import_json(&json)
}

fn io_error(path: &Path, source: std::io::Error) -> ExportError {
    ExportError::Io {
        path: path.display().to_string(),
        source,
    }
}
