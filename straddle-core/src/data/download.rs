//! Remote quote dataset fetch over HTTP.

use std::time::Duration;

use tracing::info;

use super::csv_import::read_quotes;
use super::provider::DataError;
use super::table::QuoteTable;

/// Public intraday options sample dataset.
pub const DEFAULT_DATASET_URL: &str =
    "https://raw.githubusercontent.com/GetHorizontal/optionsdatacsv/main/Options%20Data.csv";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Download a quote CSV and import it.
pub fn fetch_csv(url: &str) -> Result<QuoteTable, DataError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

    info!(url, "fetching quote dataset");
    let resp = client
        .get(url)
        .send()
        .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(DataError::Http {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    let body = resp
        .bytes()
        .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;
    read_quotes(body.as_ref())
}
