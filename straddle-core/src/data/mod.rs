//! Quote data sources and straddle series construction

pub mod csv_import;
pub mod download;
pub mod provider;
pub mod series;
pub mod table;

pub use csv_import::{load_csv, read_quotes};
pub use download::{fetch_csv, DEFAULT_DATASET_URL};
pub use provider::{DataError, QuoteProvider, QuoteQuery};
pub use series::{build_straddle_series, SeriesError, StraddleSeries};
pub use table::QuoteTable;
