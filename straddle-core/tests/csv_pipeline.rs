//! CSV file → quote table → selection → backtest → artifacts.

use std::io::Write;
use std::path::PathBuf;

use chrono::NaiveDate;
use straddle_core::data::{load_csv, DataError};
use straddle_core::domain::OptionSide;
use straddle_core::export::{load_artifacts, save_artifacts};
use straddle_core::{run_backtest, Evaluation, ExitReason, StrategyParameters};

// ──────────────────────────────────────────────
// Fixtures
// ──────────────────────────────────────────────

const QUOTES: &str = "\
date,Ticker,Side,Strike,close
3/7/2024 9:30,QQQ,C,440,3.00
3/7/2024 9:30,QQQ,P,435,3.00
3/8/2024 9:30,SPY,C,515,2.50
3/8/2024 9:30,SPY,P,510,2.50
3/8/2024 9:30,SPY,C,520,1.10
3/8/2024 9:45,SPY,C,515,2.80
3/8/2024 9:45,SPY,P,510,2.80
3/8/2024 10:15,SPY,C,515,3.40
3/8/2024 10:15,SPY,P,510,3.40
3/8/2024 10:45,SPY,C,515,3.20
3/8/2024 10:45,SPY,P,510,3.20
3/8/2024 11:00,SPY,C,515,3.50
3/8/2024 11:00,SPY,P,510,3.50
3/8/2024 16:30,SPY,C,515,9.00
3/8/2024 16:30,SPY,P,510,9.00
";

fn write_csv(dir: &tempfile::TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("quotes.csv");
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(content.as_bytes()).unwrap();
    path
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 8).unwrap()
}

// ──────────────────────────────────────────────
// Selection discovery
// ──────────────────────────────────────────────

#[test]
fn table_lists_dates_tickers_and_strikes() {
    let dir = tempfile::tempdir().unwrap();
    let table = load_csv(&write_csv(&dir, QUOTES)).unwrap();

    assert_eq!(
        table.dates(),
        vec![NaiveDate::from_ymd_opt(2024, 3, 7).unwrap(), day()]
    );
    assert_eq!(table.tickers(day()), vec!["SPY".to_string()]);
    assert_eq!(
        table.strikes(day(), "SPY", OptionSide::Call),
        vec![515.0, 520.0]
    );
    assert_eq!(table.strikes(day(), "SPY", OptionSide::Put), vec![510.0]);

    let sel = table.default_selection(day()).unwrap();
    assert_eq!(sel.ticker, "SPY");
    assert_eq!(sel.call_strike, 515.0);
    assert_eq!(sel.put_strike, 510.0);
}

// ──────────────────────────────────────────────
// Full run
// ──────────────────────────────────────────────

#[test]
fn csv_run_exits_on_trailing_take_profit() {
    let dir = tempfile::tempdir().unwrap();
    let table = load_csv(&write_csv(&dir, QUOTES)).unwrap();
    let sel = table.default_selection(day()).unwrap();
    let report = run_backtest(&table, &sel, &StrategyParameters::default()).unwrap();

    // The 16:30 row is outside the session window.
    assert_eq!(report.series.len(), 5);
    assert!((report.daily_high_price - 700.0).abs() < 1e-6);

    let outcome = report.outcome().unwrap();
    assert_eq!(outcome.exit_reason(), ExitReason::TakeProfit);
    assert!((outcome.exit_price().unwrap() - 640.0).abs() < 1e-6);
    assert_eq!(
        outcome.exit_time(),
        Some(day().and_hms_opt(10, 45, 0).unwrap())
    );

    let m = report.metrics().unwrap().computed().unwrap();
    assert_eq!(m.contracts, 3);
    assert!((m.net_return - 420.0).abs() < 1e-6);
    assert!((m.percent_return - 28.0).abs() < 1e-6);
    assert!((m.max_gain_return - 540.0).abs() < 1e-6);
    assert!((m.daily_high_return - 600.0).abs() < 1e-6);
}

#[test]
fn csv_run_without_entry_quote_is_informational() {
    let csv = "\
date,Ticker,Side,Strike,close
3/8/2024 9:31,SPY,C,515,2.50
3/8/2024 9:31,SPY,P,510,2.50
3/8/2024 10:05,SPY,C,515,1.00
3/8/2024 10:05,SPY,P,510,1.00
";
    let dir = tempfile::tempdir().unwrap();
    let table = load_csv(&write_csv(&dir, csv)).unwrap();
    let sel = table.default_selection(day()).unwrap();
    let report = run_backtest(&table, &sel, &StrategyParameters::default()).unwrap();

    assert!(matches!(
        report.evaluation,
        Evaluation::MissingEntryQuote { .. }
    ));
}

#[test]
fn artifacts_roundtrip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let table = load_csv(&write_csv(&dir, QUOTES)).unwrap();
    let sel = table.default_selection(day()).unwrap();
    let report = run_backtest(&table, &sel, &StrategyParameters::default()).unwrap();

    let out = tempfile::tempdir().unwrap();
    let run_dir = save_artifacts(&report, out.path()).unwrap();
    let series_csv = std::fs::read_to_string(run_dir.join("series.csv")).unwrap();
    assert_eq!(series_csv.lines().count(), 6);
    assert_eq!(load_artifacts(&run_dir).unwrap(), report);
}

// ──────────────────────────────────────────────
// Import failures
// ──────────────────────────────────────────────

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        load_csv(&dir.path().join("absent.csv")),
        Err(DataError::Io(_))
    ));
}

#[test]
fn unparseable_date_reports_line() {
    let csv = "date,Ticker,Side,Strike,close\n3/8/2024 9:30,SPY,C,515,2.5\nnot a date,SPY,P,510,2.5\n";
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        load_csv(&write_csv(&dir, csv)),
        Err(DataError::Parse { line: 3, .. })
    ));
}
