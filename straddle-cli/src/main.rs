//! Straddle CLI: list available selections and run single-session backtests.
//!
//! Commands:
//! - `list` shows session dates, tickers of a date, or strikes of a ticker
//! - `run` backtests one call/put pair on one date and prints the returns

use anyhow::{anyhow, bail, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use straddle_core::data::{fetch_csv, load_csv, DEFAULT_DATASET_URL};
use straddle_core::domain::{OptionSide, StraddleSelection};
use straddle_core::export::{export_json, save_artifacts};
use straddle_core::metrics::NoMetricsReason;
use straddle_core::{
    run_backtest, BacktestReport, Evaluation, ExitReason, MetricsResult, QuoteTable,
    StrategyParameters,
};

#[derive(Parser)]
#[command(
    name = "straddle",
    about = "Backtest an intraday long straddle with a trailing take-profit and a stop-loss"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the quote dataset comes from.
#[derive(Args)]
struct Source {
    /// Local quote CSV.
    #[arg(long, conflicts_with = "url")]
    data: Option<PathBuf>,

    /// Remote quote CSV. Defaults to the public sample dataset.
    #[arg(long)]
    url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List session dates, or the tickers of a date, or the strikes of a ticker.
    List {
        #[command(flatten)]
        source: Source,

        /// Session date (YYYY-MM-DD).
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Underlying ticker (requires --date).
        #[arg(long, requires = "date")]
        ticker: Option<String>,
    },
    /// Backtest one straddle. Unset selection fields default to the first
    /// date, ticker, and strikes in the dataset.
    Run {
        #[command(flatten)]
        source: Source,

        /// Path to a TOML strategy parameter file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Session date (YYYY-MM-DD).
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        ticker: Option<String>,

        #[arg(long)]
        call_strike: Option<f64>,

        #[arg(long)]
        put_strike: Option<f64>,

        /// Account balance, overriding the config file.
        #[arg(long)]
        balance: Option<f64>,

        /// Write report.json and series.csv under this directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print the full report as JSON instead of the summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("straddle=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List {
            source,
            date,
            ticker,
        } => run_list(&load_table(&source)?, date, ticker.as_deref()),
        Commands::Run {
            source,
            config,
            date,
            ticker,
            call_strike,
            put_strike,
            balance,
            output_dir,
            json,
        } => {
            let mut params = match config {
                Some(path) => StrategyParameters::from_file(&path)?,
                None => StrategyParameters::default(),
            };
            if let Some(b) = balance {
                params = params.with_account_balance(b);
            }
            let table = load_table(&source)?;
            let selection = resolve_selection(&table, date, ticker, call_strike, put_strike)?;
            run_backtest_cmd(&table, &selection, &params, output_dir, json)
        }
    }
}

fn load_table(source: &Source) -> Result<QuoteTable> {
    let table = match (&source.data, &source.url) {
        (Some(path), _) => load_csv(path)?,
        (None, Some(url)) => fetch_csv(url)?,
        (None, None) => fetch_csv(DEFAULT_DATASET_URL)?,
    };
    info!(quotes = table.len(), dates = table.dates().len(), "loaded quote dataset");
    Ok(table)
}

fn run_list(table: &QuoteTable, date: Option<NaiveDate>, ticker: Option<&str>) -> Result<()> {
    match (date, ticker) {
        (None, _) => {
            for d in table.dates() {
                println!("{d}");
            }
        }
        (Some(date), None) => {
            let tickers = table.tickers(date);
            if tickers.is_empty() {
                bail!("no quotes on {date}");
            }
            for t in tickers {
                println!("{t}");
            }
        }
        (Some(date), Some(ticker)) => {
            println!("Call strikes: {}", join(&table.strikes(date, ticker, OptionSide::Call)));
            println!("Put strikes:  {}", join(&table.strikes(date, ticker, OptionSide::Put)));
        }
    }
    Ok(())
}

fn join(strikes: &[f64]) -> String {
    strikes
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Fill unset selection fields from the dataset.
fn resolve_selection(
    table: &QuoteTable,
    date: Option<NaiveDate>,
    ticker: Option<String>,
    call_strike: Option<f64>,
    put_strike: Option<f64>,
) -> Result<StraddleSelection> {
    let date = match date {
        Some(d) => d,
        None => table
            .dates()
            .first()
            .copied()
            .ok_or_else(|| anyhow!("dataset has no session dates"))?,
    };
    let ticker = match ticker {
        Some(t) => t,
        None => table
            .default_selection(date)
            .map(|s| s.ticker)
            .ok_or_else(|| anyhow!("first ticker on {date} lacks a call or put quote; pass --ticker"))?,
    };
    let first_strike = |side: OptionSide| {
        table
            .strikes(date, &ticker, side)
            .first()
            .copied()
            .ok_or_else(|| anyhow!("no {side} quotes for {ticker} on {date}"))
    };
    let call_strike = match call_strike {
        Some(k) => k,
        None => first_strike(OptionSide::Call)?,
    };
    let put_strike = match put_strike {
        Some(k) => k,
        None => first_strike(OptionSide::Put)?,
    };

    Ok(StraddleSelection {
        date,
        ticker,
        call_strike,
        put_strike,
    })
}

fn run_backtest_cmd(
    table: &QuoteTable,
    selection: &StraddleSelection,
    params: &StrategyParameters,
    output_dir: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let report = run_backtest(table, selection, params)?;

    if json {
        println!("{}", export_json(&report)?);
    } else {
        print_summary(&report);
    }

    if let Some(dir) = output_dir {
        let run_dir = save_artifacts(&report, &dir)?;
        eprintln!("Artifacts saved to: {}", run_dir.display());
    }

    Ok(())
}

fn print_summary(report: &BacktestReport) {
    for line in summary_lines(report) {
        println!("{line}");
    }
}

/// Text summary of one run: entry, exit, the max-gain and daily-high points,
/// then the returns.
fn summary_lines(report: &BacktestReport) -> Vec<String> {
    let sel = &report.selection;
    let mut out = vec![format!(
        "{} {}  call {}  put {}  (run {})",
        sel.ticker,
        sel.date,
        sel.call_strike,
        sel.put_strike,
        report.fingerprint.run_id.short()
    )];

    let (outcome, metrics) = match &report.evaluation {
        Evaluation::MissingEntryQuote { session_start } => {
            out.push(format!(
                "No straddle quote at {}; the position was not entered.",
                session_start.time()
            ));
            out.push(format!(
                "Daily High: {:.2} at {}",
                report.daily_high_price,
                report.daily_high_time.time()
            ));
            return out;
        }
        Evaluation::Simulated { outcome, metrics } => (outcome, metrics),
    };

    out.push(format!(
        "Entry: {:.2} at {}",
        outcome.initial_price,
        outcome.entry_time.time()
    ));
    if let Some(exit) = outcome.exit() {
        let rule = match exit.reason {
            ExitReason::TakeProfit => "trailing take-profit",
            ExitReason::StopLoss => "stop-loss",
            ExitReason::None => "none",
        };
        out.push(format!(
            "Exit: {:.2} at {} ({rule})",
            exit.price,
            exit.time.time()
        ));
    }
    out.push(format!(
        "Max Gain Price: {:.2} at {}",
        outcome.max_gain_price,
        outcome.max_gain_time.time()
    ));
    out.push(format!(
        "Daily High: {:.2} at {}",
        outcome.daily_high_price,
        outcome.daily_high_time.time()
    ));

    match metrics {
        MetricsResult::Computed(m) => {
            out.push(format!("Net Return: ${:.2}", m.net_return));
            out.push(format!("Percentage Gain/Loss: {:.2}%", m.percent_return));
            out.push(format!("Number of Contracts: {}", m.contracts));
            out.push(format!("Max Gain: ${:.2}", m.max_gain_return));
            out.push(format!("Max Gain Percentage: {:.2}%", m.max_gain_percent));
            out.push(format!("Daily High Gain: ${:.2}", m.daily_high_return));
            out.push(format!("Daily High Percentage: {:.2}%", m.daily_high_percent));
        }
        MetricsResult::NotComputed(NoMetricsReason::NoExit) => {
            out.push(
                "Neither stop-loss nor take-profit conditions were met during the trading day."
                    .to_string(),
            );
        }
        MetricsResult::NotComputed(NoMetricsReason::NonPositiveEntryPrice) => {
            out.push("Entry price is not positive; returns are undefined.".to_string());
        }
    }
    out
}
