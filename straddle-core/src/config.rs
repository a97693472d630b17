//! Strategy parameters and the session window.
//!
//! Parameters are plain serde data loaded from TOML. Every field has a
//! default, so an empty file (or no file) yields the standard strategy:
//!
//! ```toml
//! account_balance = 2100.0
//! take_profit_multiplier = 1.30
//! stop_loss_multiplier = 0.65
//! trailing_giveback_fraction = 0.95
//! session_start = "09:30:00"
//! session_end = "16:00:00"
//! stop_loss_activation_time = "10:00:00"
//! cash_utilization_fraction = 0.80
//! ```

use std::path::Path;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading or validating strategy parameters.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid parameter '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Inclusive time-of-day bounds of the trading session (local exchange time).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl SessionWindow {
    pub fn contains(&self, time: NaiveTime) -> bool {
        self.start <= time && time <= self.end
    }
}

impl Default for SessionWindow {
    fn default() -> Self {
        Self {
            start: default_session_start(),
            end: default_session_end(),
        }
    }
}

/// Entry/exit rules and sizing inputs for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyParameters {
    pub account_balance: f64,
    /// Gain threshold relative to the entry price.
    pub take_profit_multiplier: f64,
    /// Loss floor relative to the entry price.
    pub stop_loss_multiplier: f64,
    /// Fraction of the trailing high retained before the take-profit exit.
    pub trailing_giveback_fraction: f64,
    pub session_start: NaiveTime,
    pub session_end: NaiveTime,
    /// The stop-loss rule is inert before this time.
    pub stop_loss_activation_time: NaiveTime,
    /// Fraction of the account balance deployable into the position.
    pub cash_utilization_fraction: f64,
}

impl Default for StrategyParameters {
    fn default() -> Self {
        Self {
            account_balance: 2100.0,
            take_profit_multiplier: 1.30,
            stop_loss_multiplier: 0.65,
            trailing_giveback_fraction: 0.95,
            session_start: default_session_start(),
            session_end: default_session_end(),
            stop_loss_activation_time: default_stop_loss_activation(),
            cash_utilization_fraction: 0.80,
        }
    }
}

impl StrategyParameters {
    /// Load and validate parameters from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate parameters from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let params: Self = toml::from_str(content)?;
        params.validate()?;
        Ok(params)
    }

    pub fn with_account_balance(mut self, account_balance: f64) -> Self {
        self.account_balance = account_balance;
        self
    }

    pub fn session(&self) -> SessionWindow {
        SessionWindow {
            start: self.session_start,
            end: self.session_end,
        }
    }

    /// Price at or above which the trailing take-profit arms.
    pub fn gain_threshold(&self, initial_price: f64) -> f64 {
        initial_price * self.take_profit_multiplier
    }

    /// Price at or below which the stop-loss fires (once active).
    pub fn stop_loss_floor(&self, initial_price: f64) -> f64 {
        initial_price * self.stop_loss_multiplier
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("account_balance", self.account_balance)?;
        positive("take_profit_multiplier", self.take_profit_multiplier)?;
        positive("stop_loss_multiplier", self.stop_loss_multiplier)?;

        let g = self.trailing_giveback_fraction;
        if !(g.is_finite() && g > 0.0 && g < 1.0) {
            return Err(ConfigError::Invalid {
                field: "trailing_giveback_fraction",
                reason: format!("must be in (0, 1), got {g}"),
            });
        }

        let c = self.cash_utilization_fraction;
        if !(c.is_finite() && c > 0.0 && c <= 1.0) {
            return Err(ConfigError::Invalid {
                field: "cash_utilization_fraction",
                reason: format!("must be in (0, 1], got {c}"),
            });
        }

        if self.session_start >= self.session_end {
            return Err(ConfigError::Invalid {
                field: "session_end",
                reason: format!(
                    "session_end {} must be after session_start {}",
                    self.session_end, self.session_start
                ),
            });
        }

        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be a positive finite number, got {value}"),
        })
    }
}

fn hms(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN)
}

fn default_session_start() -> NaiveTime {
    hms(9, 30)
}

fn default_session_end() -> NaiveTime {
    hms(16, 0)
}

fn default_stop_loss_activation() -> NaiveTime {
    hms(10, 0)
}
