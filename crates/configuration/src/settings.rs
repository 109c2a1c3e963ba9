use crate::error::ConfigError;
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// The root configuration structure for the entire application.
///
/// Every section has defaults, so an empty or missing `config.toml` yields
/// the NASDAQ Composite from 2005-01-01 to 2025-10-28.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub analysis: Analysis,
    pub provider: Provider,
    pub output: Output,
    pub logging: Logging,
}

/// What to analyze.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Analysis {
    /// The ticker symbol to download (e.g., "^IXIC").
    pub ticker: String,
    /// Inclusive start of the analysis window.
    pub start_date: NaiveDate,
    /// Inclusive end of the analysis window.
    pub end_date: NaiveDate,
    /// Divisor used to annualize the total return.
    pub trading_days_per_year: u32,
}

/// Where the price history comes from.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Provider {
    pub base_url: String,
    /// The chart endpoint rejects requests without a browser-like agent.
    pub user_agent: String,
    /// No timeout when unset.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Option<Duration>,
}

/// Where and how the chart is written.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Output {
    pub chart_path: PathBuf,
    pub chart_width: u32,
    pub chart_height: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Logging {
    /// Filter directive used when `RUST_LOG` is not set.
    pub level: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<PathBuf>,
}

impl Default for Analysis {
    fn default() -> Self {
        Self {
            ticker: "^IXIC".to_string(),
            start_date: NaiveDate::from_ymd_opt(2005, 1, 1).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2025, 10, 28).unwrap_or_default(),
            trading_days_per_year: 252,
        }
    }
}

impl Default for Provider {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com".to_string(),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/124.0 Safari/537.36"
                .to_string(),
            request_timeout: None,
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self {
            chart_path: PathBuf::from("returns.svg"),
            chart_width: 1200,
            chart_height: 800,
        }
    }
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

impl Settings {
    /// Checks the constraints that deserialization alone cannot express.
    ///
    /// Date ordering is not checked here; the calculator reports an inverted
    /// range as an invalid range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.analysis.ticker.trim().is_empty() {
            return Err(ConfigError::Validation(
                "analysis.ticker must not be empty".to_string(),
            ));
        }
        if self.analysis.trading_days_per_year == 0 {
            return Err(ConfigError::Validation(
                "analysis.trading_days_per_year must be positive".to_string(),
            ));
        }
        if self.output.chart_width == 0 || self.output.chart_height == 0 {
            return Err(ConfigError::Validation(format!(
                "output chart dimensions must be positive, got {}x{}",
                self.output.chart_width, self.output.chart_height
            )));
        }
        if self.provider.base_url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "provider.base_url must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
