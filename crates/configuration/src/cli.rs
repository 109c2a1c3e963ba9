use crate::settings::Settings;
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

/// Download, analyze, and visualize index returns.
///
/// Every flag is optional; unset flags fall back to the configuration file,
/// then to `RETURNS__*` environment variables, then to built-in defaults.
#[derive(Debug, Clone, Default, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Ticker symbol to download (default: ^IXIC, NASDAQ Composite Index).
    #[arg(long)]
    pub ticker: Option<String>,

    /// Inclusive start date in YYYY-MM-DD format (default: 2005-01-01).
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Inclusive end date in YYYY-MM-DD format (default: 2025-10-28).
    #[arg(long)]
    pub end_date: Option<NaiveDate>,

    /// Where to write the SVG chart (default: returns.svg).
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Configuration file to read instead of ./config.toml.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Trading sessions per year used to annualize the total return (default: 252).
    #[arg(long)]
    pub trading_days_per_year: Option<u32>,

    /// Print the summary as JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

impl CliArgs {
    /// Overwrites the configured values with any flags that were given.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(ticker) = &self.ticker {
            settings.analysis.ticker = ticker.clone();
        }
        if let Some(start_date) = self.start_date {
            settings.analysis.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            settings.analysis.end_date = end_date;
        }
        if let Some(output) = &self.output {
            settings.output.chart_path = output.clone();
        }
        if let Some(days) = self.trading_days_per_year {
            settings.analysis.trading_days_per_year = days;
        }
    }
}
