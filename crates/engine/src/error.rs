use analytics::AnalyticsError;
use api_client::ApiError;
use chrono::NaiveDate;
use core_types::{CoreError, DateRange};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid date range: end date {end} precedes start date {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error(
        "No price data was retrieved for '{ticker}' from {range}. Check the ticker symbol and date range."
    )]
    NoData { ticker: String, range: DateRange },

    #[error("Market data provider failed: {0}")]
    Upstream(#[from] ApiError),

    #[error(
        "Insufficient data for '{ticker}' from {range}: need at least 2 prices, got {points}"
    )]
    InsufficientData {
        ticker: String,
        range: DateRange,
        points: usize,
    },

    #[error("Invalid request: {0}")]
    Core(#[from] CoreError),

    #[error("Analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
}
