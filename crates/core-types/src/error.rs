use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),

    #[error("Invalid date range: end date {end} precedes start date {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}
