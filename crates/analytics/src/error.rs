use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Not enough data to compute returns: need at least 2 prices, got {0}")]
    InsufficientData(usize),

    #[error("Calculation error: Division by zero encountered in metric '{0}'")]
    DivisionByZero(String),

    #[error("Error in calculation: {0}")]
    Calculation(String),
}
