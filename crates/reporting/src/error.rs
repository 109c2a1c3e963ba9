use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Nothing to plot: {0}")]
    EmptySeries(String),

    #[error("Failed to write the chart: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize the summary: {0}")]
    Serialization(#[from] serde_json::Error),
}
