use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("The data provider returned an error: {code}: {description}")]
    Provider { code: String, description: String },

    #[error("Unexpected HTTP status {status} from the data provider: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),

    #[error("Invalid data format from API: {0}")]
    InvalidData(String),
}
