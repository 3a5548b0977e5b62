use thiserror::Error;

pub type ComputeResult<T> = std::result::Result<T, ComputeError>;

/// Represents an error that can occur when calling the management API.
#[derive(Error, Debug)]
pub enum ComputeError {
    /// The request could not be sent.
    #[error("request error: {0}")]
    Request(String),

    /// The management API returned a non-success status.
    #[error("management API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The response body could not be parsed.
    #[error("serialization error: {0}")]
    Serialization(String),
}
