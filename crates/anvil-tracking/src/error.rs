use thiserror::Error;

pub type TrackingResult<T> = std::result::Result<T, TrackingError>;

/// Represents an error that can occur when calling the tracking service.
#[derive(Error, Debug)]
pub enum TrackingError {
    /// The request could not be sent.
    #[error("request error: {0}")]
    Request(String),

    /// The service returned a non-success status.
    #[error("tracking API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The response body could not be parsed.
    #[error("serialization error: {0}")]
    Serialization(String),
}
