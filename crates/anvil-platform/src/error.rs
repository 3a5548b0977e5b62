use thiserror::Error;

pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Represents an error that can occur while acquiring platform credentials.
#[derive(Error, Debug)]
pub enum AuthError {
    /// A required credential is not configured.
    #[error("missing credential: {0}")]
    MissingCredential(String),

    /// The token request could not be sent.
    #[error("token request error: {0}")]
    Request(String),

    /// The token endpoint rejected the request.
    #[error("token endpoint error ({status}): {body}")]
    Endpoint { status: u16, body: String },

    /// The token response could not be parsed.
    #[error("token response error: {0}")]
    Response(String),
}
