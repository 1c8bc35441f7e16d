use reqwest::StatusCode;
use thiserror::Error;

/// Classified failure of a request issued through [`super::ApiClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered 401; the stored token has already been cleared.
    #[error("unauthorized: {body}")]
    Unauthorized { body: String },
    #[error("request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },
    /// No response was received.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Transport(err) => err.status(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized { .. })
    }

    pub fn body(&self) -> Option<&str> {
        match self {
            ClientError::Unauthorized { body } | ClientError::Status { body, .. } => Some(body),
            ClientError::Transport(_) => None,
        }
    }
}
