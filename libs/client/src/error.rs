use thiserror::Error;

/// Errors surfaced by the client core
#[derive(Error, Debug)]
pub enum ClientError {
    /// The server rejected the session (or the password); the stored
    /// token must be discarded
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The server answered with a non-2xx status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Input rejected before any request was issued
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Local storage error: {0}")]
    Storage(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized(_))
    }

    /// Text suitable for an on-screen notification
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Unauthorized(message)
            | ClientError::Validation(message)
            | ClientError::Api { message, .. } => message.clone(),
            ClientError::Request(_) => "Network error, please try again".to_string(),
            ClientError::Storage(_) | ClientError::Json(_) => "Something went wrong".to_string(),
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Storage(err.to_string())
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
