use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status
    #[error("{message}")]
    Status { status: u16, message: String },

    /// A 2xx response whose body did not have the expected shape
    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Invalid base URL: {0}")]
    BaseUrl(String),
}

impl ApiError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        ApiError::Status {
            status,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
