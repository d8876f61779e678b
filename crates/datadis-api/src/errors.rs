use datadis_core::ValidationError;
use thiserror::Error;

/// API-specific errors for datadis-api
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("Connection failed after {attempts} attempts: {source}")]
    Transport {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Non-success HTTP outcomes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    #[error("Unauthorized (401): invalid credentials or expired token")]
    Unauthorized,

    #[error("Rate limited (429) after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("HTTP error {status}: {message}")]
    Status { status: u16, message: String },
}

/// Coarse classification callers can match on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Authentication,
    Api,
    Transport,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Validation(_) => ErrorKind::Validation,
            ApiError::Authentication(_) | ApiError::Http(HttpError::Unauthorized) => {
                ErrorKind::Authentication
            }
            ApiError::Http(_) | ApiError::InvalidResponse(_) | ApiError::Config(_) => {
                ErrorKind::Api
            }
            ApiError::Transport { .. } => ErrorKind::Transport,
        }
    }

    /// Whether repeating the whole operation later may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::Transport { .. }
                | ApiError::Http(HttpError::RateLimited { .. })
                | ApiError::Http(HttpError::Unauthorized)
        )
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Http(HttpError::Unauthorized))
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http(HttpError::Unauthorized) => Some(401),
            ApiError::Http(HttpError::RateLimited { .. }) => Some(429),
            ApiError::Http(HttpError::Status { status, .. }) => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
