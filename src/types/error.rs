//! Error types for the laptop catalog
//!
//! Every variant maps onto exactly one RPC status code, so handlers can
//! bubble errors with `?` and convert at the edge.

use tonic::{Code, Status};

/// Main error type for catalog operations
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("record already exists: {0}")]
    AlreadyExists(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    PermissionDenied(String),

    #[error("request is canceled")]
    Canceled,

    #[error("deadline is exceeded")]
    DeadlineExceeded,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Unknown(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),
}

impl CatalogError {
    /// RPC status code for this error
    pub fn code(&self) -> Code {
        match self {
            Self::InvalidArgument(_) => Code::InvalidArgument,
            Self::AlreadyExists(_) => Code::AlreadyExists,
            Self::NotFound(_) => Code::NotFound,
            Self::Unauthenticated(_) => Code::Unauthenticated,
            Self::PermissionDenied(_) => Code::PermissionDenied,
            Self::Canceled => Code::Cancelled,
            Self::DeadlineExceeded => Code::DeadlineExceeded,
            Self::Storage(_) => Code::Internal,
            Self::Internal(_) => Code::Internal,
            Self::Unknown(_) => Code::Unknown,
            Self::Config(_) => Code::Internal,
            Self::Auth(_) => Code::Internal,
        }
    }

    /// Rebuild an error from a status received over a call boundary
    pub fn from_status(status: &Status) -> Self {
        let message = status.message().to_string();
        match status.code() {
            Code::InvalidArgument => Self::InvalidArgument(message),
            Code::AlreadyExists => Self::AlreadyExists(message),
            Code::NotFound => Self::NotFound(message),
            Code::Unauthenticated => Self::Unauthenticated(message),
            Code::PermissionDenied => Self::PermissionDenied(message),
            Code::Cancelled => Self::Canceled,
            Code::DeadlineExceeded => Self::DeadlineExceeded,
            Code::Internal => Self::Internal(message),
            _ => Self::Unknown(message),
        }
    }
}

impl From<CatalogError> for Status {
    fn from(err: CatalogError) -> Self {
        Status::new(err.code(), err.to_string())
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON error: {}", err))
    }
}

impl From<jsonwebtoken::errors::Error> for CatalogError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Unauthenticated(format!("access token is invalid: {}", err))
    }
}

impl From<uuid::Error> for CatalogError {
    fn from(err: uuid::Error) -> Self {
        Self::InvalidArgument(format!("laptop ID is not a valid UUID: {}", err))
    }
}

/// Result type alias for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;
