//! Error handling for the QHSE client

use std::fmt;
use thiserror::Error;

use qhse_storage::StorageError;

/// Result type used across the client
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the QHSE client
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Durable storage failures
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The backend answered 401, or no token was stored; the session was purged
    #[error("Unauthorized: session has ended")]
    Unauthorized,

    /// Login was rejected
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Any other non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// A form was submitted with missing fields
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// The requesting view went away before the response arrived
    #[error("Request result discarded: view was unmounted")]
    Cancelled,

    /// General errors
    #[error("{0}")]
    General(String),
}

impl Error {
    pub fn api<T: fmt::Display>(status: u16, msg: T) -> Self {
        Error::Api {
            status,
            message: msg.to_string(),
        }
    }

    pub fn validation<T: fmt::Display>(msg: T) -> Self {
        Error::Validation(msg.to_string())
    }

    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    pub fn general<T: fmt::Display>(msg: T) -> Self {
        Error::General(msg.to_string())
    }

    /// True when the failure ended the session
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Unauthorized)
    }

    /// HTTP status, when the backend produced one
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::Unauthorized => Some(401),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
