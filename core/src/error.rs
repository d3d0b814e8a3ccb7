//! Error types for the Taiga API client.
//!
//! # Design
//! Status codes are classified once, in [`ApiError::from_status`], and every
//! `parse_*` method goes through it. `NotFound` and `Conflict` get dedicated
//! variants because callers branch on them; the remaining 4xx codes mean the
//! server rejected the payload and land in `Validation`. 5xx, connection
//! failures and any status the client does not expect land in `Transport`.
//! Nothing here retries; errors go straight back to the caller.

use thiserror::Error;

/// Errors returned by `TaigaClient` parse methods and by transports.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network failure, 5xx, or a status outside the mapped set.
    /// `status` is `None` when no response was received at all.
    #[error(
        "transport error{}: {message}",
        .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
    )]
    Transport { status: Option<u16>, message: String },

    /// The server rejected the request payload (400, 422 and other 4xx).
    #[error("validation failed (HTTP {status}): {body}")]
    Validation { status: u16, body: String },

    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned 409, e.g. for a relation that already exists.
    #[error("conflict: {body}")]
    Conflict { body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    /// Map a non-success status code to the matching variant.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            404 => ApiError::NotFound,
            409 => ApiError::Conflict {
                body: body.to_string(),
            },
            400..=499 => ApiError::Validation {
                status,
                body: body.to_string(),
            },
            _ => ApiError::Transport {
                status: Some(status),
                message: body.to_string(),
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound)
    }
}

/// Errors raised while loading `ClientConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}
