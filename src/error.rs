//! Inspector client error types.
//!
//! # Error Classification
//!
//! - **InvalidInput**: the caller handed over something malformed. Always
//!   raised before any network traffic, always fixable by the caller.
//! - **VersionNotSupported**: negotiation found no overlap between what the
//!   caller asked for and what the server advertises.
//! - **Transport**: the round trip failed, either at the connection level or
//!   with a non-2xx status. Carries the status and body when there is one.
//!
//! Nothing in this crate retries or swallows an error.

use http::StatusCode;
use thiserror::Error;

use crate::version::{Version, VersionRange};

/// Inspector client errors.
#[derive(Error, Debug)]
pub enum InspectorError {
    /// Malformed argument or version specifier.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Requested API version is outside the range advertised by the server.
    #[error("Version {requested} is not supported by the server, supported range is {supported}")]
    VersionNotSupported {
        /// Version resolved from the caller's specifier.
        requested: Version,
        /// Range advertised by the server.
        supported: VersionRange,
    },

    /// Connection failure or non-2xx response.
    #[error("Transport error: {message}")]
    Transport {
        /// HTTP status, absent on connection-level failures.
        status: Option<StatusCode>,
        /// Human-readable message, extracted from the error body if possible.
        message: String,
        /// Raw response body, if the server sent one.
        body: Option<String>,
    },

    /// Server reply did not have the expected shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for inspector client operations
pub type Result<T> = std::result::Result<T, InspectorError>;

impl InspectorError {
    /// Shorthand for [`InspectorError::InvalidInput`].
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        InspectorError::InvalidInput(msg.into())
    }

    /// HTTP status carried by a transport error.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            InspectorError::Transport { status, .. } => *status,
            _ => None,
        }
    }

    /// Build a transport error from a failed HTTP response.
    ///
    /// The service reports failures as `{"error": {"message": "..."}}`; older
    /// servers send plain text, which is used as the message unchanged.
    pub fn from_response(status: StatusCode, body: &[u8]) -> Self {
        let text = String::from_utf8_lossy(body).into_owned();
        let message = match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(value) => match value["error"]["message"].as_str() {
                Some(msg) => msg.to_string(),
                None => {
                    tracing::warn!("Bad error response from inspector: {}", text);
                    text.clone()
                },
            },
            Err(_) => {
                tracing::debug!("Plain text error response, assuming legacy server");
                text.clone()
            },
        };

        tracing::debug!("Inspector returned error \"{}\" (HTTP {})", message, status);

        InspectorError::Transport {
            status: Some(status),
            message,
            body: if text.is_empty() { None } else { Some(text) },
        }
    }
}

impl From<reqwest::Error> for InspectorError {
    fn from(err: reqwest::Error) -> Self {
        InspectorError::Transport {
            status: err.status(),
            message: err.to_string(),
            body: None,
        }
    }
}

impl From<toml::de::Error> for InspectorError {
    fn from(err: toml::de::Error) -> Self {
        InspectorError::Config(err.to_string())
    }
}
