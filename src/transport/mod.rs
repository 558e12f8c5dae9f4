//! Transport layer abstraction for the inspector client.
//!
//! The client core never touches sockets. Every round trip goes through a
//! [`Transport`], which turns an [`HttpRequest`] into an [`HttpResponse`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        Client (versioned requests)      │
//! └──────────────────┬──────────────────────┘
//!                    │ HttpRequest
//!                    ▼
//!          ┌─────────────────────┐
//!          │   dyn Transport     │
//!          └─────────┬───────────┘
//!                    ▼
//!          ┌─────────────────────┐
//!          │   HttpTransport     │
//!          │ (reqwest, blocking) │
//!          └─────────────────────┘
//! ```
//!
//! Transports hand back every response regardless of status. Deciding what
//! counts as a failure is up to the caller: the version probe accepts a 404,
//! endpoint calls do not.

mod blocking;
#[cfg(test)]
pub(crate) mod mock;

pub use blocking::{HttpTransport, DEFAULT_TIMEOUT_SECS};

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{InspectorError, Result};

/// Outbound request handed to a [`Transport`].
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP verb.
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    /// Request headers.
    pub headers: HeaderMap,
    /// Query parameters. Keys with a `None` value are kept for inspection
    /// but not put on the wire.
    pub query: Vec<(String, Option<String>)>,
    /// Optional JSON body.
    pub json: Option<Value>,
}

impl HttpRequest {
    /// Create a request with no headers, query or body.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            query: Vec::new(),
            json: None,
        }
    }

    /// Add a header. Names are case-insensitive.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            InspectorError::invalid_input(format!("Invalid header name {name:?}: {e}"))
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| {
            InspectorError::invalid_input(format!("Invalid value for header {name}: {e}"))
        })?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Replace the query parameters.
    pub fn with_query(mut self, query: Vec<(String, Option<String>)>) -> Self {
        self.query = query;
        self
    }

    /// Attach a JSON body.
    pub fn with_json(mut self, body: Value) -> Self {
        self.json = Some(body);
        self
    }

    /// Header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Value of a query parameter. The outer `Option` is the key's presence.
    pub fn query_param(&self, name: &str) -> Option<Option<&str>> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_deref())
    }
}

/// Response returned by a [`Transport`].
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Raw body bytes.
    pub body: Bytes,
}

impl HttpResponse {
    /// Create a response with no headers.
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Body as (lossy) UTF-8 text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Turn a non-2xx response into a [`InspectorError::Transport`].
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(InspectorError::from_response(self.status, &self.body))
        }
    }
}

/// Transport trait for pluggable HTTP backends.
///
/// Implementations perform exactly one round trip per call and never retry.
pub trait Transport: Send + Sync {
    /// Perform the request and return the response, whatever its status.
    ///
    /// Connection-level failures are reported as
    /// [`InspectorError::Transport`] with no status.
    fn send(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// Get the transport name for logging.
    fn name(&self) -> &'static str;
}
