//! Blocking HTTP transport backed by reqwest.

use std::time::Duration;

use reqwest::blocking::Client;

use super::{HttpRequest, HttpResponse, Transport};
use crate::error::{InspectorError, Result};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// HTTP transport using reqwest's blocking client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport with the given per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InspectorError::Transport {
                status: None,
                message: format!("Failed to create HTTP client: {e}"),
                body: None,
            })?;

        Ok(Self { client, timeout })
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let query: Vec<(&str, &str)> = request
            .query
            .iter()
            .filter_map(|(k, v)| v.as_deref().map(|v| (k.as_str(), v)))
            .collect();

        let mut builder = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers);
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if let Some(body) = &request.json {
            builder = builder.json(body);
        }

        let response = builder.send()?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes()?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    fn name(&self) -> &'static str {
        "reqwest/blocking"
    }
}
