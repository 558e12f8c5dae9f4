//! Recording transport for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use http::header::HeaderValue;
use http::StatusCode;
use serde_json::Value;

use super::{HttpRequest, HttpResponse, Transport};
use crate::error::Result;
use crate::version::{MAX_VERSION_HEADER, MIN_VERSION_HEADER};

/// Replays queued responses and records every request it sees.
///
/// An empty queue answers `200 OK` with an empty body.
#[derive(Default)]
pub(crate) struct MockTransport {
    responses: Mutex<VecDeque<Result<HttpResponse>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Transport whose first answer is a probe response advertising `min..=max`.
    pub(crate) fn with_versions(min: &str, max: &str) -> Arc<Self> {
        let transport = Self::new();
        transport.push_versions(min, max);
        transport
    }

    pub(crate) fn push(&self, response: Result<HttpResponse>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub(crate) fn push_versions(&self, min: &str, max: &str) {
        let mut response = HttpResponse::new(StatusCode::OK, "");
        response
            .headers
            .insert(MIN_VERSION_HEADER, HeaderValue::from_str(min).unwrap());
        response
            .headers
            .insert(MAX_VERSION_HEADER, HeaderValue::from_str(max).unwrap());
        self.push(Ok(response));
    }

    pub(crate) fn push_json(&self, status: StatusCode, body: &Value) {
        self.push(Ok(HttpResponse::new(status, body.to_string())));
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn last_request(&self) -> HttpRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was sent")
    }
}

impl Transport for MockTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(HttpResponse::new(StatusCode::OK, "")))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
