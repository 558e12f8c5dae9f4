//! Versioned inspector client.
//!
//! A [`Client`] is created once per server. Construction negotiates the API
//! version (see [`crate::version`]) and the result is pinned for the life of
//! the client: every call made through [`Client::request`] carries it.
//!
//! Typed operations check their arguments before anything is sent, so an
//! invalid node id or rule never produces network traffic.
//!
//! ```rust,ignore
//! use inspector_client::{Client, VersionSpec};
//!
//! let client = Client::builder()
//!     .with_url("http://10.0.0.2:5050")
//!     .with_api_version(VersionSpec::Major(1))
//!     .with_auth_token("gAAAA...")
//!     .build()?;
//!
//! client.introspect("3d5f1c1e-5b59-4b5a-8a0e-6c9e3c0f6f21", None, None)?;
//! let status = client.get_status("3d5f1c1e-5b59-4b5a-8a0e-6c9e3c0f6f21")?;
//! println!("finished: {}", status["finished"]);
//! ```

mod rules;

pub use rules::{rule_documents, RulesApi};

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::Method;
use serde_json::{Map, Value};

use crate::config::ClientConfig;
use crate::error::{InspectorError, Result};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, Transport, DEFAULT_TIMEOUT_SECS};
use crate::version::{Negotiator, Version, VersionSpec, MICROVERSION_HEADER, SERVICE_TYPE, VERSION_HEADER};

/// URL used when none is configured.
pub const DEFAULT_INSPECTOR_URL: &str = "http://127.0.0.1:5050";

/// Header carrying the authentication token.
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Introspection status of a node, as returned by the server.
pub type IntrospectionStatus = Map<String, Value>;

/// Data collected by the last introspection of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum IntrospectionData {
    /// Decoded JSON document.
    Json(Value),
    /// Response body exactly as received.
    Raw(Bytes),
}

impl IntrospectionData {
    /// Decoded document, if this is the JSON form.
    pub fn into_json(self) -> Option<Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Raw(_) => None,
        }
    }

    /// Raw bytes, if this is the raw form.
    pub fn into_raw(self) -> Option<Bytes> {
        match self {
            Self::Raw(bytes) => Some(bytes),
            Self::Json(_) => None,
        }
    }
}

/// Builder for [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    url: Option<String>,
    api_version: VersionSpec,
    auth_token: Option<String>,
    timeout: Option<Duration>,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    /// Builder with defaults: local URL, latest version, no token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder seeded from a loaded configuration.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            url: Some(config.inspector_url.clone()),
            api_version: config.version_spec(),
            auth_token: config.auth_token.clone(),
            timeout: Some(Duration::from_secs(config.timeout_secs)),
            transport: None,
        }
    }

    /// Inspector URL in form `http://host:port[/vN]`.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Requested API version.
    pub fn with_api_version(mut self, spec: impl Into<VersionSpec>) -> Self {
        self.api_version = spec.into();
        self
    }

    /// Authentication token sent with every endpoint call.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Per-request timeout for the default transport.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use a custom transport instead of the reqwest one.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Negotiate the API version and create the client.
    pub fn build(self) -> Result<Client> {
        // Fail on a malformed specifier before building anything.
        self.api_version.requested()?;

        let url = self
            .url
            .as_deref()
            .unwrap_or(DEFAULT_INSPECTOR_URL)
            .trim_end_matches('/')
            .to_string();

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(
                self.timeout
                    .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            )?),
        };

        let version = Negotiator::new(&*transport, &url).negotiate(&self.api_version)?;

        let postfix = format!("/v{}", version.major());
        let base_url = if url.ends_with(&postfix) {
            url
        } else {
            format!("{url}{postfix}")
        };

        tracing::debug!(
            "Using inspector at {} with API version {} via {}",
            base_url,
            version,
            transport.name()
        );

        Ok(Client {
            transport,
            base_url,
            version,
            auth_token: self.auth_token.filter(|t| !t.is_empty()),
        })
    }
}

/// Client for the introspection API with a pinned version.
pub struct Client {
    transport: Arc<dyn Transport>,
    base_url: String,
    version: Version,
    auth_token: Option<String>,
}

impl Client {
    /// Start building a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a client from configuration using the reqwest transport.
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        ClientBuilder::from_config(config).build()
    }

    /// Pinned API version.
    pub fn api_version(&self) -> Version {
        self.version
    }

    /// Versioned base URL, e.g. `http://host:5050/v1`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make a request against the versioned base URL.
    ///
    /// Query parameters with a `None` value are not sent. Any non-2xx status
    /// is returned as [`InspectorError::Transport`].
    pub fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, Option<&str>)],
        body: Option<Value>,
    ) -> Result<HttpResponse> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let version = self.version.to_string();

        let mut request = HttpRequest::new(method.clone(), url.clone())
            .with_header(VERSION_HEADER, &version)?
            .with_header(MICROVERSION_HEADER, &format!("{SERVICE_TYPE} {version}"))?
            .with_query(
                query
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), v.map(str::to_string)))
                    .collect(),
            );
        if let Some(token) = &self.auth_token {
            request = request.with_header(AUTH_TOKEN_HEADER, token)?;
        }
        if let Some(body) = body {
            request = request.with_json(body);
        }

        tracing::debug!("Requesting {} {} (API version {})", method, url, version);
        let response = self.transport.send(request)?;
        tracing::debug!(
            "Got response for {} {} with status code {}",
            method,
            url,
            response.status.as_u16()
        );

        response.error_for_status()
    }

    /// Start introspection for a node.
    ///
    /// When `new_ipmi_username` is given the server also resets the IPMI
    /// credentials, which requires `new_ipmi_password` too.
    pub fn introspect(
        &self,
        node_id: &str,
        new_ipmi_username: Option<&str>,
        new_ipmi_password: Option<&str>,
    ) -> Result<()> {
        let node_id = check_id("node", node_id)?;
        let new_ipmi_username = new_ipmi_username.filter(|s| !s.is_empty());
        let new_ipmi_password = new_ipmi_password.filter(|s| !s.is_empty());
        if new_ipmi_username.is_some() && new_ipmi_password.is_none() {
            return Err(InspectorError::invalid_input(
                "Setting IPMI user name requires a new password",
            ));
        }

        self.request(
            Method::POST,
            &format!("introspection/{node_id}"),
            &[
                ("new_ipmi_username", new_ipmi_username),
                ("new_ipmi_password", new_ipmi_password),
            ],
            None,
        )?;
        Ok(())
    }

    /// Get introspection status for a node.
    pub fn get_status(&self, node_id: &str) -> Result<IntrospectionStatus> {
        let node_id = check_id("node", node_id)?;
        self.request(Method::GET, &format!("introspection/{node_id}"), &[], None)?
            .json()
    }

    /// Get data from the last introspection of a node.
    ///
    /// With `raw` set the body is returned byte for byte, otherwise decoded.
    pub fn get_data(&self, node_id: &str, raw: bool) -> Result<IntrospectionData> {
        let node_id = check_id("node", node_id)?;
        let response =
            self.request(Method::GET, &format!("introspection/{node_id}/data"), &[], None)?;
        if raw {
            Ok(IntrospectionData::Raw(response.body))
        } else {
            Ok(IntrospectionData::Json(response.json()?))
        }
    }

    /// Introspection rules API.
    pub fn rules(&self) -> RulesApi<'_> {
        RulesApi::new(self)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("version", &self.version)
            .field("transport", &self.transport.name())
            .field("authenticated", &self.auth_token.is_some())
            .finish()
    }
}

/// Reject identifiers that cannot be used as a single path segment.
pub(crate) fn check_id<'a>(kind: &str, id: &'a str) -> Result<&'a str> {
    if id.is_empty() {
        return Err(InspectorError::invalid_input(format!(
            "Expected a non-empty {kind} identifier"
        )));
    }
    if id == "."
        || id == ".."
        || id.contains(['/', '?', '#'])
        || id.chars().any(char::is_whitespace)
    {
        return Err(InspectorError::invalid_input(format!(
            "Expected a {kind} identifier, got {id:?}"
        )));
    }
    Ok(id)
}
