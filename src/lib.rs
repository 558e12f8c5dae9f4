//! # Inspector Client - Bare-Metal Hardware Introspection
//!
//! Client library for the hardware introspection service: start introspection
//! on bare-metal nodes, poll its status, fetch the collected hardware data and
//! manage introspection rules.
//!
//! ## Features
//!
//! - **Version negotiation**: probe the server's supported API range and pin
//!   one version for the whole session
//! - **Typed operations**: `introspect`, `get_status`, `get_data`, rules CRUD
//! - **Fail-fast validation**: bad arguments never reach the network
//! - **Pluggable transport**: blocking reqwest by default, any [`Transport`]
//!   for tests or custom stacks
//!
//! ## Protocol Overview
//!
//! ```text
//! Client                                   Inspector
//!    |                                        |
//!    |-------- GET / ----------------------->|  Probe
//!    |<------- Minimum/Maximum-Version ------|
//!    |                                        |
//!    |   pin version (e.g. 1.5)               |
//!    |                                        |
//!    |-------- POST /v1/introspection/{id} ->|  API-Version: 1.5
//!    |-------- GET  /v1/introspection/{id} ->|  API-Version: 1.5
//!    |-------- GET  /v1/rules -------------->|  API-Version: 1.5
//! ```
//!
//! ### Endpoints
//!
//! | Operation              | Request                              |
//! |------------------------|--------------------------------------|
//! | `introspect`           | `POST /introspection/{node}`         |
//! | `get_status`           | `GET /introspection/{node}`          |
//! | `get_data`             | `GET /introspection/{node}/data`     |
//! | `rules().create`       | `POST /rules`                        |
//! | `rules().from_json`    | `POST /rules`                        |
//! | `rules().get_all`      | `GET /rules`                         |
//! | `rules().get`          | `GET /rules/{uuid}`                  |
//! | `rules().delete`       | `DELETE /rules/{uuid}`               |
//! | `rules().delete_all`   | `DELETE /rules`                      |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use inspector_client::{Client, ClientConfig};
//!
//! let config = ClientConfig::from_env();
//! let client = Client::connect(&config)?;
//! println!("Pinned API version {}", client.api_version());
//!
//! for rule in client.rules().get_all()? {
//!     println!("{} {}", rule["uuid"], rule["description"]);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`version`]: Version types, specifiers and negotiation
//! - [`client`]: Versioned client and typed operations
//! - [`transport`]: HTTP transport abstraction
//! - [`config`]: Configuration management
//! - [`error`]: Error types and result aliases

pub mod client;
pub mod config;
pub mod error;
pub mod transport;
pub mod version;

// Re-exports for convenience
pub use client::{
    Client, ClientBuilder, IntrospectionData, IntrospectionStatus, RulesApi,
    DEFAULT_INSPECTOR_URL,
};
pub use config::{ClientConfig, ConfigOverrides};
pub use error::{InspectorError, Result};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Transport};
pub use version::{
    known_api_versions, server_api_versions, Version, VersionRange, VersionSpec, MAX_API_VERSION,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
