//! API version negotiation.
//!
//! The inspector service advertises the range of API versions it speaks via
//! two headers on its root resource. Before any endpoint call the client
//! probes that range, resolves the caller's requested version against it and
//! pins the result for the lifetime of the session.
//!
//! # Negotiation Flow
//!
//! ```text
//! Client                                   Server
//!    |                                        |
//!    |-------- GET / (no auth) ------------->|  Probe
//!    |<------- min/max version headers ------|
//!    |                                        |
//!    |  resolve, validate, pin M.m            |
//!    |                                        |
//!    |-------- POST /v1/... (M.m) ---------->|  Every later call
//! ```
//!
//! # Version Specifiers
//!
//! | Specifier             | Resolves to                                  |
//! |-----------------------|----------------------------------------------|
//! | `Latest`              | server maximum                               |
//! | `Major(N)`            | `N.<server max minor>`                       |
//! | `MajorMinor(N, M)`    | `N.M`                                        |
//! | `Dotted("N.M")`       | `N.M`                                        |
//! | `Dotted("N")`         | same as `Major(N)`                           |
//!
//! The resolved version must lie inside `[min, max]` and share the major
//! version of `max`: the protocol only defines one major family at a time.

mod negotiator;

pub use negotiator::{server_api_versions, Negotiator};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{InspectorError, Result};

/// Header carrying the minimum version supported by the server.
pub const MIN_VERSION_HEADER: &str = "x-openstack-ironic-inspector-api-minimum-version";

/// Header carrying the maximum version supported by the server.
pub const MAX_VERSION_HEADER: &str = "x-openstack-ironic-inspector-api-maximum-version";

/// Header stamped with the pinned version on every request.
pub const VERSION_HEADER: &str = "x-openstack-ironic-inspector-api-version";

/// Generic OpenStack microversion header, also stamped on every request.
pub const MICROVERSION_HEADER: &str = "openstack-api-version";

/// Service type used in the microversion header.
pub const SERVICE_TYPE: &str = "baremetal-introspection";

/// Version assumed when the server does not advertise one.
pub const DEFAULT_SERVER_VERSION: Version = Version::new(1, 0);

/// Highest API version this client knows about.
pub const MAX_API_VERSION: Version = Version::new(1, 5);

/// API version as an ordered `(major, minor)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version {
    major: u32,
    minor: u32,
}

impl Version {
    /// Create a version.
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Major component.
    pub const fn major(&self) -> u32 {
        self.major
    }

    /// Minor component.
    pub const fn minor(&self) -> u32 {
        self.minor
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for Version {
    type Err = InspectorError;

    /// Parse `"N.M"`; a bare `"N"` means `N.0`.
    fn from_str(s: &str) -> Result<Self> {
        match parse_components(s)? {
            (major, Some(minor)) => Ok(Self::new(major, minor)),
            (major, None) => Ok(Self::new(major, 0)),
        }
    }
}

impl From<(u32, u32)> for Version {
    fn from((major, minor): (u32, u32)) -> Self {
        Self::new(major, minor)
    }
}

/// Split `"N"` or `"N.M"` into its integer components.
fn parse_components(s: &str) -> Result<(u32, Option<u32>)> {
    let malformed = || {
        InspectorError::invalid_input(format!(
            "Malformed API version {s:?}: expect a string in form of X.Y, a pair or an integer"
        ))
    };
    let number = |part: &str| -> Result<u32> {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        part.parse().map_err(|_| malformed())
    };

    let mut parts = s.trim().split('.');
    let major = number(parts.next().unwrap_or_default())?;
    let minor = parts.next().map(number).transpose()?;
    if parts.next().is_some() {
        return Err(malformed());
    }
    Ok((major, minor))
}

/// Range of API versions advertised by a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRange {
    /// Minimum supported version.
    pub min: Version,
    /// Maximum supported version.
    pub max: Version,
}

impl VersionRange {
    /// Create a range.
    pub const fn new(min: Version, max: Version) -> Self {
        Self { min, max }
    }

    /// Whether `version` may be pinned against this range.
    pub fn supports(&self, version: Version) -> bool {
        self.min <= version && version <= self.max && version.major == self.max.major
    }

    /// Accept `version` or fail with [`InspectorError::VersionNotSupported`].
    pub fn check(&self, version: Version) -> Result<Version> {
        if self.supports(version) {
            Ok(version)
        } else {
            Err(InspectorError::VersionNotSupported {
                requested: version,
                supported: *self,
            })
        }
    }
}

impl Default for VersionRange {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_VERSION, DEFAULT_SERVER_VERSION)
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.min, self.max)
    }
}

/// Version requested by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum VersionSpec {
    /// No preference: use the highest version the server supports.
    #[default]
    Latest,
    /// Highest minor the server supports for this major.
    Major(u32),
    /// Exact version.
    MajorMinor(u32, u32),
    /// Unparsed `"N"` or `"N.M"`, typically from config or the command line.
    Dotted(String),
}

impl VersionSpec {
    /// Validate the specifier without touching the network.
    pub fn requested(&self) -> Result<RequestedVersion> {
        Ok(match self {
            Self::Latest => RequestedVersion::Latest,
            Self::Major(major) => RequestedVersion::Major(*major),
            Self::MajorMinor(major, minor) => RequestedVersion::Exact(Version::new(*major, *minor)),
            Self::Dotted(s) => match parse_components(s)? {
                (major, Some(minor)) => RequestedVersion::Exact(Version::new(major, minor)),
                (major, None) => RequestedVersion::Major(major),
            },
        })
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => write!(f, "latest"),
            Self::Major(major) => write!(f, "{major}"),
            Self::MajorMinor(major, minor) => write!(f, "{major}.{minor}"),
            Self::Dotted(s) => write!(f, "{s}"),
        }
    }
}

impl From<u32> for VersionSpec {
    fn from(major: u32) -> Self {
        Self::Major(major)
    }
}

impl From<(u32, u32)> for VersionSpec {
    fn from((major, minor): (u32, u32)) -> Self {
        Self::MajorMinor(major, minor)
    }
}

impl From<Version> for VersionSpec {
    fn from(version: Version) -> Self {
        Self::MajorMinor(version.major, version.minor)
    }
}

impl From<&str> for VersionSpec {
    fn from(s: &str) -> Self {
        Self::Dotted(s.to_string())
    }
}

impl From<String> for VersionSpec {
    fn from(s: String) -> Self {
        Self::Dotted(s)
    }
}

impl<T: Into<VersionSpec>> From<Option<T>> for VersionSpec {
    fn from(spec: Option<T>) -> Self {
        spec.map_or(Self::Latest, Into::into)
    }
}

/// A syntactically valid specifier, waiting for the server range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestedVersion {
    /// Server maximum.
    Latest,
    /// Server maximum minor for this major.
    Major(u32),
    /// Exactly this version.
    Exact(Version),
}

impl RequestedVersion {
    /// Resolve against the server range. The result is not validated yet.
    pub fn resolve(self, range: &VersionRange) -> Version {
        match self {
            Self::Latest => range.max,
            Self::Major(major) if major == range.max.major => Version::new(major, range.max.minor),
            Self::Major(major) => Version::new(major, 0),
            Self::Exact(version) => version,
        }
    }
}

/// Version strings this client build knows, major-only form first.
///
/// For a maximum of `1.2` this is `["1", "1.0", "1.1", "1.2"]`.
pub fn known_api_versions(max: Version) -> Vec<String> {
    std::iter::once(max.major.to_string())
        .chain((0..=max.minor).map(|minor| Version::new(max.major, minor).to_string()))
        .collect()
}
