//! Configuration management.
//!
//! Supports configuration from:
//! - TOML config files
//! - Environment variables
//! - CLI arguments (merged on top by the `inspector` binary)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::client::DEFAULT_INSPECTOR_URL;
use crate::error::{InspectorError, Result};
use crate::transport::DEFAULT_TIMEOUT_SECS;
use crate::version::VersionSpec;

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Inspector URL in form `http://host:port[/vN]`
    pub inspector_url: String,

    /// Requested API version (`"1"`, `"1.3"`); latest when unset
    pub api_version: Option<String>,

    /// Authentication token
    pub auth_token: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            inspector_url: DEFAULT_INSPECTOR_URL.to_string(),
            api_version: None,
            auth_token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Partial configuration layer, e.g. environment or command-line flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Inspector URL
    pub inspector_url: Option<String>,
    /// Requested API version
    pub api_version: Option<String>,
    /// Authentication token
    pub auth_token: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
}

impl ConfigOverrides {
    /// Read overrides from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides from an arbitrary variable source.
    ///
    /// Reads `INSPECTOR_URL`, `INSPECTOR_VERSION`, `OS_AUTH_TOKEN` and
    /// `INSPECTOR_TIMEOUT`. Unparsable timeouts are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let timeout_secs = lookup("INSPECTOR_TIMEOUT").and_then(|timeout| match timeout.parse() {
            Ok(secs) => Some(secs),
            Err(_) => {
                tracing::warn!("Ignoring invalid INSPECTOR_TIMEOUT {:?}", timeout);
                None
            },
        });

        Self {
            inspector_url: lookup("INSPECTOR_URL"),
            api_version: lookup("INSPECTOR_VERSION"),
            auth_token: lookup("OS_AUTH_TOKEN"),
            timeout_secs,
        }
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            InspectorError::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        toml::from_str(&content)
            .map_err(|e| InspectorError::Config(format!("Failed to parse config: {e}")))
    }

    /// Default config file location (`~/.config/inspector-client/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("inspector-client").join("config.toml"))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::default().merge(ConfigOverrides::from_env())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self::default().merge(ConfigOverrides::from_lookup(lookup))
    }

    /// Apply overrides on top of this config. Every value that is set wins,
    /// even when it equals the default.
    pub fn merge(self, overrides: ConfigOverrides) -> Self {
        Self {
            inspector_url: overrides.inspector_url.unwrap_or(self.inspector_url),
            api_version: overrides.api_version.or(self.api_version),
            auth_token: overrides.auth_token.or(self.auth_token),
            timeout_secs: overrides.timeout_secs.unwrap_or(self.timeout_secs),
        }
    }

    /// Requested version as a specifier.
    pub fn version_spec(&self) -> VersionSpec {
        self.api_version
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map_or(VersionSpec::Latest, VersionSpec::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.inspector_url, "http://127.0.0.1:5050");
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.version_spec(), VersionSpec::Latest);
    }

    #[test]
    fn test_config_from_toml() {
        let toml = r#"
            inspector_url = "http://10.0.0.2:5050"
            api_version = "1.3"
            timeout_secs = 10
        "#;

        let config: ClientConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.inspector_url, "http://10.0.0.2:5050");
        assert_eq!(config.version_spec(), VersionSpec::Dotted("1.3".to_string()));
        assert_eq!(config.timeout_secs, 10);
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn test_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "auth_token = \"secret\"").unwrap();

        let config = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(config.auth_token.as_deref(), Some("secret"));
        assert_eq!(config.inspector_url, DEFAULT_INSPECTOR_URL);
    }

    #[test]
    fn test_config_from_bad_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timeout_secs = \"soon\"").unwrap();
        assert!(matches!(
            ClientConfig::from_file(file.path()),
            Err(InspectorError::Config(_))
        ));

        assert!(matches!(
            ClientConfig::from_file("/nonexistent/inspector.toml"),
            Err(InspectorError::Config(_))
        ));
    }

    #[test]
    fn test_config_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("INSPECTOR_URL", "http://inspector:5050"),
            ("INSPECTOR_VERSION", "1"),
            ("OS_AUTH_TOKEN", "tok"),
            ("INSPECTOR_TIMEOUT", "never"),
        ]
        .into_iter()
        .collect();

        let config = ClientConfig::from_lookup(|k| vars.get(k).map(|v| (*v).to_string()));
        assert_eq!(config.inspector_url, "http://inspector:5050");
        assert_eq!(config.version_spec(), VersionSpec::Dotted("1".to_string()));
        assert_eq!(config.auth_token.as_deref(), Some("tok"));
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_merge_overrides_win() {
        let file = ClientConfig {
            inspector_url: "http://file:5050".to_string(),
            api_version: Some("1.1".to_string()),
            auth_token: Some("file-token".to_string()),
            timeout_secs: 30,
        };
        let env = ConfigOverrides {
            api_version: Some("1.2".to_string()),
            ..Default::default()
        };

        let merged = file.merge(env);
        assert_eq!(merged.inspector_url, "http://file:5050");
        assert_eq!(merged.api_version.as_deref(), Some("1.2"));
        assert_eq!(merged.auth_token.as_deref(), Some("file-token"));
        assert_eq!(merged.timeout_secs, 30);
    }

    #[test]
    fn test_merge_override_equal_to_default() {
        let file = ClientConfig {
            inspector_url: "http://file:5050".to_string(),
            timeout_secs: 30,
            ..Default::default()
        };
        let flags = ConfigOverrides {
            inspector_url: Some(DEFAULT_INSPECTOR_URL.to_string()),
            timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
            ..Default::default()
        };

        let merged = file.merge(flags);
        assert_eq!(merged.inspector_url, DEFAULT_INSPECTOR_URL);
        assert_eq!(merged.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_layers_file_env_flags() {
        let file = ClientConfig {
            timeout_secs: 30,
            ..Default::default()
        };
        let env =
            ConfigOverrides::from_lookup(|k| (k == "INSPECTOR_TIMEOUT").then(|| "10".to_string()));
        assert_eq!(file.clone().merge(env.clone()).timeout_secs, 10);

        let flags = ConfigOverrides {
            timeout_secs: Some(5),
            ..Default::default()
        };
        assert_eq!(file.merge(env).merge(flags).timeout_secs, 5);
    }

    #[test]
    fn test_blank_version_is_latest() {
        let config = ClientConfig {
            api_version: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.version_spec(), VersionSpec::Latest);
    }
}
