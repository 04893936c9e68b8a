//! Configuration module for the appliance RPC client
//!
//! This module provides TOML-based configuration parsing and validation,
//! plus loading from environment variables.

use crate::error::{Result, RpcError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use url::Url;

pub const ENV_ENDPOINT_URL: &str = "VPNAS_ENDPOINT_URL";
pub const ENV_USERNAME: &str = "VPNAS_USERNAME";
pub const ENV_PASSWORD: &str = "VPNAS_PASSWORD";
pub const ENV_DEBUG: &str = "VPNAS_DEBUG";
pub const ENV_ALLOW_UNTRUSTED: &str = "VPNAS_ALLOW_UNTRUSTED";

/// Server configuration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// XML-RPC endpoint, e.g. `https://vpn.example.com/RPC2/`
    pub endpoint: String,
    /// Accept untrusted or self-signed server certificates
    #[serde(default)]
    pub allow_untrusted: bool,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u32,
}

/// Authentication configuration
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("password", &"REDACTED")
            .finish()
    }
}

/// Method catalog source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// JSON catalog file; the builtin catalog is used when absent
    pub path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Authentication configuration
    pub auth: AuthConfig,
    /// Method catalog configuration
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ClientConfig {
    /// Create a configuration with default options
    pub fn new(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            server: ServerConfig {
                endpoint: endpoint.into(),
                allow_untrusted: false,
                timeout: default_timeout(),
            },
            auth: AuthConfig {
                username: username.into(),
                password: password.into(),
            },
            catalog: CatalogConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| RpcError::Config(format!("Failed to read config file: {e}")))?;

        <Self as FromStr>::from_str(&contents)
    }

    /// Load configuration from the `VPNAS_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| RpcError::Config(format!("{key} is not set")))
        };
        let flag = |key: &str| -> Result<bool> {
            match lookup(key).map(|v| v.to_ascii_lowercase()).as_deref() {
                None | Some("false") => Ok(false),
                Some("true") => Ok(true),
                Some(_) => Err(RpcError::Config(format!(
                    "{key} must be either true or false"
                ))),
            }
        };

        let mut config = Self::new(
            required(ENV_ENDPOINT_URL)?,
            required(ENV_USERNAME)?,
            required(ENV_PASSWORD)?,
        );
        config.server.allow_untrusted = flag(ENV_ALLOW_UNTRUSTED)?;
        if flag(ENV_DEBUG)? {
            config.logging.level = "debug".to_string();
        }

        config.validate()?;
        Ok(config)
    }

    /// Convert configuration to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| RpcError::Config(format!("Failed to serialize config: {e}")))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<Url> {
        let endpoint = validate_endpoint(&self.server.endpoint)?;
        validate_credential("Username", &self.auth.username)?;
        validate_credential("Password", &self.auth.password)?;

        if self.server.timeout == 0 {
            return Err(RpcError::Config("Timeout cannot be zero".to_string()));
        }

        Ok(endpoint)
    }
}

impl FromStr for ClientConfig {
    type Err = RpcError;

    fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| RpcError::Config(format!("Failed to parse TOML: {e}")))
    }
}

/// Check that a URL is usable as an XML-RPC endpoint.
///
/// Endpoints must be https, must not embed credentials (they travel in a
/// header instead), must name a host and must not carry a query or fragment.
pub fn validate_endpoint(endpoint: &str) -> Result<Url> {
    let invalid = |reason: &str| {
        RpcError::Config(format!("Endpoint URL '{endpoint}' is invalid: {reason}"))
    };

    let url = Url::parse(endpoint).map_err(|e| invalid(&e.to_string()))?;

    if url.scheme() != "https" {
        return Err(invalid("scheme must be https"));
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(invalid("must not contain a username or password"));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing hostname"));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("must not contain a query string or fragment"));
    }

    Ok(url)
}

fn validate_credential(label: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(RpcError::Config(format!("{label} cannot be empty")));
    }
    // basic auth joins the pair with a colon
    if value.contains(':') {
        return Err(RpcError::Config(format!(
            "{label} contains \":\" character (illegal in basic auth)"
        )));
    }
    Ok(())
}

// Default value functions for serde
fn default_timeout() -> u32 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}
