//! Configuration file handling
//!
//! Settings are resolved once at startup: the TOML file first, then
//! `TCK_*` environment variables, then command-line flags (applied by the
//! CLI). Every value has a default, so an empty configuration targets
//! `http://localhost:8080/graphql` with 30 second timeouts.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use super::paths::config_path;
use super::{Error, Result};
use crate::compare::CompareMode;

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Endpoint of the service under test
    #[serde(default)]
    pub endpoint: EndpointConfig,

    /// Timeout settings in milliseconds
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Run settings
    #[serde(default)]
    pub run: RunConfig,
}

/// Endpoint of the service under test
#[derive(Debug, Deserialize, Clone)]
pub struct EndpointConfig {
    /// Full endpoint URL; when set, the other fields are ignored
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default = "default_scheme")]
    pub scheme: String,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: None,
            scheme: default_scheme(),
            host: default_host(),
            port: default_port(),
            path: default_path(),
        }
    }
}

impl EndpointConfig {
    /// Compose the target URL
    pub fn url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };
        format!("{}://{}:{}{}", self.scheme, self.host, self.port, path)
    }
}

fn default_scheme() -> String {
    "http".to_string()
}
fn default_host() -> String {
    "localhost".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_path() -> String {
    "/graphql".to_string()
}

/// Timeout settings in milliseconds
#[derive(Debug, Deserialize, Clone)]
pub struct Timeouts {
    /// Time allowed to establish the connection
    #[serde(default = "default_timeout_ms")]
    pub connect_ms: u64,

    /// Time allowed between reads of the response
    #[serde(default = "default_timeout_ms")]
    pub read_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect_ms: default_timeout_ms(),
            read_ms: default_timeout_ms(),
        }
    }
}

impl Timeouts {
    pub fn connect(&self) -> Duration {
        Duration::from_millis(self.connect_ms)
    }

    pub fn read(&self) -> Duration {
        Duration::from_millis(self.read_ms)
    }
}

fn default_timeout_ms() -> u64 {
    30_000
}

/// Run settings
#[derive(Debug, Deserialize, Clone)]
pub struct RunConfig {
    /// How test-call responses are compared to the expected output
    #[serde(default)]
    pub compare_mode: CompareMode,

    /// Extra attempts for a call that failed at the transport level
    #[serde(default)]
    pub retries: u32,

    /// Upper bound on concurrently running isolated cases (1 = sequential)
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            compare_mode: CompareMode::default(),
            retries: 0,
            max_parallel: default_max_parallel(),
        }
    }
}

fn default_max_parallel() -> usize {
    1
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))
    }

    /// Apply `TCK_*` overrides from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply `TCK_*` overrides from an arbitrary lookup
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("TCK_ENDPOINT_URL") {
            self.endpoint.url = Some(url);
        }
        if let Some(host) = lookup("TCK_ENDPOINT_HOST") {
            self.endpoint.host = host;
        }
        if let Some(port) = lookup("TCK_ENDPOINT_PORT") {
            self.endpoint.port = parse_var("TCK_ENDPOINT_PORT", &port)?;
        }
        if let Some(path) = lookup("TCK_ENDPOINT_PATH") {
            self.endpoint.path = path;
        }
        if let Some(ms) = lookup("TCK_CONNECT_TIMEOUT_MS") {
            self.timeouts.connect_ms = parse_var("TCK_CONNECT_TIMEOUT_MS", &ms)?;
        }
        if let Some(ms) = lookup("TCK_READ_TIMEOUT_MS") {
            self.timeouts.read_ms = parse_var("TCK_READ_TIMEOUT_MS", &ms)?;
        }
        if let Some(retries) = lookup("TCK_RETRIES") {
            self.run.retries = parse_var("TCK_RETRIES", &retries)?;
        }
        if let Some(max) = lookup("TCK_MAX_PARALLEL") {
            self.run.max_parallel = parse_var("TCK_MAX_PARALLEL", &max)?;
        }
        self.validate()
    }

    /// Reject values the runner cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.timeouts.connect_ms == 0 || self.timeouts.read_ms == 0 {
            return Err(Error::Config(
                "Timeouts must be greater than zero; unbounded waits are not allowed".to_string(),
            ));
        }
        if self.run.max_parallel == 0 {
            return Err(Error::Config("max_parallel must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("Invalid value '{}' for {}", value, key)))
}
