//! Sync configuration
//!
//! Provides the configuration consumed by the queue, the orchestrator and the
//! HTTP delivery. Values come from defaults, environment variables or a TOML
//! file, always passing through [`SyncConfigBuilder::build`] for validation.
//!
//! # Environment
//!
//! - `SYNC_API_URL` - base URL of the storefront API
//! - `SYNC_MAX_RETRIES` - delivery attempts before an item is left for manual handling
//! - `SYNC_REQUEST_TIMEOUT_SECS` - per-request delivery timeout
//! - `SYNC_DB_PATH` - location of the SQLite queue file
//!
//! # TOML
//!
//! ```toml
//! base_url = "https://www.pgclosets.com"
//! max_retries = 3
//! request_timeout_secs = 10
//!
//! [endpoints]
//! quotes = "/api/quotes"
//! ```

use crate::shared::submission::SubmissionType;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default storefront API base URL
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";

/// Delivery attempts before a submission stops being retried automatically
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default per-request delivery timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Mapping from submission type to the API path receiving it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointTable {
    paths: HashMap<SubmissionType, String>,
}

impl Default for EndpointTable {
    fn default() -> Self {
        let paths = SubmissionType::ALL
            .into_iter()
            .map(|kind| (kind, kind.default_endpoint().to_string()))
            .collect();
        Self { paths }
    }
}

impl EndpointTable {
    /// Path for `kind`
    pub fn path(&self, kind: SubmissionType) -> &str {
        self.paths
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_else(|| kind.default_endpoint())
    }

    /// Override the path for `kind`
    pub fn set(&mut self, kind: SubmissionType, path: impl Into<String>) {
        self.paths.insert(kind, path.into());
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for kind in SubmissionType::ALL {
            let path = self.path(kind);
            if !path.starts_with('/') {
                return Err(ConfigError::InvalidEndpoint {
                    kind,
                    path: path.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Appearance of success notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationConfig {
    pub title: String,
    pub icon: String,
    pub badge: String,
    pub tag: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            title: "PG Closets".to_string(),
            icon: "/icons/icon-192x192.png".to_string(),
            badge: "/icons/badge-72x72.png".to_string(),
            tag: "sync-success".to_string(),
        }
    }
}

/// Offline sync configuration
#[derive(Debug, Clone)]
pub struct SyncConfig {
    base_url: String,
    endpoints: EndpointTable,
    max_retries: u32,
    request_timeout: Duration,
    database_path: PathBuf,
    notification: NotificationConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            endpoints: EndpointTable::default(),
            max_retries: DEFAULT_MAX_RETRIES,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            database_path: default_database_path(),
            notification: NotificationConfig::default(),
        }
    }
}

impl SyncConfig {
    /// Create a new SyncConfigBuilder
    pub fn builder() -> SyncConfigBuilder {
        SyncConfigBuilder::default()
    }

    /// Load configuration from `SYNC_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = Self::builder();

        if let Ok(url) = std::env::var("SYNC_API_URL") {
            builder = builder.base_url(url);
        }
        if let Ok(raw) = std::env::var("SYNC_MAX_RETRIES") {
            let retries = raw.parse::<u32>().map_err(|_| ConfigError::InvalidValue {
                key: "SYNC_MAX_RETRIES",
                value: raw.clone(),
            })?;
            builder = builder.max_retries(retries);
        }
        if let Ok(raw) = std::env::var("SYNC_REQUEST_TIMEOUT_SECS") {
            let secs = raw.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                key: "SYNC_REQUEST_TIMEOUT_SECS",
                value: raw.clone(),
            })?;
            builder = builder.request_timeout(Duration::from_secs(secs));
        }
        if let Ok(path) = std::env::var("SYNC_DB_PATH") {
            builder = builder.database_path(path);
        }

        builder.build()
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(raw)?;
        file.into_builder().build()
    }

    /// Read configuration from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoints(&self) -> &EndpointTable {
        &self.endpoints
    }

    /// Full URL receiving submissions of `kind`
    pub fn endpoint_url(&self, kind: SubmissionType) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.endpoints.path(kind))
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn notification(&self) -> &NotificationConfig {
        &self.notification
    }
}

/// Platform data directory location of the queue file
fn default_database_path() -> PathBuf {
    let mut path = dirs::data_dir().unwrap_or_else(std::env::temp_dir);
    path.push("pgclosets");
    path.push("offline.db");
    path
}

/// Builder for SyncConfig
#[derive(Debug, Default)]
pub struct SyncConfigBuilder {
    base_url: Option<String>,
    endpoints: EndpointTable,
    max_retries: Option<u32>,
    request_timeout: Option<Duration>,
    database_path: Option<PathBuf>,
    notification: Option<NotificationConfig>,
}

impl SyncConfigBuilder {
    /// Set the API base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Override the endpoint path for one submission type
    pub fn endpoint(mut self, kind: SubmissionType, path: impl Into<String>) -> Self {
        self.endpoints.set(kind, path);
        self
    }

    /// Set the retry ceiling
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Set the per-request delivery timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the SQLite queue file location
    pub fn database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Set how success notifications look
    pub fn notification(mut self, notification: NotificationConfig) -> Self {
        self.notification = Some(notification);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<SyncConfig, ConfigError> {
        let base_url = self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(base_url));
        }

        let max_retries = self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES);
        if max_retries == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_retries",
                value: "0".to_string(),
            });
        }

        self.endpoints.validate()?;

        Ok(SyncConfig {
            base_url,
            endpoints: self.endpoints,
            max_retries,
            request_timeout: self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            database_path: self.database_path.unwrap_or_else(default_database_path),
            notification: self.notification.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    base_url: Option<String>,
    max_retries: Option<u32>,
    request_timeout_secs: Option<u64>,
    database_path: Option<PathBuf>,
    endpoints: EndpointFile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EndpointFile {
    quotes: Option<String>,
    contacts: Option<String>,
    cart: Option<String>,
    favorites: Option<String>,
}

impl ConfigFile {
    fn into_builder(self) -> SyncConfigBuilder {
        let mut builder = SyncConfig::builder();
        if let Some(url) = self.base_url {
            builder = builder.base_url(url);
        }
        if let Some(retries) = self.max_retries {
            builder = builder.max_retries(retries);
        }
        if let Some(secs) = self.request_timeout_secs {
            builder = builder.request_timeout(Duration::from_secs(secs));
        }
        if let Some(path) = self.database_path {
            builder = builder.database_path(path);
        }

        let overrides = [
            (SubmissionType::Quotes, self.endpoints.quotes),
            (SubmissionType::Contacts, self.endpoints.contacts),
            (SubmissionType::Cart, self.endpoints.cart),
            (SubmissionType::Favorites, self.endpoints.favorites),
        ];
        for (kind, path) in overrides {
            if let Some(path) = path {
                builder = builder.endpoint(kind, path);
            }
        }
        builder
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("endpoint for {kind} must start with '/': {path}")]
    InvalidEndpoint { kind: SubmissionType, path: String },
    #[error("failed to read {path}: {message}")]
    Io { path: PathBuf, message: String },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
}
