//! Automation configuration types and pre-flight validation.
//!
//! Configuration is validated synchronously before any task is created; a
//! misconfigured automation request is rejected with a [`ConfigError`] and never
//! reaches the queue. Each task snapshots the configuration it was started with.

use serde::{Deserialize, Serialize};

use crate::error::config::ConfigError;

/// Target specification for the scraper's catalog discovery crawl.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Catalog or listing URL to crawl.
    pub target_url: String,
    /// Optional category to restrict discovery to.
    pub category: Option<String>,
    /// Optional cap on the number of items to discover.
    pub item_limit: Option<u32>,
}

impl ScrapeConfig {
    /// Creates a scrape config for the given target URL with no restrictions.
    pub fn new(target_url: impl Into<String>) -> Self {
        Self {
            target_url: target_url.into(),
            category: None,
            item_limit: None,
        }
    }

    /// Validates the config, rejecting an empty target URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_url.trim().is_empty() {
            return Err(ConfigError::MissingTargetUrl);
        }
        Ok(())
    }
}

/// Login credentials for the scraper's authenticated session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Account username.
    pub username: String,
    /// Account password.
    pub password: String,
}

impl Credentials {
    /// Creates credentials from a username/password pair.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Validates the credentials, rejecting an empty username or password.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.username.trim().is_empty() || self.password.trim().is_empty() {
            return Err(ConfigError::MissingCredentials);
        }
        Ok(())
    }
}

/// Output format requested from the background-removal collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Transparent PNG (default).
    #[default]
    Png,
    /// JPEG with a white background.
    Jpeg,
    /// WebP with transparency.
    Webp,
}

/// Owner-configured settings for the background-removal collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemovalSettings {
    /// API key for the background-removal service.
    pub api_key: String,
    /// Requested output format.
    pub output_format: OutputFormat,
    /// Requested output quality in `[1, 100]`.
    pub quality: u8,
}

impl RemovalSettings {
    /// Creates settings with the given API key and default format/quality.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            output_format: OutputFormat::default(),
            quality: 90,
        }
    }

    /// Validates the settings, rejecting a missing API key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(())
    }
}

/// Destination tag for the storage collaborator.
///
/// Only the tag and its location are modeled here; wire protocols for non-local
/// destinations live entirely in external [`StorageWriter`](crate::client::StorageWriter)
/// implementations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageDestination {
    /// Local filesystem directory.
    Local {
        /// Directory processed assets are written into.
        directory: String,
    },
    /// Object storage bucket.
    S3 {
        /// Bucket name.
        bucket: String,
        /// Key prefix within the bucket.
        prefix: String,
    },
    /// Remote file transfer host.
    Sftp {
        /// Host to connect to.
        host: String,
        /// Remote path to write into.
        path: String,
    },
}

/// Storage destination configuration snapshotted per task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Where processed assets are persisted.
    pub destination: StorageDestination,
}

impl StorageConfig {
    /// Creates a local-filesystem storage config.
    pub fn local(directory: impl Into<String>) -> Self {
        Self {
            destination: StorageDestination::Local {
                directory: directory.into(),
            },
        }
    }

    /// Validates the config, rejecting a destination with an empty location.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let location = match &self.destination {
            StorageDestination::Local { directory } => directory,
            StorageDestination::S3 { bucket, .. } => bucket,
            StorageDestination::Sftp { host, .. } => host,
        };

        if location.trim().is_empty() {
            return Err(ConfigError::MissingStorageLocation {
                destination: self.destination_name().to_string(),
            });
        }
        Ok(())
    }

    /// Returns the human-readable name of the destination type.
    pub fn destination_name(&self) -> &'static str {
        match &self.destination {
            StorageDestination::Local { .. } => "local",
            StorageDestination::S3 { .. } => "s3",
            StorageDestination::Sftp { .. } => "sftp",
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::local("output")
    }
}
