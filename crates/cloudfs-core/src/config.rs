//! Configuration module for cloudfs.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, environment overrides, validation and defaults.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::{FolderMode, VfsPath};

/// Environment variable holding a `cloudinary://<key>:<secret>@<cloud>` URL.
pub const CLOUDINARY_URL_ENV: &str = "CLOUDINARY_URL";

/// Largest page the remote listing endpoints accept.
pub const MAX_PAGE_SIZE: u32 = 500;

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for cloudfs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cloudinary: CloudinaryConfig,
    pub adapter: AdapterConfig,
    pub logging: LoggingConfig,
}

/// Algorithm used to sign Upload API requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

/// Cloudinary account credentials and endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudinaryConfig {
    /// Account (cloud) name, the first path segment of every API URL.
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    /// API root without the cloud name, e.g. `https://api.cloudinary.com/v1_1`.
    pub api_base_url: String,
    pub signature_algorithm: SignatureAlgorithm,
}

/// Filesystem adapter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Folder addressing mode of the account: `dynamic` or `fixed`.
    pub folder_mode: FolderMode,
    /// Remote subtree the adapter is scoped to (empty for the whole account).
    pub path_prefix: String,
    /// Entries requested per listing page (1..=500).
    pub page_size: u32,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/cloudfs/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("cloudfs")
            .join("config.yaml")
    }

    /// Override credentials from `CLOUDINARY_URL` when it is set.
    pub fn apply_env(&mut self) -> anyhow::Result<()> {
        match std::env::var(CLOUDINARY_URL_ENV) {
            Ok(value) if !value.trim().is_empty() => self
                .apply_cloudinary_url(&value)
                .with_context(|| format!("Invalid {CLOUDINARY_URL_ENV}")),
            _ => Ok(()),
        }
    }

    /// Override credentials from a `cloudinary://` URL.
    ///
    /// The endpoint and signature settings are left untouched.
    pub fn apply_cloudinary_url(&mut self, value: &str) -> anyhow::Result<()> {
        let parsed = CloudinaryConfig::from_url(value)?;
        self.cloudinary.cloud_name = parsed.cloud_name;
        self.cloudinary.api_key = parsed.api_key;
        self.cloudinary.api_secret = parsed.api_secret;
        Ok(())
    }
}

impl CloudinaryConfig {
    /// Parse a `cloudinary://<api_key>:<api_secret>@<cloud_name>` URL.
    pub fn from_url(value: &str) -> anyhow::Result<Self> {
        let url = Url::parse(value.trim()).context("Malformed Cloudinary URL")?;
        if url.scheme() != "cloudinary" {
            bail!("Expected the cloudinary:// scheme, got {}://", url.scheme());
        }

        let api_key = url.username();
        let Some(api_secret) = url.password() else {
            bail!("Cloudinary URL is missing the API secret");
        };
        let Some(cloud_name) = url.host_str() else {
            bail!("Cloudinary URL is missing the cloud name");
        };
        if api_key.is_empty() {
            bail!("Cloudinary URL is missing the API key");
        }

        Ok(Self {
            cloud_name: cloud_name.to_string(),
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
            ..Self::default()
        })
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for CloudinaryConfig {
    fn default() -> Self {
        Self {
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            api_base_url: "https://api.cloudinary.com/v1_1".to_string(),
            signature_algorithm: SignatureAlgorithm::Sha1,
        }
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            folder_mode: FolderMode::Dynamic,
            path_prefix: String::new(),
            page_size: MAX_PAGE_SIZE,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"adapter.page_size"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- cloudinary ---
        for (field, value) in [
            ("cloudinary.cloud_name", &self.cloudinary.cloud_name),
            ("cloudinary.api_key", &self.cloudinary.api_key),
            ("cloudinary.api_secret", &self.cloudinary.api_secret),
        ] {
            if value.trim().is_empty() {
                errors.push(ValidationError {
                    field: field.into(),
                    message: format!("must be set (or provided through {CLOUDINARY_URL_ENV})"),
                });
            }
        }
        match Url::parse(&self.cloudinary.api_base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(ValidationError {
                field: "cloudinary.api_base_url".into(),
                message: format!("unsupported scheme '{}'", url.scheme()),
            }),
            Err(e) => errors.push(ValidationError {
                field: "cloudinary.api_base_url".into(),
                message: format!("invalid URL: {e}"),
            }),
        }

        // --- adapter ---
        if self.adapter.page_size == 0 || self.adapter.page_size > MAX_PAGE_SIZE {
            errors.push(ValidationError {
                field: "adapter.page_size".into(),
                message: format!("must be in range 1..={MAX_PAGE_SIZE}"),
            });
        }
        if let Err(e) = VfsPath::parse(&self.adapter.path_prefix) {
            errors.push(ValidationError {
                field: "adapter.path_prefix".into(),
                message: e.to_string(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}
