//! CLI subcommands
//!
//! Filesystem commands share [`open_adapter`], which builds a
//! [`CloudinaryAdapter`] from the config file and the `CLOUDINARY_URL`
//! environment variable.

use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::debug;

use cloudfs_cloudinary::CloudinaryAdapter;
use cloudfs_core::config::Config;

pub mod completions;
pub mod config;
pub mod directory;
pub mod file;

/// Loads the effective configuration: file (if any) overlaid with the environment
pub fn load_config(config_path: &Path) -> Result<Config> {
    let mut config = if config_path.exists() {
        Config::load(config_path)?
    } else {
        debug!(config_path = %config_path.display(), "No configuration file, using defaults");
        Config::default()
    };
    config.apply_env()?;
    Ok(config)
}

/// Builds the adapter for the effective configuration
pub fn open_adapter(config_path: &Path) -> Result<CloudinaryAdapter> {
    let config = load_config(config_path)?;

    let errors = config.validate();
    if !errors.is_empty() {
        let details: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        bail!(
            "Invalid configuration ({}): {}. Set CLOUDINARY_URL or run 'cloudfs config validate'.",
            config_path.display(),
            details.join("; ")
        );
    }

    CloudinaryAdapter::from_config(&config).context("Failed to create the Cloudinary adapter")
}
