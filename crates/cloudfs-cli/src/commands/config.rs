//! Config command - View and manage cloudfs configuration
//!
//! Provides the `cloudfs config` CLI command which:
//! 1. Shows the effective configuration (YAML or JSON)
//! 2. Sets individual configuration values via dot-notation keys
//! 3. Validates the configuration file and reports errors
//! 4. Prints the configuration file location

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;

use cloudfs_core::config::{Config, SignatureAlgorithm};
use cloudfs_core::domain::FolderMode;

use crate::commands::load_config;
use crate::output::{get_formatter, OutputFormat};

/// Credentials may be written one at a time or come from `CLOUDINARY_URL`
const CREDENTIAL_FIELDS: [&str; 3] = [
    "cloudinary.cloud_name",
    "cloudinary.api_key",
    "cloudinary.api_secret",
];

const SUPPORTED_KEYS: [(&str, &str); 9] = [
    ("cloudinary.cloud_name", "Cloud (account) name"),
    ("cloudinary.api_key", "API key"),
    ("cloudinary.api_secret", "API secret"),
    ("cloudinary.api_base_url", "API root, e.g. https://api.cloudinary.com/v1_1"),
    ("cloudinary.signature_algorithm", "sha1|sha256"),
    ("adapter.folder_mode", "dynamic|fixed"),
    ("adapter.path_prefix", "Remote subtree to scope the filesystem to"),
    ("adapter.page_size", "Listing page size (1-500)"),
    ("logging.level", "trace|debug|info|warn|error"),
];

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "adapter.folder_mode")
        key: String,
        /// New value
        value: String,
    },
    /// Validate configuration file
    Validate,
    /// Print the configuration file path
    Path,
}

impl ConfigCommand {
    /// Execute the config command
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        match self {
            ConfigCommand::Show => self.execute_show(format, config_path).await,
            ConfigCommand::Set { key, value } => {
                self.execute_set(key, value, format, config_path).await
            }
            ConfigCommand::Validate => self.execute_validate(format, config_path).await,
            ConfigCommand::Path => self.execute_path(format, config_path).await,
        }
    }

    async fn execute_show(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let formatter = get_formatter(format);
        let mut config = load_config(config_path)?;
        config.cloudinary.api_secret = mask_secret(&config.cloudinary.api_secret);

        info!(config_path = %config_path.display(), "Showing configuration");

        if format.is_json() {
            let json = serde_json::to_value(&config)
                .context("Failed to serialize configuration to JSON")?;
            formatter.print_json(&json);
        } else {
            formatter.success(&format!("Configuration ({})", config_path.display()));
            formatter.info("");

            let yaml = serde_yaml::to_string(&config)
                .context("Failed to serialize configuration to YAML")?;

            for line in yaml.lines() {
                formatter.info(line);
            }
        }

        Ok(())
    }

    async fn execute_set(
        &self,
        key: &str,
        value: &str,
        format: OutputFormat,
        config_path: &Path,
    ) -> Result<()> {
        let formatter = get_formatter(format);
        let mut config = Config::load_or_default(config_path);

        info!(key = %key, "Setting configuration value");

        if let Err(e) = apply_config_value(&mut config, key, value) {
            if format.is_json() {
                formatter.print_json(&serde_json::json!({
                    "success": false,
                    "key": key,
                    "error": e.to_string(),
                }));
            } else {
                formatter.error(&format!("Failed to set '{}': {}", key, e));
                formatter.info("");
                formatter.info("Supported keys:");
                for (name, description) in SUPPORTED_KEYS {
                    formatter.info(&format!("  {name:<32} - {description}"));
                }
            }
            return Ok(());
        }

        let error_msgs: Vec<String> = config
            .validate()
            .iter()
            .filter(|e| !CREDENTIAL_FIELDS.contains(&e.field.as_str()))
            .map(|e| e.to_string())
            .collect();
        if !error_msgs.is_empty() {
            if format.is_json() {
                formatter.print_json(&serde_json::json!({
                    "success": false,
                    "key": key,
                    "errors": error_msgs,
                }));
            } else {
                formatter.error(&format!(
                    "Invalid value for '{}': {}",
                    key,
                    error_msgs.join("; ")
                ));
            }
            return Ok(());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create configuration directory")?;
        }
        let yaml = serde_yaml::to_string(&config).context("Failed to serialize configuration")?;
        std::fs::write(config_path, &yaml).context("Failed to write configuration file")?;

        let shown = if key == "cloudinary.api_secret" {
            mask_secret(value)
        } else {
            value.to_string()
        };
        if format.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "key": key,
                "value": shown,
                "config_path": config_path.display().to_string(),
            }));
        } else {
            formatter.success(&format!("Set {} = {}", key, shown));
            formatter.info(&format!("Saved to {}", config_path.display()));
        }

        Ok(())
    }

    async fn execute_validate(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let formatter = get_formatter(format);

        if !config_path.exists() {
            if format.is_json() {
                formatter.print_json(&serde_json::json!({
                    "valid": false,
                    "config_path": config_path.display().to_string(),
                    "errors": ["Configuration file not found. Using defaults."],
                }));
            } else {
                formatter.info(&format!(
                    "Configuration file not found at {}",
                    config_path.display()
                ));
                formatter.info(
                    "Using default configuration. Run 'cloudfs config set <key> <value>' to create one.",
                );
            }
            return Ok(());
        }

        let mut config = match Config::load(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                if format.is_json() {
                    formatter.print_json(&serde_json::json!({
                        "valid": false,
                        "config_path": config_path.display().to_string(),
                        "errors": [format!("Failed to parse configuration: {:#}", e)],
                    }));
                } else {
                    formatter.error(&format!("Failed to parse configuration: {:#}", e));
                    formatter.info(&format!("File: {}", config_path.display()));
                }
                return Ok(());
            }
        };
        config.apply_env()?;

        info!(config_path = %config_path.display(), "Validating configuration");

        let errors = config.validate();

        if format.is_json() {
            let error_strings: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            formatter.print_json(&serde_json::json!({
                "valid": errors.is_empty(),
                "config_path": config_path.display().to_string(),
                "errors": error_strings,
            }));
        } else if errors.is_empty() {
            formatter.success("Configuration is valid");
            formatter.info(&format!("File: {}", config_path.display()));
        } else {
            formatter.error(&format!(
                "Configuration has {} error{}:",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" }
            ));
            formatter.info(&format!("File: {}", config_path.display()));
            formatter.info("");
            for error in &errors {
                formatter.info(&format!("  {} - {}", error.field, error.message));
            }
        }

        Ok(())
    }

    async fn execute_path(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        if format.is_json() {
            get_formatter(format).print_json(&serde_json::json!({
                "config_path": config_path.display().to_string(),
                "exists": config_path.exists(),
            }));
        } else {
            println!("{}", config_path.display());
        }
        Ok(())
    }
}

/// Keeps the last four characters of a secret visible
fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count == 0 {
        return String::new();
    }
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("{}{}", "*".repeat(count - 4), tail)
}

/// Apply a dot-notation key/value pair to a Config struct
///
/// See [`SUPPORTED_KEYS`] for the accepted keys.
fn apply_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        // --- cloudinary ---
        "cloudinary.cloud_name" => {
            config.cloudinary.cloud_name = value.to_string();
        }
        "cloudinary.api_key" => {
            config.cloudinary.api_key = value.to_string();
        }
        "cloudinary.api_secret" => {
            config.cloudinary.api_secret = value.to_string();
        }
        "cloudinary.api_base_url" => {
            config.cloudinary.api_base_url = value.trim_end_matches('/').to_string();
        }
        "cloudinary.signature_algorithm" => {
            config.cloudinary.signature_algorithm = match value {
                "sha1" => SignatureAlgorithm::Sha1,
                "sha256" => SignatureAlgorithm::Sha256,
                other => anyhow::bail!("Unknown signature algorithm '{other}', expected 'sha1' or 'sha256'"),
            };
        }

        // --- adapter ---
        "adapter.folder_mode" => {
            config.adapter.folder_mode = value.parse::<FolderMode>()?;
        }
        "adapter.path_prefix" => {
            config.adapter.path_prefix = value.to_string();
        }
        "adapter.page_size" => {
            config.adapter.page_size = value
                .parse::<u32>()
                .context("Expected a positive integer for adapter.page_size")?;
        }

        // --- logging ---
        "logging.level" => {
            config.logging.level = value.to_string();
        }

        _ => {
            anyhow::bail!("Unknown configuration key: '{}'", key);
        }
    }

    Ok(())
}
