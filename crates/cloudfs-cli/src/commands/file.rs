//! File commands - cat, put, get, rm, mv, cp, stat, url, exists
//!
//! Each command opens the adapter from the effective configuration and
//! runs a single filesystem verb against it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tokio::io::AsyncWriteExt;
use tracing::info;

use cloudfs_core::domain::FileAttributes;
use cloudfs_core::ports::IFilesystemAdapter;

use crate::commands::open_adapter;
use crate::output::{format_size, get_formatter, OutputFormat};

// ============================================================================
// cat
// ============================================================================

#[derive(Debug, Args)]
pub struct CatCommand {
    /// Remote file path
    pub path: String,
}

impl CatCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let adapter = open_adapter(config_path)?;
        let contents = adapter
            .read(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.path))?;

        if format.is_json() {
            get_formatter(format).print_json(&serde_json::json!({
                "path": self.path,
                "size": contents.len(),
                "content": String::from_utf8_lossy(&contents),
            }));
        } else {
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(&contents)
                .await
                .context("Failed to write to stdout")?;
            stdout.flush().await.context("Failed to flush stdout")?;
        }
        Ok(())
    }
}

// ============================================================================
// put / get
// ============================================================================

#[derive(Debug, Args)]
pub struct PutCommand {
    /// Local file to upload
    pub local: PathBuf,
    /// Remote destination path
    pub remote: String,
}

impl PutCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let adapter = open_adapter(config_path)?;
        let formatter = get_formatter(format);

        let file = tokio::fs::File::open(&self.local)
            .await
            .with_context(|| format!("Failed to open {}", self.local.display()))?;
        let size = file.metadata().await.map(|m| m.len()).unwrap_or_default();

        info!(local = %self.local.display(), remote = %self.remote, size, "Uploading file");
        adapter
            .write_stream(&self.remote, Box::new(file))
            .await
            .with_context(|| format!("Failed to upload to {}", self.remote))?;

        if format.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "local": self.local.display().to_string(),
                "remote": self.remote,
                "size": size,
            }));
        } else {
            formatter.success(&format!(
                "Uploaded {} to {} ({})",
                self.local.display(),
                self.remote,
                format_size(size)
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Args)]
pub struct GetCommand {
    /// Remote file path
    pub remote: String,
    /// Local destination file
    pub local: PathBuf,
}

impl GetCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let adapter = open_adapter(config_path)?;
        let formatter = get_formatter(format);

        let mut reader = adapter
            .read_stream(&self.remote)
            .await
            .with_context(|| format!("Failed to read {}", self.remote))?;
        let mut file = tokio::fs::File::create(&self.local)
            .await
            .with_context(|| format!("Failed to create {}", self.local.display()))?;
        let size = tokio::io::copy(&mut reader, &mut file)
            .await
            .with_context(|| format!("Failed to download {}", self.remote))?;
        file.flush().await.context("Failed to flush local file")?;

        if format.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "remote": self.remote,
                "local": self.local.display().to_string(),
                "size": size,
            }));
        } else {
            formatter.success(&format!(
                "Downloaded {} to {} ({})",
                self.remote,
                self.local.display(),
                format_size(size)
            ));
        }
        Ok(())
    }
}

// ============================================================================
// rm / mv / cp
// ============================================================================

#[derive(Debug, Args)]
pub struct RemoveCommand {
    /// Remote file path
    pub path: String,
}

impl RemoveCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let adapter = open_adapter(config_path)?;
        adapter
            .delete(&self.path)
            .await
            .with_context(|| format!("Failed to delete {}", self.path))?;
        get_formatter(format).success(&format!("Deleted {}", self.path));
        Ok(())
    }
}

#[derive(Debug, Args)]
pub struct MoveCommand {
    /// Current path
    pub source: String,
    /// New path
    pub destination: String,
}

impl MoveCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let adapter = open_adapter(config_path)?;
        adapter
            .move_file(&self.source, &self.destination)
            .await
            .with_context(|| format!("Failed to move {} to {}", self.source, self.destination))?;
        get_formatter(format).success(&format!("Moved {} to {}", self.source, self.destination));
        Ok(())
    }
}

#[derive(Debug, Args)]
pub struct CopyCommand {
    /// File to copy
    pub source: String,
    /// Path of the copy
    pub destination: String,
}

impl CopyCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let adapter = open_adapter(config_path)?;
        adapter
            .copy(&self.source, &self.destination)
            .await
            .with_context(|| format!("Failed to copy {} to {}", self.source, self.destination))?;
        get_formatter(format).success(&format!("Copied {} to {}", self.source, self.destination));
        Ok(())
    }
}

// ============================================================================
// stat / url / exists
// ============================================================================

#[derive(Debug, Args)]
pub struct StatCommand {
    /// Remote file path
    pub path: String,
}

impl StatCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let adapter = open_adapter(config_path)?;
        let formatter = get_formatter(format);

        let attributes = collect_attributes(&adapter, &self.path, |message| {
            formatter.warn(message)
        })
        .await?;

        if format.is_json() {
            let json = serde_json::to_value(&attributes)
                .context("Failed to serialize file attributes")?;
            formatter.print_json(&json);
            return Ok(());
        }

        formatter.success(&attributes.path);
        for line in describe(&attributes) {
            formatter.info(&line);
        }
        Ok(())
    }
}

/// Gathers every metadata field of a file
///
/// Size and visibility are required; a missing timestamp or MIME type is
/// reported through `warn` and left out.
async fn collect_attributes(
    adapter: &dyn IFilesystemAdapter,
    path: &str,
    warn: impl Fn(&str),
) -> Result<FileAttributes> {
    let mut attributes = adapter
        .file_size(path)
        .await
        .with_context(|| format!("Failed to stat {path}"))?;
    attributes.visibility = adapter
        .visibility(path)
        .await
        .with_context(|| format!("Failed to stat {path}"))?
        .visibility;

    match adapter.last_modified(path).await {
        Ok(modified) => attributes.last_modified = modified.last_modified,
        Err(e) => warn(&e.to_string()),
    }
    match adapter.mime_type(path).await {
        Ok(mime) => attributes.mime_type = mime.mime_type,
        Err(e) => warn(&e.to_string()),
    }
    Ok(attributes)
}

fn describe(attributes: &FileAttributes) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(size) = attributes.file_size {
        lines.push(format!("Size:       {} ({size} bytes)", format_size(size)));
    }
    if let Some(modified) = attributes.last_modified {
        lines.push(format!("Modified:   {}", modified.to_rfc3339()));
    }
    if let Some(mime) = &attributes.mime_type {
        lines.push(format!("MIME type:  {mime}"));
    }
    if let Some(visibility) = attributes.visibility {
        lines.push(format!("Visibility: {visibility}"));
    }
    lines
}

#[derive(Debug, Args)]
pub struct UrlCommand {
    /// Remote file path
    pub path: String,
}

impl UrlCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let adapter = open_adapter(config_path)?;
        let url = adapter
            .public_url(&self.path)
            .await
            .with_context(|| format!("Failed to get the public URL of {}", self.path))?;

        if format.is_json() {
            get_formatter(format).print_json(&serde_json::json!({
                "path": self.path,
                "url": url,
            }));
        } else {
            println!("{url}");
        }
        Ok(())
    }
}

#[derive(Debug, Args)]
pub struct ExistsCommand {
    /// Remote path
    pub path: String,

    /// Check for a directory instead of a file
    #[arg(short, long)]
    pub directory: bool,
}

impl ExistsCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let adapter = open_adapter(config_path)?;
        let exists = if self.directory {
            adapter.directory_exists(&self.path).await
        } else {
            adapter.file_exists(&self.path).await
        }
        .with_context(|| format!("Failed to check {}", self.path))?;

        let kind = if self.directory { "directory" } else { "file" };
        if format.is_json() {
            get_formatter(format).print_json(&serde_json::json!({
                "path": self.path,
                "kind": kind,
                "exists": exists,
            }));
        } else if exists {
            println!("{kind} {} exists", self.path);
        } else {
            println!("{kind} {} does not exist", self.path);
        }
        Ok(())
    }
}
