//! Directory commands - ls, mkdir, rmdir

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use futures_util::TryStreamExt;
use tracing::info;

use cloudfs_core::domain::StorageAttributes;
use cloudfs_core::ports::IFilesystemAdapter;

use crate::commands::open_adapter;
use crate::output::{format_size, get_formatter, OutputFormat};

// ============================================================================
// ls
// ============================================================================

#[derive(Debug, Args)]
pub struct ListCommand {
    /// Directory to list (the root when omitted)
    #[arg(default_value = "")]
    pub path: String,

    /// Include the contents of subdirectories
    #[arg(short, long)]
    pub recursive: bool,
}

impl ListCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let adapter = open_adapter(config_path)?;
        let formatter = get_formatter(format);

        info!(path = %self.path, recursive = self.recursive, "Listing contents");

        if format.is_json() {
            let entries: Vec<StorageAttributes> = adapter
                .list_contents(&self.path, self.recursive)
                .try_collect()
                .await
                .with_context(|| format!("Failed to list '{}'", self.path))?;
            let json =
                serde_json::to_value(&entries).context("Failed to serialize listing to JSON")?;
            formatter.print_json(&json);
            return Ok(());
        }

        // Human output is printed as entries arrive
        let mut entries = adapter.list_contents(&self.path, self.recursive);
        let mut count = 0usize;
        while let Some(entry) = entries
            .try_next()
            .await
            .with_context(|| format!("Failed to list '{}'", self.path))?
        {
            println!("{}", listing_line(&entry));
            count += 1;
        }
        if count == 0 {
            formatter.info("(empty)");
        }
        Ok(())
    }
}

fn listing_line(entry: &StorageAttributes) -> String {
    match entry {
        StorageAttributes::Directory(dir) => format!("{:>10}  {}/", "<dir>", dir.path),
        StorageAttributes::File(file) => {
            let size = file.file_size.map(format_size).unwrap_or_else(|| "-".into());
            format!("{:>10}  {}", size, file.path)
        }
    }
}

// ============================================================================
// mkdir / rmdir
// ============================================================================

#[derive(Debug, Args)]
pub struct MkdirCommand {
    /// Directory to create
    pub path: String,
}

impl MkdirCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let adapter = open_adapter(config_path)?;
        adapter
            .create_directory(&self.path)
            .await
            .with_context(|| format!("Failed to create directory {}", self.path))?;
        get_formatter(format).success(&format!("Created directory {}", self.path));
        Ok(())
    }
}

#[derive(Debug, Args)]
pub struct RmdirCommand {
    /// Directory to delete, with all of its contents
    pub path: String,
}

impl RmdirCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let adapter = open_adapter(config_path)?;
        adapter
            .delete_directory(&self.path)
            .await
            .with_context(|| format!("Failed to delete directory {}", self.path))?;
        get_formatter(format).success(&format!("Deleted directory {}", self.path));
        Ok(())
    }
}
