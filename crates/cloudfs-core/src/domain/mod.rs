//! Domain types
//!
//! This module contains the core domain types for cloudfs:
//! - Normalised virtual filesystem paths and the path prefixer
//! - The folder addressing mode of the remote account
//! - File and directory attributes produced by adapters
//! - Domain-specific and filesystem error types

pub mod attributes;
pub mod errors;
pub mod folder_mode;
pub mod path;

// Re-export commonly used types
pub use attributes::{DirectoryAttributes, FileAttributes, StorageAttributes, Visibility};
pub use errors::{AssetApiError, DomainError, ExistenceKind, FilesystemError, MetadataField};
pub use folder_mode::FolderMode;
pub use path::{PathPrefixer, VfsPath};
