//! Virtual filesystem port (driving/primary port)
//!
//! The uniform file and directory interface callers program against. An
//! adapter implements it on top of some storage backend; cloudfs ships one
//! for Cloudinary.
//!
//! ## Design Notes
//!
//! - Paths are plain `&str` at this boundary and normalised by the adapter;
//!   an invalid path surfaces as [`FilesystemError::InvalidPath`].
//! - `list_contents` is not `async`: it returns a lazy stream that issues
//!   remote calls only while the consumer keeps polling it. Dropping the
//!   stream early stops further page requests.

use futures_util::stream::BoxStream;
use tokio::io::AsyncRead;

use crate::domain::attributes::{FileAttributes, StorageAttributes, Visibility};
use crate::domain::errors::FilesystemError;

/// Lazy listing of files and directories
pub type ListingStream<'a> = BoxStream<'a, Result<StorageAttributes, FilesystemError>>;

/// Readable file content
pub type ByteReader = Box<dyn AsyncRead + Send + Unpin>;

/// Port trait for virtual filesystem adapters
#[async_trait::async_trait]
pub trait IFilesystemAdapter: Send + Sync {
    /// Returns true if a file exists at `path`
    async fn file_exists(&self, path: &str) -> Result<bool, FilesystemError>;

    /// Returns true if a directory exists at `path`
    async fn directory_exists(&self, path: &str) -> Result<bool, FilesystemError>;

    /// Creates or fully replaces the file at `path`
    async fn write(&self, path: &str, contents: &[u8]) -> Result<(), FilesystemError>;

    /// Creates or fully replaces the file at `path` from a reader
    async fn write_stream(&self, path: &str, contents: ByteReader) -> Result<(), FilesystemError>;

    /// Reads the whole file
    async fn read(&self, path: &str) -> Result<Vec<u8>, FilesystemError>;

    /// Opens the file for streaming reads
    async fn read_stream(&self, path: &str) -> Result<ByteReader, FilesystemError>;

    /// Deletes a file; deleting a missing file is not an error
    async fn delete(&self, path: &str) -> Result<(), FilesystemError>;

    /// Deletes a directory and everything below it
    async fn delete_directory(&self, path: &str) -> Result<(), FilesystemError>;

    /// Creates a directory
    async fn create_directory(&self, path: &str) -> Result<(), FilesystemError>;

    /// Changes the visibility of a file
    async fn set_visibility(
        &self,
        path: &str,
        visibility: Visibility,
    ) -> Result<(), FilesystemError>;

    /// Visibility of an existing file
    async fn visibility(&self, path: &str) -> Result<FileAttributes, FilesystemError>;

    /// MIME type of an existing file
    async fn mime_type(&self, path: &str) -> Result<FileAttributes, FilesystemError>;

    /// Last modification time of an existing file
    async fn last_modified(&self, path: &str) -> Result<FileAttributes, FilesystemError>;

    /// Size of an existing file
    async fn file_size(&self, path: &str) -> Result<FileAttributes, FilesystemError>;

    /// Lists the entries below `path`, recursing into sub-directories if `deep`
    fn list_contents<'a>(&'a self, path: &str, deep: bool) -> ListingStream<'a>;

    /// Moves a file
    async fn move_file(&self, source: &str, destination: &str) -> Result<(), FilesystemError>;

    /// Copies a file
    async fn copy(&self, source: &str, destination: &str) -> Result<(), FilesystemError>;

    /// Public URL of a file
    async fn public_url(&self, path: &str) -> Result<String, FilesystemError>;
}
