//! Domain error types
//!
//! Three layers of errors live here:
//! - [`DomainError`] for validation of domain values (paths, identifiers)
//! - [`AssetApiError`] for failures reported by the remote asset API port,
//!   with a distinguishable "not found" condition
//! - [`FilesystemError`] for the virtual filesystem verbs exposed to callers;
//!   one variant per verb family, carrying the path(s) and the cause

use std::fmt::{self, Display, Formatter};
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid path format or content
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Path tries to escape the filesystem root
    #[error("Path traversal detected: {0}")]
    PathTraversal(String),

    /// Invalid public identifier
    #[error("Invalid public ID: {0}")]
    InvalidPublicId(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

/// Errors reported by the remote asset API
///
/// `NotFound` is kept apart from every other failure so that adapters can
/// turn an absent resource into the verb's documented outcome (a `false`
/// existence check, a no-op delete) instead of a failure.
#[derive(Debug, Error)]
pub enum AssetApiError {
    /// The requested resource or folder does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Credentials were rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Credentials are valid but lack the permission for this call
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Rate limit exceeded
    #[error("Rate limited (retry after {retry_after:?})")]
    RateLimited {
        /// Delay suggested by the `Retry-After` header, when present
        retry_after: Option<Duration>,
    },

    /// The API rejected the request parameters
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A server-side error occurred (5xx)
    #[error("Server error: {0}")]
    Server(String),

    /// A network-level error occurred
    #[error("Network error: {0}")]
    Network(String),

    /// The API response could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl AssetApiError {
    /// Returns true if the remote reported the resource as absent
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// What an existence check was looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExistenceKind {
    File,
    Directory,
}

impl Display for ExistenceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Directory => write!(f, "directory"),
        }
    }
}

/// Metadata field a retrieval failure refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataField {
    Visibility,
    MimeType,
    LastModified,
    FileSize,
}

impl Display for MetadataField {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Visibility => write!(f, "visibility"),
            Self::MimeType => write!(f, "mime_type"),
            Self::LastModified => write!(f, "last_modified"),
            Self::FileSize => write!(f, "file_size"),
        }
    }
}

fn listing_depth(deep: &bool) -> &'static str {
    if *deep {
        "deep"
    } else {
        "shallow"
    }
}

/// Errors returned by virtual filesystem operations
#[derive(Debug, Error)]
pub enum FilesystemError {
    #[error("Unable to check existence of {kind} at {path}: {source}")]
    UnableToCheckExistence {
        path: String,
        kind: ExistenceKind,
        source: AssetApiError,
    },

    #[error("Unable to read file from location: {path}. {reason}")]
    UnableToRead {
        path: String,
        reason: String,
        source: Option<AssetApiError>,
    },

    #[error("Unable to write file at location: {path}. {reason}")]
    UnableToWrite {
        path: String,
        reason: String,
        source: Option<AssetApiError>,
    },

    #[error("Unable to delete file at location: {path}. {source}")]
    UnableToDeleteFile { path: String, source: AssetApiError },

    #[error("Unable to delete directory at location: {path}. {source}")]
    UnableToDeleteDirectory { path: String, source: AssetApiError },

    #[error("Unable to create directory at location: {path}. {source}")]
    UnableToCreateDirectory { path: String, source: AssetApiError },

    #[error("Unable to retrieve the {field} for file at location: {path}. {reason}")]
    UnableToRetrieveMetadata {
        path: String,
        field: MetadataField,
        reason: String,
        source: Option<AssetApiError>,
    },

    #[error("Unable to list contents for '{path}', {} listing: {source}", listing_depth(.deep))]
    UnableToListContents {
        path: String,
        deep: bool,
        source: AssetApiError,
    },

    #[error("Unable to move file from {from} to {to}: {source}")]
    UnableToMove {
        from: String,
        to: String,
        source: AssetApiError,
    },

    #[error("Unable to copy file from {from} to {to}: {reason}")]
    UnableToCopy {
        from: String,
        to: String,
        reason: String,
        source: Option<AssetApiError>,
    },

    #[error("Unable to generate public url for {path}: {source}")]
    UnableToGeneratePublicUrl { path: String, source: AssetApiError },

    #[error("Unable to {operation} for {path}: {reason}")]
    UnsupportedOperation {
        operation: &'static str,
        path: String,
        reason: String,
    },

    #[error("Invalid path {path}: {source}")]
    InvalidPath { path: String, source: DomainError },
}

impl FilesystemError {
    /// The primary path the failed operation was acting on
    ///
    /// For move and copy this is the source location.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::UnableToCheckExistence { path, .. }
            | Self::UnableToRead { path, .. }
            | Self::UnableToWrite { path, .. }
            | Self::UnableToDeleteFile { path, .. }
            | Self::UnableToDeleteDirectory { path, .. }
            | Self::UnableToCreateDirectory { path, .. }
            | Self::UnableToRetrieveMetadata { path, .. }
            | Self::UnableToListContents { path, .. }
            | Self::UnableToGeneratePublicUrl { path, .. }
            | Self::UnsupportedOperation { path, .. }
            | Self::InvalidPath { path, .. } => path,
            Self::UnableToMove { from, .. } | Self::UnableToCopy { from, .. } => from,
        }
    }

    /// The remote API failure behind this error, if any
    #[must_use]
    pub fn api_error(&self) -> Option<&AssetApiError> {
        match self {
            Self::UnableToCheckExistence { source, .. }
            | Self::UnableToDeleteFile { source, .. }
            | Self::UnableToDeleteDirectory { source, .. }
            | Self::UnableToCreateDirectory { source, .. }
            | Self::UnableToListContents { source, .. }
            | Self::UnableToMove { source, .. }
            | Self::UnableToGeneratePublicUrl { source, .. } => Some(source),
            Self::UnableToRead { source, .. }
            | Self::UnableToWrite { source, .. }
            | Self::UnableToCopy { source, .. }
            | Self::UnableToRetrieveMetadata { source, .. } => source.as_ref(),
            Self::UnsupportedOperation { .. } | Self::InvalidPath { .. } => None,
        }
    }
}
