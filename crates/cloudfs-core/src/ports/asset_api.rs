//! Remote asset API port (driven/secondary port)
//!
//! This module defines the primitive operations a remote media-asset store
//! must provide for the filesystem adapter to work: upload, rename, update,
//! destroy, metadata lookup, paginated listings and folder management.
//!
//! ## Design Notes
//!
//! - Methods return [`AssetApiError`] rather than `anyhow::Result` because
//!   callers must tell a missing resource apart from every other failure.
//! - Listing methods return one [`Page`] per call; following the cursor is
//!   the caller's job, which keeps listings lazy.
//! - The DTOs here are port-level records, not domain entities. The
//!   translator maps them to filesystem paths and attributes.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::domain::errors::{AssetApiError, DomainError};

// ============================================================================
// ResourceType
// ============================================================================

/// Coarse remote-side classification of an asset
///
/// Determines the identifier encoding and which listing endpoint applies.
/// Audio files are stored as `Video`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Image,
    Video,
    Raw,
}

impl ResourceType {
    /// Every resource type, in the order listings visit them
    pub const ALL: [ResourceType; 3] = [Self::Image, Self::Video, Self::Raw];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Raw => "raw",
        }
    }
}

impl Display for ResourceType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            "raw" => Ok(Self::Raw),
            other => Err(DomainError::ValidationFailed(format!(
                "Unknown resource type: {other}"
            ))),
        }
    }
}

// ============================================================================
// Records
// ============================================================================

/// A remote asset as reported by metadata and listing calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetResource {
    /// Unique key within the resource type
    pub public_id: String,
    pub resource_type: ResourceType,
    /// Delivery format (file extension) for image and video assets
    pub format: Option<String>,
    /// Size in bytes
    pub bytes: u64,
    pub created_at: Option<DateTime<Utc>>,
    /// HTTPS delivery URL
    pub secure_url: Option<String>,
    /// Folder attribute used by dynamic-folder accounts (`""` at the root)
    pub asset_folder: Option<String>,
    /// Folder encoded in the public ID, reported by fixed-folder accounts
    pub folder: Option<String>,
    /// Set for the zero-byte markers the store creates as a side effect
    pub placeholder: bool,
}

impl AssetResource {
    /// Placeholders must never surface as real files
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.placeholder || self.bytes == 0
    }
}

/// A remote folder entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderEntry {
    /// Last path segment
    pub name: String,
    /// Full folder path from the account root
    pub path: String,
}

/// One page of a paginated listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Continuation token; `None` on the last page
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// A final page holding `items`
    #[must_use]
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_cursor: None,
        }
    }
}

/// Pagination arguments for listing calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub max_results: u32,
    pub next_cursor: Option<String>,
}

impl PageRequest {
    #[must_use]
    pub fn new(max_results: u32, next_cursor: Option<String>) -> Self {
        Self {
            max_results,
            next_cursor,
        }
    }
}

// ============================================================================
// Request options
// ============================================================================

/// Content of an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadSource {
    /// Raw file bytes
    Bytes(Vec<u8>),
    /// A remote URL the store fetches the content from
    Url(String),
}

/// Options for [`IAssetApi::upload`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    pub public_id: String,
    pub resource_type: ResourceType,
    /// Original filename reported to the store
    pub filename: Option<String>,
    /// Target folder (dynamic-folder accounts only)
    pub asset_folder: Option<String>,
    pub overwrite: bool,
    /// Purge CDN caches for the replaced asset
    pub invalidate: bool,
}

/// Options for [`IAssetApi::rename`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameOptions {
    pub resource_type: ResourceType,
    pub asset_folder: Option<String>,
    pub overwrite: bool,
    pub invalidate: bool,
}

/// Options for [`IAssetApi::update`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOptions {
    pub resource_type: ResourceType,
    pub asset_folder: Option<String>,
}

/// Options for [`IAssetApi::destroy`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestroyOptions {
    pub resource_type: ResourceType,
    pub invalidate: bool,
}

/// Streamed body of a delivery download
pub type ByteStream = BoxStream<'static, Result<Bytes, AssetApiError>>;

// ============================================================================
// IAssetApi trait
// ============================================================================

/// Port trait for the remote asset store
///
/// ## Implementation Notes
///
/// - Every method that addresses a single asset or folder must report an
///   absent target as [`AssetApiError::NotFound`].
/// - Implementations must not retry internally on behalf of the adapter.
#[async_trait::async_trait]
pub trait IAssetApi: Send + Sync {
    /// Uploads new content, creating or replacing `options.public_id`
    async fn upload(
        &self,
        source: UploadSource,
        options: &UploadOptions,
    ) -> Result<AssetResource, AssetApiError>;

    /// Changes an asset's public identifier
    async fn rename(
        &self,
        from_public_id: &str,
        to_public_id: &str,
        options: &RenameOptions,
    ) -> Result<AssetResource, AssetApiError>;

    /// Updates an asset's metadata (folder assignment)
    async fn update(
        &self,
        public_id: &str,
        options: &UpdateOptions,
    ) -> Result<AssetResource, AssetApiError>;

    /// Deletes an asset
    async fn destroy(&self, public_id: &str, options: &DestroyOptions)
        -> Result<(), AssetApiError>;

    /// Fetches an asset's metadata
    async fn asset(
        &self,
        public_id: &str,
        resource_type: ResourceType,
    ) -> Result<AssetResource, AssetApiError>;

    /// Lists assets of one resource type whose public ID starts with `prefix`
    async fn list_assets(
        &self,
        resource_type: ResourceType,
        prefix: &str,
        page: &PageRequest,
    ) -> Result<Page<AssetResource>, AssetApiError>;

    /// Lists assets whose folder attribute is exactly `asset_folder`
    async fn assets_by_asset_folder(
        &self,
        asset_folder: &str,
        page: &PageRequest,
    ) -> Result<Page<AssetResource>, AssetApiError>;

    /// Lists the top-level folders
    async fn root_folders(&self, page: &PageRequest) -> Result<Page<FolderEntry>, AssetApiError>;

    /// Lists the direct sub-folders of `path`
    async fn sub_folders(
        &self,
        path: &str,
        page: &PageRequest,
    ) -> Result<Page<FolderEntry>, AssetApiError>;

    /// Creates a folder (and any missing ancestors)
    async fn create_folder(&self, path: &str) -> Result<(), AssetApiError>;

    /// Deletes an empty folder
    async fn delete_folder(&self, path: &str) -> Result<(), AssetApiError>;

    /// Streams the content behind a delivery URL
    async fn download(&self, url: &str) -> Result<ByteStream, AssetApiError>;
}
