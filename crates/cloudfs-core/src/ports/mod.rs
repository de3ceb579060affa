//! Port definitions (hexagonal architecture interfaces)
//!
//! ## Ports Overview
//!
//! - [`IAssetApi`] - Remote asset store the adapter consumes
//! - [`IFilesystemAdapter`] - Virtual filesystem the adapter exposes
//! - [`IMimeTypeDetector`] - Local MIME type inference

pub mod asset_api;
pub mod filesystem;
pub mod mime;

pub use asset_api::{
    AssetResource, ByteStream, DestroyOptions, FolderEntry, IAssetApi, Page, PageRequest,
    RenameOptions, ResourceType, UpdateOptions, UploadOptions, UploadSource,
};
pub use filesystem::{ByteReader, IFilesystemAdapter, ListingStream};
pub use mime::IMimeTypeDetector;
