//! cloudfs Cloudinary - Cloudinary backend for the cloudfs virtual filesystem
//!
//! Provides:
//! - An async HTTP client for the Cloudinary Admin and Upload APIs
//! - Translation between filesystem paths and Cloudinary public IDs
//! - Lazy, paginated directory listings synthesised from flat result sets
//! - [`CloudinaryAdapter`], the `IFilesystemAdapter` implementation
//!
//! ## Modules
//!
//! - [`client`] - HTTP client implementing the `IAssetApi` port
//! - [`signature`] - Upload API request signing
//! - [`translator`] - Path <-> public identifier translation
//! - [`listing`] - Pagination and traversal engine
//! - [`adapter`] - Filesystem verbs composed from remote calls
//! - [`mime`] - Extension-based MIME type detection

pub mod adapter;
pub mod client;
pub mod listing;
pub mod mime;
pub mod signature;
pub mod translator;

pub use adapter::CloudinaryAdapter;
pub use client::CloudinaryClient;
pub use mime::GuessMimeTypeDetector;
