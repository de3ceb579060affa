//! cloudfs Core - Domain types, ports and configuration
//!
//! This crate contains the provider-agnostic half of cloudfs:
//! - **Domain types** - `VfsPath`, `PathPrefixer`, file/directory attributes
//! - **Error taxonomy** - `FilesystemError` for callers, `AssetApiError` for the remote port
//! - **Port definitions** - `IAssetApi` (consumed remote API), `IFilesystemAdapter`
//!   (exposed virtual filesystem) and `IMimeTypeDetector`
//! - **Configuration** - YAML-backed `Config` with validation
//!
//! # Architecture
//!
//! Ports & adapters: the domain module is pure and has no I/O. The ports
//! module defines the traits that adapter crates (such as
//! `cloudfs-cloudinary`) implement or consume.

pub mod config;
pub mod domain;
pub mod ports;
