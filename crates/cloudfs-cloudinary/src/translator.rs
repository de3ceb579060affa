//! Path <-> public identifier translation
//!
//! Every function here is pure over its inputs: a path (or remote record),
//! the account's [`FolderMode`] and the adapter's [`PathPrefixer`].
//!
//! ## Rules
//!
//! - The resource type comes from a fixed extension table. Lookup is
//!   case-sensitive; unknown or missing extensions map to `raw`.
//! - `image` and `video` public IDs drop the extension (the remote keeps it
//!   as `format`); `raw` public IDs keep the full file name.
//! - Fixed-folder accounts embed the directory in the public ID
//!   (`dir/name`); dynamic-folder accounts use the bare name and carry the
//!   directory as `asset_folder`.

use cloudfs_core::domain::{
    DirectoryAttributes, FileAttributes, FolderMode, PathPrefixer, VfsPath, Visibility,
};
use cloudfs_core::ports::{AssetResource, FolderEntry, IMimeTypeDetector, ResourceType};

/// Extensions stored as `image`
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "3ds", "ai", "arw", "avif", "bmp", "bw", "cr2", "cr3", "djvu", "dng", "eps", "eps3", "ept",
    "fbx", "flif", "gif", "glb", "gltf", "hdp", "heic", "heif", "ico", "indd", "jp2", "jpe", "jpeg",
    "jpg", "jxl", "jxr", "obj", "pdf", "ply", "png", "ps", "psd", "svg", "tga", "tif", "tiff",
    "u3ma", "usdz", "wdp", "webp",
];

/// Extensions stored as `video`
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "3g2", "3gp", "avi", "flv", "m2ts", "mkv", "mov", "mp4", "mpeg", "mts", "mxf", "ogv", "ts",
    "webm", "wmv",
];

/// Audio extensions, which the remote also stores as `video`
pub const AUDIO_EXTENSIONS: &[&str] = &[
    "aac", "aiff", "amr", "flac", "m4a", "mp3", "ogg", "opus", "wav",
];

/// Extra metadata key holding the remote public ID
pub const META_PUBLIC_ID: &str = "public_id";

/// Extra metadata key holding the remote asset folder
pub const META_ASSET_FOLDER: &str = "asset_folder";

/// Resource type for a path, from its extension
///
/// A basename that is only an extension (`.jpg`) has no stem to serve as a
/// public ID and is stored as raw.
pub fn classify_resource_type(path: &VfsPath) -> ResourceType {
    if path.file_stem().is_empty() {
        return ResourceType::Raw;
    }
    match path.extension() {
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext) => ResourceType::Image,
        Some(ext) if VIDEO_EXTENSIONS.contains(&ext) || AUDIO_EXTENSIONS.contains(&ext) => {
            ResourceType::Video
        }
        _ => ResourceType::Raw,
    }
}

/// Remote directory of a path (prefix applied), `""` at the account root
pub fn remote_directory(path: &VfsPath, prefixer: &PathPrefixer) -> String {
    let remote = prefixer.prefix_path(path);
    match remote.rfind('/') {
        Some(idx) => remote[..idx].to_string(),
        None => String::new(),
    }
}

/// Public identifier of a file path
pub fn to_public_id(
    path: &VfsPath,
    resource_type: ResourceType,
    mode: FolderMode,
    prefixer: &PathPrefixer,
) -> String {
    let name = match resource_type {
        ResourceType::Raw => path.basename(),
        ResourceType::Image | ResourceType::Video => path.file_stem(),
    };

    match mode {
        FolderMode::Dynamic => name.to_string(),
        FolderMode::Fixed => {
            let directory = remote_directory(path, prefixer);
            if directory.is_empty() {
                name.to_string()
            } else {
                format!("{directory}/{name}")
            }
        }
    }
}

/// Asset folder to attach to uploads and moves
///
/// Only dynamic-folder accounts carry a folder attribute.
pub fn to_folder(path: &VfsPath, mode: FolderMode, prefixer: &PathPrefixer) -> Option<String> {
    match mode {
        FolderMode::Dynamic => Some(remote_directory(path, prefixer)),
        FolderMode::Fixed => None,
    }
}

/// Where a file path lives on the remote side
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLocation {
    pub resource_type: ResourceType,
    pub public_id: String,
    /// Asset folder (dynamic mode only, `""` at the root)
    pub folder: Option<String>,
}

impl RemoteLocation {
    /// Resolves a file path to its remote location
    pub fn resolve(path: &VfsPath, mode: FolderMode, prefixer: &PathPrefixer) -> Self {
        let resource_type = classify_resource_type(path);
        Self {
            resource_type,
            public_id: to_public_id(path, resource_type, mode, prefixer),
            folder: to_folder(path, mode, prefixer),
        }
    }
}

/// Filesystem path of a remote asset
pub fn resource_path(resource: &AssetResource, mode: FolderMode, prefixer: &PathPrefixer) -> String {
    let mut remote = resource.public_id.clone();
    if resource.resource_type != ResourceType::Raw {
        if let Some(format) = &resource.format {
            remote.push('.');
            remote.push_str(format);
        }
    }

    if mode == FolderMode::Dynamic {
        if let Some(folder) = resource.asset_folder.as_deref().filter(|f| !f.is_empty()) {
            remote = format!("{folder}/{remote}");
        }
    }

    prefixer.strip_prefix(&remote)
}

/// File attributes of a remote asset
pub fn from_resource(
    resource: &AssetResource,
    mode: FolderMode,
    prefixer: &PathPrefixer,
    detector: &dyn IMimeTypeDetector,
) -> FileAttributes {
    let path = resource_path(resource, mode, prefixer);

    let mut attributes = FileAttributes::new(path.clone())
        .with_file_size(resource.bytes)
        .with_visibility(Visibility::Public)
        .with_extra_metadata(META_PUBLIC_ID, resource.public_id.clone());
    if let Some(created_at) = resource.created_at {
        attributes = attributes.with_last_modified(created_at);
    }
    if let Some(mime_type) = detector.detect_from_path(&path) {
        attributes = attributes.with_mime_type(mime_type);
    }
    if let Some(folder) = &resource.asset_folder {
        attributes = attributes.with_extra_metadata(META_ASSET_FOLDER, folder.clone());
    }
    attributes
}

/// Directory attributes of a remote folder
pub fn from_folder(folder: &FolderEntry, prefixer: &PathPrefixer) -> DirectoryAttributes {
    DirectoryAttributes::new(prefixer.strip_prefix(&folder.path))
}
