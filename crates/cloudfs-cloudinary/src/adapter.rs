//! CloudinaryAdapter - IFilesystemAdapter implementation for Cloudinary
//!
//! Composes the filesystem verbs from [`IAssetApi`] calls, using the
//! [`translator`](crate::translator) for path <-> public ID mapping and the
//! [`Lister`] for directory listings.
//!
//! ## Design Notes
//!
//! - The adapter holds no remote state. Every verb is a short sequence of
//!   remote calls with no retries.
//! - On dynamic-folder accounts public IDs do not encode the directory, so
//!   an asset only counts as the file at a path when its asset folder
//!   matches the path's directory.
//! - A remote "not found" is turned into `false` by existence checks and
//!   into a no-op by deletes. Every other verb reports it as a failure.

use std::sync::Arc;

use futures_util::stream::{self, TryStreamExt};
use futures_util::StreamExt;
use tokio::io::AsyncReadExt;
use tokio_util::io::StreamReader;
use tracing::{debug, info, warn};

use cloudfs_core::config::{Config, MAX_PAGE_SIZE};
use cloudfs_core::domain::{
    AssetApiError, DomainError, ExistenceKind, FileAttributes, FilesystemError, FolderMode,
    MetadataField, PathPrefixer, VfsPath, Visibility,
};
use cloudfs_core::ports::{
    AssetResource, ByteReader, ByteStream, DestroyOptions, IAssetApi, IFilesystemAdapter,
    IMimeTypeDetector, ListingStream, PageRequest, RenameOptions, UpdateOptions, UploadOptions,
    UploadSource,
};

use crate::client::CloudinaryClient;
use crate::listing::Lister;
use crate::mime::GuessMimeTypeDetector;
use crate::translator::RemoteLocation;

/// Reason reported by [`IFilesystemAdapter::set_visibility`]
const VISIBILITY_UNSUPPORTED: &str = "Cloudinary does not support this operation.";

/// Reason reported when a copy would land on the source's own public ID
const COPY_SAME_ASSET: &str =
    "destination resolves to the same remote asset as the source (same public ID and resource type)";

/// Virtual filesystem over a Cloudinary account
#[derive(Clone)]
pub struct CloudinaryAdapter {
    api: Arc<dyn IAssetApi>,
    mode: FolderMode,
    prefixer: PathPrefixer,
    detector: Arc<dyn IMimeTypeDetector>,
    page_size: u32,
}

impl CloudinaryAdapter {
    /// Creates an adapter for a dynamic-folder account, without prefix
    pub fn new(api: Arc<dyn IAssetApi>) -> Self {
        Self {
            api,
            mode: FolderMode::default(),
            prefixer: PathPrefixer::default(),
            detector: Arc::new(GuessMimeTypeDetector),
            page_size: MAX_PAGE_SIZE,
        }
    }

    /// Builds the HTTP client and adapter described by `config`
    pub fn from_config(config: &Config) -> Result<Self, DomainError> {
        let client = CloudinaryClient::from_config(&config.cloudinary);
        Ok(Self::new(Arc::new(client))
            .with_folder_mode(config.adapter.folder_mode)
            .with_page_size(config.adapter.page_size)
            .with_path_prefix(&config.adapter.path_prefix)?)
    }

    pub fn with_folder_mode(mut self, mode: FolderMode) -> Self {
        self.mode = mode;
        self
    }

    /// Roots every path under `prefix` on the remote side
    pub fn with_path_prefix(mut self, prefix: &str) -> Result<Self, DomainError> {
        self.prefixer = PathPrefixer::new(prefix)?;
        Ok(self)
    }

    pub fn with_mime_type_detector(mut self, detector: Arc<dyn IMimeTypeDetector>) -> Self {
        self.detector = detector;
        self
    }

    /// Sets the listing page size, clamped to what the API accepts
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn folder_mode(&self) -> FolderMode {
        self.mode
    }

    pub fn path_prefix(&self) -> &str {
        self.prefixer.prefix()
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    fn lister(&self) -> Lister {
        Lister::new(
            Arc::clone(&self.api),
            self.mode,
            self.prefixer.clone(),
            Arc::clone(&self.detector),
            self.page_size,
        )
    }

    fn parse(path: &str) -> Result<VfsPath, FilesystemError> {
        VfsPath::parse(path).map_err(|source| FilesystemError::InvalidPath {
            path: path.to_string(),
            source,
        })
    }

    fn locate(&self, path: &VfsPath) -> RemoteLocation {
        RemoteLocation::resolve(path, self.mode, &self.prefixer)
    }

    /// Whether `resource` is the stored file at `location`
    fn is_stored_at(&self, resource: &AssetResource, location: &RemoteLocation) -> bool {
        if resource.is_placeholder() {
            return false;
        }
        match (&location.folder, self.mode) {
            (Some(folder), FolderMode::Dynamic) => {
                resource.asset_folder.as_deref().unwrap_or_default() == folder.as_str()
            }
            _ => true,
        }
    }

    /// Fetches the asset stored at `location`
    ///
    /// Placeholders and same-named assets in other folders are reported
    /// as [`AssetApiError::NotFound`].
    async fn fetch(&self, location: &RemoteLocation) -> Result<AssetResource, AssetApiError> {
        let resource = self
            .api
            .asset(&location.public_id, location.resource_type)
            .await?;
        if self.is_stored_at(&resource, location) {
            Ok(resource)
        } else {
            Err(AssetApiError::NotFound(location.public_id.clone()))
        }
    }

    /// Secure delivery URL of the asset stored at `location`
    async fn delivery_url(&self, location: &RemoteLocation) -> Result<String, AssetApiError> {
        let resource = self.fetch(location).await?;
        resource.secure_url.ok_or_else(|| {
            AssetApiError::InvalidResponse(format!(
                "{}: asset has no delivery URL",
                location.public_id
            ))
        })
    }

    async fn download(&self, location: &RemoteLocation) -> Result<ByteStream, AssetApiError> {
        let url = self.delivery_url(location).await?;
        self.api.download(&url).await
    }

    fn upload_options(&self, path: &VfsPath, location: &RemoteLocation) -> UploadOptions {
        UploadOptions {
            public_id: location.public_id.clone(),
            resource_type: location.resource_type,
            filename: Some(path.as_str().to_string()),
            asset_folder: location.folder.clone(),
            overwrite: true,
            invalidate: true,
        }
    }

    async fn upload(&self, path: &VfsPath, contents: Vec<u8>) -> Result<(), FilesystemError> {
        let location = self.locate(path);
        let options = self.upload_options(path, &location);

        info!(
            path = %path,
            public_id = %location.public_id,
            resource_type = %location.resource_type,
            size = contents.len(),
            "Writing file"
        );
        self.api
            .upload(UploadSource::Bytes(contents), &options)
            .await
            .map_err(|e| FilesystemError::UnableToWrite {
                path: path.to_string(),
                reason: e.to_string(),
                source: Some(e),
            })?;
        Ok(())
    }

    /// Fetches the file behind one of the metadata verbs
    async fn metadata_source(
        &self,
        path: &str,
        field: MetadataField,
    ) -> Result<(VfsPath, AssetResource), FilesystemError> {
        let path = Self::parse(path)?;
        debug!(path = %path, field = %field, "CloudinaryAdapter::metadata");
        let location = self.locate(&path);
        match self.fetch(&location).await {
            Ok(resource) => Ok((path, resource)),
            Err(e) => Err(FilesystemError::UnableToRetrieveMetadata {
                path: path.to_string(),
                field,
                reason: e.to_string(),
                source: Some(e),
            }),
        }
    }
}

#[async_trait::async_trait]
impl IFilesystemAdapter for CloudinaryAdapter {
    async fn file_exists(&self, path: &str) -> Result<bool, FilesystemError> {
        let path = Self::parse(path)?;
        debug!(path = %path, "CloudinaryAdapter::file_exists");
        let location = self.locate(&path);

        match self.fetch(&location).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(source) => Err(FilesystemError::UnableToCheckExistence {
                path: path.to_string(),
                kind: ExistenceKind::File,
                source,
            }),
        }
    }

    async fn directory_exists(&self, path: &str) -> Result<bool, FilesystemError> {
        let path = Self::parse(path)?;
        debug!(path = %path, "CloudinaryAdapter::directory_exists");
        let remote = self.prefixer.prefix_path(&path);
        if remote.is_empty() {
            return Ok(true);
        }

        match self.api.sub_folders(&remote, &PageRequest::new(1, None)).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(source) => Err(FilesystemError::UnableToCheckExistence {
                path: path.to_string(),
                kind: ExistenceKind::Directory,
                source,
            }),
        }
    }

    async fn write(&self, path: &str, contents: &[u8]) -> Result<(), FilesystemError> {
        let path = Self::parse(path)?;
        self.upload(&path, contents.to_vec()).await
    }

    async fn write_stream(
        &self,
        path: &str,
        mut contents: ByteReader,
    ) -> Result<(), FilesystemError> {
        let path = Self::parse(path)?;

        let mut buffer = Vec::new();
        contents
            .read_to_end(&mut buffer)
            .await
            .map_err(|e| FilesystemError::UnableToWrite {
                path: path.to_string(),
                reason: format!("failed to read source stream: {e}"),
                source: None,
            })?;

        self.upload(&path, buffer).await
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, FilesystemError> {
        let path = Self::parse(path)?;
        debug!(path = %path, "CloudinaryAdapter::read");
        let location = self.locate(&path);

        let to_read_error = |e: AssetApiError| FilesystemError::UnableToRead {
            path: path.to_string(),
            reason: e.to_string(),
            source: Some(e),
        };

        let chunks = self.download(&location).await.map_err(to_read_error)?;
        chunks
            .try_fold(Vec::new(), |mut contents, chunk| async move {
                contents.extend_from_slice(&chunk);
                Ok(contents)
            })
            .await
            .map_err(to_read_error)
    }

    async fn read_stream(&self, path: &str) -> Result<ByteReader, FilesystemError> {
        let path = Self::parse(path)?;
        debug!(path = %path, "CloudinaryAdapter::read_stream");
        let location = self.locate(&path);

        let chunks = self
            .download(&location)
            .await
            .map_err(|e| FilesystemError::UnableToRead {
                path: path.to_string(),
                reason: e.to_string(),
                source: Some(e),
            })?;
        Ok(Box::new(StreamReader::new(
            chunks.map_err(std::io::Error::other),
        )))
    }

    async fn delete(&self, path: &str) -> Result<(), FilesystemError> {
        let path = Self::parse(path)?;
        let location = self.locate(&path);
        info!(path = %path, public_id = %location.public_id, "Deleting file");

        let result = match self.fetch(&location).await {
            Ok(_) => {
                self.api
                    .destroy(
                        &location.public_id,
                        &DestroyOptions {
                            resource_type: location.resource_type,
                            invalidate: true,
                        },
                    )
                    .await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                debug!(path = %path, "File already absent");
                Ok(())
            }
            Err(source) => Err(FilesystemError::UnableToDeleteFile {
                path: path.to_string(),
                source,
            }),
        }
    }

    async fn delete_directory(&self, path: &str) -> Result<(), FilesystemError> {
        let path = Self::parse(path)?;
        let remote = self.prefixer.prefix_path(&path);
        if remote.is_empty() {
            return Err(FilesystemError::UnsupportedOperation {
                operation: "delete directory",
                path: path.to_string(),
                reason: "the filesystem root cannot be deleted".to_string(),
            });
        }
        info!(path = %path, folder = %remote, "Deleting directory");

        let to_delete_error = |source: AssetApiError| FilesystemError::UnableToDeleteDirectory {
            path: path.to_string(),
            source,
        };

        // Collect first so deletions do not shift the pages being read.
        let files: Vec<AssetResource> = self
            .lister()
            .files(remote.clone(), true)
            .try_collect()
            .await
            .map_err(to_delete_error)?;

        for resource in &files {
            let options = DestroyOptions {
                resource_type: resource.resource_type,
                invalidate: true,
            };
            match self.api.destroy(&resource.public_id, &options).await {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {
                    debug!(public_id = %resource.public_id, "Asset already absent");
                }
                Err(e) => return Err(to_delete_error(e)),
            }
        }

        match self.api.delete_folder(&remote).await {
            Ok(()) => {
                info!(path = %path, files = files.len(), "Directory deleted");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                warn!(path = %path, folder = %remote, "Remote folder did not exist");
                Ok(())
            }
            Err(e) => Err(to_delete_error(e)),
        }
    }

    async fn create_directory(&self, path: &str) -> Result<(), FilesystemError> {
        let path = Self::parse(path)?;
        let remote = self.prefixer.prefix_path(&path);
        if remote.is_empty() {
            return Ok(());
        }
        info!(path = %path, folder = %remote, "Creating directory");

        self.api
            .create_folder(&remote)
            .await
            .map_err(|source| FilesystemError::UnableToCreateDirectory {
                path: path.to_string(),
                source,
            })
    }

    async fn set_visibility(
        &self,
        path: &str,
        visibility: Visibility,
    ) -> Result<(), FilesystemError> {
        debug!(path, %visibility, "CloudinaryAdapter::set_visibility");
        Err(FilesystemError::UnsupportedOperation {
            operation: "set visibility",
            path: path.to_string(),
            reason: VISIBILITY_UNSUPPORTED.to_string(),
        })
    }

    async fn visibility(&self, path: &str) -> Result<FileAttributes, FilesystemError> {
        let (path, _) = self.metadata_source(path, MetadataField::Visibility).await?;
        Ok(FileAttributes::new(path.as_str()).with_visibility(Visibility::Public))
    }

    async fn mime_type(&self, path: &str) -> Result<FileAttributes, FilesystemError> {
        let (path, _) = self.metadata_source(path, MetadataField::MimeType).await?;
        match self.detector.detect_from_path(path.as_str()) {
            Some(mime_type) => Ok(FileAttributes::new(path.as_str()).with_mime_type(mime_type)),
            None => Err(FilesystemError::UnableToRetrieveMetadata {
                path: path.to_string(),
                field: MetadataField::MimeType,
                reason: "no MIME type could be detected".to_string(),
                source: None,
            }),
        }
    }

    async fn last_modified(&self, path: &str) -> Result<FileAttributes, FilesystemError> {
        let (path, resource) = self
            .metadata_source(path, MetadataField::LastModified)
            .await?;
        match resource.created_at {
            Some(created_at) => {
                Ok(FileAttributes::new(path.as_str()).with_last_modified(created_at))
            }
            None => Err(FilesystemError::UnableToRetrieveMetadata {
                path: path.to_string(),
                field: MetadataField::LastModified,
                reason: "the asset carries no creation time".to_string(),
                source: None,
            }),
        }
    }

    async fn file_size(&self, path: &str) -> Result<FileAttributes, FilesystemError> {
        let (path, resource) = self.metadata_source(path, MetadataField::FileSize).await?;
        Ok(FileAttributes::new(path.as_str()).with_file_size(resource.bytes))
    }

    fn list_contents<'a>(&'a self, path: &str, deep: bool) -> ListingStream<'a> {
        let path = match Self::parse(path) {
            Ok(path) => path,
            Err(e) => return stream::once(async move { Err(e) }).boxed(),
        };
        debug!(path = %path, deep, "CloudinaryAdapter::list_contents");

        let remote = self.prefixer.prefix_path(&path);
        self.lister()
            .list_contents(remote, deep)
            .map_err(move |source| FilesystemError::UnableToListContents {
                path: path.to_string(),
                deep,
                source,
            })
            .boxed()
    }

    async fn move_file(&self, source: &str, destination: &str) -> Result<(), FilesystemError> {
        let source = Self::parse(source)?;
        let destination = Self::parse(destination)?;
        let from = self.locate(&source);
        let to = self.locate(&destination);

        if from == to {
            debug!(path = %source, "Source and destination are the same location");
            return Ok(());
        }

        let to_move_error = |source_error: AssetApiError| FilesystemError::UnableToMove {
            from: source.to_string(),
            to: destination.to_string(),
            source: source_error,
        };

        // A same-named asset in another folder is not the source.
        self.fetch(&from).await.map_err(to_move_error)?;

        let result = if from.public_id == to.public_id {
            info!(
                from = %source,
                to = %destination,
                public_id = %from.public_id,
                "Moving file to another asset folder"
            );
            self.api
                .update(
                    &from.public_id,
                    &UpdateOptions {
                        resource_type: from.resource_type,
                        asset_folder: to.folder.clone(),
                    },
                )
                .await
        } else {
            info!(
                from = %source,
                to = %destination,
                from_public_id = %from.public_id,
                to_public_id = %to.public_id,
                "Renaming file"
            );
            self.api
                .rename(
                    &from.public_id,
                    &to.public_id,
                    &RenameOptions {
                        resource_type: from.resource_type,
                        asset_folder: to.folder.clone(),
                        overwrite: true,
                        invalidate: true,
                    },
                )
                .await
        };

        result.map(|_| ()).map_err(to_move_error)
    }

    async fn copy(&self, source: &str, destination: &str) -> Result<(), FilesystemError> {
        let source = Self::parse(source)?;
        let destination = Self::parse(destination)?;
        let from = self.locate(&source);
        let to = self.locate(&destination);
        info!(from = %source, to = %destination, "Copying file");

        if from.public_id == to.public_id && from.resource_type == to.resource_type {
            // Both paths name one remote asset; uploading would move it.
            return Err(FilesystemError::UnableToCopy {
                from: source.to_string(),
                to: destination.to_string(),
                reason: COPY_SAME_ASSET.to_string(),
                source: None,
            });
        }

        let to_copy_error = |e: AssetApiError| FilesystemError::UnableToCopy {
            from: source.to_string(),
            to: destination.to_string(),
            reason: e.to_string(),
            source: Some(e),
        };

        let url = self.delivery_url(&from).await.map_err(to_copy_error)?;
        self.api
            .upload(
                UploadSource::Url(url),
                &self.upload_options(&destination, &to),
            )
            .await
            .map_err(to_copy_error)?;
        Ok(())
    }

    async fn public_url(&self, path: &str) -> Result<String, FilesystemError> {
        let path = Self::parse(path)?;
        debug!(path = %path, "CloudinaryAdapter::public_url");
        let location = self.locate(&path);

        self.delivery_url(&location)
            .await
            .map_err(|source| FilesystemError::UnableToGeneratePublicUrl {
                path: path.to_string(),
                source,
            })
    }
}
