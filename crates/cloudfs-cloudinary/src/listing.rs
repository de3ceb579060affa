//! Listing and traversal engine
//!
//! Synthesises a directory tree from Cloudinary's flat, paginated result
//! sets. Every listing is a lazy stream: a page is requested only when the
//! consumer has drained the previous one, and dropping the stream stops
//! further requests.
//!
//! ## Strategies
//!
//! - **Dynamic folders**: assets are listed per asset folder; folders come
//!   from the folder endpoints and, for deep listings, each discovered
//!   folder triggers its own asset listing.
//! - **Fixed folders**: assets are listed per resource type by public ID
//!   prefix, and shallow listings keep only the assets directly inside the
//!   directory.

use std::future::{self, Future};
use std::sync::Arc;

use async_stream::stream;
use cloudfs_core::domain::{AssetApiError, FolderMode, PathPrefixer, StorageAttributes};
use cloudfs_core::ports::{
    AssetResource, FolderEntry, IAssetApi, IMimeTypeDetector, Page, PageRequest, ResourceType,
};
use futures_util::stream::{self as futures_stream, BoxStream};
use futures_util::{StreamExt, TryStreamExt};

use crate::translator::{from_folder, from_resource};

/// Lazy stream of remote listing results
pub type ApiStream<T> = BoxStream<'static, Result<T, AssetApiError>>;

// ============================================================================
// Pagination
// ============================================================================

/// Follows a cursor-paginated listing until the remote returns no cursor
///
/// `fetch` receives the cursor of the next page (`None` for the first one).
/// `map` converts each entry, dropping it when it returns `None`. The stream
/// ends after the first error.
pub fn paginate<R, T, F, Fut, M>(mut fetch: F, mut map: M) -> ApiStream<T>
where
    F: FnMut(Option<String>) -> Fut + Send + 'static,
    Fut: Future<Output = Result<Page<R>, AssetApiError>> + Send + 'static,
    M: FnMut(R) -> Option<T> + Send + 'static,
    R: Send + 'static,
    T: Send + 'static,
{
    Box::pin(stream! {
        let mut cursor: Option<String> = None;
        loop {
            let page = match fetch(cursor.take()).await {
                Ok(page) => page,
                Err(e) => {
                    yield Err(e);
                    break;
                }
            };

            for item in page.items {
                if let Some(mapped) = map(item) {
                    yield Ok(mapped);
                }
            }

            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }
    })
}

/// Ends `stream` right after the first error it yields
pub fn until_first_error<T: Send + 'static>(mut stream: ApiStream<T>) -> ApiStream<T> {
    Box::pin(stream! {
        while let Some(item) = stream.next().await {
            let failed = item.is_err();
            yield item;
            if failed {
                break;
            }
        }
    })
}

/// Folder an asset lives in on a fixed-folder account
fn fixed_folder(resource: &AssetResource) -> String {
    match &resource.folder {
        Some(folder) => folder.clone(),
        None => resource
            .public_id
            .rsplit_once('/')
            .map(|(folder, _)| folder.to_string())
            .unwrap_or_default(),
    }
}

// ============================================================================
// Lister
// ============================================================================

/// Produces listings for one adapter configuration
///
/// Directories passed to the methods are remote paths (prefix applied),
/// `""` for the account root.
#[derive(Clone)]
pub struct Lister {
    api: Arc<dyn IAssetApi>,
    mode: FolderMode,
    prefixer: PathPrefixer,
    detector: Arc<dyn IMimeTypeDetector>,
    page_size: u32,
}

impl Lister {
    pub fn new(
        api: Arc<dyn IAssetApi>,
        mode: FolderMode,
        prefixer: PathPrefixer,
        detector: Arc<dyn IMimeTypeDetector>,
        page_size: u32,
    ) -> Self {
        Self {
            api,
            mode,
            prefixer,
            detector,
            page_size,
        }
    }

    /// Assets whose asset folder is exactly `folder`, placeholders included
    pub fn files_in_asset_folder(&self, folder: String) -> ApiStream<AssetResource> {
        let api = Arc::clone(&self.api);
        let page_size = self.page_size;
        paginate(
            move |cursor| {
                let api = Arc::clone(&api);
                let folder = folder.clone();
                async move {
                    api.assets_by_asset_folder(&folder, &PageRequest::new(page_size, cursor))
                        .await
                }
            },
            Some,
        )
    }

    /// Assets below `directory` by public ID prefix, one pass per resource type
    ///
    /// Shallow listings keep only assets directly inside `directory`.
    /// Placeholders are included.
    pub fn files_by_prefix(&self, directory: String, deep: bool) -> ApiStream<AssetResource> {
        let prefix = if directory.is_empty() {
            String::new()
        } else {
            format!("{directory}/")
        };

        let passes: Vec<ApiStream<AssetResource>> = ResourceType::ALL
            .into_iter()
            .map(|resource_type| {
                let api = Arc::clone(&self.api);
                let prefix = prefix.clone();
                let directory = directory.clone();
                let page_size = self.page_size;
                paginate(
                    move |cursor| {
                        let api = Arc::clone(&api);
                        let prefix = prefix.clone();
                        async move {
                            api.list_assets(
                                resource_type,
                                &prefix,
                                &PageRequest::new(page_size, cursor),
                            )
                            .await
                        }
                    },
                    move |resource: AssetResource| {
                        (deep || fixed_folder(&resource) == directory).then_some(resource)
                    },
                )
            })
            .collect();

        until_first_error(futures_stream::iter(passes).flatten().boxed())
    }

    /// Folders below `directory`, depth-first when `deep`
    ///
    /// A folder that does not exist has no sub-folders.
    pub fn folders(&self, directory: String, deep: bool) -> ApiStream<FolderEntry> {
        let api = Arc::clone(&self.api);
        let page_size = self.page_size;
        let folders = paginate(
            move |cursor| {
                let api = Arc::clone(&api);
                let directory = directory.clone();
                async move {
                    let request = PageRequest::new(page_size, cursor);
                    let page = if directory.is_empty() {
                        api.root_folders(&request).await
                    } else {
                        api.sub_folders(&directory, &request).await
                    };
                    match page {
                        Err(e) if e.is_not_found() => Ok(Page::last(Vec::new())),
                        other => other,
                    }
                }
            },
            Some,
        );

        if !deep {
            return folders;
        }

        let this = self.clone();
        let tree = folders
            .map_ok(move |folder| {
                let nested = this.folders(folder.path.clone(), true);
                futures_stream::once(future::ready(Ok(folder)))
                    .chain(nested)
                    .boxed()
            })
            .try_flatten()
            .boxed();
        until_first_error(tree)
    }

    /// Every asset below `directory` for the configured folder mode
    pub fn files(&self, directory: String, deep: bool) -> ApiStream<AssetResource> {
        match self.mode {
            FolderMode::Fixed => self.files_by_prefix(directory, deep),
            FolderMode::Dynamic => {
                let files = self.files_in_asset_folder(directory.clone());
                if !deep {
                    return files;
                }

                let this = self.clone();
                let nested = self
                    .folders(directory, true)
                    .map_ok(move |folder| this.files_in_asset_folder(folder.path))
                    .try_flatten();
                until_first_error(files.chain(nested).boxed())
            }
        }
    }

    /// Files and directories below `directory`
    ///
    /// Dynamic mode yields the directory's files, then each sub-folder
    /// followed (when `deep`) by its files. Fixed mode yields all files,
    /// then all folders. Placeholders never appear.
    pub fn list_contents(&self, directory: String, deep: bool) -> ApiStream<StorageAttributes> {
        let entries = match self.mode {
            FolderMode::Dynamic => {
                let files = self.file_entries(self.files_in_asset_folder(directory.clone()));

                let this = self.clone();
                let folders = self
                    .folders(directory, deep)
                    .map_ok(move |folder| {
                        let entry =
                            futures_stream::once(future::ready(Ok(this.directory_entry(&folder))));
                        if deep {
                            let files =
                                this.file_entries(this.files_in_asset_folder(folder.path));
                            entry.chain(files).boxed()
                        } else {
                            entry.boxed()
                        }
                    })
                    .try_flatten();

                files.chain(folders).boxed()
            }
            FolderMode::Fixed => {
                let files = self.file_entries(self.files_by_prefix(directory.clone(), deep));

                let this = self.clone();
                let folders = self
                    .folders(directory, deep)
                    .map_ok(move |folder| this.directory_entry(&folder));

                files.chain(folders).boxed()
            }
        };

        until_first_error(entries)
    }

    fn file_entries(&self, resources: ApiStream<AssetResource>) -> ApiStream<StorageAttributes> {
        let this = self.clone();
        resources
            .try_filter(|resource| future::ready(!resource.is_placeholder()))
            .map_ok(move |resource| {
                StorageAttributes::File(from_resource(
                    &resource,
                    this.mode,
                    &this.prefixer,
                    this.detector.as_ref(),
                ))
            })
            .boxed()
    }

    fn directory_entry(&self, folder: &FolderEntry) -> StorageAttributes {
        from_folder(folder, &self.prefixer).into()
    }
}
