//! Shared test helpers for cloudfs-cloudinary integration tests
//!
//! Two kinds of backends:
//! - a wiremock server standing in for the Cloudinary HTTP API, used to
//!   check request building and response parsing in [`CloudinaryClient`]
//! - [`InMemoryAssetApi`], an `IAssetApi` fake with the observable behaviour
//!   of a Cloudinary account (both folder modes, placeholders, cursor
//!   pagination), used to exercise the adapter verbs

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use futures_util::stream::{self, StreamExt};
use wiremock::MockServer;

use cloudfs_cloudinary::{CloudinaryAdapter, CloudinaryClient};
use cloudfs_core::domain::{AssetApiError, FolderMode, StorageAttributes};
use cloudfs_core::ports::{
    AssetResource, ByteStream, DestroyOptions, FolderEntry, IAssetApi, IFilesystemAdapter,
    Page, PageRequest, RenameOptions, ResourceType, UpdateOptions, UploadOptions, UploadSource,
};

// ============================================================================
// wiremock helpers
// ============================================================================

pub const CLOUD_NAME: &str = "demo";
pub const API_KEY: &str = "test-key";
pub const API_SECRET: &str = "test-secret";

/// Starts a mock server and returns a client pointing at it
pub async fn setup_cloudinary_mock() -> (MockServer, CloudinaryClient) {
    let server = MockServer::start().await;
    let client = CloudinaryClient::with_base_url(
        format!("{}/{CLOUD_NAME}", server.uri()),
        API_KEY,
        API_SECRET,
    );
    (server, client)
}

/// Resource record as returned by the Admin and Upload APIs
pub fn resource_json(
    public_id: &str,
    resource_type: &str,
    format: &str,
    bytes: u64,
) -> serde_json::Value {
    serde_json::json!({
        "asset_id": "b5e6d2b39ba3e0869d67141ba7dba6cf",
        "public_id": public_id,
        "format": format,
        "version": 1719304891,
        "resource_type": resource_type,
        "type": "upload",
        "created_at": "2024-06-25T08:41:31Z",
        "bytes": bytes,
        "asset_folder": "",
        "url": format!("http://res.cloudinary.com/demo/{resource_type}/upload/v1719304891/{public_id}"),
        "secure_url": format!("https://res.cloudinary.com/demo/{resource_type}/upload/v1719304891/{public_id}"),
    })
}

// ============================================================================
// In-memory Cloudinary account
// ============================================================================

const DELIVERY_HOST: &str = "https://res.cloudinary.test/demo";

#[derive(Debug, Clone)]
struct StoredAsset {
    resource: AssetResource,
    content: Vec<u8>,
}

#[derive(Debug, Default)]
struct AccountState {
    assets: BTreeMap<(&'static str, String), StoredAsset>,
    folders: BTreeSet<String>,
    clock: i64,
    calls: Vec<String>,
    failing: BTreeSet<&'static str>,
}

impl AccountState {
    fn record(&mut self, call: String) {
        self.calls.push(call);
    }

    fn check_failure(&self, operation: &'static str) -> Result<(), AssetApiError> {
        if self.failing.contains(operation) {
            Err(AssetApiError::Server(format!("{operation}: injected failure")))
        } else {
            Ok(())
        }
    }

    fn add_folder(&mut self, path: &str) {
        let mut current = String::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(segment);
            self.folders.insert(current.clone());
        }
    }

    fn tick(&mut self) -> chrono::DateTime<Utc> {
        self.clock += 1;
        Utc.timestamp_opt(1_700_000_000 + self.clock, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

/// Fake Cloudinary account
///
/// Assets are keyed by resource type and public ID. Uploads register their
/// folder (and ancestors), like the real service does. Listing cursors are
/// offsets into the sorted result set.
pub struct InMemoryAssetApi {
    mode: FolderMode,
    state: Mutex<AccountState>,
}

fn dirname(public_id: &str) -> String {
    public_id
        .rsplit_once('/')
        .map(|(dir, _)| dir.to_string())
        .unwrap_or_default()
}

fn extension(name: &str) -> Option<String> {
    let base = name.rsplit('/').next().unwrap_or(name);
    base.rsplit_once('.').map(|(_, ext)| ext.to_string())
}

fn delivery_url(resource_type: ResourceType, public_id: &str) -> String {
    format!("{DELIVERY_HOST}/{resource_type}/upload/{public_id}")
}

fn paged<T: Clone>(items: Vec<T>, page: &PageRequest) -> Page<T> {
    let offset: usize = page
        .next_cursor
        .as_deref()
        .and_then(|cursor| cursor.parse().ok())
        .unwrap_or(0);
    let end = (offset + page.max_results as usize).min(items.len());
    let slice = items.get(offset..end).map(<[T]>::to_vec).unwrap_or_default();
    Page {
        items: slice,
        next_cursor: (end < items.len()).then(|| end.to_string()),
    }
}

impl InMemoryAssetApi {
    pub fn new(mode: FolderMode) -> Self {
        Self {
            mode,
            state: Mutex::new(AccountState::default()),
        }
    }

    /// Makes every call to `operation` fail with a server error
    pub fn fail_on(&self, operation: &'static str) {
        self.state.lock().unwrap().failing.insert(operation);
    }

    /// Every call made so far, as `operation arg...` strings
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of calls whose log line starts with `prefix`
    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// The stored record for an asset, if any
    pub fn stored(&self, resource_type: ResourceType, public_id: &str) -> Option<AssetResource> {
        self.state
            .lock()
            .unwrap()
            .assets
            .get(&(resource_type.as_str(), public_id.to_string()))
            .map(|asset| asset.resource.clone())
    }

    pub fn asset_count(&self) -> usize {
        self.state.lock().unwrap().assets.len()
    }

    pub fn has_folder(&self, path: &str) -> bool {
        self.state.lock().unwrap().folders.contains(path)
    }

    /// Stores a zero-byte placeholder, as left behind by the media library
    pub fn insert_placeholder(&self, resource_type: ResourceType, public_id: &str, folder: &str) {
        let mut state = self.state.lock().unwrap();
        state.add_folder(folder);
        let created_at = state.tick();
        let resource = AssetResource {
            public_id: public_id.to_string(),
            resource_type,
            format: None,
            bytes: 0,
            created_at: Some(created_at),
            secure_url: Some(delivery_url(resource_type, public_id)),
            asset_folder: (self.mode == FolderMode::Dynamic).then(|| folder.to_string()),
            folder: (self.mode == FolderMode::Fixed).then(|| folder.to_string()),
            placeholder: true,
        };
        state.assets.insert(
            (resource_type.as_str(), public_id.to_string()),
            StoredAsset {
                resource,
                content: Vec::new(),
            },
        );
    }

    fn folder_of(&self, asset: &StoredAsset) -> String {
        match self.mode {
            FolderMode::Dynamic => asset.resource.asset_folder.clone().unwrap_or_default(),
            FolderMode::Fixed => dirname(&asset.resource.public_id),
        }
    }
}

#[async_trait::async_trait]
impl IAssetApi for InMemoryAssetApi {
    async fn upload(
        &self,
        source: UploadSource,
        options: &UploadOptions,
    ) -> Result<AssetResource, AssetApiError> {
        let mut state = self.state.lock().unwrap();
        state.record(format!("upload {}", options.public_id));
        state.check_failure("upload")?;

        let content = match source {
            UploadSource::Bytes(data) => data,
            UploadSource::Url(url) => state
                .assets
                .values()
                .find(|asset| asset.resource.secure_url.as_deref() == Some(url.as_str()))
                .map(|asset| asset.content.clone())
                .ok_or_else(|| AssetApiError::BadRequest(format!("cannot fetch {url}")))?,
        };

        let key = (options.resource_type.as_str(), options.public_id.clone());
        if !options.overwrite && state.assets.contains_key(&key) {
            return Err(AssetApiError::BadRequest(format!(
                "{} already exists",
                options.public_id
            )));
        }

        let format = match options.resource_type {
            ResourceType::Raw => None,
            _ => options.filename.as_deref().and_then(extension),
        };
        let (asset_folder, folder) = match self.mode {
            FolderMode::Dynamic => (Some(options.asset_folder.clone().unwrap_or_default()), None),
            FolderMode::Fixed => (None, Some(dirname(&options.public_id))),
        };
        if let Some(path) = asset_folder.as_ref().or(folder.as_ref()) {
            let path = path.clone();
            state.add_folder(&path);
        }

        let created_at = state.tick();
        let resource = AssetResource {
            public_id: options.public_id.clone(),
            resource_type: options.resource_type,
            format,
            bytes: content.len() as u64,
            created_at: Some(created_at),
            secure_url: Some(delivery_url(options.resource_type, &options.public_id)),
            asset_folder,
            folder,
            placeholder: false,
        };
        state.assets.insert(
            key,
            StoredAsset {
                resource: resource.clone(),
                content,
            },
        );
        Ok(resource)
    }

    async fn rename(
        &self,
        from_public_id: &str,
        to_public_id: &str,
        options: &RenameOptions,
    ) -> Result<AssetResource, AssetApiError> {
        let mut state = self.state.lock().unwrap();
        state.record(format!("rename {from_public_id} {to_public_id}"));
        state.check_failure("rename")?;

        let type_name = options.resource_type.as_str();
        let to_key = (type_name, to_public_id.to_string());
        if !options.overwrite && state.assets.contains_key(&to_key) {
            return Err(AssetApiError::BadRequest(format!("{to_public_id} already exists")));
        }
        let mut asset = state
            .assets
            .remove(&(type_name, from_public_id.to_string()))
            .ok_or_else(|| AssetApiError::NotFound(from_public_id.to_string()))?;

        asset.resource.public_id = to_public_id.to_string();
        asset.resource.secure_url = Some(delivery_url(options.resource_type, to_public_id));
        match self.mode {
            FolderMode::Dynamic => {
                if let Some(folder) = &options.asset_folder {
                    asset.resource.asset_folder = Some(folder.clone());
                    state.add_folder(folder);
                }
            }
            FolderMode::Fixed => {
                let folder = dirname(to_public_id);
                state.add_folder(&folder);
                asset.resource.folder = Some(folder);
            }
        }

        let resource = asset.resource.clone();
        state.assets.insert(to_key, asset);
        Ok(resource)
    }

    async fn update(
        &self,
        public_id: &str,
        options: &UpdateOptions,
    ) -> Result<AssetResource, AssetApiError> {
        let mut state = self.state.lock().unwrap();
        state.record(format!("update {public_id}"));
        state.check_failure("update")?;

        let key = (options.resource_type.as_str(), public_id.to_string());
        let folder = options.asset_folder.clone();
        if let Some(folder) = &folder {
            state.add_folder(folder);
        }
        let asset = state
            .assets
            .get_mut(&key)
            .ok_or_else(|| AssetApiError::NotFound(public_id.to_string()))?;
        if folder.is_some() {
            asset.resource.asset_folder = folder;
        }
        Ok(asset.resource.clone())
    }

    async fn destroy(&self, public_id: &str, options: &DestroyOptions) -> Result<(), AssetApiError> {
        let mut state = self.state.lock().unwrap();
        state.record(format!("destroy {public_id}"));
        state.check_failure("destroy")?;

        state
            .assets
            .remove(&(options.resource_type.as_str(), public_id.to_string()))
            .map(|_| ())
            .ok_or_else(|| AssetApiError::NotFound(public_id.to_string()))
    }

    async fn asset(
        &self,
        public_id: &str,
        resource_type: ResourceType,
    ) -> Result<AssetResource, AssetApiError> {
        let mut state = self.state.lock().unwrap();
        state.record(format!("asset {public_id}"));
        state.check_failure("asset")?;

        state
            .assets
            .get(&(resource_type.as_str(), public_id.to_string()))
            .map(|asset| asset.resource.clone())
            .ok_or_else(|| AssetApiError::NotFound(public_id.to_string()))
    }

    async fn list_assets(
        &self,
        resource_type: ResourceType,
        prefix: &str,
        page: &PageRequest,
    ) -> Result<Page<AssetResource>, AssetApiError> {
        let mut state = self.state.lock().unwrap();
        state.record(format!(
            "list_assets {resource_type} {prefix} {}",
            page.next_cursor.as_deref().unwrap_or("-")
        ));
        state.check_failure("list_assets")?;

        let matching: Vec<AssetResource> = state
            .assets
            .iter()
            .filter(|((type_name, public_id), _)| {
                *type_name == resource_type.as_str() && public_id.starts_with(prefix)
            })
            .map(|(_, asset)| asset.resource.clone())
            .collect();
        Ok(paged(matching, page))
    }

    async fn assets_by_asset_folder(
        &self,
        asset_folder: &str,
        page: &PageRequest,
    ) -> Result<Page<AssetResource>, AssetApiError> {
        let mut state = self.state.lock().unwrap();
        state.record(format!(
            "by_asset_folder {asset_folder} {}",
            page.next_cursor.as_deref().unwrap_or("-")
        ));
        state.check_failure("assets_by_asset_folder")?;

        let mut matching: Vec<AssetResource> = state
            .assets
            .values()
            .filter(|asset| self.folder_of(asset) == asset_folder)
            .map(|asset| asset.resource.clone())
            .collect();
        matching.sort_by(|a, b| a.public_id.cmp(&b.public_id));
        Ok(paged(matching, page))
    }

    async fn root_folders(&self, page: &PageRequest) -> Result<Page<FolderEntry>, AssetApiError> {
        let mut state = self.state.lock().unwrap();
        state.record("root_folders".to_string());
        state.check_failure("root_folders")?;

        let folders: Vec<FolderEntry> = state
            .folders
            .iter()
            .filter(|path| !path.contains('/'))
            .map(|path| FolderEntry {
                name: path.clone(),
                path: path.clone(),
            })
            .collect();
        Ok(paged(folders, page))
    }

    async fn sub_folders(
        &self,
        path: &str,
        page: &PageRequest,
    ) -> Result<Page<FolderEntry>, AssetApiError> {
        let mut state = self.state.lock().unwrap();
        state.record(format!("sub_folders {path}"));
        state.check_failure("sub_folders")?;

        if !state.folders.contains(path) {
            return Err(AssetApiError::NotFound(path.to_string()));
        }
        let folders: Vec<FolderEntry> = state
            .folders
            .iter()
            .filter(|candidate| dirname(candidate) == path)
            .map(|candidate| FolderEntry {
                name: candidate.rsplit('/').next().unwrap_or(candidate).to_string(),
                path: candidate.clone(),
            })
            .collect();
        Ok(paged(folders, page))
    }

    async fn create_folder(&self, path: &str) -> Result<(), AssetApiError> {
        let mut state = self.state.lock().unwrap();
        state.record(format!("create_folder {path}"));
        state.check_failure("create_folder")?;
        state.add_folder(path);
        Ok(())
    }

    async fn delete_folder(&self, path: &str) -> Result<(), AssetApiError> {
        let mut state = self.state.lock().unwrap();
        state.record(format!("delete_folder {path}"));
        state.check_failure("delete_folder")?;

        if !state.folders.contains(path) {
            return Err(AssetApiError::NotFound(path.to_string()));
        }
        let nested = format!("{path}/");
        let not_empty = state.assets.values().any(|asset| {
            let folder = self.folder_of(asset);
            folder == path || folder.starts_with(&nested)
        });
        if not_empty {
            return Err(AssetApiError::BadRequest(format!("Folder is not empty: {path}")));
        }
        state
            .folders
            .retain(|folder| folder != path && !folder.starts_with(&nested));
        Ok(())
    }

    async fn download(&self, url: &str) -> Result<ByteStream, AssetApiError> {
        let mut state = self.state.lock().unwrap();
        state.record(format!("download {url}"));
        state.check_failure("download")?;

        let content = state
            .assets
            .values()
            .find(|asset| asset.resource.secure_url.as_deref() == Some(url))
            .map(|asset| asset.content.clone())
            .ok_or_else(|| AssetApiError::NotFound(url.to_string()))?;

        // Two chunks, so readers have to reassemble the body.
        let middle = content.len() / 2;
        let chunks = vec![
            Ok(bytes::Bytes::copy_from_slice(&content[..middle])),
            Ok(bytes::Bytes::copy_from_slice(&content[middle..])),
        ];
        Ok(stream::iter(chunks).boxed())
    }
}

// ============================================================================
// Adapter helpers
// ============================================================================

/// An adapter over a fresh in-memory account
pub fn setup_adapter(mode: FolderMode) -> (Arc<InMemoryAssetApi>, CloudinaryAdapter) {
    let api = Arc::new(InMemoryAssetApi::new(mode));
    let adapter = CloudinaryAdapter::new(api.clone()).with_folder_mode(mode);
    (api, adapter)
}

/// Collects a listing into `(path, is_file)` pairs, in stream order
pub async fn list(adapter: &CloudinaryAdapter, path: &str, deep: bool) -> Vec<(String, bool)> {
    adapter
        .list_contents(path, deep)
        .map(|entry| {
            let entry: StorageAttributes = entry.expect("listing failed");
            (entry.path().to_string(), entry.is_file())
        })
        .collect()
        .await
}

/// Collects a listing into sorted `(path, is_file)` pairs
pub async fn list_sorted(
    adapter: &CloudinaryAdapter,
    path: &str,
    deep: bool,
) -> Vec<(String, bool)> {
    let mut entries = list(adapter, path, deep).await;
    entries.sort();
    entries
}

pub fn file(path: &str) -> (String, bool) {
    (path.to_string(), true)
}

pub fn dir(path: &str) -> (String, bool) {
    (path.to_string(), false)
}
