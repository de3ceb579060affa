//! Listing engine strategies against the in-memory account

use std::sync::Arc;

use futures_util::{StreamExt, TryStreamExt};

use cloudfs_cloudinary::listing::Lister;
use cloudfs_cloudinary::GuessMimeTypeDetector;
use cloudfs_core::domain::{AssetApiError, FolderMode, PathPrefixer};
use cloudfs_core::ports::{IAssetApi, IFilesystemAdapter, ResourceType};

use crate::common::{self, InMemoryAssetApi};

fn lister(api: &Arc<InMemoryAssetApi>, mode: FolderMode, page_size: u32) -> Lister {
    Lister::new(
        api.clone(),
        mode,
        PathPrefixer::default(),
        Arc::new(GuessMimeTypeDetector),
        page_size,
    )
}

#[tokio::test]
async fn test_folders_are_walked_depth_first() {
    let api = Arc::new(InMemoryAssetApi::new(FolderMode::Dynamic));
    for folder in ["b", "a/y", "a/x/deep", "c"] {
        api.create_folder(folder).await.unwrap();
    }

    let shallow: Vec<String> = lister(&api, FolderMode::Dynamic, 500)
        .folders(String::new(), false)
        .map_ok(|folder| folder.path)
        .try_collect()
        .await
        .unwrap();
    assert_eq!(shallow, vec!["a", "b", "c"]);

    let deep: Vec<String> = lister(&api, FolderMode::Dynamic, 1)
        .folders(String::new(), true)
        .map_ok(|folder| folder.path)
        .try_collect()
        .await
        .unwrap();
    assert_eq!(deep, vec!["a", "a/x", "a/x/deep", "a/y", "b", "c"]);
}

#[tokio::test]
async fn test_missing_folder_has_no_sub_folders() {
    let api = Arc::new(InMemoryAssetApi::new(FolderMode::Dynamic));

    let folders: Vec<_> = lister(&api, FolderMode::Dynamic, 10)
        .folders("nowhere".to_string(), true)
        .try_collect()
        .await
        .unwrap();

    assert!(folders.is_empty());
}

#[tokio::test]
async fn test_files_include_placeholders() {
    let (api, adapter) = common::setup_adapter(FolderMode::Dynamic);
    adapter.write("box/a.txt", b"a").await.unwrap();
    adapter.write("box/inner/b.txt", b"b").await.unwrap();
    api.insert_placeholder(ResourceType::Image, "empty", "box/inner");

    let mut ids: Vec<String> = lister(&api, FolderMode::Dynamic, 500)
        .files("box".to_string(), true)
        .map_ok(|resource| resource.public_id)
        .try_collect()
        .await
        .unwrap();
    ids.sort();

    assert_eq!(ids, vec!["a.txt", "b.txt", "empty"]);
}

#[tokio::test]
async fn test_files_by_prefix_keeps_direct_children_when_shallow() {
    let (api, adapter) = common::setup_adapter(FolderMode::Fixed);
    adapter.write("docs/a.txt", b"a").await.unwrap();
    adapter.write("docs/img.png", b"i").await.unwrap();
    adapter.write("docs/old/b.txt", b"b").await.unwrap();

    let shallow: Vec<String> = lister(&api, FolderMode::Fixed, 500)
        .files_by_prefix("docs".to_string(), false)
        .map_ok(|resource| resource.public_id)
        .try_collect()
        .await
        .unwrap();
    assert_eq!(shallow, vec!["docs/img", "docs/a.txt"]);

    let deep: Vec<String> = lister(&api, FolderMode::Fixed, 500)
        .files_by_prefix("docs".to_string(), true)
        .map_ok(|resource| resource.public_id)
        .try_collect()
        .await
        .unwrap();
    assert_eq!(deep, vec!["docs/img", "docs/a.txt", "docs/old/b.txt"]);
}

#[tokio::test]
async fn test_listing_stops_at_first_error() {
    let (api, adapter) = common::setup_adapter(FolderMode::Dynamic);
    adapter.write("docs/a.txt", b"a").await.unwrap();
    adapter.write("docs/sub/b.txt", b"b").await.unwrap();
    api.fail_on("sub_folders");

    let entries: Vec<_> = lister(&api, FolderMode::Dynamic, 500)
        .list_contents("docs".to_string(), true)
        .collect()
        .await;

    assert_eq!(entries.len(), 2);
    assert!(entries[0].as_ref().is_ok_and(|entry| entry.path() == "docs/a.txt"));
    assert!(matches!(entries[1], Err(AssetApiError::Server(_))));
}
