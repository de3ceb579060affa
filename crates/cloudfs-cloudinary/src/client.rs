//! Cloudinary API client
//!
//! Provides a typed HTTP client for the Cloudinary Admin and Upload APIs and
//! implements the [`IAssetApi`] port on top of it.
//!
//! ## Authentication
//!
//! - Admin API calls (`/resources`, `/folders`) use HTTP basic auth with the
//!   API key and secret.
//! - Upload API calls (`upload`, `rename`, `destroy`) carry a `timestamp`,
//!   the `api_key` and a `signature` computed by [`crate::signature`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cloudfs_cloudinary::client::CloudinaryClient;
//! use cloudfs_core::ports::{IAssetApi, ResourceType};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = CloudinaryClient::new("demo", "api-key", "api-secret");
//! let asset = client.asset("sample", ResourceType::Image).await?;
//! println!("{:?}", asset.secure_url);
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use cloudfs_core::config::{CloudinaryConfig, SignatureAlgorithm};
use cloudfs_core::domain::AssetApiError;
use cloudfs_core::ports::{
    AssetResource, ByteStream, DestroyOptions, FolderEntry, IAssetApi, Page, PageRequest,
    RenameOptions, ResourceType, UpdateOptions, UploadOptions, UploadSource,
};
use futures_util::{StreamExt, TryStreamExt};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::signature;

/// Base URL of the Cloudinary API, without the cloud name
pub const DEFAULT_API_BASE_URL: &str = "https://api.cloudinary.com/v1_1";

/// Delivery type of every asset this client manages
const DELIVERY_TYPE: &str = "upload";

// ============================================================================
// Cloudinary API response types
// ============================================================================

/// Resource record returned by metadata, listing and upload calls
#[derive(Debug, Deserialize)]
struct ResourceResponse {
    public_id: String,
    resource_type: ResourceType,
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    bytes: u64,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    secure_url: Option<String>,
    #[serde(default)]
    asset_folder: Option<String>,
    #[serde(default)]
    folder: Option<String>,
    #[serde(default)]
    placeholder: bool,
}

impl From<ResourceResponse> for AssetResource {
    fn from(resource: ResourceResponse) -> Self {
        Self {
            public_id: resource.public_id,
            resource_type: resource.resource_type,
            // Raw assets report an empty format
            format: resource.format.filter(|format| !format.is_empty()),
            bytes: resource.bytes,
            created_at: resource.created_at,
            secure_url: resource.secure_url,
            asset_folder: resource.asset_folder,
            folder: resource.folder,
            placeholder: resource.placeholder,
        }
    }
}

/// One page of `/resources/...` results
#[derive(Debug, Deserialize)]
struct ResourcesResponse {
    #[serde(default)]
    resources: Vec<ResourceResponse>,
    #[serde(default)]
    next_cursor: Option<String>,
}

/// Folder entry in `/folders` results
#[derive(Debug, Deserialize)]
struct FolderResponse {
    name: String,
    path: String,
}

/// One page of `/folders` results
#[derive(Debug, Deserialize)]
struct FoldersResponse {
    #[serde(default)]
    folders: Vec<FolderResponse>,
    #[serde(default)]
    next_cursor: Option<String>,
}

/// Outcome reported by `destroy`
#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

/// Error envelope used by both APIs
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

// ============================================================================
// CloudinaryClient
// ============================================================================

/// HTTP client for the Cloudinary API
///
/// Wraps `reqwest::Client` with credentials and URL construction for one
/// cloud. Never retries; throttling surfaces as
/// [`AssetApiError::RateLimited`].
pub struct CloudinaryClient {
    /// The underlying HTTP client
    client: Client,
    /// API root including the cloud name
    base_url: String,
    api_key: String,
    api_secret: String,
    signature_algorithm: SignatureAlgorithm,
}

impl CloudinaryClient {
    /// Creates a client for `cloud_name` on the public Cloudinary endpoint
    pub fn new(
        cloud_name: impl AsRef<str>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self::with_base_url(
            format!("{DEFAULT_API_BASE_URL}/{}", cloud_name.as_ref()),
            api_key,
            api_secret,
        )
    }

    /// Creates a client with a custom API root (useful for testing)
    ///
    /// # Arguments
    /// * `base_url` - API root including the cloud name, e.g. `http://127.0.0.1:1234/demo`
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            signature_algorithm: SignatureAlgorithm::default(),
        }
    }

    /// Creates a client from the `cloudinary` configuration section
    pub fn from_config(config: &CloudinaryConfig) -> Self {
        Self::with_base_url(
            format!(
                "{}/{}",
                config.api_base_url.trim_end_matches('/'),
                config.cloud_name
            ),
            config.api_key.clone(),
            config.api_secret.clone(),
        )
        .with_signature_algorithm(config.signature_algorithm)
    }

    /// Sets the digest used for Upload API signatures
    pub fn with_signature_algorithm(mut self, algorithm: SignatureAlgorithm) -> Self {
        self.signature_algorithm = algorithm;
        self
    }

    /// Returns the API root including the cloud name
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds an API URL from path segments
    ///
    /// Each segment is percent-encoded on its own, so identifiers containing
    /// spaces, brackets or braces are addressed verbatim.
    pub fn endpoint<'s, I>(&self, segments: I) -> Result<Url, AssetApiError>
    where
        I: IntoIterator<Item = &'s str>,
    {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            AssetApiError::BadRequest(format!("Invalid API base URL '{}': {e}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                AssetApiError::BadRequest(format!(
                    "API base URL '{}' cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments.into_iter().filter(|segment| !segment.is_empty()));
        Ok(url)
    }

    /// Creates an Admin API request authenticated with basic auth
    pub fn admin_request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .basic_auth(&self.api_key, Some(&self.api_secret))
    }

    /// Adds `timestamp`, `signature` and `api_key` to Upload API parameters
    fn signed_params(
        &self,
        mut params: BTreeMap<&'static str, String>,
    ) -> BTreeMap<&'static str, String> {
        params.insert("timestamp", Utc::now().timestamp().to_string());
        let signature = signature::sign(&params, &self.api_secret, self.signature_algorithm);
        params.insert("signature", signature);
        params.insert("api_key", self.api_key.clone());
        params
    }

    async fn send(&self, request: RequestBuilder, target: &str) -> Result<Response, AssetApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| AssetApiError::Network(format!("{target}: {e}")))?;
        check_status(response, target).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        target: &str,
    ) -> Result<T, AssetApiError> {
        self.send(request, target)
            .await?
            .json::<T>()
            .await
            .map_err(|e| AssetApiError::InvalidResponse(format!("{target}: {e}")))
    }

    async fn resources_page(
        &self,
        url: Url,
        mut query: Vec<(&'static str, String)>,
        page: &PageRequest,
        target: &str,
    ) -> Result<Page<AssetResource>, AssetApiError> {
        query.extend(page_query(page));
        let response: ResourcesResponse = self
            .send_json(self.admin_request(Method::GET, url).query(&query), target)
            .await?;

        debug!(
            location = target,
            count = response.resources.len(),
            has_more = response.next_cursor.is_some(),
            "Fetched resources page"
        );
        Ok(Page {
            items: response.resources.into_iter().map(Into::into).collect(),
            next_cursor: response.next_cursor,
        })
    }

    async fn folders_page(
        &self,
        url: Url,
        page: &PageRequest,
        target: &str,
    ) -> Result<Page<FolderEntry>, AssetApiError> {
        let response: FoldersResponse = self
            .send_json(
                self.admin_request(Method::GET, url).query(&page_query(page)),
                target,
            )
            .await?;

        debug!(
            location = target,
            count = response.folders.len(),
            has_more = response.next_cursor.is_some(),
            "Fetched folders page"
        );
        Ok(Page {
            items: response
                .folders
                .into_iter()
                .map(|folder| FolderEntry {
                    name: folder.name,
                    path: folder.path,
                })
                .collect(),
            next_cursor: response.next_cursor,
        })
    }
}

fn page_query(page: &PageRequest) -> Vec<(&'static str, String)> {
    let mut query = vec![("max_results", page.max_results.to_string())];
    if let Some(cursor) = &page.next_cursor {
        query.push(("next_cursor", cursor.clone()));
    }
    query
}

/// Turns a non-success response into the matching [`AssetApiError`]
async fn check_status(response: Response, target: &str) -> Result<Response, AssetApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_retry_after);
    let message = match response.json::<ErrorResponse>().await {
        Ok(body) => body.error.message,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
    };

    debug!(
        location = target,
        status = status.as_u16(),
        %message,
        "Cloudinary request failed"
    );
    Err(error_for_status(status, target, message, retry_after))
}

/// Maps an HTTP error status to an [`AssetApiError`]
///
/// Cloudinary reports throttling as either 420 or 429.
pub(crate) fn error_for_status(
    status: StatusCode,
    target: &str,
    message: String,
    retry_after: Option<Duration>,
) -> AssetApiError {
    match status.as_u16() {
        404 => AssetApiError::NotFound(format!("{target}: {message}")),
        401 => AssetApiError::Unauthorized(message),
        403 => AssetApiError::Forbidden(message),
        420 | 429 => AssetApiError::RateLimited { retry_after },
        400..=499 => AssetApiError::BadRequest(format!("{target}: {message}")),
        code => AssetApiError::Server(format!("{target}: HTTP {code}: {message}")),
    }
}

/// Parses a `Retry-After` header given in seconds
fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

// ============================================================================
// IAssetApi implementation
// ============================================================================

#[async_trait::async_trait]
impl IAssetApi for CloudinaryClient {
    async fn upload(
        &self,
        source: UploadSource,
        options: &UploadOptions,
    ) -> Result<AssetResource, AssetApiError> {
        let url = self.endpoint([options.resource_type.as_str(), "upload"])?;

        let mut params = BTreeMap::new();
        params.insert("public_id", options.public_id.clone());
        params.insert("overwrite", options.overwrite.to_string());
        params.insert("invalidate", options.invalidate.to_string());
        if let Some(folder) = &options.asset_folder {
            params.insert("asset_folder", folder.clone());
        }

        let mut form = Form::new();
        for (key, value) in self.signed_params(params) {
            form = form.text(key, value);
        }
        let form = match source {
            UploadSource::Bytes(data) => {
                let file_name = options
                    .filename
                    .clone()
                    .unwrap_or_else(|| options.public_id.clone());
                debug!(
                    public_id = %options.public_id,
                    resource_type = %options.resource_type,
                    size = data.len(),
                    "Uploading asset content"
                );
                form.part("file", Part::bytes(data).file_name(file_name))
            }
            UploadSource::Url(remote) => {
                debug!(
                    public_id = %options.public_id,
                    resource_type = %options.resource_type,
                    source = %remote,
                    "Uploading asset from URL"
                );
                form.text("file", remote)
            }
        };

        let resource: ResourceResponse = self
            .send_json(self.client.post(url).multipart(form), &options.public_id)
            .await?;
        Ok(resource.into())
    }

    async fn rename(
        &self,
        from_public_id: &str,
        to_public_id: &str,
        options: &RenameOptions,
    ) -> Result<AssetResource, AssetApiError> {
        let url = self.endpoint([options.resource_type.as_str(), "rename"])?;

        let mut params = BTreeMap::new();
        params.insert("from_public_id", from_public_id.to_string());
        params.insert("to_public_id", to_public_id.to_string());
        params.insert("type", DELIVERY_TYPE.to_string());
        params.insert("overwrite", options.overwrite.to_string());
        params.insert("invalidate", options.invalidate.to_string());
        if let Some(folder) = &options.asset_folder {
            params.insert("asset_folder", folder.clone());
        }

        debug!(
            from = from_public_id,
            to = to_public_id,
            resource_type = %options.resource_type,
            "Renaming asset"
        );
        let resource: ResourceResponse = self
            .send_json(
                self.client.post(url).form(&self.signed_params(params)),
                from_public_id,
            )
            .await?;
        Ok(resource.into())
    }

    async fn update(
        &self,
        public_id: &str,
        options: &UpdateOptions,
    ) -> Result<AssetResource, AssetApiError> {
        let url = self.endpoint(
            ["resources", options.resource_type.as_str(), DELIVERY_TYPE]
                .into_iter()
                .chain(segments(public_id)),
        )?;

        let mut params = BTreeMap::new();
        if let Some(folder) = &options.asset_folder {
            params.insert("asset_folder", folder.clone());
        }

        debug!(public_id, asset_folder = ?options.asset_folder, "Updating asset");
        let resource: ResourceResponse = self
            .send_json(
                self.admin_request(Method::POST, url).form(&params),
                public_id,
            )
            .await?;
        Ok(resource.into())
    }

    async fn destroy(
        &self,
        public_id: &str,
        options: &DestroyOptions,
    ) -> Result<(), AssetApiError> {
        let url = self.endpoint([options.resource_type.as_str(), "destroy"])?;

        let mut params = BTreeMap::new();
        params.insert("public_id", public_id.to_string());
        params.insert("type", DELIVERY_TYPE.to_string());
        params.insert("invalidate", options.invalidate.to_string());

        debug!(public_id, resource_type = %options.resource_type, "Destroying asset");
        let response: DestroyResponse = self
            .send_json(
                self.client.post(url).form(&self.signed_params(params)),
                public_id,
            )
            .await?;

        match response.result.as_str() {
            "ok" => Ok(()),
            "not found" => Err(AssetApiError::NotFound(public_id.to_string())),
            other => Err(AssetApiError::InvalidResponse(format!(
                "{public_id}: unexpected destroy result '{other}'"
            ))),
        }
    }

    async fn asset(
        &self,
        public_id: &str,
        resource_type: ResourceType,
    ) -> Result<AssetResource, AssetApiError> {
        let url = self.endpoint(
            ["resources", resource_type.as_str(), DELIVERY_TYPE]
                .into_iter()
                .chain(segments(public_id)),
        )?;

        debug!(public_id, resource_type = %resource_type, "Fetching asset metadata");
        let resource: ResourceResponse = self
            .send_json(self.admin_request(Method::GET, url), public_id)
            .await?;
        Ok(resource.into())
    }

    async fn list_assets(
        &self,
        resource_type: ResourceType,
        prefix: &str,
        page: &PageRequest,
    ) -> Result<Page<AssetResource>, AssetApiError> {
        let url = self.endpoint(["resources", resource_type.as_str(), DELIVERY_TYPE])?;
        let mut query = Vec::new();
        if !prefix.is_empty() {
            query.push(("prefix", prefix.to_string()));
        }
        self.resources_page(url, query, page, prefix).await
    }

    async fn assets_by_asset_folder(
        &self,
        asset_folder: &str,
        page: &PageRequest,
    ) -> Result<Page<AssetResource>, AssetApiError> {
        let url = self.endpoint(["resources", "by_asset_folder"])?;
        let query = vec![("asset_folder", asset_folder.to_string())];
        self.resources_page(url, query, page, asset_folder).await
    }

    async fn root_folders(&self, page: &PageRequest) -> Result<Page<FolderEntry>, AssetApiError> {
        let url = self.endpoint(["folders"])?;
        self.folders_page(url, page, "/").await
    }

    async fn sub_folders(
        &self,
        path: &str,
        page: &PageRequest,
    ) -> Result<Page<FolderEntry>, AssetApiError> {
        let url = self.endpoint(["folders"].into_iter().chain(segments(path)))?;
        self.folders_page(url, page, path).await
    }

    async fn create_folder(&self, path: &str) -> Result<(), AssetApiError> {
        let url = self.endpoint(["folders"].into_iter().chain(segments(path)))?;
        debug!(path, "Creating folder");
        self.send(self.admin_request(Method::POST, url), path)
            .await?;
        Ok(())
    }

    async fn delete_folder(&self, path: &str) -> Result<(), AssetApiError> {
        let url = self.endpoint(["folders"].into_iter().chain(segments(path)))?;
        debug!(path, "Deleting folder");
        self.send(self.admin_request(Method::DELETE, url), path)
            .await?;
        Ok(())
    }

    async fn download(&self, url: &str) -> Result<ByteStream, AssetApiError> {
        debug!(url, "Downloading asset content");
        let response = self.send(self.client.get(url), url).await?;
        Ok(response
            .bytes_stream()
            .map_err(|e| AssetApiError::Network(e.to_string()))
            .boxed())
    }
}
