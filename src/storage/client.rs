//! HTTP client for the remote file store
//!
//! Endpoints used:
//! - `POST {base}/upload` multipart field `file`, answers `{id, url}`
//! - `GET {base}/files/{id}` raw file bytes (404 is `StorageError::NotFound`)
//! - `GET {base}/files?name=...` JSON array of `{id, url, name}`
//! - `DELETE {base}/files/{id}`
//!
//! Every request carries `Authorization: Bearer <api key>`. No retries.

use bytes::Bytes;
use reqwest::{header, multipart, Client, StatusCode};
use std::time::Duration;
use tracing::debug;

use super::error::{Result, StorageError};
use super::types::{BlobRef, FileMeta, StorageConfig, UploadedBlob};
use super::BlobStore;

/// reqwest-backed `BlobStore`
pub struct RemoteBlobClient {
    base_url: String,
    client: Client,
}

impl RemoteBlobClient {
    /// Create a new client; fails if the API key is not a valid header value
    pub fn new(config: StorageConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref api_key) = config.api_key {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| StorageError::Config(format!("Invalid API key: {}", e)))?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let mut builder = Client::builder().default_headers(headers);
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a reference to a fetchable URL
    pub fn resolve_url(&self, blob: &BlobRef) -> String {
        if blob.is_url() {
            blob.as_str().to_string()
        } else {
            format!(
                "{}/files/{}",
                self.base_url,
                urlencoding::encode(blob.as_str())
            )
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(StorageError::Server {
            status,
            message: body,
        })
    }
}

fn content_type_for(name: &str) -> &'static str {
    if name.ends_with(".json") {
        "application/json"
    } else {
        "application/octet-stream"
    }
}

#[async_trait::async_trait]
impl BlobStore for RemoteBlobClient {
    async fn upload(&self, name: &str, content: Bytes) -> Result<UploadedBlob> {
        let url = format!("{}/upload", self.base_url);
        let size = content.len();

        let part = multipart::Part::bytes(content.to_vec())
            .file_name(name.to_string())
            .mime_str(content_type_for(name))?;
        let form = multipart::Form::new().part("file", part);

        let response = self.client.post(&url).multipart(form).send().await?;
        let response = Self::check_status(response).await?;

        let text = response.text().await?;
        let uploaded: UploadedBlob = serde_json::from_str(&text)
            .map_err(|e| StorageError::InvalidResponse(format!("upload response: {}", e)))?;

        if uploaded.location().is_none() {
            return Err(StorageError::InvalidResponse(format!(
                "upload response has neither id nor url: {}",
                text
            )));
        }

        debug!(name, size, id = ?uploaded.id, url = ?uploaded.url, "Blob uploaded");
        Ok(uploaded)
    }

    async fn download(&self, blob: &BlobRef) -> Result<Bytes> {
        let url = self.resolve_url(blob);

        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound(blob.to_string()));
        }
        let response = Self::check_status(response).await?;

        Ok(response.bytes().await?)
    }

    async fn find_by_name(&self, name: &str) -> Result<Vec<FileMeta>> {
        let url = format!(
            "{}/files?name={}",
            self.base_url,
            urlencoding::encode(name)
        );

        let response = self.client.get(&url).send().await?;
        let response = Self::check_status(response).await?;

        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| StorageError::InvalidResponse(format!("file listing: {}", e)))
    }

    async fn delete(&self, blob: &BlobRef) -> Result<()> {
        let url = self.resolve_url(blob);

        let response = self.client.delete(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::check_status(response).await?;
        Ok(())
    }
}
