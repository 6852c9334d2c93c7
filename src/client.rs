//! HTTP client for the course-content store
//!
//! Implements [`ContentStore`] over the store's REST API. Every non-success
//! response is normalized into [`StoreError`] here, so nothing above this
//! layer inspects HTTP statuses or response bodies.

use crate::config::StorageConfig;
use crate::error::{Result, StoreError};
use crate::prerequisite::sort_by_prerequisite;
use crate::store::{ContentStore, MaterialLookup};
use crate::types::{Chapter, CreateMaterialInput, Material, SelectedFile, Unit, UnitDraft};
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Manifest returned by the blob endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobManifest {
    pub blob_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_cid: Option<String>,
    pub mime_type: String,
    pub total_size: u64,
}

/// List response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub total: Option<u64>,
}

/// HTTP client for the course-content store
///
/// # Example
///
/// ```rust,no_run
/// use lamad_curriculum::{StorageClient, StorageConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = StorageClient::new(StorageConfig {
///     base_url: "http://localhost:8090".into(),
///     ..Default::default()
/// })?;
///
/// // Units of a chapter in prerequisite order
/// let units = client.list_units("chapter-1").await?;
/// # Ok(())
/// # }
/// ```
pub struct StorageClient {
    config: StorageConfig,
    client: Client,
}

impl StorageClient {
    /// Create a new storage client
    pub fn new(config: StorageConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref api_key) = config.api_key {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|_| StoreError::Unauthorized("API key is not a valid header value".into()))?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    // ==================== Chapters & Units ====================

    /// Chapters of a course, in prerequisite order
    pub async fn list_chapters(&self, course_id: &str) -> Result<Vec<Chapter>> {
        let url = format!(
            "{}?course_id={}",
            self.db_url("chapters"),
            urlencoding::encode(course_id)
        );

        let response = self.client.get(&url).send().await?;
        let list: ListResponse<Chapter> = self.handle_response(response).await?;
        Ok(sort_by_prerequisite(list.items))
    }

    /// Units of a chapter, in prerequisite order
    pub async fn list_units(&self, chapter_id: &str) -> Result<Vec<Unit>> {
        let url = format!(
            "{}?chapter_id={}",
            self.db_url("units"),
            urlencoding::encode(chapter_id)
        );

        let response = self.client.get(&url).send().await?;
        let list: ListResponse<Unit> = self.handle_response(response).await?;
        Ok(sort_by_prerequisite(list.items))
    }

    // ==================== Blob API ====================

    /// Store a blob
    pub async fn put_blob(&self, data: &[u8], mime_type: &str) -> Result<BlobManifest> {
        let url = format!("{}/blob/", self.config.base_url);

        let response = self
            .client
            .put(&url)
            .header(header::CONTENT_TYPE, mime_type)
            .body(data.to_vec())
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Public URL of a stored blob
    pub fn blob_url(&self, blob_hash: &str) -> String {
        format!(
            "{}/blob/{}",
            self.config.base_url,
            urlencoding::encode(blob_hash)
        )
    }

    // ==================== Helper Methods ====================

    fn db_url(&self, collection: &str) -> String {
        format!(
            "{}/db/{}/{}",
            self.config.base_url, self.config.app_id, collection
        )
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::from_status(status.as_u16(), body));
        }

        let body = response.json().await?;
        Ok(body)
    }
}

#[async_trait]
impl MaterialLookup for StorageClient {
    async fn lookup_material(&self, id: &str) -> Result<Material> {
        let url = format!(
            "{}/{}",
            self.db_url("materials"),
            urlencoding::encode(id)
        );

        let response = self.client.get(&url).send().await?;
        self.handle_response(response).await
    }
}

#[async_trait]
impl ContentStore for StorageClient {
    async fn create_unit(&self, draft: &UnitDraft) -> Result<Unit> {
        let response = self
            .client
            .post(self.db_url("units"))
            .header(header::CONTENT_TYPE, "application/json")
            .json(draft)
            .send()
            .await?;

        self.handle_response(response).await
    }

    async fn upload_material_file(&self, file: &SelectedFile) -> Result<String> {
        let manifest = self.put_blob(&file.data, file.content_type()).await?;
        tracing::debug!(
            file = %file.name,
            blob_hash = %manifest.blob_hash,
            size = manifest.total_size,
            "Material file stored"
        );
        Ok(self.blob_url(&manifest.blob_hash))
    }

    async fn create_material(&self, input: CreateMaterialInput) -> Result<Material> {
        let response = self
            .client
            .post(self.db_url("materials"))
            .header(header::CONTENT_TYPE, "application/json")
            .json(&input)
            .send()
            .await?;

        self.handle_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> StorageClient {
        StorageClient::new(StorageConfig {
            base_url: "http://store.test".into(),
            app_id: "lamad".into(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_urls() {
        let client = client();
        assert_eq!(client.db_url("units"), "http://store.test/db/lamad/units");
        assert_eq!(client.blob_url("sha256-ab cd"), "http://store.test/blob/sha256-ab%20cd");
    }

    #[test]
    fn test_invalid_api_key_rejected() {
        let result = StorageClient::new(StorageConfig {
            api_key: Some("bad\nkey".into()),
            ..Default::default()
        });
        assert!(matches!(result, Err(StoreError::Unauthorized(_))));
    }

    #[test]
    fn test_list_response_decodes() {
        let list: ListResponse<Unit> = serde_json::from_str(
            r#"{"items": [{"id": "u1", "title": "Greetings", "status": "ACTIVE", "chapter_id": "c1"}]}"#,
        )
        .unwrap();
        assert_eq!(list.items.len(), 1);
        assert_eq!(list.items[0].status, crate::types::UnitStatus::Active);
        assert!(list.total.is_none());
    }
}
