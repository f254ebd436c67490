//! Object storage: upload, remove, and public URLs.

use serde::Deserialize;
use serde_json::json;

use crate::client::BackendClient;
use crate::error::BackendError;

/// Response body of a successful upload.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedObject {
    /// `{bucket}/{path}` as stored.
    #[serde(rename = "Key")]
    pub key: String,
}

#[derive(Debug, Clone)]
pub struct StorageClient {
    client: BackendClient,
}

impl StorageClient {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Upload `bytes` to `bucket/path`, overwriting any existing object.
    pub async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<UploadedObject, BackendError> {
        let path = path.trim_start_matches('/');
        tracing::debug!(bucket, path, size = bytes.len(), content_type, "Uploading object");

        let request = self
            .client
            .http()
            .post(self.object_url(bucket, path))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "true")
            .body(bytes);
        let response = self.client.authorize(request).send().await?;
        BackendClient::parse_response(response).await
    }

    /// Remove objects by path within `bucket`.
    pub async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), BackendError> {
        if paths.is_empty() {
            return Ok(());
        }
        let request = self
            .client
            .http()
            .delete(self.client.endpoint("storage", &format!("object/{bucket}")))
            .json(&json!({ "prefixes": paths }));
        let response = self.client.authorize(request).send().await?;
        BackendClient::ensure_success(response).await?;
        Ok(())
    }

    /// URL under which a public bucket serves `path`.
    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        self.client.endpoint(
            "storage",
            &format!("object/public/{bucket}/{}", path.trim_start_matches('/')),
        )
    }

    fn object_url(&self, bucket: &str, path: &str) -> String {
        self.client
            .endpoint("storage", &format!("object/{bucket}/{path}"))
    }
}
