//! Pinata storage backend
//!
//! Uploads each file as a multipart form to the Pinata v3 files endpoint with
//! `network=public`, so the returned CID is retrievable from any IPFS gateway.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::{ContentStore, StorageError, UploadFile, UploadReceipt};
use crate::config::StorageConfig;
use crate::secrets::SecretManager;

pub struct PinataStore {
    upload_url: String,
    jwt_env: String,
    secrets: Arc<SecretManager>,
    client: reqwest::Client,
}

impl PinataStore {
    pub fn new(
        upload_url: impl Into<String>,
        jwt_env: impl Into<String>,
        secrets: Arc<SecretManager>,
        timeout: Duration,
    ) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::Network(format!("HTTP client: {}", e)))?;

        Ok(Self {
            upload_url: upload_url.into(),
            jwt_env: jwt_env.into(),
            secrets,
            client,
        })
    }

    /// Create a store from the `[storage]` config section
    pub fn from_config(
        config: &StorageConfig,
        secrets: Arc<SecretManager>,
    ) -> Result<Self, StorageError> {
        Self::new(
            config.upload_url.clone(),
            config.jwt_env.clone(),
            secrets,
            Duration::from_secs(config.timeout_secs),
        )
    }
}

#[async_trait]
impl ContentStore for PinataStore {
    fn name(&self) -> &str {
        "pinata"
    }

    async fn upload(&self, file: &UploadFile) -> Result<UploadReceipt, StorageError> {
        let jwt = self
            .secrets
            .get_secret(&self.jwt_env)
            .ok_or_else(|| StorageError::MissingCredential(self.jwt_env.clone()))?;

        let part = Part::bytes(file.content.clone().into_bytes())
            .file_name(file.name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| StorageError::Network(format!("Invalid content type: {}", e)))?;

        let form = Form::new()
            .text("network", "public")
            .text("name", file.name.clone())
            .part("file", part);

        let response = self
            .client
            .post(&self.upload_url)
            .bearer_auth(jwt.unsecure())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    StorageError::Timeout
                } else {
                    StorageError::Network(SecretManager::scrub(&e.to_string()))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = SecretManager::scrub(&response.text().await.unwrap_or_default());
            return Err(StorageError::Rejected {
                name: file.name.clone(),
                status,
                body,
            });
        }

        let envelope: PinataResponse = response
            .json()
            .await
            .map_err(|e| StorageError::InvalidResponse(e.to_string()))?;

        tracing::debug!("Pinned '{}' as {}", file.name, envelope.data.cid);

        Ok(envelope.data)
    }
}

/// Pinata v3 wraps the file record in a `data` envelope
#[derive(Debug, Deserialize)]
struct PinataResponse {
    data: UploadReceipt,
}
