//! Pinning Service Adapter
//!
//! Implements the `BlobStore` port against an IPFS pinning service
//! (`pinFileToIPFS` multipart upload, bearer-token auth).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use shared_types::ContentId;
use tracing::{debug, warn};

use crate::config::RegistryConfig;
use crate::ports::{gateway_locator, BlobStore, BlobStoreError};

/// Upload response of the pinning service.
#[derive(Debug, Deserialize)]
pub struct PinResponse {
    #[serde(rename = "IpfsHash")]
    pub ipfs_hash: String,
    #[serde(rename = "PinSize", default)]
    pub pin_size: u64,
    #[serde(rename = "Timestamp", default)]
    pub timestamp: String,
}

/// HTTP pinning-service blob store.
pub struct PinningBlobStore {
    client: Client,
    api_url: String,
    api_token: Option<String>,
    gateway_base: String,
}

impl PinningBlobStore {
    pub fn new(
        api_url: impl Into<String>,
        api_token: Option<String>,
        gateway_base: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, BlobStoreError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| BlobStoreError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            api_url: api_url.into(),
            api_token,
            gateway_base: gateway_base.into(),
        })
    }

    pub fn from_config(config: &RegistryConfig) -> Result<Self, BlobStoreError> {
        Self::new(
            config.blob_api_url.clone(),
            config.blob_api_token.clone(),
            config.gateway_base.clone(),
            config.upload_timeout(),
        )
    }

    fn pin_url(&self) -> String {
        format!("{}/pinning/pinFileToIPFS", self.api_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl BlobStore for PinningBlobStore {
    async fn put(&self, bytes: Vec<u8>) -> Result<ContentId, BlobStoreError> {
        let size = bytes.len();
        let form = Form::new().part("file", Part::bytes(bytes).file_name("document"));

        let mut request = self.client.post(self.pin_url()).multipart(form);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                BlobStoreError::Transport(e.to_string())
            } else {
                BlobStoreError::Upload(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "pinning service refused upload");
            return Err(BlobStoreError::Upload(format!("{status}: {body}")));
        }

        let pinned: PinResponse = response
            .json()
            .await
            .map_err(|e| BlobStoreError::InvalidResponse(e.to_string()))?;

        let content_id = ContentId::new(pinned.ipfs_hash);
        if content_id.is_empty() {
            return Err(BlobStoreError::InvalidResponse(
                "empty content id".to_string(),
            ));
        }
        debug!(%content_id, size, pin_size = pinned.pin_size, "blob pinned");
        Ok(content_id)
    }

    fn locator_for(&self, content_id: &ContentId) -> String {
        gateway_locator(&self.gateway_base, content_id)
    }
}
