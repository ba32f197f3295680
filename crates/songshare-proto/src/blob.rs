//! HTTP blob store for audio files.
//!
//! `PUT {endpoint}/objects/{key}` stores a blob; `POST {endpoint}/sign`
//! exchanges a key for a short-lived read URL.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::Session;
use crate::config::StorageConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::BlobGateway;

#[derive(Debug, Serialize)]
pub struct SignRequest<'a> {
    pub key: &'a str,
    /// Seconds.
    pub expires: u64,
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    url: String,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    key: Option<String>,
}

pub struct HttpBlobStore {
    client: reqwest::Client,
    endpoint: String,
    id_token: String,
}

/// `{endpoint}/objects/{key}` with a single separating slash.
pub fn object_url(endpoint: &str, key: &str) -> String {
    format!("{}/objects/{}", endpoint.trim_end_matches('/'), key)
}

pub fn sign_url(endpoint: &str) -> String {
    format!("{}/sign", endpoint.trim_end_matches('/'))
}

impl HttpBlobStore {
    pub fn new(config: &StorageConfig, session: &Session) -> GatewayResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            id_token: session.id_token.clone(),
        })
    }

    fn check(status: reqwest::StatusCode, body: &str) -> GatewayResult<()> {
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(GatewayError::Unauthorized(body.to_string()));
        }
        if !status.is_success() {
            return Err(GatewayError::Status {
                service: "storage",
                status: status.as_u16(),
                body: body.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl BlobGateway for HttpBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> GatewayResult<String> {
        let size = bytes.len();
        let response = self
            .client
            .put(object_url(&self.endpoint, key))
            .header("Authorization", &self.id_token)
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        Self::check(status, &text)?;
        debug!("storage: stored {} ({} bytes)", key, size);

        // Services may echo a normalised key; otherwise ours stands
        let stored = serde_json::from_str::<PutResponse>(&text)
            .ok()
            .and_then(|r| r.key)
            .unwrap_or_else(|| key.to_string());
        Ok(stored)
    }

    async fn signed_url(&self, key: &str, expires: Duration) -> GatewayResult<String> {
        let response = self
            .client
            .post(sign_url(&self.endpoint))
            .header("Authorization", &self.id_token)
            .json(&SignRequest {
                key,
                expires: expires.as_secs(),
            })
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        Self::check(status, &text)?;
        let signed: SignResponse = serde_json::from_str(&text)?;
        if signed.url.is_empty() {
            return Err(GatewayError::MissingData("url"));
        }
        Ok(signed.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_join_cleanly() {
        assert_eq!(
            object_url("https://blobs.example/", "k.mp3"),
            "https://blobs.example/objects/k.mp3"
        );
        assert_eq!(sign_url("https://blobs.example"), "https://blobs.example/sign");
    }

    #[test]
    fn sign_request_shape() {
        let body = serde_json::to_value(SignRequest {
            key: "k.mp3",
            expires: 60,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "key": "k.mp3", "expires": 60 }));
    }
}
