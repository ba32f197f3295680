//! Gateway traits — the seams between the controller and the managed backend.
//!
//! Implementations:
//! - [`crate::graphql::GraphQlGateway`] for [`DataGateway`]
//! - [`crate::blob::HttpBlobStore`] for [`BlobGateway`]
//! - [`crate::auth::CognitoAuth`] for [`AuthProvider`]

use std::time::Duration;

use async_trait::async_trait;

use crate::auth::Session;
use crate::error::GatewayResult;
use crate::song::{Song, SongInput};

/// Structured-data API holding the song records.
#[async_trait]
pub trait DataGateway: Send + Sync {
    /// All songs, in the order the service returns them.
    async fn list_songs(&self) -> GatewayResult<Vec<Song>>;

    /// Replace a record; returns the server's authoritative copy.
    async fn update_song(&self, input: SongInput) -> GatewayResult<Song>;

    async fn create_song(&self, input: SongInput) -> GatewayResult<Song>;
}

/// Blob storage holding the audio files.
#[async_trait]
pub trait BlobGateway: Send + Sync {
    /// Store `bytes` under `key`. Returns the key the service stored it under.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> GatewayResult<String>;

    /// A URL granting read access to `key` for `expires`.
    async fn signed_url(&self, key: &str, expires: Duration) -> GatewayResult<String>;
}

/// Identity provider gating the whole UI.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, username: &str, password: &str) -> GatewayResult<Session>;

    async fn sign_out(&self, session: &Session) -> GatewayResult<()>;
}
