//! GraphQL data gateway (AppSync-style endpoint).

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::auth::Session;
use crate::config::BackendConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::DataGateway;
use crate::song::{Song, SongInput};

const SONG_FIELDS: &str = "id title description owner filePath like createdAt updatedAt";

pub fn list_songs_query() -> String {
    format!("query ListSongs {{ listSongs {{ items {{ {} }} }} }}", SONG_FIELDS)
}

pub fn update_song_mutation() -> String {
    format!(
        "mutation UpdateSong($input: UpdateSongInput!) {{ updateSong(input: $input) {{ {} }} }}",
        SONG_FIELDS
    )
}

pub fn create_song_mutation() -> String {
    format!(
        "mutation CreateSong($input: CreateSongInput!) {{ createSong(input: $input) {{ {} }} }}",
        SONG_FIELDS
    )
}

/// Request body for a GraphQL POST.
pub fn request_body(query: &str, variables: Option<Value>) -> Value {
    match variables {
        Some(v) => json!({ "query": query, "variables": v }),
        None => json!({ "query": query }),
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorEntry {
    message: String,
}

#[derive(Debug, Deserialize)]
struct SongConnection {
    #[serde(default)]
    items: Vec<Option<Song>>,
}

/// Pull `data.<field>` out of a response body, failing on any `errors`.
pub fn extract_field<T: DeserializeOwned>(body: &str, field: &'static str) -> GatewayResult<T> {
    let response: GraphQlResponse = serde_json::from_str(body)?;
    if !response.errors.is_empty() {
        return Err(GatewayError::GraphQl(
            response.errors.into_iter().map(|e| e.message).collect(),
        ));
    }
    let value = response
        .data
        .and_then(|d| match d {
            Value::Object(mut map) => map.remove(field),
            _ => None,
        })
        .filter(|v| !v.is_null())
        .ok_or(GatewayError::MissingData(field))?;
    Ok(serde_json::from_value(value)?)
}

/// Songs from a `listSongs` body. Null entries (records the caller may not
/// read) are dropped.
pub fn parse_song_list(body: &str) -> GatewayResult<Vec<Song>> {
    let connection: SongConnection = extract_field(body, "listSongs")?;
    let total = connection.items.len();
    let songs: Vec<Song> = connection.items.into_iter().flatten().collect();
    if songs.len() != total {
        warn!("listSongs: dropped {} null item(s)", total - songs.len());
    }
    Ok(songs)
}

pub struct GraphQlGateway {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    id_token: String,
}

impl GraphQlGateway {
    pub fn new(config: &BackendConfig, session: &Session) -> GatewayResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            endpoint: config.graphql_endpoint.clone(),
            api_key: config.api_key.clone(),
            id_token: session.id_token.clone(),
        })
    }

    async fn execute(&self, query: &str, variables: Option<Value>) -> GatewayResult<String> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header("Authorization", &self.id_token)
            .json(&request_body(query, variables));
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if status.as_u16() == 401 {
            return Err(GatewayError::Unauthorized(text));
        }
        if !status.is_success() {
            return Err(GatewayError::Status {
                service: "graphql",
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }
}

#[async_trait]
impl DataGateway for GraphQlGateway {
    async fn list_songs(&self) -> GatewayResult<Vec<Song>> {
        let body = self.execute(&list_songs_query(), None).await?;
        let songs = parse_song_list(&body)?;
        debug!("listSongs: {} songs", songs.len());
        Ok(songs)
    }

    async fn update_song(&self, input: SongInput) -> GatewayResult<Song> {
        let body = self
            .execute(&update_song_mutation(), Some(json!({ "input": input })))
            .await?;
        extract_field(&body, "updateSong")
    }

    async fn create_song(&self, input: SongInput) -> GatewayResult<Song> {
        let body = self
            .execute(&create_song_mutation(), Some(json!({ "input": input })))
            .await?;
        extract_field(&body, "createSong")
    }
}
