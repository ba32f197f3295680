use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::platform;

/// Environment variable that points at an alternative config file.
pub const CONFIG_PATH_ENV: &str = "SONGSHARE_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub player: PlayerConfig,
}

/// GraphQL data API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_graphql_endpoint")]
    pub graphql_endpoint: String,
    /// Sent as `x-api-key` when set.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Cognito user pool used for sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub client_id: String,
    /// Overrides `https://cognito-idp.<region>.amazonaws.com/`.
    #[serde(default)]
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_endpoint")]
    pub endpoint: String,
    /// Validity window of playback URLs.
    #[serde(default = "default_signed_url_expiry_secs")]
    pub signed_url_expiry_secs: u64,
    #[serde(default = "default_content_type")]
    pub default_content_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    #[serde(default = "default_volume")]
    pub volume: f32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            graphql_endpoint: default_graphql_endpoint(),
            api_key: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            client_id: String::new(),
            endpoint: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: default_storage_endpoint(),
            signed_url_expiry_secs: default_signed_url_expiry_secs(),
            default_content_type: default_content_type(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            volume: default_volume(),
        }
    }
}

fn default_graphql_endpoint() -> String {
    "http://127.0.0.1:20002/graphql".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_storage_endpoint() -> String {
    "http://127.0.0.1:20005".to_string()
}

fn default_signed_url_expiry_secs() -> u64 {
    60
}

fn default_content_type() -> String {
    "audio/mp3".to_string()
}

fn default_volume() -> f32 {
    0.7
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

impl AuthConfig {
    pub fn endpoint_url(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| format!("https://cognito-idp.{}.amazonaws.com/", self.region))
    }
}

impl StorageConfig {
    pub fn signed_url_expiry(&self) -> Duration {
        Duration::from_secs(self.signed_url_expiry_secs)
    }
}

impl Config {
    /// Load the config file, writing defaults on first run.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &PathBuf) -> anyhow::Result<Self> {
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(config_path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, config_path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(p) if !p.is_empty() => PathBuf::from(p),
            _ => platform::config_dir().join("config.toml"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.storage.signed_url_expiry_secs, 60);
        assert_eq!(config.storage.default_content_type, "audio/mp3");
        assert!(config.backend.api_key.is_none());
        assert_eq!(
            config.auth.endpoint_url(),
            "https://cognito-idp.us-east-1.amazonaws.com/"
        );
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            [backend]
            graphql_endpoint = "https://example.appsync-api.eu-west-1.amazonaws.com/graphql"

            [storage]
            signed_url_expiry_secs = 120
            "#,
        )
        .unwrap();
        assert!(config.backend.graphql_endpoint.starts_with("https://"));
        assert_eq!(config.backend.request_timeout_secs, 30);
        assert_eq!(config.storage.signed_url_expiry(), Duration::from_secs(120));
        assert_eq!(config.auth.region, "us-east-1");
    }

    #[test]
    fn auth_endpoint_override() {
        let auth = AuthConfig {
            endpoint: Some("http://localhost:9229/".to_string()),
            ..AuthConfig::default()
        };
        assert_eq!(auth.endpoint_url(), "http://localhost:9229/");
    }

    #[test]
    fn first_load_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.storage.signed_url_expiry_secs, 60);

        let mut edited = config.clone();
        edited.player.volume = 0.25;
        edited.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().player.volume, 0.25);
    }
}
