//! Cognito user-pool sign-in.
//!
//! Uses the JSON-1.1 `InitiateAuth` / `GlobalSignOut` actions directly; no
//! AWS SDK. The id token is what the GraphQL API and blob store accept as
//! `Authorization`.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::config::AuthConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::AuthProvider;

const AMZ_JSON: &str = "application/x-amz-json-1.1";
const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService";

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub id_token: String,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthResponse {
    authentication_result: Option<AuthenticationResult>,
    challenge_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthenticationResult {
    id_token: String,
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct CognitoError {
    #[serde(rename = "__type", default)]
    kind: String,
    #[serde(default, alias = "Message")]
    message: String,
}

pub struct CognitoAuth {
    client: reqwest::Client,
    endpoint: String,
    client_id: String,
}

impl CognitoAuth {
    pub fn new(config: &AuthConfig) -> GatewayResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint_url(),
            client_id: config.client_id.clone(),
        })
    }

    async fn call(&self, action: &str, body: serde_json::Value) -> GatewayResult<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", AMZ_JSON)
            .header("X-Amz-Target", format!("{}.{}", TARGET_PREFIX, action))
            .body(body.to_string())
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if status.is_success() {
            return Ok(text);
        }

        // Cognito reports bad credentials as 400 NotAuthorizedException
        let err: CognitoError = serde_json::from_str(&text).unwrap_or(CognitoError {
            kind: String::new(),
            message: text.clone(),
        });
        if err.kind.ends_with("NotAuthorizedException")
            || err.kind.ends_with("UserNotFoundException")
        {
            return Err(GatewayError::Unauthorized(err.message));
        }
        Err(GatewayError::Status {
            service: "cognito",
            status: status.as_u16(),
            body: text,
        })
    }
}

/// Turn an `InitiateAuth` response body into a session.
pub fn parse_initiate_auth(
    username: &str,
    body: &str,
    now: DateTime<Utc>,
) -> GatewayResult<Session> {
    let parsed: InitiateAuthResponse = serde_json::from_str(body)?;
    if let Some(challenge) = parsed.challenge_name {
        // NEW_PASSWORD_REQUIRED, MFA etc. need a browser flow
        return Err(GatewayError::Unauthorized(format!(
            "sign-in challenge {} is not supported",
            challenge
        )));
    }
    let result = parsed
        .authentication_result
        .ok_or(GatewayError::MissingData("AuthenticationResult"))?;
    Ok(Session {
        username: username.to_string(),
        id_token: result.id_token,
        access_token: result.access_token,
        expires_at: now + ChronoDuration::seconds(result.expires_in),
    })
}

#[async_trait]
impl AuthProvider for CognitoAuth {
    async fn sign_in(&self, username: &str, password: &str) -> GatewayResult<Session> {
        debug!("auth: InitiateAuth for {}", username);
        let body = self
            .call(
                "InitiateAuth",
                json!({
                    "AuthFlow": "USER_PASSWORD_AUTH",
                    "ClientId": self.client_id,
                    "AuthParameters": {
                        "USERNAME": username,
                        "PASSWORD": password,
                    }
                }),
            )
            .await?;
        let session = parse_initiate_auth(username, &body, Utc::now())?;
        info!("auth: signed in as {}", session.username);
        Ok(session)
    }

    async fn sign_out(&self, session: &Session) -> GatewayResult<()> {
        self.call(
            "GlobalSignOut",
            json!({ "AccessToken": session.access_token }),
        )
        .await?;
        info!("auth: signed out {}", session.username);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_successful_auth() {
        let now = Utc::now();
        let body = r#"{
            "AuthenticationResult": {
                "IdToken": "id.jwt",
                "AccessToken": "access.jwt",
                "RefreshToken": "refresh",
                "ExpiresIn": 3600,
                "TokenType": "Bearer"
            },
            "ChallengeParameters": {}
        }"#;
        let session = parse_initiate_auth("mira", body, now).unwrap();
        assert_eq!(session.username, "mira");
        assert_eq!(session.id_token, "id.jwt");
        assert_eq!(session.access_token, "access.jwt");
        assert!(!session.is_expired(now));
        assert!(session.is_expired(now + ChronoDuration::seconds(3600)));
    }

    #[test]
    fn challenge_is_rejected() {
        let body = r#"{"ChallengeName": "NEW_PASSWORD_REQUIRED", "Session": "abc"}"#;
        let err = parse_initiate_auth("mira", body, Utc::now()).unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[test]
    fn missing_result_is_reported() {
        let err = parse_initiate_auth("mira", "{}", Utc::now()).unwrap_err();
        assert!(matches!(err, GatewayError::MissingData(_)));
    }
}
