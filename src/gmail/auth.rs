//! OAuth credentials for the Gmail API
//!
//! Handles:
//! - Parsing the client secret document (console `installed`/`web` format)
//! - Parsing a stored OAuth token
//! - Handing out access tokens, refreshing them when expired
//!
//! Nothing in here performs an interactive consent flow or writes tokens back
//! to disk.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use yup_oauth2::ApplicationSecret;

use crate::config::gmail::SETTINGS_BASIC_SCOPE;
use crate::config::ProviderConfig;
use crate::context::RequestContext;
use crate::error::{AuthError, ConfigError, Result};

/// Access tokens this close to expiry are refreshed before use
const EXPIRY_DELTA_SECS: i64 = 10;

/// OAuth client configuration
#[derive(Debug, Clone)]
pub struct OAuthClient {
    /// Client ID, secret and endpoints from the console document
    pub secret: ApplicationSecret,

    /// Scopes the client is configured for
    pub scopes: Vec<String>,
}

/// Stored OAuth token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Token {
    /// Access token
    #[serde(default)]
    pub access_token: String,

    /// Token type (usually "Bearer")
    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// Refresh token
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub refresh_token: String,

    /// Expiry; absent or the zero time means the token never expires
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl Token {
    /// Parse a stored token document
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let mut token: Token =
            serde_json::from_slice(bytes).map_err(|e| ConfigError::MalformedToken {
                message: e.to_string(),
            })?;

        if token.access_token.is_empty() && token.refresh_token.is_empty() {
            return Err(ConfigError::MalformedToken {
                message: "token has neither an access_token nor a refresh_token".to_string(),
            }
            .into());
        }

        // Serialized zero times carry year 1
        if token.expiry.is_some_and(|e| e.year() <= 1) {
            token.expiry = None;
        }

        if token.token_type.is_empty() {
            token.token_type = default_token_type();
        }

        Ok(token)
    }

    /// Whether the access token can be used as-is at `now`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        if self.access_token.is_empty() {
            return false;
        }

        match self.expiry {
            Some(expiry) => expiry - Duration::seconds(EXPIRY_DELTA_SECS) > now,
            None => true,
        }
    }
}

/// Token response from the OAuth token endpoint
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    token_type: String,
    expires_in: Option<i64>,
}

/// Loaded credential state, established once at provider configuration
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    client: Option<OAuthClient>,
    token: Option<Arc<RwLock<Token>>>,
}

impl Credentials {
    /// Empty credentials; load documents before building a service
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve and parse both documents named by a provider configuration
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let documents = config.documents()?;

        let mut credentials = Self::new();
        credentials.load_client(&documents.client)?;
        credentials.load_token(&documents.token)?;
        Ok(credentials)
    }

    /// Parse the client secret document
    pub fn load_client(&mut self, bytes: &[u8]) -> Result<()> {
        let secret = yup_oauth2::parse_application_secret(bytes).map_err(|e| {
            ConfigError::MalformedClient {
                message: e.to_string(),
            }
        })?;

        if secret.client_id.is_empty() || secret.token_uri.is_empty() {
            return Err(ConfigError::MalformedClient {
                message: "client_id and token_uri are required".to_string(),
            }
            .into());
        }

        tracing::debug!("Loaded OAuth client {}", secret.client_id);

        self.client = Some(OAuthClient {
            secret,
            scopes: vec![SETTINGS_BASIC_SCOPE.to_string()],
        });
        Ok(())
    }

    /// Parse the stored token document
    pub fn load_token(&mut self, bytes: &[u8]) -> Result<()> {
        let token = Token::from_json(bytes)?;
        self.token = Some(Arc::new(RwLock::new(token)));
        Ok(())
    }

    pub fn client(&self) -> Option<&OAuthClient> {
        self.client.as_ref()
    }

    /// Token source bound to these credentials
    pub fn token_source(&self, http_client: reqwest::Client) -> Result<TokenSource> {
        let client = self.client.clone().ok_or(AuthError::ClientNotConfigured)?;
        let token = self.token.clone().ok_or(AuthError::TokenNotConfigured)?;

        Ok(TokenSource {
            http_client,
            client,
            token,
        })
    }
}

/// Hands out access tokens, refreshing the shared token when it has expired
#[derive(Debug, Clone)]
pub struct TokenSource {
    http_client: reqwest::Client,
    client: OAuthClient,
    token: Arc<RwLock<Token>>,
}

impl TokenSource {
    /// Get a valid access token, refreshing if necessary
    pub async fn access_token(&self, ctx: &RequestContext) -> Result<String> {
        {
            let token = self.token.read().await;
            if token.is_valid_at(Utc::now()) {
                return Ok(token.access_token.clone());
            }
        }

        let mut token = self.token.write().await;

        // Another caller may have refreshed while we waited
        if token.is_valid_at(Utc::now()) {
            return Ok(token.access_token.clone());
        }

        let refreshed = ctx.run(self.refresh(&token)).await?;
        *token = refreshed;
        Ok(token.access_token.clone())
    }

    /// Exchange the refresh token for a new access token
    async fn refresh(&self, current: &Token) -> Result<Token> {
        if current.refresh_token.is_empty() {
            return Err(AuthError::TokenRefreshFailed {
                message: "token expired and no refresh token is available".to_string(),
            }
            .into());
        }

        tracing::debug!("Refreshing access token via {}", self.client.secret.token_uri);

        let params = [
            ("client_id", self.client.secret.client_id.as_str()),
            ("client_secret", self.client.secret.client_secret.as_str()),
            ("refresh_token", current.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .http_client
            .post(&self.client.secret.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::TokenRefreshFailed {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AuthError::TokenRefreshFailed {
                message: format!("token endpoint returned {}: {}", status, text),
            }
            .into());
        }

        let token_response: TokenResponse =
            response
                .json()
                .await
                .map_err(|e| AuthError::TokenRefreshFailed {
                    message: e.to_string(),
                })?;

        Ok(Token {
            access_token: token_response.access_token,
            token_type: token_response.token_type,
            refresh_token: token_response
                .refresh_token
                .unwrap_or_else(|| current.refresh_token.clone()),
            expiry: token_response
                .expires_in
                .map(|secs| Utc::now() + Duration::seconds(secs)),
        })
    }
}
