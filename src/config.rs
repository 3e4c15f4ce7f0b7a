//! Provider configuration
//!
//! Resolves the `client` and `token` provider arguments. Each one is either a
//! literal JSON document or a path to a file holding it, and falls back to an
//! environment variable when unset.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Environment variable consulted when `client` is unset
pub const CLIENT_ENV_VAR: &str = "GOOGLE_CLIENT_CREDENTIALS";

/// Environment variable consulted when `token` is unset
pub const TOKEN_ENV_VAR: &str = "GOOGLE_TOKEN";

/// Provider configuration as supplied by the host
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderConfig {
    /// Client credentials document or path to it
    #[serde(default)]
    pub client: Option<String>,

    /// OAuth token document or path to it
    #[serde(default)]
    pub token: Option<String>,
}

/// Raw credential documents, ready for parsing
#[derive(Debug, Clone)]
pub struct CredentialDocuments {
    pub client: Vec<u8>,
    pub token: Vec<u8>,
}

impl ProviderConfig {
    /// Create a configuration from explicit values
    pub fn new(client: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: Some(client.into()),
            token: Some(token.into()),
        }
    }

    /// Fill unset values from the process environment
    pub fn with_env_fallback(self) -> Self {
        self.with_env_fallback_from(|var| std::env::var(var).ok())
    }

    /// Fill unset values using `lookup` in place of the process environment
    pub fn with_env_fallback_from<F>(self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        Self {
            client: non_empty(self.client).or_else(|| non_empty(lookup(CLIENT_ENV_VAR))),
            token: non_empty(self.token).or_else(|| non_empty(lookup(TOKEN_ENV_VAR))),
        }
    }

    /// Read both credential documents
    pub fn documents(&self) -> Result<CredentialDocuments> {
        let client = required(&self.client, "client", CLIENT_ENV_VAR)?;
        let token = required(&self.token, "token", TOKEN_ENV_VAR)?;

        Ok(CredentialDocuments {
            client: read_document("client", client)?,
            token: read_document("token", token)?,
        })
    }
}

fn required<'a>(value: &'a Option<String>, name: &str, env_var: &str) -> Result<&'a str> {
    value.as_deref().ok_or_else(|| {
        ConfigError::MissingValue {
            name: name.to_string(),
            env_var: env_var.to_string(),
        }
        .into()
    })
}

/// Load a document that is either a file path or literal JSON
pub fn read_document(name: &str, value: &str) -> Result<Vec<u8>> {
    let path = expand_home(value);

    if path.is_file() {
        tracing::debug!("Reading {} document from {}", name, path.display());
        return std::fs::read(&path).map_err(|source| {
            ConfigError::ReadFailed {
                name: name.to_string(),
                path: path.display().to_string(),
                source,
            }
            .into()
        });
    }

    if value.trim_start().starts_with('{') {
        return Ok(value.as_bytes().to_vec());
    }

    Err(ConfigError::DocumentNotFound {
        name: name.to_string(),
        value: value.to_string(),
    }
    .into())
}

/// Expand a leading `~/` to the user's home directory
fn expand_home(value: &str) -> PathBuf {
    match value.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(value)),
        None => Path::new(value).to_path_buf(),
    }
}

/// Gmail API constants
pub mod gmail {
    /// Base URL for Gmail API
    pub const API_BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1";

    /// User ID for the authenticated user
    pub const USER_ID: &str = "me";

    /// Scope required to manage filters
    pub const SETTINGS_BASIC_SCOPE: &str = "https://www.googleapis.com/auth/gmail.settings.basic";
}
