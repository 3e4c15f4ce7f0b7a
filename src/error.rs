//! Error types for the Gmail provider
//!
//! This module defines the error hierarchy for all provider operations.
//! Every error is terminal for the operation that raised it; nothing here is
//! retried.

use serde::Serialize;
use thiserror::Error;

/// Main error type for the Gmail provider
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Bad or missing credential documents
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Credentials not usable for authenticating requests
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Gmail API errors
    #[error("Gmail API error: {0}")]
    Gmail(#[from] GmailApiError),

    /// Resource model validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Host bridge protocol errors
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required value '{name}' (set it or export {env_var})")]
    MissingValue { name: String, env_var: String },

    #[error("error reading {name} file {path}: {source}")]
    ReadFailed {
        name: String,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{name} is neither a readable file nor a JSON document: {value}")]
    DocumentNotFound { name: String, value: String },

    #[error("error parsing client credentials JSON: {message}")]
    MalformedClient { message: String },

    #[error("error parsing token JSON: {message}")]
    MalformedToken { message: String },
}

/// Authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("OAuth client credentials have not been loaded")]
    ClientNotConfigured,

    #[error("OAuth token has not been loaded")]
    TokenNotConfigured,

    #[error("Failed to refresh access token: {message}")]
    TokenRefreshFailed { message: String },
}

/// Gmail API errors
#[derive(Error, Debug)]
pub enum GmailApiError {
    #[error("Filter not found: {filter_id}")]
    FilterNotFound { filter_id: String },

    #[error("Invalid filter criteria: {message}")]
    InvalidFilterCriteria { message: String },

    #[error("API request failed: {message}")]
    RequestFailed { message: String },

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Request cancelled")]
    Cancelled,

    #[error("Request deadline exceeded")]
    DeadlineExceeded,
}

/// Validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("{field} must not be empty; omit the attribute instead")]
    EmptyValue { field: String },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: String, value: i64 },
}

/// Host bridge protocol errors
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Unknown method: {method}")]
    UnknownMethod { method: String },

    #[error("Unknown resource type: {type_name}")]
    UnknownResourceType { type_name: String },

    #[error("Invalid parameters: {message}")]
    InvalidParams { message: String },
}

/// Coarse classification surfaced to the host with every failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Authentication,
    Remote,
    Validation,
    Protocol,
    Internal,
}

impl ProviderError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProviderError::Config(_) => ErrorKind::Configuration,
            ProviderError::Auth(_) => ErrorKind::Authentication,
            ProviderError::Gmail(_) => ErrorKind::Remote,
            ProviderError::Validation(_) => ErrorKind::Validation,
            ProviderError::Protocol(_) => ErrorKind::Protocol,
            ProviderError::Io(_) | ProviderError::Json(_) => ErrorKind::Internal,
        }
    }

    /// Whether this is a 404 for a filter id
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ProviderError::Gmail(GmailApiError::FilterNotFound { .. })
        )
    }
}

/// Result type alias for provider operations
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Transport failures from reqwest are remote errors
impl From<reqwest::Error> for GmailApiError {
    fn from(err: reqwest::Error) -> Self {
        GmailApiError::Transport {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Gmail(GmailApiError::from(err))
    }
}
