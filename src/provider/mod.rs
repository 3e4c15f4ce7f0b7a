//! Gmail provider
//!
//! Owns the credentials established at configuration time and hands each
//! resource operation a freshly built `GmailService`.

pub mod filter;
pub mod schema;

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::gmail::API_BASE_URL;
use crate::config::ProviderConfig;
use crate::error::{AuthError, Result};
use crate::gmail::auth::Credentials;
use crate::gmail::client::GmailService;

pub use filter::{
    from_wire, plan_filter, to_wire, ActionModel, CriteriaModel, FilterModel, FilterPlan,
    FilterResource, FilterState,
};
pub use schema::{provider_schema, ProviderSchema, FILTER_TYPE_NAME};

/// Provider name reported to the host
pub const PROVIDER_NAME: &str = "gmail";

/// Provider version reported to the host
pub const PROVIDER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The Gmail provider
#[derive(Debug)]
pub struct GmailProvider {
    /// Shared HTTP client
    http_client: reqwest::Client,

    /// API root used by services
    api_base_url: String,

    /// Credentials loaded by `configure`
    credentials: RwLock<Option<Arc<Credentials>>>,
}

impl Default for GmailProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl GmailProvider {
    /// Create an unconfigured provider
    pub fn new() -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_base_url: API_BASE_URL.to_string(),
            credentials: RwLock::new(None),
        }
    }

    /// Point services at another API root
    pub fn with_api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into();
        self
    }

    pub fn schema(&self) -> ProviderSchema {
        provider_schema()
    }

    /// Resource types this provider serves
    pub fn resource_types(&self) -> Vec<&'static str> {
        vec![FILTER_TYPE_NAME]
    }

    /// Load credentials named by `config`, falling back to the environment
    pub async fn configure(&self, config: ProviderConfig) -> Result<()> {
        self.configure_with(config.with_env_fallback()).await
    }

    /// Load credentials exactly as given, without consulting the environment
    pub async fn configure_with(&self, config: ProviderConfig) -> Result<()> {
        let credentials = Credentials::from_config(&config)?;
        *self.credentials.write().await = Some(Arc::new(credentials));
        tracing::info!("Gmail provider configured");
        Ok(())
    }

    /// Install already loaded credentials
    pub async fn set_credentials(&self, credentials: Credentials) {
        *self.credentials.write().await = Some(Arc::new(credentials));
    }

    pub async fn is_configured(&self) -> bool {
        self.credentials.read().await.is_some()
    }

    /// Build a client for one operation
    pub async fn service(&self) -> Result<GmailService> {
        let credentials = self
            .credentials
            .read()
            .await
            .clone()
            .ok_or(AuthError::ClientNotConfigured)?;

        Ok(
            GmailService::with_http_client(&credentials, self.http_client.clone())?
                .with_api_base_url(self.api_base_url.clone()),
        )
    }

    pub fn filter_resource(&self) -> FilterResource {
        FilterResource
    }
}
