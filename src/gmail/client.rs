//! Gmail API client
//!
//! `GmailService` is the client handed to resource operations. It is bound
//! to a single mailbox and authenticates each request through a shared
//! token source.

use async_trait::async_trait;

use crate::config::gmail::{API_BASE_URL, USER_ID};
use crate::context::RequestContext;
use crate::error::Result;
use crate::gmail::auth::{Credentials, TokenSource};
use crate::gmail::filters::FilterManager;
use crate::gmail::types::Filter;

/// Remote filter operations for the authenticated mailbox
#[async_trait]
pub trait FilterService: Send + Sync {
    /// Create a filter, returning it with its assigned id
    async fn create_filter(&self, ctx: &RequestContext, filter: &Filter) -> Result<Filter>;

    /// Fetch a filter by id
    async fn get_filter(&self, ctx: &RequestContext, filter_id: &str) -> Result<Filter>;

    /// Delete a filter by id
    async fn delete_filter(&self, ctx: &RequestContext, filter_id: &str) -> Result<()>;

    /// List every filter in the mailbox
    async fn list_filters(&self, ctx: &RequestContext) -> Result<Vec<Filter>>;
}

/// Gmail API client
#[derive(Debug, Clone)]
pub struct GmailService {
    /// HTTP client
    http_client: reqwest::Client,

    /// Access token provider
    token_source: TokenSource,

    /// API root, without trailing slash
    api_base_url: String,

    /// Mailbox the client is bound to
    user_id: String,
}

impl GmailService {
    /// Create a client for the `me` mailbox
    pub fn new(credentials: &Credentials) -> Result<Self> {
        Self::with_http_client(credentials, reqwest::Client::new())
    }

    /// Create a client reusing an existing HTTP client
    pub fn with_http_client(credentials: &Credentials, http_client: reqwest::Client) -> Result<Self> {
        let token_source = credentials.token_source(http_client.clone())?;

        Ok(Self {
            http_client,
            token_source,
            api_base_url: API_BASE_URL.to_string(),
            user_id: USER_ID.to_string(),
        })
    }

    /// Point the client at another API root
    pub fn with_api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into();
        self
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Get a valid access token
    async fn access_token(&self, ctx: &RequestContext) -> Result<String> {
        self.token_source.access_token(ctx).await
    }

    fn filters<'a>(&'a self, token: &'a str) -> FilterManager<'a> {
        FilterManager::new(&self.http_client, token, &self.api_base_url, &self.user_id)
    }
}

#[async_trait]
impl FilterService for GmailService {
    async fn create_filter(&self, ctx: &RequestContext, filter: &Filter) -> Result<Filter> {
        let token = self.access_token(ctx).await?;
        self.filters(&token).create(ctx, filter).await
    }

    async fn get_filter(&self, ctx: &RequestContext, filter_id: &str) -> Result<Filter> {
        let token = self.access_token(ctx).await?;
        self.filters(&token).get(ctx, filter_id).await
    }

    async fn delete_filter(&self, ctx: &RequestContext, filter_id: &str) -> Result<()> {
        let token = self.access_token(ctx).await?;
        self.filters(&token).delete(ctx, filter_id).await
    }

    async fn list_filters(&self, ctx: &RequestContext) -> Result<Vec<Filter>> {
        let token = self.access_token(ctx).await?;
        self.filters(&token).list(ctx).await
    }
}
