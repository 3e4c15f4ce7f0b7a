//! Filter endpoints of the Gmail settings API

use reqwest::StatusCode;

use crate::context::RequestContext;
use crate::error::{GmailApiError, ProviderError, Result};
use crate::gmail::types::{Filter, FilterList};

/// Filter requests for one mailbox, authenticated with a single access token
pub struct FilterManager<'a> {
    client: &'a reqwest::Client,
    access_token: &'a str,
    filters_url: String,
}

impl<'a> FilterManager<'a> {
    /// Create a new filter manager
    pub fn new(
        client: &'a reqwest::Client,
        access_token: &'a str,
        api_base_url: &str,
        user_id: &str,
    ) -> Self {
        Self {
            client,
            access_token,
            filters_url: format!(
                "{}/users/{}/settings/filters",
                api_base_url.trim_end_matches('/'),
                urlencoding::encode(user_id)
            ),
        }
    }

    fn filter_url(&self, filter_id: &str) -> String {
        format!("{}/{}", self.filters_url, urlencoding::encode(filter_id))
    }

    /// Create a new Gmail filter
    pub async fn create(&self, ctx: &RequestContext, filter: &Filter) -> Result<Filter> {
        ctx.run(self.send_create(filter)).await
    }

    /// List all Gmail filters
    pub async fn list(&self, ctx: &RequestContext) -> Result<Vec<Filter>> {
        ctx.run(self.send_list()).await
    }

    /// Get a specific filter by ID
    pub async fn get(&self, ctx: &RequestContext, filter_id: &str) -> Result<Filter> {
        ctx.run(self.send_get(filter_id)).await
    }

    /// Delete a Gmail filter
    pub async fn delete(&self, ctx: &RequestContext, filter_id: &str) -> Result<()> {
        ctx.run(self.send_delete(filter_id)).await
    }

    // The send_* requests below include reading the body, so a context
    // bounds the whole exchange and not just the response headers.

    async fn send_create(&self, filter: &Filter) -> Result<Filter> {
        let response = self
            .client
            .post(&self.filters_url)
            .bearer_auth(self.access_token)
            .json(filter)
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(response.json().await?);
        }

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if status == StatusCode::BAD_REQUEST {
            return Err(GmailApiError::InvalidFilterCriteria { message: text }.into());
        }

        Err(GmailApiError::RequestFailed {
            message: format!("Failed to create filter ({}): {}", status, text),
        }
        .into())
    }

    async fn send_list(&self) -> Result<Vec<Filter>> {
        let response = self
            .client
            .get(&self.filters_url)
            .bearer_auth(self.access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(GmailApiError::RequestFailed {
                message: format!("Failed to list filters ({}): {}", status, text),
            }
            .into());
        }

        let text = response.text().await?;

        // No filters comes back as an empty body or an empty object
        if text.trim().is_empty() || text.trim() == "{}" {
            return Ok(vec![]);
        }

        let filter_list: FilterList =
            serde_json::from_str(&text).map_err(|e| GmailApiError::RequestFailed {
                message: format!("Failed to parse filter list: {}", e),
            })?;

        Ok(filter_list.filter)
    }

    async fn send_get(&self, filter_id: &str) -> Result<Filter> {
        let response = self
            .client
            .get(self.filter_url(filter_id))
            .bearer_auth(self.access_token)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(response.json().await?),
            StatusCode::NOT_FOUND => Err(not_found(filter_id)),
            status => {
                let text = response.text().await.unwrap_or_default();
                Err(GmailApiError::RequestFailed {
                    message: format!("Failed to get filter ({}): {}", status, text),
                }
                .into())
            }
        }
    }

    async fn send_delete(&self, filter_id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.filter_url(filter_id))
            .bearer_auth(self.access_token)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(not_found(filter_id)),
            status => {
                let text = response.text().await.unwrap_or_default();
                Err(GmailApiError::RequestFailed {
                    message: format!("Failed to delete filter ({}): {}", status, text),
                }
                .into())
            }
        }
    }
}

fn not_found(filter_id: &str) -> ProviderError {
    GmailApiError::FilterNotFound {
        filter_id: filter_id.to_string(),
    }
    .into()
}
