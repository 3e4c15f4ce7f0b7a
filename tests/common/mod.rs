//! Common test utilities and fixtures
//!
//! Every fixture returns a fresh instance; nothing is shared between tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use terraform_provider_gmail::context::RequestContext;
use terraform_provider_gmail::error::{GmailApiError, ProviderError, Result};
use terraform_provider_gmail::gmail::types::Filter;
use terraform_provider_gmail::gmail::{Credentials, FilterService};
use terraform_provider_gmail::provider::{ActionModel, CriteriaModel, FilterModel};

/// Filter service keeping filters in memory
#[derive(Default)]
pub struct InMemoryFilterService {
    filters: Mutex<BTreeMap<String, Filter>>,
    next_id: AtomicU64,
}

impl InMemoryFilterService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a filter as if it had been created outside the provider
    pub fn seed(&self, mut filter: Filter) -> String {
        let id = self.allocate_id();
        filter.id = Some(id.clone());
        self.filters.lock().unwrap().insert(id.clone(), filter);
        id
    }

    /// Remove a filter as if it had been deleted outside the provider
    pub fn remove_out_of_band(&self, id: &str) {
        self.filters.lock().unwrap().remove(id);
    }

    pub fn len(&self) -> usize {
        self.filters.lock().unwrap().len()
    }

    fn allocate_id(&self) -> String {
        format!("ANe1Bm{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn not_found(id: &str) -> ProviderError {
        GmailApiError::FilterNotFound {
            filter_id: id.to_string(),
        }
        .into()
    }
}

#[async_trait]
impl FilterService for InMemoryFilterService {
    async fn create_filter(&self, ctx: &RequestContext, filter: &Filter) -> Result<Filter> {
        ctx.run(async {
            let mut created = filter.clone();
            let id = self.allocate_id();
            created.id = Some(id.clone());
            self.filters.lock().unwrap().insert(id, created.clone());
            Ok::<_, ProviderError>(created)
        })
        .await
    }

    async fn get_filter(&self, ctx: &RequestContext, filter_id: &str) -> Result<Filter> {
        ctx.run(async {
            self.filters
                .lock()
                .unwrap()
                .get(filter_id)
                .cloned()
                .ok_or_else(|| Self::not_found(filter_id))
        })
        .await
    }

    async fn delete_filter(&self, ctx: &RequestContext, filter_id: &str) -> Result<()> {
        ctx.run(async {
            self.filters
                .lock()
                .unwrap()
                .remove(filter_id)
                .map(|_| ())
                .ok_or_else(|| Self::not_found(filter_id))
        })
        .await
    }

    async fn list_filters(&self, ctx: &RequestContext) -> Result<Vec<Filter>> {
        ctx.run(async {
            Ok::<_, ProviderError>(self.filters.lock().unwrap().values().cloned().collect())
        })
        .await
    }
}

/// The canonical example: archive everything from foo@example.com
pub fn archive_from_foo() -> FilterModel {
    FilterModel {
        criteria: CriteriaModel {
            from: Some("foo@example.com".to_string()),
            ..Default::default()
        },
        action: ActionModel {
            remove_label_ids: ["INBOX".to_string()].into_iter().collect(),
            ..Default::default()
        },
    }
}

/// Client secret document pointing its token endpoint at `token_uri`
pub fn client_json(token_uri: &str) -> String {
    json!({
        "installed": {
            "client_id": "test-client-id.apps.googleusercontent.com",
            "client_secret": "test-secret",
            "auth_uri": "https://accounts.google.com/o/oauth2/auth",
            "token_uri": token_uri,
            "redirect_uris": ["http://localhost"]
        }
    })
    .to_string()
}

/// Token document that stays valid for the duration of a test
pub fn valid_token_json(access_token: &str) -> String {
    json!({
        "access_token": access_token,
        "token_type": "Bearer",
        "refresh_token": "1//refresh-token",
        "expiry": "2999-01-01T00:00:00Z"
    })
    .to_string()
}

/// Token document whose access token has already expired
pub fn expired_token_json() -> String {
    json!({
        "access_token": "stale-token",
        "token_type": "Bearer",
        "refresh_token": "1//refresh-token",
        "expiry": "2001-01-01T00:00:00Z"
    })
    .to_string()
}

/// Credentials loaded from the given documents
pub fn credentials(client: &str, token: &str) -> Credentials {
    let mut credentials = Credentials::new();
    credentials.load_client(client.as_bytes()).unwrap();
    credentials.load_token(token.as_bytes()).unwrap();
    credentials
}
