//! Host bridge server
//!
//! Serves provider and resource requests over line-delimited JSON-RPC on
//! stdio. Requests are handled one at a time; each gets a child of the
//! server's root context so shutdown cancels whatever is in flight.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::context::RequestContext;
use crate::error::{ProtocolError, ProviderError, Result};
use crate::host::types::*;
use crate::provider::{
    plan_filter, GmailProvider, FILTER_TYPE_NAME, PROVIDER_NAME, PROVIDER_VERSION,
};

/// Bridge between the plugin host and the provider
pub struct HostServer {
    /// The provider being served
    provider: Arc<GmailProvider>,

    /// Parent of every request context
    root: RequestContext,
}

impl HostServer {
    /// Create a new server
    pub fn new(provider: Arc<GmailProvider>) -> Self {
        Self {
            provider,
            root: RequestContext::background(),
        }
    }

    /// Use `root` as the parent of every request context
    pub fn with_context(mut self, root: RequestContext) -> Self {
        self.root = root;
        self
    }

    /// Run the server on stdio
    pub async fn run_stdio(&self) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Serve requests from `reader` until it is exhausted
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            if let Some(response) = self.handle_message(&line).await {
                let mut text = serde_json::to_string(&response)?;
                text.push('\n');
                writer.write_all(text.as_bytes()).await?;
                writer.flush().await?;
            }
        }

        tracing::debug!("Host closed the request stream");
        Ok(())
    }

    /// Handle one incoming JSON-RPC message
    pub async fn handle_message(&self, message: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(message) {
            Ok(req) => req,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    RequestId::Number(0),
                    JsonRpcError::parse_error(e.to_string()),
                ));
            }
        };

        tracing::debug!("Handling {}", request.method);

        let outcome = self.dispatch(&request.method, request.params).await;

        let Some(id) = request.id else {
            // Notification, no response
            if let Err(e) = outcome {
                tracing::warn!("Notification {} failed: {}", request.method, e);
            }
            return None;
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => {
                tracing::error!("{} failed: {}", request.method, e);
                JsonRpcResponse::error(id, rpc_error(&e))
            }
        })
    }

    async fn dispatch(&self, method: &str, params: Option<Value>) -> Result<Value> {
        match method {
            methods::PING => Ok(serde_json::json!({})),
            methods::METADATA => self.handle_metadata(),
            methods::SCHEMA => Ok(serde_json::to_value(self.provider.schema())?),
            methods::CONFIGURE => self.handle_configure(parse_params(params)?).await,
            methods::PLAN => self.handle_plan(parse_params(params)?),
            methods::CREATE => self.handle_create(parse_params(params)?).await,
            methods::READ => self.handle_read(parse_params(params)?).await,
            methods::DELETE => self.handle_delete(parse_params(params)?).await,
            methods::IMPORT => self.handle_import(parse_params(params)?).await,
            _ => Err(ProtocolError::UnknownMethod {
                method: method.to_string(),
            }
            .into()),
        }
    }

    fn handle_metadata(&self) -> Result<Value> {
        let result = MetadataResult {
            name: PROVIDER_NAME.to_string(),
            version: PROVIDER_VERSION.to_string(),
            resource_types: self
                .provider
                .resource_types()
                .into_iter()
                .map(String::from)
                .collect(),
        };

        Ok(serde_json::to_value(result)?)
    }

    async fn handle_configure(&self, params: ConfigureParams) -> Result<Value> {
        self.provider.configure(params).await?;
        Ok(serde_json::json!({}))
    }

    fn handle_plan(&self, params: PlanParams) -> Result<Value> {
        check_type(&params.type_name)?;

        let plan = plan_filter(params.prior_state.as_ref(), &params.config);
        plan.planned.validate()?;

        Ok(serde_json::to_value(PlanResult {
            planned_state: plan.planned,
            requires_replace: plan.requires_replace,
        })?)
    }

    async fn handle_create(&self, params: CreateParams) -> Result<Value> {
        check_type(&params.type_name)?;

        let ctx = self.request_context(params.timeout_secs);
        let service = self.provider.service().await?;
        let state = self
            .provider
            .filter_resource()
            .create(&service, &ctx, &params.config)
            .await?;

        Ok(serde_json::to_value(StateResult {
            new_state: Some(state),
        })?)
    }

    async fn handle_read(&self, params: IdParams) -> Result<Value> {
        check_type(&params.type_name)?;

        let ctx = self.request_context(params.timeout_secs);
        let service = self.provider.service().await?;
        let state = self
            .provider
            .filter_resource()
            .read(&service, &ctx, &params.id)
            .await?;

        Ok(serde_json::to_value(StateResult { new_state: state })?)
    }

    async fn handle_delete(&self, params: IdParams) -> Result<Value> {
        check_type(&params.type_name)?;

        let ctx = self.request_context(params.timeout_secs);
        let service = self.provider.service().await?;
        self.provider
            .filter_resource()
            .delete(&service, &ctx, &params.id)
            .await?;

        Ok(serde_json::json!({}))
    }

    async fn handle_import(&self, params: IdParams) -> Result<Value> {
        check_type(&params.type_name)?;

        let ctx = self.request_context(params.timeout_secs);
        let service = self.provider.service().await?;
        let state = self
            .provider
            .filter_resource()
            .import(&service, &ctx, &params.id)
            .await?;

        Ok(serde_json::to_value(ImportResult {
            imported_state: state,
        })?)
    }

    fn request_context(&self, timeout_secs: Option<u64>) -> RequestContext {
        match timeout_secs {
            Some(secs) => self.root.with_timeout(Duration::from_secs(secs)),
            None => self.root.child(),
        }
    }
}

fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T> {
    let params = params.unwrap_or_else(|| serde_json::json!({}));
    serde_json::from_value(params).map_err(|e| {
        ProtocolError::InvalidParams {
            message: e.to_string(),
        }
        .into()
    })
}

fn check_type(type_name: &str) -> Result<()> {
    if type_name == FILTER_TYPE_NAME {
        Ok(())
    } else {
        Err(ProtocolError::UnknownResourceType {
            type_name: type_name.to_string(),
        }
        .into())
    }
}

fn rpc_error(err: &ProviderError) -> JsonRpcError {
    match err {
        ProviderError::Protocol(ProtocolError::UnknownMethod { method }) => {
            JsonRpcError::method_not_found(method)
        }
        ProviderError::Protocol(ProtocolError::InvalidParams { message }) => {
            JsonRpcError::invalid_params(message)
        }
        _ => JsonRpcError::operation_failed(err),
    }
}
