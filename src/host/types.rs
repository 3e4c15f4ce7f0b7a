//! Host bridge protocol type definitions
//!
//! Line-delimited JSON-RPC 2.0 messages exchanged with the plugin host.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ProviderConfig;
use crate::error::{ErrorKind, ProviderError};
use crate::provider::{FilterModel, FilterState};

/// JSON-RPC version
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC request; requests without an id are notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,

    /// Request ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,

    /// Method name
    pub method: String,

    /// Method parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// JSON-RPC response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version
    pub jsonrpc: String,

    /// Request ID
    pub id: RequestId,

    /// Result (on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Error (on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Create a success response
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: RequestId, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// Request ID (can be string or number)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(i64),
}

/// JSON-RPC error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code
    pub code: i32,

    /// Error message
    pub message: String,

    /// Additional data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// Parse error (-32700)
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self {
            code: -32700,
            message: message.into(),
            data: None,
        }
    }

    /// Method not found (-32601)
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self {
            code: -32601,
            message: format!("Method not found: {}", method.into()),
            data: None,
        }
    }

    /// Invalid params (-32602)
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: -32602,
            message: message.into(),
            data: Some(serde_json::json!({ "kind": ErrorKind::Protocol })),
        }
    }

    /// Operation failure (-32000), tagged with its error kind
    pub fn operation_failed(err: &ProviderError) -> Self {
        Self {
            code: -32000,
            message: err.to_string(),
            data: Some(serde_json::json!({ "kind": err.kind() })),
        }
    }
}

/// Provider metadata result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataResult {
    pub name: String,
    pub version: String,
    pub resource_types: Vec<String>,
}

/// `provider/configure` params
pub type ConfigureParams = ProviderConfig;

/// `resource/plan` params
#[derive(Debug, Clone, Deserialize)]
pub struct PlanParams {
    pub type_name: String,
    #[serde(default)]
    pub prior_state: Option<FilterState>,
    pub config: FilterModel,
}

/// `resource/create` params
#[derive(Debug, Clone, Deserialize)]
pub struct CreateParams {
    pub type_name: String,
    pub config: FilterModel,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Params of operations addressing an existing filter by id
#[derive(Debug, Clone, Deserialize)]
pub struct IdParams {
    pub type_name: String,
    pub id: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// `resource/plan` result
#[derive(Debug, Clone, Serialize)]
pub struct PlanResult {
    pub planned_state: FilterModel,
    pub requires_replace: Vec<String>,
}

/// Result carrying a state; `null` means the resource is gone
#[derive(Debug, Clone, Serialize)]
pub struct StateResult {
    pub new_state: Option<FilterState>,
}

/// `resource/import` result
#[derive(Debug, Clone, Serialize)]
pub struct ImportResult {
    pub imported_state: FilterState,
}

/// Bridge methods
pub mod methods {
    pub const METADATA: &str = "provider/metadata";
    pub const SCHEMA: &str = "provider/schema";
    pub const CONFIGURE: &str = "provider/configure";
    pub const PLAN: &str = "resource/plan";
    pub const CREATE: &str = "resource/create";
    pub const READ: &str = "resource/read";
    pub const DELETE: &str = "resource/delete";
    pub const IMPORT: &str = "resource/import";
    pub const PING: &str = "ping";
}
