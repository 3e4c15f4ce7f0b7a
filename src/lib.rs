//! Gmail Terraform Provider Library
//!
//! Manages Gmail mail filters as a `gmail_filter` resource. Provides the
//! credential loading, Gmail API client, resource model and lifecycle, and
//! the stdio bridge a plugin host talks to.

pub mod config;
pub mod context;
pub mod error;
pub mod gmail;
pub mod host;
pub mod provider;

pub use config::ProviderConfig;
pub use context::RequestContext;
pub use error::{ProviderError, Result};
pub use provider::GmailProvider;
