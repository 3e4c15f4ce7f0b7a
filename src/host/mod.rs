//! Host bridge module
//!
//! Implements the line-delimited JSON-RPC protocol a plugin host uses to
//! drive the provider.

pub mod server;
pub mod types;

pub use server::HostServer;
