//! Gmail API module
//!
//! Contains types, authentication, and client for interacting with the Gmail API.

pub mod auth;
pub mod client;
pub mod filters;
pub mod types;

pub use auth::Credentials;
pub use client::{FilterService, GmailService};
