//! Gmail API type definitions
//!
//! These types mirror the Gmail filter resources and are used for
//! serialization/deserialization on the wire.

use serde::{Deserialize, Serialize};

/// Matching criteria of a filter
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    /// Sender display name or address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    /// Recipient in To, Cc or Bcc
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,

    /// Case-insensitive phrase in the subject
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// Gmail search query the message must match
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    /// Gmail search query the message must not match
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negated_query: Option<String>,

    /// Only messages with attachments
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_attachment: Option<bool>,

    /// Skip chat messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_chats: Option<bool>,

    /// RFC822 message size in bytes, paired with `size_comparison`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_comparison: Option<SizeComparison>,
}

/// How `size` is compared against a message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SizeComparison {
    Unspecified,
    Smaller,
    Larger,
}

impl SizeComparison {
    /// Accepted values, as spelled on the wire
    pub const VALUES: [&'static str; 3] = ["larger", "smaller", "unspecified"];
}

/// Action applied to matching messages
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FilterAction {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub add_label_ids: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remove_label_ids: Vec<String>,

    /// Verified forwarding address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward: Option<String>,
}

/// A mail filter as exchanged with the settings API
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Filter {
    /// Assigned by Gmail; absent on create requests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub criteria: FilterCriteria,

    #[serde(default)]
    pub action: FilterAction,
}

/// Response of `settings.filters.list`; `filter` is omitted when empty
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FilterList {
    #[serde(default)]
    pub filter: Vec<Filter>,
}
