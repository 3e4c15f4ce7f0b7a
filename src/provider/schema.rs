//! Schema declarations served to the host
//!
//! Mirrors the shape of a Terraform schema: attributes with a type and
//! behaviour flags, and nested blocks with item bounds.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::{CLIENT_ENV_VAR, TOKEN_ENV_VAR};
use crate::gmail::types::SizeComparison;

/// Resource type name for Gmail filters
pub const FILTER_TYPE_NAME: &str = "gmail_filter";

/// Attribute value types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Bool,
    Int,
    SetOfString,
}

/// A single attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    #[serde(rename = "type")]
    pub attr_type: AttributeType,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    pub force_new: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_default: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<String>,
}

impl Attribute {
    fn new(attr_type: AttributeType, description: &str) -> Self {
        Self {
            attr_type,
            description: description.to_string(),
            required: false,
            optional: false,
            computed: false,
            sensitive: false,
            force_new: false,
            env_default: None,
            allowed_values: Vec::new(),
        }
    }

    /// Required attribute
    pub fn required(attr_type: AttributeType, description: &str) -> Self {
        Self {
            required: true,
            ..Self::new(attr_type, description)
        }
    }

    /// Optional attribute
    pub fn optional(attr_type: AttributeType, description: &str) -> Self {
        Self {
            optional: true,
            ..Self::new(attr_type, description)
        }
    }

    /// Optional attribute the remote fills in when unset
    pub fn optional_computed(attr_type: AttributeType, description: &str) -> Self {
        Self {
            computed: true,
            ..Self::optional(attr_type, description)
        }
    }

    /// Computed-only attribute
    pub fn computed(attr_type: AttributeType, description: &str) -> Self {
        Self {
            computed: true,
            ..Self::new(attr_type, description)
        }
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn env_default(mut self, env_var: &str) -> Self {
        self.env_default = Some(env_var.to_string());
        self
    }

    pub fn allowed_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values = values.into_iter().map(Into::into).collect();
        self
    }
}

/// A nested block of attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Block {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub attributes: BTreeMap<String, Attribute>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub blocks: BTreeMap<String, NestedBlock>,
}

impl Block {
    pub fn with_attribute(mut self, name: &str, attribute: Attribute) -> Self {
        self.attributes.insert(name.to_string(), attribute);
        self
    }

    pub fn with_block(mut self, name: &str, block: NestedBlock) -> Self {
        self.blocks.insert(name.to_string(), block);
        self
    }
}

/// A block nested as a bounded list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NestedBlock {
    pub min_items: u32,
    pub max_items: u32,
    pub force_new: bool,
    pub block: Block,
}

impl NestedBlock {
    /// Exactly one instance of `block`
    pub fn single(description: &str, block: Block) -> Self {
        Self {
            min_items: 1,
            max_items: 1,
            force_new: false,
            block: Block {
                description: Some(description.to_string()),
                ..block
            },
        }
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }
}

/// Schema of one resource type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceSchema {
    pub version: u32,
    pub importable: bool,
    pub block: Block,
}

/// Full provider schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderSchema {
    pub provider: Block,
    pub resources: BTreeMap<String, ResourceSchema>,
}

impl ProviderSchema {
    pub fn resource(&self, type_name: &str) -> Option<&ResourceSchema> {
        self.resources.get(type_name)
    }
}

/// Schema of the provider and every resource it serves
pub fn provider_schema() -> ProviderSchema {
    let provider = Block::default()
        .with_attribute(
            "client",
            Attribute::required(
                AttributeType::String,
                "OAuth client credentials JSON, or a path to a file containing it",
            )
            .sensitive()
            .env_default(CLIENT_ENV_VAR),
        )
        .with_attribute(
            "token",
            Attribute::required(
                AttributeType::String,
                "OAuth token JSON, or a path to a file containing it",
            )
            .sensitive()
            .env_default(TOKEN_ENV_VAR),
        );

    let mut resources = BTreeMap::new();
    resources.insert(FILTER_TYPE_NAME.to_string(), filter_schema());

    ProviderSchema {
        provider,
        resources,
    }
}

/// Schema of `gmail_filter`
pub fn filter_schema() -> ResourceSchema {
    use AttributeType::{Bool, Int, SetOfString};

    let criterion = |attr_type, description| {
        Attribute::optional_computed(attr_type, description).force_new()
    };

    let criteria = Block::default()
        .with_attribute(
            "exclude_chats",
            criterion(Bool, "Whether the response should exclude chats"),
        )
        .with_attribute(
            "from",
            criterion(AttributeType::String, "The sender's display name or email address"),
        )
        .with_attribute(
            "has_attachment",
            criterion(Bool, "Whether the message has any attachment"),
        )
        .with_attribute(
            "query",
            criterion(
                AttributeType::String,
                "Only return messages matching the specified query. Supports the same query format as the Gmail search box.",
            ),
        )
        .with_attribute(
            "negated_query",
            criterion(
                AttributeType::String,
                "Only return messages not matching the specified query. Supports the same query format as the Gmail search box.",
            ),
        )
        .with_attribute(
            "size",
            criterion(
                Int,
                "The size of the entire RFC822 message in bytes, including all headers and attachments",
            ),
        )
        .with_attribute(
            "size_comparison",
            criterion(
                AttributeType::String,
                "How the message size in bytes should be in relation to the size field",
            )
            .allowed_values(SizeComparison::VALUES),
        )
        .with_attribute(
            "subject",
            criterion(
                AttributeType::String,
                "Case-insensitive phrase found in the message's subject. Trailing and leading whitespace are trimmed and adjacent spaces are collapsed.",
            ),
        )
        .with_attribute(
            "to",
            criterion(
                AttributeType::String,
                "The recipient's display name or email address. Includes recipients in the \"to\", \"cc\", and \"bcc\" header fields. You can use simply the local part of the email address. For example, \"example\" and \"example@\" both match \"example@gmail.com\". This field is case-insensitive.",
            ),
        );

    let action = Block::default()
        .with_attribute(
            "add_label_ids",
            Attribute::optional(SetOfString, "List of labels to add to the message").force_new(),
        )
        .with_attribute(
            "remove_label_ids",
            Attribute::optional(SetOfString, "List of labels to remove from the message")
                .force_new(),
        )
        .with_attribute(
            "forward",
            Attribute::optional(AttributeType::String, "Email address that the message should be forwarded to")
                .force_new(),
        );

    ResourceSchema {
        version: 0,
        importable: true,
        block: Block::default()
            .with_attribute("id", Attribute::computed(AttributeType::String, "Filter ID assigned by Gmail"))
            .with_block(
                "criteria",
                NestedBlock::single("Matching criteria for the filter", criteria).force_new(),
            )
            .with_block(
                "action",
                NestedBlock::single("Action that the filter performs", action).force_new(),
            ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_arguments() {
        let schema = provider_schema();
        let client = &schema.provider.attributes["client"];
        assert!(client.required);
        assert!(client.sensitive);
        assert_eq!(client.env_default.as_deref(), Some(CLIENT_ENV_VAR));
        assert_eq!(
            schema.provider.attributes["token"].env_default.as_deref(),
            Some(TOKEN_ENV_VAR)
        );
    }

    #[test]
    fn test_filter_blocks_are_single_and_force_new() {
        let schema = provider_schema();
        let filter = schema.resource(FILTER_TYPE_NAME).unwrap();
        assert!(filter.importable);

        for name in ["criteria", "action"] {
            let block = &filter.block.blocks[name];
            assert_eq!((block.min_items, block.max_items), (1, 1));
            assert!(block.force_new);
        }
    }

    #[test]
    fn test_every_filter_attribute_forces_replacement() {
        let filter = filter_schema();
        for nested in filter.block.blocks.values() {
            for (name, attribute) in &nested.block.attributes {
                assert!(attribute.force_new, "{} should force replacement", name);
                assert!(attribute.optional, "{} should be optional", name);
            }
        }

        let criteria = &filter.block.blocks["criteria"].block;
        assert_eq!(criteria.attributes.len(), 9);
        assert!(criteria.attributes.values().all(|a| a.computed));
        assert_eq!(
            criteria.attributes["size_comparison"].allowed_values,
            vec!["larger", "smaller", "unspecified"]
        );
    }

    #[test]
    fn test_schema_serializes() {
        let json = serde_json::to_value(provider_schema()).unwrap();
        assert_eq!(
            json["resources"]["gmail_filter"]["block"]["blocks"]["action"]["block"]["attributes"]
                ["add_label_ids"]["type"],
            "set_of_string"
        );
    }
}
