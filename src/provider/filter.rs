//! The `gmail_filter` resource
//!
//! Holds the typed resource model, its mapping to and from the Gmail wire
//! format, replacement planning, and the create/read/delete/import lifecycle.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};

use crate::context::RequestContext;
use crate::error::{GmailApiError, Result, ValidationError};
use crate::gmail::client::FilterService;
use crate::gmail::types::{Filter, FilterAction, FilterCriteria, SizeComparison};

/// Matching criteria block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CriteriaModel {
    #[serde(default)]
    pub exclude_chats: Option<bool>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub has_attachment: Option<bool>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub negated_query: Option<String>,
    #[serde(default)]
    pub size: Option<i64>,
    #[serde(default)]
    pub size_comparison: Option<SizeComparison>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

/// Action block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionModel {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub add_label_ids: BTreeSet<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub remove_label_ids: BTreeSet<String>,
    #[serde(default)]
    pub forward: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BTreeSet<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl CriteriaModel {
    /// Drop zero values, which Gmail omits when it reports a filter back
    pub fn without_defaults(&self) -> Self {
        Self {
            exclude_chats: self.exclude_chats.filter(|v| *v),
            has_attachment: self.has_attachment.filter(|v| *v),
            size: self.size.filter(|s| *s != 0),
            size_comparison: self
                .size_comparison
                .filter(|c| *c != SizeComparison::Unspecified),
            ..self.clone()
        }
    }
}

/// Desired configuration of a filter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterModel {
    pub criteria: CriteriaModel,
    pub action: ActionModel,
}

/// Stored state of a created filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub id: String,
    pub criteria: CriteriaModel,
    pub action: ActionModel,
}

impl FilterState {
    pub fn model(&self) -> FilterModel {
        FilterModel {
            criteria: self.criteria.clone(),
            action: self.action.clone(),
        }
    }
}

impl FilterModel {
    /// Check the model can be sent and read back unchanged
    pub fn validate(&self) -> Result<()> {
        let c = &self.criteria;
        let strings = [
            ("criteria.0.from", &c.from),
            ("criteria.0.query", &c.query),
            ("criteria.0.negated_query", &c.negated_query),
            ("criteria.0.subject", &c.subject),
            ("criteria.0.to", &c.to),
            ("action.0.forward", &self.action.forward),
        ];

        for (field, value) in strings {
            if value.as_deref().is_some_and(str::is_empty) {
                return Err(ValidationError::EmptyValue {
                    field: field.to_string(),
                }
                .into());
            }
        }

        if let Some(size) = c.size.filter(|s| *s < 0) {
            return Err(ValidationError::Negative {
                field: "criteria.0.size".to_string(),
                value: size,
            }
            .into());
        }

        let labels = [
            ("action.0.add_label_ids", &self.action.add_label_ids),
            ("action.0.remove_label_ids", &self.action.remove_label_ids),
        ];

        for (field, ids) in labels {
            if ids.iter().any(String::is_empty) {
                return Err(ValidationError::EmptyValue {
                    field: field.to_string(),
                }
                .into());
            }
        }

        Ok(())
    }
}

/// Build the wire filter for a criteria/action pair
pub fn to_wire(criteria: &CriteriaModel, action: &ActionModel) -> Filter {
    Filter {
        id: None,
        criteria: FilterCriteria {
            from: criteria.from.clone(),
            to: criteria.to.clone(),
            subject: criteria.subject.clone(),
            query: criteria.query.clone(),
            negated_query: criteria.negated_query.clone(),
            has_attachment: criteria.has_attachment,
            exclude_chats: criteria.exclude_chats,
            size: criteria.size,
            size_comparison: criteria.size_comparison,
        },
        action: FilterAction {
            add_label_ids: action.add_label_ids.iter().cloned().collect(),
            remove_label_ids: action.remove_label_ids.iter().cloned().collect(),
            forward: action.forward.clone(),
        },
    }
}

/// Project a wire filter back onto the resource model
pub fn from_wire(filter: &Filter) -> (CriteriaModel, ActionModel) {
    let criteria = &filter.criteria;
    let action = &filter.action;

    (
        CriteriaModel {
            exclude_chats: criteria.exclude_chats,
            from: criteria.from.clone(),
            has_attachment: criteria.has_attachment,
            query: criteria.query.clone(),
            negated_query: criteria.negated_query.clone(),
            size: criteria.size,
            size_comparison: criteria.size_comparison,
            subject: criteria.subject.clone(),
            to: criteria.to.clone(),
        },
        ActionModel {
            add_label_ids: action.add_label_ids.iter().cloned().collect(),
            remove_label_ids: action.remove_label_ids.iter().cloned().collect(),
            forward: action.forward.clone(),
        },
    )
}

/// Outcome of planning a change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterPlan {
    /// State expected after apply, without an id when one must be created
    pub planned: FilterModel,

    /// Attribute paths whose change forces destroy and recreate
    pub requires_replace: Vec<String>,
}

impl FilterPlan {
    pub fn is_noop(&self) -> bool {
        self.requires_replace.is_empty()
    }
}

/// Merge `config` with the prior state and report replacement paths
///
/// Criteria attributes are computed, so leaving one unset keeps whatever the
/// remote reported. A zero criterion counts as unset on both sides. Action
/// attributes are taken from `config` as given.
pub fn plan_filter(prior: Option<&FilterState>, config: &FilterModel) -> FilterPlan {
    let c = config.criteria.without_defaults();

    let Some(prior) = prior else {
        return FilterPlan {
            planned: FilterModel {
                criteria: c,
                action: config.action.clone(),
            },
            requires_replace: Vec::new(),
        };
    };

    let p = prior.criteria.without_defaults();

    let planned = FilterModel {
        criteria: CriteriaModel {
            exclude_chats: c.exclude_chats.or(p.exclude_chats),
            from: c.from.clone().or_else(|| p.from.clone()),
            has_attachment: c.has_attachment.or(p.has_attachment),
            query: c.query.clone().or_else(|| p.query.clone()),
            negated_query: c.negated_query.clone().or_else(|| p.negated_query.clone()),
            size: c.size.or(p.size),
            size_comparison: c.size_comparison.or(p.size_comparison),
            subject: c.subject.clone().or_else(|| p.subject.clone()),
            to: c.to.clone().or_else(|| p.to.clone()),
        },
        action: config.action.clone(),
    };

    let mut requires_replace = Vec::new();
    let mut changed = |path: &str, differs: bool| {
        if differs {
            requires_replace.push(path.to_string());
        }
    };

    let n = &planned.criteria;
    changed("criteria.0.exclude_chats", n.exclude_chats != p.exclude_chats);
    changed("criteria.0.from", n.from != p.from);
    changed("criteria.0.has_attachment", n.has_attachment != p.has_attachment);
    changed("criteria.0.query", n.query != p.query);
    changed("criteria.0.negated_query", n.negated_query != p.negated_query);
    changed("criteria.0.size", n.size != p.size);
    changed("criteria.0.size_comparison", n.size_comparison != p.size_comparison);
    changed("criteria.0.subject", n.subject != p.subject);
    changed("criteria.0.to", n.to != p.to);

    let a = &planned.action;
    let pa = &prior.action;
    changed("action.0.add_label_ids", a.add_label_ids != pa.add_label_ids);
    changed("action.0.remove_label_ids", a.remove_label_ids != pa.remove_label_ids);
    changed("action.0.forward", a.forward != pa.forward);

    FilterPlan {
        planned,
        requires_replace,
    }
}

/// Lifecycle of `gmail_filter` against a filter service
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterResource;

impl FilterResource {
    /// Create the filter, then read it back to fill computed attributes
    pub async fn create(
        &self,
        service: &dyn FilterService,
        ctx: &RequestContext,
        model: &FilterModel,
    ) -> Result<FilterState> {
        model.validate()?;

        let filter = to_wire(&model.criteria, &model.action);
        let created = service.create_filter(ctx, &filter).await?;

        let id = created.id.filter(|id| !id.is_empty()).ok_or_else(|| {
            GmailApiError::RequestFailed {
                message: "create filter response carried no id".to_string(),
            }
        })?;

        tracing::info!("Created Gmail filter {}", id);

        self.read(service, ctx, &id).await?.ok_or_else(|| {
            GmailApiError::FilterNotFound {
                filter_id: id.clone(),
            }
            .into()
        })
    }

    /// Refresh state from the remote; `None` when the filter no longer exists
    pub async fn read(
        &self,
        service: &dyn FilterService,
        ctx: &RequestContext,
        id: &str,
    ) -> Result<Option<FilterState>> {
        let filter = match service.get_filter(ctx, id).await {
            Ok(filter) => filter,
            Err(e) if e.is_not_found() => {
                tracing::warn!("Gmail filter {} not found, removing from state", id);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let (criteria, action) = from_wire(&filter);

        Ok(Some(FilterState {
            id: filter.id.unwrap_or_else(|| id.to_string()),
            criteria,
            action,
        }))
    }

    /// Delete the filter
    pub async fn delete(
        &self,
        service: &dyn FilterService,
        ctx: &RequestContext,
        id: &str,
    ) -> Result<()> {
        service.delete_filter(ctx, id).await?;
        tracing::info!("Deleted Gmail filter {}", id);
        Ok(())
    }

    /// Adopt an existing filter by id
    pub async fn import(
        &self,
        service: &dyn FilterService,
        ctx: &RequestContext,
        id: &str,
    ) -> Result<FilterState> {
        let id = id.trim();

        let state = self.read(service, ctx, id).await?.ok_or_else(|| {
            GmailApiError::FilterNotFound {
                filter_id: id.to_string(),
            }
        })?;

        tracing::info!("Imported Gmail filter {}", state.id);
        Ok(state)
    }
}
