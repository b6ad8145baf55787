use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{Result, ValidationError};
use crate::repositories::repository_traits::{Entity, EntityKind};

lazy_static! {
    static ref HEX_COLOR_RE: Regex =
        Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("valid color pattern");
}

/// Which side of the ledger a category (and its transactions) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Income,
    Expense,
}

impl CategoryKind {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "income" => Ok(CategoryKind::Income),
            "expense" => Ok(CategoryKind::Expense),
            other => Err(ValidationError::InvalidInput(format!(
                "unknown category type '{}'",
                other
            ))
            .into()),
        }
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryKind::Income => f.write_str("income"),
            CategoryKind::Expense => f.write_str("expense"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CategoryKind,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub parent_id: Option<String>,
    pub is_default: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDraft {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CategoryKind,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Partial update. `parent_id` is tri-state: absent leaves the parent
/// untouched, `null` clears it, a string re-parents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub parent_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Category with its children (for hierarchical display)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWithChildren {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<Category>,
}

fn validate_color(color: &str) -> Result<()> {
    if HEX_COLOR_RE.is_match(color) {
        Ok(())
    } else {
        Err(ValidationError::InvalidColor(color.to_string()).into())
    }
}

impl Entity for Category {
    type Draft = CategoryDraft;
    type Patch = CategoryPatch;
    type Mapper = super::categories_transformer::CategoryMapper;

    const KIND: EntityKind = EntityKind::Category;

    fn id(&self) -> &str {
        &self.id
    }

    fn materialize(draft: CategoryDraft, id: String, now: DateTime<Utc>) -> Self {
        Category {
            id,
            name: draft.name,
            kind: draft.kind,
            color: draft.color,
            icon: draft.icon,
            parent_id: draft.parent_id,
            is_default: draft.is_default,
            is_active: draft.is_active,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: &CategoryPatch, now: DateTime<Utc>) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(color) = &patch.color {
            self.color = Some(color.clone());
        }
        if let Some(icon) = &patch.icon {
            self.icon = Some(icon.clone());
        }
        if let Some(parent_id) = &patch.parent_id {
            self.parent_id = parent_id.clone();
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
        self.updated_at = now;
    }

    fn validate_draft(draft: &CategoryDraft) -> Result<()> {
        if draft.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if let Some(color) = &draft.color {
            validate_color(color)?;
        }
        Ok(())
    }

    fn validate_patch(patch: &CategoryPatch) -> Result<()> {
        if let Some(name) = &patch.name {
            if name.trim().is_empty() {
                return Err(ValidationError::EmptyName.into());
            }
        }
        if let Some(color) = &patch.color {
            validate_color(color)?;
        }
        Ok(())
    }
}
