use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ValidationError};
use crate::repositories::repository_traits::{Entity, EntityKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDraft {
    pub name: String,
    pub email: String,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl Entity for User {
    type Draft = UserDraft;
    type Patch = UserPatch;
    type Mapper = super::users_transformer::UserMapper;

    const KIND: EntityKind = EntityKind::User;
    // The replay loop only handles transactions, categories and budgets.
    const DEFERRABLE: bool = false;

    fn id(&self) -> &str {
        &self.id
    }

    fn materialize(draft: UserDraft, id: String, now: DateTime<Utc>) -> Self {
        User {
            id,
            name: draft.name,
            email: draft.email,
            currency: draft.currency,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: &UserPatch, now: DateTime<Utc>) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(email) = &patch.email {
            self.email = email.clone();
        }
        if let Some(currency) = &patch.currency {
            self.currency = currency.clone();
        }
        self.updated_at = now;
    }

    fn validate_draft(draft: &UserDraft) -> Result<()> {
        if draft.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }
}
