use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::categories::CategoryKind;
use crate::errors::{Result, ValidationError};
use crate::repositories::repository_traits::{Entity, EntityKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: CategoryKind,
    pub amount: Decimal,
    pub description: String,
    pub category_id: String,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDraft {
    #[serde(rename = "type")]
    pub kind: CategoryKind,
    pub amount: Decimal,
    pub description: String,
    pub category_id: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPatch {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<CategoryKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

/// Income/expense/net aggregate over a set of transactions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionTotals {
    pub income: Decimal,
    pub expenses: Decimal,
    pub net: Decimal,
}

impl TransactionTotals {
    pub fn add(&mut self, transaction: &Transaction) {
        match transaction.kind {
            CategoryKind::Income => self.income += transaction.amount,
            CategoryKind::Expense => self.expenses += transaction.amount,
        }
        self.net = self.income - self.expenses;
    }
}

/// One calendar month of totals, keyed `YYYY-MM`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTotals {
    pub month: String,
    #[serde(flatten)]
    pub totals: TransactionTotals,
}

impl Entity for Transaction {
    type Draft = TransactionDraft;
    type Patch = TransactionPatch;
    type Mapper = super::transactions_transformer::TransactionMapper;

    const KIND: EntityKind = EntityKind::Transaction;

    fn id(&self) -> &str {
        &self.id
    }

    fn materialize(draft: TransactionDraft, id: String, now: DateTime<Utc>) -> Self {
        Transaction {
            id,
            kind: draft.kind,
            amount: draft.amount,
            description: draft.description,
            category_id: draft.category_id,
            date: draft.date,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: &TransactionPatch, now: DateTime<Utc>) {
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(category_id) = &patch.category_id {
            self.category_id = category_id.clone();
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        self.updated_at = now;
    }

    fn validate_draft(draft: &TransactionDraft) -> Result<()> {
        if draft.amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount.into());
        }
        if draft.description.trim().is_empty() {
            return Err(ValidationError::EmptyDescription.into());
        }
        Ok(())
    }

    fn validate_patch(patch: &TransactionPatch) -> Result<()> {
        if let Some(amount) = patch.amount {
            if amount <= Decimal::ZERO {
                return Err(ValidationError::NonPositiveAmount.into());
            }
        }
        if let Some(description) = &patch.description {
            if description.trim().is_empty() {
                return Err(ValidationError::EmptyDescription.into());
            }
        }
        Ok(())
    }
}
