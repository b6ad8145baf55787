//! Wire mapping for transactions. The backend sends amounts as numbers or
//! strings and dates as `YYYY-MM-DD`; both are coerced here.

use serde_json::{json, Value};

use super::transactions_model::{Transaction, TransactionDraft, TransactionPatch};
use crate::categories::CategoryKind;
use crate::errors::{Result, ValidationError};
use crate::repositories::repository_traits::WireMapper;
use crate::repositories::wire::{coerce_date, coerce_decimal, coerce_timestamp, string_field, PatchBody};

#[derive(Default)]
pub struct TransactionMapper;

impl WireMapper<Transaction> for TransactionMapper {
    fn from_backend(&self, value: Value) -> Result<Transaction> {
        Ok(Transaction {
            id: string_field(&value, "id")?,
            kind: CategoryKind::parse(&string_field(&value, "type")?)?,
            amount: coerce_decimal(value.get("amount").unwrap_or(&Value::Null))?,
            description: string_field(&value, "description")?,
            category_id: string_field(&value, "category_id")?,
            date: coerce_date(value.get("date").unwrap_or(&Value::Null))?,
            created_at: coerce_timestamp(value.get("created_at")),
            updated_at: coerce_timestamp(value.get("updated_at")),
        })
    }

    fn to_backend_create(&self, draft: &TransactionDraft) -> Result<Value> {
        Ok(json!({
            "type": draft.kind,
            "amount": draft.amount,
            "description": draft.description,
            "category_id": draft.category_id,
            "date": draft.date.format("%Y-%m-%d").to_string(),
        }))
    }

    fn to_backend_update(&self, patch: &TransactionPatch) -> Result<Value> {
        Ok(PatchBody::new()
            .set_value("type", patch.kind.map(|k| json!(k)))
            .set_value(
                "amount",
                patch.amount.map(|a| serde_json::to_value(a)).transpose()?,
            )
            .set("description", patch.description.clone())
            .set("category_id", patch.category_id.clone())
            .set(
                "date",
                patch.date.map(|d| d.format("%Y-%m-%d").to_string()),
            )
            .into_value())
    }
}
