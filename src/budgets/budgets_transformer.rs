//! Wire mapping for budgets.

use serde_json::{json, Value};

use super::budgets_model::{Budget, BudgetDraft, BudgetPatch, BudgetPeriod};
use crate::constants::DEFAULT_ALERT_THRESHOLD;
use crate::errors::{Result, ValidationError};
use crate::repositories::repository_traits::WireMapper;
use crate::repositories::wire::{
    bool_field, coerce_date, coerce_decimal, coerce_timestamp, string_field, PatchBody,
};

#[derive(Default)]
pub struct BudgetMapper;

fn threshold_field(value: &Value) -> Result<u8> {
    match value.get("alert_threshold") {
        None | Some(Value::Null) => Ok(DEFAULT_ALERT_THRESHOLD),
        Some(v) => v
            .as_u64()
            .filter(|n| *n <= 100)
            .map(|n| n as u8)
            .ok_or_else(|| {
                ValidationError::InvalidInput(format!("bad alert_threshold: {}", v)).into()
            }),
    }
}

impl WireMapper<Budget> for BudgetMapper {
    fn from_backend(&self, value: Value) -> Result<Budget> {
        Ok(Budget {
            id: string_field(&value, "id")?,
            category_id: string_field(&value, "category_id")?,
            amount: coerce_decimal(value.get("amount").unwrap_or(&Value::Null))?,
            period: BudgetPeriod::parse(&string_field(&value, "period")?)?,
            start_date: coerce_date(value.get("start_date").unwrap_or(&Value::Null))?,
            end_date: coerce_date(value.get("end_date").unwrap_or(&Value::Null))?,
            alert_threshold: threshold_field(&value)?,
            is_active: bool_field(&value, "is_active", true),
            created_at: coerce_timestamp(value.get("created_at")),
            updated_at: coerce_timestamp(value.get("updated_at")),
        })
    }

    fn to_backend_create(&self, draft: &BudgetDraft) -> Result<Value> {
        let end_date = draft
            .end_date
            .unwrap_or_else(|| draft.period.end_of(draft.start_date));
        Ok(json!({
            "category_id": draft.category_id,
            "amount": draft.amount,
            "period": draft.period,
            "start_date": draft.start_date.format("%Y-%m-%d").to_string(),
            "end_date": end_date.format("%Y-%m-%d").to_string(),
            "alert_threshold": draft.alert_threshold,
            "is_active": draft.is_active,
        }))
    }

    fn to_backend_update(&self, patch: &BudgetPatch) -> Result<Value> {
        Ok(PatchBody::new()
            .set_value(
                "amount",
                patch.amount.map(serde_json::to_value).transpose()?,
            )
            .set_value("period", patch.period.map(|p| json!(p)))
            .set(
                "start_date",
                patch.start_date.map(|d| d.format("%Y-%m-%d").to_string()),
            )
            .set(
                "end_date",
                patch.end_date.map(|d| d.format("%Y-%m-%d").to_string()),
            )
            .set("alert_threshold", patch.alert_threshold.map(u64::from))
            .set("is_active", patch.is_active)
            .into_value())
    }
}
