use serde_json::{json, Value};

use super::users_model::{User, UserDraft, UserPatch};
use crate::errors::Result;
use crate::repositories::repository_traits::WireMapper;
use crate::repositories::wire::{coerce_timestamp, string_field, PatchBody};

#[derive(Default)]
pub struct UserMapper;

impl WireMapper<User> for UserMapper {
    fn from_backend(&self, value: Value) -> Result<User> {
        Ok(User {
            id: string_field(&value, "id")?,
            name: string_field(&value, "name")?,
            email: string_field(&value, "email")?,
            currency: string_field(&value, "currency")?,
            created_at: coerce_timestamp(value.get("created_at")),
            updated_at: coerce_timestamp(value.get("updated_at")),
        })
    }

    fn to_backend_create(&self, draft: &UserDraft) -> Result<Value> {
        Ok(json!({
            "name": draft.name,
            "email": draft.email,
            "currency": draft.currency,
        }))
    }

    fn to_backend_update(&self, patch: &UserPatch) -> Result<Value> {
        Ok(PatchBody::new()
            .set("name", patch.name.clone())
            .set("email", patch.email.clone())
            .set("currency", patch.currency.clone())
            .into_value())
    }
}
