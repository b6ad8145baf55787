//! Wire mapping for categories: snake_case backend rows to and from the
//! in-process record. Pure functions, no I/O.

use serde_json::{json, Value};

use super::categories_model::{Category, CategoryDraft, CategoryKind, CategoryPatch};
use crate::errors::Result;
use crate::repositories::repository_traits::WireMapper;
use crate::repositories::wire::{
    bool_field, coerce_timestamp, optional_string_field, string_field, PatchBody,
};

#[derive(Default)]
pub struct CategoryMapper;

impl WireMapper<Category> for CategoryMapper {
    fn from_backend(&self, value: Value) -> Result<Category> {
        Ok(Category {
            id: string_field(&value, "id")?,
            name: string_field(&value, "name")?,
            kind: CategoryKind::parse(&string_field(&value, "type")?)?,
            color: optional_string_field(&value, "color"),
            icon: optional_string_field(&value, "icon"),
            parent_id: optional_string_field(&value, "parent_id"),
            is_default: bool_field(&value, "is_default", false),
            is_active: bool_field(&value, "is_active", true),
            created_at: coerce_timestamp(value.get("created_at")),
            updated_at: coerce_timestamp(value.get("updated_at")),
        })
    }

    fn to_backend_create(&self, draft: &CategoryDraft) -> Result<Value> {
        Ok(json!({
            "name": draft.name,
            "type": draft.kind,
            "color": draft.color,
            "icon": draft.icon,
            "parent_id": draft.parent_id,
            "is_default": draft.is_default,
            "is_active": draft.is_active,
        }))
    }

    fn to_backend_update(&self, patch: &CategoryPatch) -> Result<Value> {
        let parent_id = patch
            .parent_id
            .clone()
            .map(|p| p.map(Value::from).unwrap_or(Value::Null));

        Ok(PatchBody::new()
            .set("name", patch.name.clone())
            .set("color", patch.color.clone())
            .set("icon", patch.icon.clone())
            .set_value("parent_id", parent_id)
            .set("is_active", patch.is_active)
            .into_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_backend_coerces_flags_and_timestamps() {
        let mapper = CategoryMapper;
        let row = json!({
            "id": "cat_1",
            "name": "Groceries",
            "type": "expense",
            "color": "#4f9d69",
            "parent_id": null,
            "is_default": 1,
            "created_at": "2024-01-01T00:00:00Z",
        });

        let category = mapper.from_backend(row).unwrap();
        assert_eq!(category.kind, CategoryKind::Expense);
        assert!(category.is_default);
        assert!(category.is_active);
        assert!(category.parent_id.is_none());
    }

    #[test]
    fn update_body_carries_an_explicit_null_to_clear_the_parent() {
        let mapper = CategoryMapper;
        let patch = CategoryPatch {
            parent_id: Some(None),
            ..Default::default()
        };
        let body = mapper.to_backend_update(&patch).unwrap();
        assert!(body.get("parent_id").unwrap().is_null());
        assert!(body.get("name").is_none());
    }
}
