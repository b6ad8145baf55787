//! Read-side query helpers shared by both repository backends: field
//! filters, the sort comparator and pagination.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate};
use serde_json::Value;

use crate::errors::Result;
use crate::repositories::repository_traits::Entity;

/// A single field predicate. `Contains` is the case-insensitive substring
/// operator used for string filters; `NotNull`/`IsNull` exist for
/// `parentId`-style checks.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    Eq(Value),
    NotNull,
    IsNull,
    Contains(String),
}

/// Conjunction of field predicates, keyed by the camelCase field name the
/// records serialize under.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    predicates: Vec<(String, FilterOp)>,
}

impl FilterSet {
    pub fn new() -> Self {
        FilterSet::default()
    }

    /// The empty filter, matching everything.
    pub fn none() -> Self {
        FilterSet::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.predicates.push((field.into(), FilterOp::Eq(value.into())));
        self
    }

    pub fn not_null(mut self, field: impl Into<String>) -> Self {
        self.predicates.push((field.into(), FilterOp::NotNull));
        self
    }

    pub fn is_null(mut self, field: impl Into<String>) -> Self {
        self.predicates.push((field.into(), FilterOp::IsNull));
        self
    }

    pub fn contains(mut self, field: impl Into<String>, needle: impl Into<String>) -> Self {
        self.predicates
            .push((field.into(), FilterOp::Contains(needle.into())));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Whether a serialized record satisfies every predicate.
    pub fn matches(&self, record: &Value) -> bool {
        self.predicates.iter().all(|(field, op)| {
            let value = record.get(field).unwrap_or(&Value::Null);
            match op {
                FilterOp::Eq(expected) => value == expected,
                FilterOp::NotNull => !value.is_null(),
                FilterOp::IsNull => value.is_null(),
                FilterOp::Contains(needle) => value
                    .as_str()
                    .map(|s| s.to_lowercase().contains(&needle.to_lowercase()))
                    .unwrap_or(false),
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone)]
pub struct PageRequest {
    /// 1-based page index.
    pub page: usize,
    pub limit: usize,
    pub sort_field: Option<String>,
    pub sort_order: SortOrder,
}

impl PageRequest {
    pub fn new(page: usize, limit: usize) -> Self {
        PageRequest {
            page: page.max(1),
            limit: limit.max(1),
            sort_field: None,
            sort_order: SortOrder::Asc,
        }
    }

    pub fn sorted_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort_field = Some(field.into());
        self.sort_order = order;
        self
    }
}

#[derive(Debug, Clone)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
}

/// Normalized comparison key for one field value. Dates sort as
/// timestamps, numbers numerically, strings case-insensitively; null sorts
/// first.
#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Null,
    Number(f64),
    Timestamp(i64),
    Text(String),
}

impl SortKey {
    fn from_value(value: &Value) -> SortKey {
        match value {
            Value::Null => SortKey::Null,
            Value::Bool(b) => SortKey::Number(if *b { 1.0 } else { 0.0 }),
            Value::Number(n) => SortKey::Number(n.as_f64().unwrap_or(0.0)),
            Value::String(s) => {
                if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
                    return SortKey::Timestamp(ts.timestamp_millis());
                }
                if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                    let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
                    return SortKey::Timestamp(midnight.and_utc().timestamp_millis());
                }
                SortKey::Text(s.to_lowercase())
            }
            other => SortKey::Text(other.to_string().to_lowercase()),
        }
    }

    fn compare(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            (SortKey::Null, SortKey::Null) => Ordering::Equal,
            (SortKey::Null, _) => Ordering::Less,
            (_, SortKey::Null) => Ordering::Greater,
            (SortKey::Number(a), SortKey::Number(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (SortKey::Timestamp(a), SortKey::Timestamp(b)) => a.cmp(b),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            // Mixed representations: fall back to a textual comparison so
            // the ordering stays total.
            (a, b) => render(a).cmp(&render(b)),
        }
    }
}

fn render(key: &SortKey) -> String {
    match key {
        SortKey::Null => String::new(),
        SortKey::Number(n) => format!("{:020.6}", n),
        SortKey::Timestamp(t) => format!("{:020}", t),
        SortKey::Text(s) => s.clone(),
    }
}

/// Sorts records on one field with a stable secondary sort by id, so equal
/// keys always come back in a deterministic order.
pub fn sort_records<T: Entity>(items: Vec<T>, field: &str, order: SortOrder) -> Result<Vec<T>> {
    let mut keyed: Vec<(SortKey, String, T)> = Vec::with_capacity(items.len());
    for item in items {
        let value = serde_json::to_value(&item)?;
        let key = SortKey::from_value(value.get(field).unwrap_or(&Value::Null));
        keyed.push((key, item.id().to_string(), item));
    }

    keyed.sort_by(|a, b| {
        let primary = a.0.compare(&b.0);
        let primary = match order {
            SortOrder::Asc => primary,
            SortOrder::Desc => primary.reverse(),
        };
        primary.then_with(|| a.1.cmp(&b.1))
    });

    Ok(keyed.into_iter().map(|(_, _, item)| item).collect())
}

pub fn paginate<T: Entity>(items: Vec<T>, request: &PageRequest) -> Result<PagedResult<T>> {
    let sorted = match &request.sort_field {
        Some(field) => sort_records(items, field, request.sort_order)?,
        None => items,
    };

    // The constructor clamps, but the fields are public; guard against a
    // hand-built `page: 0` or `limit: 0`.
    let page = request.page.max(1);
    let limit = request.limit.max(1);

    let total = sorted.len();
    let total_pages = total.div_ceil(limit).max(1);
    let start = (page - 1) * limit;
    let items = sorted.into_iter().skip(start).take(limit).collect();

    Ok(PagedResult {
        items,
        total,
        page,
        limit,
        total_pages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_matching() {
        let record = json!({
            "id": "cat_1",
            "name": "Groceries",
            "parentId": null,
            "type": "expense",
        });

        assert!(FilterSet::new().eq("type", "expense").matches(&record));
        assert!(!FilterSet::new().eq("type", "income").matches(&record));
        assert!(FilterSet::new().is_null("parentId").matches(&record));
        assert!(!FilterSet::new().not_null("parentId").matches(&record));
        assert!(FilterSet::new().contains("name", "GROC").matches(&record));
        assert!(FilterSet::none().matches(&record));
    }

    #[test]
    fn sort_keys_parse_dates_and_strings() {
        let date = SortKey::from_value(&json!("2024-03-01"));
        let earlier = SortKey::from_value(&json!("2024-01-15"));
        assert_eq!(earlier.compare(&date), Ordering::Less);

        let a = SortKey::from_value(&json!("apple"));
        let b = SortKey::from_value(&json!("Banana"));
        assert_eq!(a.compare(&b), Ordering::Less);

        let null = SortKey::from_value(&Value::Null);
        assert_eq!(null.compare(&a), Ordering::Less);
    }
}
