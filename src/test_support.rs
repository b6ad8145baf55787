//! Shared test doubles: an in-memory transport that behaves like the REST
//! backend and records every call it receives.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use crate::errors::{Error, Result, TransportError};
use crate::repositories::repository_traits::EntityKind;
use crate::repositories::transport::Transport;

#[derive(Debug, Clone)]
pub struct TransportCall {
    pub method: &'static str,
    pub resource: String,
    pub id: Option<String>,
    pub body: Option<Value>,
}

#[derive(Default)]
struct MockState {
    calls: Vec<TransportCall>,
    records: std::collections::HashMap<String, Vec<Value>>,
    next_id: usize,
}

/// Fake backend: stores records per resource, assigns `srv_<n>` ids, wraps
/// list responses in a `{"data": …}` envelope, and fails any call whose
/// body or id carries [`MockTransport::FAIL_MARKER`].
pub struct MockTransport {
    state: Mutex<MockState>,
}

impl MockTransport {
    pub const FAIL_MARKER: &'static str = "__fail__";

    pub fn new() -> Self {
        MockTransport {
            state: Mutex::new(MockState::default()),
        }
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .calls
            .clone()
    }

    fn kind_for(resource: &str) -> EntityKind {
        match resource {
            "categories" => EntityKind::Category,
            "budgets" => EntityKind::Budget,
            "users" => EntityKind::User,
            _ => EntityKind::Transaction,
        }
    }

    fn poisoned(value: &Value) -> bool {
        match value {
            Value::String(s) => s == Self::FAIL_MARKER,
            Value::Object(obj) => obj.values().any(Self::poisoned),
            Value::Array(items) => items.iter().any(Self::poisoned),
            _ => false,
        }
    }

    fn fail(resource: &str) -> Error {
        TransportError::RequestFailed {
            url: format!("mock://{}", resource),
            reason: "injected failure".to_string(),
        }
        .into()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        MockTransport::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn create(&self, resource: &str, body: Value) -> Result<Value> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.push(TransportCall {
            method: "create",
            resource: resource.to_string(),
            id: None,
            body: Some(body.clone()),
        });

        if Self::poisoned(&body) {
            return Err(Self::fail(resource));
        }

        state.next_id += 1;
        let id = format!("srv_{}", state.next_id);
        let now = Utc::now().to_rfc3339();

        let mut record = body;
        if let Some(obj) = record.as_object_mut() {
            obj.insert("id".to_string(), json!(id));
            obj.entry("created_at").or_insert(json!(now));
            obj.insert("updated_at".to_string(), json!(now));
        }

        state
            .records
            .entry(resource.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn get_all(&self, resource: &str) -> Result<Value> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.push(TransportCall {
            method: "get_all",
            resource: resource.to_string(),
            id: None,
            body: None,
        });
        let rows = state.records.get(resource).cloned().unwrap_or_default();
        Ok(json!({ "data": rows }))
    }

    async fn get_by_id(&self, resource: &str, id: &str) -> Result<Value> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.push(TransportCall {
            method: "get_by_id",
            resource: resource.to_string(),
            id: Some(id.to_string()),
            body: None,
        });

        state
            .records
            .get(resource)
            .and_then(|rows| rows.iter().find(|r| r["id"] == id).cloned())
            .ok_or_else(|| Error::NotFound(Self::kind_for(resource), id.to_string()))
    }

    async fn update(&self, resource: &str, id: &str, body: Value) -> Result<Value> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.push(TransportCall {
            method: "update",
            resource: resource.to_string(),
            id: Some(id.to_string()),
            body: Some(body.clone()),
        });

        if id == Self::FAIL_MARKER || Self::poisoned(&body) {
            return Err(Self::fail(resource));
        }

        let kind = Self::kind_for(resource);
        let rows = state
            .records
            .get_mut(resource)
            .ok_or_else(|| Error::NotFound(kind, id.to_string()))?;
        let row = rows
            .iter_mut()
            .find(|r| r["id"] == id)
            .ok_or_else(|| Error::NotFound(kind, id.to_string()))?;

        if let (Some(target), Some(patch)) = (row.as_object_mut(), body.as_object()) {
            for (k, v) in patch {
                target.insert(k.clone(), v.clone());
            }
            target.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));
        }
        Ok(row.clone())
    }

    async fn delete(&self, resource: &str, id: &str) -> Result<Value> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.push(TransportCall {
            method: "delete",
            resource: resource.to_string(),
            id: Some(id.to_string()),
            body: None,
        });

        if id == Self::FAIL_MARKER {
            return Err(Self::fail(resource));
        }

        if let Some(rows) = state.records.get_mut(resource) {
            rows.retain(|r| r["id"] != id);
        }
        // Lenient like the real backend: deleting an unknown id succeeds.
        Ok(Value::Null)
    }
}
