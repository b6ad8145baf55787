use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::repositories::EntityKind;

/// The closed set of mutating operations the offline decorator may defer.
///
/// The target's id is named `target_id` so the flattened action never
/// shadows the operation's own `id` in the persisted JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum QueuedAction {
    Create {
        data: Value,
    },
    Update {
        #[serde(rename = "targetId")]
        target_id: String,
        patch: Value,
    },
    Delete {
        #[serde(rename = "targetId")]
        target_id: String,
    },
}

impl QueuedAction {
    pub fn name(&self) -> &'static str {
        match self {
            QueuedAction::Create { .. } => "create",
            QueuedAction::Update { .. } => "update",
            QueuedAction::Delete { .. } => "delete",
        }
    }
}

/// One deferred mutation, persisted in enqueue order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedOperation {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub entity: EntityKind,
    #[serde(flatten)]
    pub action: QueuedAction,
}

/// Per-operation failure captured during a replay pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayError {
    pub operation_id: String,
    pub entity: EntityKind,
    pub action: String,
    pub message: String,
}

/// Summary of one replay pass, broadcast after the pass completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncNotification {
    pub successful: usize,
    pub failed: usize,
    pub errors: Vec<ReplayError>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn queued_operation_serializes_with_flattened_action() {
        let op = QueuedOperation {
            id: "op_abc".to_string(),
            timestamp: Utc::now(),
            entity: EntityKind::Transaction,
            action: QueuedAction::Update {
                target_id: "txn_1".to_string(),
                patch: json!({"description": "Dinner"}),
            },
        };

        let value = serde_json::to_value(&op).unwrap();
        assert_eq!(value["entity"], "transaction");
        assert_eq!(value["action"], "update");
        assert_eq!(value["patch"]["description"], "Dinner");
        // The operation id and the target id must not collide in the map.
        assert_eq!(value["id"], "op_abc");
        assert_eq!(value["targetId"], "txn_1");

        let back: QueuedOperation = serde_json::from_value(value).unwrap();
        assert_eq!(back, op);
    }

    #[test]
    fn delete_round_trips_with_both_ids_intact() {
        let op = QueuedOperation {
            id: "op_del".to_string(),
            timestamp: Utc::now(),
            entity: EntityKind::Category,
            action: QueuedAction::Delete {
                target_id: "cat_9".to_string(),
            },
        };

        let raw = serde_json::to_string(&op).unwrap();
        let back: QueuedOperation = serde_json::from_str(&raw).unwrap();
        assert_eq!(back.id, "op_del");
        assert_eq!(
            back.action,
            QueuedAction::Delete {
                target_id: "cat_9".to_string()
            }
        );
    }
}
