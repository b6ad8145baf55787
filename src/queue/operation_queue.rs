use std::sync::{Arc, Mutex};

use chrono::Utc;
use log::{debug, info};
use uuid::Uuid;

use crate::constants::STORAGE_KEY_OFFLINE_QUEUE;
use crate::errors::Result;
use crate::queue::queue_model::{QueuedAction, QueuedOperation};
use crate::repositories::EntityKind;
use crate::storage::KeyValueStore;

/// Durable FIFO of deferred mutations, persisted as one JSON array under
/// the queue storage key. Entries are appended while offline and removed
/// only after the corresponding remote call succeeds.
pub struct OperationQueue {
    store: Arc<dyn KeyValueStore>,
    // Serializes the load-mutate-persist cycle.
    lock: Mutex<()>,
}

impl OperationQueue {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        OperationQueue {
            store,
            lock: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<Vec<QueuedOperation>> {
        match self.store.get(STORAGE_KEY_OFFLINE_QUEUE)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    fn persist(&self, operations: &[QueuedOperation]) -> Result<()> {
        self.store
            .set(STORAGE_KEY_OFFLINE_QUEUE, &serde_json::to_string(operations)?)
    }

    /// Appends an operation and returns the persisted record.
    pub fn enqueue(&self, entity: EntityKind, action: QueuedAction) -> Result<QueuedOperation> {
        let operation = QueuedOperation {
            id: format!("op_{}", &Uuid::new_v4().simple().to_string()[..12]),
            timestamp: Utc::now(),
            entity,
            action,
        };

        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut operations = self.load()?;
        operations.push(operation.clone());
        self.persist(&operations)?;

        debug!(
            "Queued offline {} on {} as {}",
            operation.action.name(),
            operation.entity,
            operation.id
        );
        Ok(operation)
    }

    /// The queue contents in enqueue (FIFO) order.
    pub fn snapshot(&self) -> Result<Vec<QueuedOperation>> {
        self.load()
    }

    /// Removes one entry after its remote call succeeded. Unknown ids are
    /// a no-op.
    pub fn remove(&self, operation_id: &str) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut operations = self.load()?;
        operations.retain(|op| op.id != operation_id);
        self.persist(&operations)
    }

    /// Drops every queued entry. Used for resets and tests.
    pub fn clear(&self) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        self.store.remove(STORAGE_KEY_OFFLINE_QUEUE)?;
        info!("Cleared offline operation queue");
        Ok(())
    }

    pub fn pending_count(&self) -> Result<usize> {
        Ok(self.load()?.len())
    }

    pub fn has_pending(&self) -> Result<bool> {
        Ok(!self.load()?.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;

    fn queue_with_store() -> (OperationQueue, Arc<dyn KeyValueStore>) {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        (OperationQueue::new(Arc::clone(&store)), store)
    }

    #[test]
    fn enqueue_preserves_fifo_order() {
        let (queue, _) = queue_with_store();
        for n in 0..3 {
            queue
                .enqueue(
                    EntityKind::Transaction,
                    QueuedAction::Create {
                        data: json!({"n": n}),
                    },
                )
                .unwrap();
        }

        let snapshot = queue.snapshot().unwrap();
        assert_eq!(snapshot.len(), 3);
        for (n, op) in snapshot.iter().enumerate() {
            match &op.action {
                QueuedAction::Create { data } => assert_eq!(data["n"], n),
                other => panic!("unexpected action {:?}", other),
            }
        }
    }

    #[test]
    fn queue_survives_reinstantiation() {
        let (queue, store) = queue_with_store();
        queue
            .enqueue(
                EntityKind::Budget,
                QueuedAction::Delete {
                    target_id: "bud_1".to_string(),
                },
            )
            .unwrap();

        let reopened = OperationQueue::new(store);
        assert_eq!(reopened.pending_count().unwrap(), 1);
        assert!(reopened.has_pending().unwrap());
    }

    #[test]
    fn persisted_updates_and_deletes_stay_loadable() {
        let (queue, store) = queue_with_store();
        queue
            .enqueue(
                EntityKind::Transaction,
                QueuedAction::Create {
                    data: json!({"description": "Taxi"}),
                },
            )
            .unwrap();
        let update = queue
            .enqueue(
                EntityKind::Transaction,
                QueuedAction::Update {
                    target_id: "txn_1".to_string(),
                    patch: json!({"amount": 9}),
                },
            )
            .unwrap();
        queue
            .enqueue(
                EntityKind::Transaction,
                QueuedAction::Delete {
                    target_id: "txn_2".to_string(),
                },
            )
            .unwrap();

        // Reload from the raw persisted JSON, as a fresh process would.
        let reopened = OperationQueue::new(store);
        let snapshot = reopened.snapshot().unwrap();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot[1].id, update.id);
        assert_eq!(
            snapshot[1].action,
            QueuedAction::Update {
                target_id: "txn_1".to_string(),
                patch: json!({"amount": 9}),
            }
        );

        reopened.remove(&update.id).unwrap();
        assert_eq!(reopened.pending_count().unwrap(), 2);
    }

    #[test]
    fn remove_and_clear() {
        let (queue, _) = queue_with_store();
        let first = queue
            .enqueue(
                EntityKind::Category,
                QueuedAction::Delete {
                    target_id: "cat_1".to_string(),
                },
            )
            .unwrap();
        queue
            .enqueue(
                EntityKind::Category,
                QueuedAction::Delete {
                    target_id: "cat_2".to_string(),
                },
            )
            .unwrap();

        queue.remove(&first.id).unwrap();
        assert_eq!(queue.pending_count().unwrap(), 1);

        // Removing an unknown id is a no-op.
        queue.remove("op_missing").unwrap();
        assert_eq!(queue.pending_count().unwrap(), 1);

        queue.clear().unwrap();
        assert!(!queue.has_pending().unwrap());
    }
}
