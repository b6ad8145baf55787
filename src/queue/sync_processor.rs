use std::sync::Arc;

use log::{error, info, warn};
use tokio::sync::broadcast;

use crate::budgets::Budget;
use crate::categories::Category;
use crate::connectivity::ConnectivityObserver;
use crate::errors::{Error, Result};
use crate::queue::operation_queue::OperationQueue;
use crate::queue::queue_model::{QueuedAction, QueuedOperation, ReplayError, SyncNotification};
use crate::repositories::remote_repository::RemoteRepository;
use crate::repositories::repository_traits::{Entity, EntityRepository};
use crate::repositories::transport::Transport;
use crate::transactions::Transaction;

const NOTIFICATION_CAPACITY: usize = 16;

/// Replays the offline queue against the remote backend when connectivity
/// returns.
///
/// Replay is strictly sequential in enqueue order: each entry is awaited
/// before the next, removed from the queue only on success, and left in
/// place on failure for the next pass. There is no backoff, retry budget
/// or idempotency key: a replay pass interrupted between remote success
/// and local dequeue can produce a duplicate on the next pass.
pub struct SyncProcessor {
    queue: Arc<OperationQueue>,
    transactions: RemoteRepository<Transaction>,
    categories: RemoteRepository<Category>,
    budgets: RemoteRepository<Budget>,
    notifications: broadcast::Sender<SyncNotification>,
}

impl SyncProcessor {
    pub fn new(queue: Arc<OperationQueue>, transport: Arc<dyn Transport>) -> Self {
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        SyncProcessor {
            queue,
            transactions: RemoteRepository::new(Arc::clone(&transport)),
            categories: RemoteRepository::new(Arc::clone(&transport)),
            budgets: RemoteRepository::new(transport),
            notifications,
        }
    }

    /// Subscribe to per-pass summaries.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncNotification> {
        self.notifications.subscribe()
    }

    /// Runs one replay pass over the current queue contents and reports
    /// the summary, also broadcast to subscribers.
    pub async fn process_pending_operations(&self) -> Result<SyncNotification> {
        let operations = self.queue.snapshot()?;
        if operations.is_empty() {
            return Ok(SyncNotification {
                successful: 0,
                failed: 0,
                errors: Vec::new(),
            });
        }

        info!("Replaying {} pending offline operations", operations.len());
        let mut successful = 0;
        let mut errors = Vec::new();

        for operation in operations {
            match self.execute(&operation).await {
                Ok(()) => {
                    self.queue.remove(&operation.id)?;
                    successful += 1;
                }
                Err(e) => {
                    warn!(
                        "Replay of {} ({} {}) failed: {}",
                        operation.id,
                        operation.entity,
                        operation.action.name(),
                        e
                    );
                    errors.push(ReplayError {
                        operation_id: operation.id.clone(),
                        entity: operation.entity,
                        action: operation.action.name().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        let summary = SyncNotification {
            successful,
            failed: errors.len(),
            errors,
        };
        info!(
            "Replay pass finished: {} succeeded, {} failed",
            summary.successful, summary.failed
        );
        let _ = self.notifications.send(summary.clone());
        Ok(summary)
    }

    async fn execute(&self, operation: &QueuedOperation) -> Result<()> {
        use crate::repositories::EntityKind;
        match operation.entity {
            EntityKind::Transaction => Self::replay(&self.transactions, &operation.action).await,
            EntityKind::Category => Self::replay(&self.categories, &operation.action).await,
            EntityKind::Budget => Self::replay(&self.budgets, &operation.action).await,
            EntityKind::User => Err(Error::Unknown(format!(
                "no replay target for queued entity '{}'",
                operation.entity
            ))),
        }
    }

    async fn replay<T: Entity>(repo: &RemoteRepository<T>, action: &QueuedAction) -> Result<()> {
        match action {
            QueuedAction::Create { data } => {
                let draft: T::Draft = serde_json::from_value(data.clone())?;
                repo.create(draft).await?;
            }
            QueuedAction::Update { target_id, patch } => {
                let patch: T::Patch = serde_json::from_value(patch.clone())?;
                repo.update(target_id, patch).await?;
            }
            QueuedAction::Delete { target_id } => {
                repo.delete(target_id).await?;
            }
        }
        Ok(())
    }

    /// Spawns a task that runs a replay pass on every offline→online
    /// transition.
    pub fn spawn_on_reconnect(
        self: Arc<Self>,
        connectivity: &ConnectivityObserver,
    ) -> tokio::task::JoinHandle<()> {
        let mut rx = connectivity.subscribe();
        // Snapshot the state at subscription time: a flip that lands before
        // the task first polls must still be seen as a transition.
        let mut was_online = *rx.borrow();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let online = *rx.borrow();
                if online && !was_online {
                    if let Err(e) = self.process_pending_operations().await {
                        error!("Replay pass failed outright: {}", e);
                    }
                }
                was_online = online;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::CategoryKind;
    use crate::storage::{KeyValueStore, MemoryStore};
    use crate::test_support::MockTransport;
    use crate::transactions::TransactionDraft;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn draft(description: &str) -> TransactionDraft {
        TransactionDraft {
            kind: CategoryKind::Expense,
            amount: dec!(5),
            description: description.to_string(),
            category_id: "cat_misc".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 2, 2).unwrap(),
        }
    }

    fn setup() -> (Arc<OperationQueue>, Arc<MockTransport>, SyncProcessor) {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let queue = Arc::new(OperationQueue::new(store));
        let transport = Arc::new(MockTransport::new());
        let processor = SyncProcessor::new(
            Arc::clone(&queue),
            transport.clone() as Arc<dyn Transport>,
        );
        (queue, transport, processor)
    }

    #[tokio::test]
    async fn replay_is_fifo_and_drains_the_queue() {
        let (queue, transport, processor) = setup();

        for name in ["A", "B", "C"] {
            queue
                .enqueue(
                    crate::repositories::EntityKind::Transaction,
                    QueuedAction::Create {
                        data: serde_json::to_value(draft(name)).unwrap(),
                    },
                )
                .unwrap();
        }

        let summary = processor.process_pending_operations().await.unwrap();
        assert_eq!(summary.successful, 3);
        assert_eq!(summary.failed, 0);
        assert!(!queue.has_pending().unwrap());

        // The remote saw the calls in enqueue order.
        let descriptions: Vec<String> = transport
            .calls()
            .iter()
            .filter_map(|c| c.body.as_ref())
            .map(|b| b["description"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(descriptions, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn failed_items_stay_queued_and_are_reported() {
        let (queue, transport, processor) = setup();

        queue
            .enqueue(
                crate::repositories::EntityKind::Transaction,
                QueuedAction::Create {
                    data: serde_json::to_value(draft("ok")).unwrap(),
                },
            )
            .unwrap();
        let failing = queue
            .enqueue(
                crate::repositories::EntityKind::Transaction,
                QueuedAction::Create {
                    data: serde_json::to_value(draft(MockTransport::FAIL_MARKER)).unwrap(),
                },
            )
            .unwrap();

        let mut notifications = processor.subscribe();
        let summary = processor.process_pending_operations().await.unwrap();

        assert_eq!(summary.successful, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.errors[0].operation_id, failing.id);

        // Only the failed entry survives the pass.
        let remaining = queue.snapshot().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, failing.id);

        // The summary was also broadcast.
        let received = notifications.recv().await.unwrap();
        assert_eq!(received, summary);

        let _ = transport;
    }

    #[tokio::test]
    async fn reconnect_triggers_a_pass() {
        let (queue, _transport, processor) = setup();
        let processor = Arc::new(processor);

        queue
            .enqueue(
                crate::repositories::EntityKind::Transaction,
                QueuedAction::Delete {
                    target_id: "txn_gone".to_string(),
                },
            )
            .unwrap();

        let connectivity = ConnectivityObserver::new(false);
        let mut notifications = processor.subscribe();
        let handle = Arc::clone(&processor).spawn_on_reconnect(&connectivity);

        connectivity.set_online();
        let summary = notifications.recv().await.unwrap();
        assert_eq!(summary.successful, 1);
        assert!(!queue.has_pending().unwrap());

        handle.abort();
    }

    #[tokio::test]
    async fn malformed_payload_is_counted_as_failure() {
        let (queue, _transport, processor) = setup();
        queue
            .enqueue(
                crate::repositories::EntityKind::Transaction,
                QueuedAction::Create {
                    data: json!({"not": "a draft"}),
                },
            )
            .unwrap();

        let summary = processor.process_pending_operations().await.unwrap();
        assert_eq!(summary.successful, 0);
        assert_eq!(summary.failed, 1);
        assert_eq!(queue.pending_count().unwrap(), 1);
    }
}
