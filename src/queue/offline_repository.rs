use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::info;

use crate::connectivity::ConnectivityObserver;
use crate::errors::Result;
use crate::queue::operation_queue::OperationQueue;
use crate::queue::queue_model::QueuedAction;
use crate::repositories::query::FilterSet;
use crate::repositories::remote_repository::RemoteRepository;
use crate::repositories::repository_traits::{
    generate_temp_id, Entity, EntityRepository, MutationOutcome,
};

/// Decorator around the remote repository that defers mutations while
/// offline instead of letting them fail on the wire.
///
/// Reads always forward. Mutating calls check connectivity first: when
/// offline the call is recorded in the operation queue and a `Queued`
/// outcome is returned immediately; for `create` it carries a local echo
/// of the record under a client-temporary id.
pub struct OfflineAwareRepository<T: Entity> {
    inner: Arc<RemoteRepository<T>>,
    queue: Arc<OperationQueue>,
    connectivity: ConnectivityObserver,
}

impl<T: Entity> OfflineAwareRepository<T> {
    pub fn new(
        inner: Arc<RemoteRepository<T>>,
        queue: Arc<OperationQueue>,
        connectivity: ConnectivityObserver,
    ) -> Self {
        OfflineAwareRepository {
            inner,
            queue,
            connectivity,
        }
    }
}

#[async_trait]
impl<T: Entity> EntityRepository<T> for OfflineAwareRepository<T> {
    async fn create(&self, draft: T::Draft) -> Result<MutationOutcome<T>> {
        if self.connectivity.is_online() {
            return self.inner.create(draft).await;
        }

        T::validate_draft(&draft)?;
        let echo = T::materialize(draft.clone(), generate_temp_id(), Utc::now());
        let operation = self.queue.enqueue(
            T::KIND,
            QueuedAction::Create {
                data: serde_json::to_value(&draft)?,
            },
        )?;

        info!("Deferred {} create as {}", T::KIND, operation.id);
        Ok(MutationOutcome::Queued {
            operation_id: operation.id,
            echo: Some(echo),
        })
    }

    async fn get_all(&self, filters: &FilterSet) -> Result<Vec<T>> {
        self.inner.get_all(filters).await
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<T>> {
        self.inner.get_by_id(id).await
    }

    async fn update(&self, id: &str, patch: T::Patch) -> Result<MutationOutcome<T>> {
        if self.connectivity.is_online() {
            return self.inner.update(id, patch).await;
        }

        T::validate_patch(&patch)?;
        let operation = self.queue.enqueue(
            T::KIND,
            QueuedAction::Update {
                target_id: id.to_string(),
                patch: serde_json::to_value(&patch)?,
            },
        )?;

        info!("Deferred {} update of {} as {}", T::KIND, id, operation.id);
        Ok(MutationOutcome::Queued {
            operation_id: operation.id,
            echo: None,
        })
    }

    async fn delete(&self, id: &str) -> Result<MutationOutcome<()>> {
        if self.connectivity.is_online() {
            return self.inner.delete(id).await;
        }

        let operation = self.queue.enqueue(
            T::KIND,
            QueuedAction::Delete {
                target_id: id.to_string(),
            },
        )?;

        info!("Deferred {} delete of {} as {}", T::KIND, id, operation.id);
        Ok(MutationOutcome::Queued {
            operation_id: operation.id,
            echo: None,
        })
    }
}
