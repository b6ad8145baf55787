use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use serde_json::Value;

use crate::errors::{Error, Result};
use crate::repositories::query::FilterSet;
use crate::repositories::repository_traits::{
    Entity, EntityRepository, MutationOutcome, WireMapper,
};
use crate::repositories::transport::Transport;

/// Repository over the REST backend: delegates to the transport and maps
/// the wire shape through the entity's transformer.
pub struct RemoteRepository<T: Entity> {
    transport: Arc<dyn Transport>,
    mapper: T::Mapper,
}

impl<T: Entity> RemoteRepository<T> {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        RemoteRepository {
            transport,
            mapper: T::Mapper::default(),
        }
    }

    /// Response-shape normalization: the backend variously returns a bare
    /// object, a bare array, or a `{"data": …}` envelope.
    fn normalize_rows(value: Value) -> Vec<Value> {
        match value {
            Value::Array(rows) => rows,
            Value::Object(mut obj) => match obj.remove("data") {
                Some(Value::Array(rows)) => rows,
                Some(row @ Value::Object(_)) => vec![row],
                _ => vec![Value::Object(obj)],
            },
            Value::Null => Vec::new(),
            other => vec![other],
        }
    }

    fn normalize_record(value: Value) -> Result<Value> {
        Self::normalize_rows(value)
            .into_iter()
            .next()
            .ok_or_else(|| Error::Unknown("backend returned an empty response".to_string()))
    }
}

#[async_trait]
impl<T: Entity> EntityRepository<T> for RemoteRepository<T> {
    async fn create(&self, draft: T::Draft) -> Result<MutationOutcome<T>> {
        T::validate_draft(&draft)?;

        let body = self.mapper.to_backend_create(&draft)?;
        let response = self.transport.create(T::KIND.resource(), body).await?;
        let record = self.mapper.from_backend(Self::normalize_record(response)?)?;

        debug!("Created remote {} {}", T::KIND, record.id());
        Ok(MutationOutcome::Applied(record))
    }

    async fn get_all(&self, filters: &FilterSet) -> Result<Vec<T>> {
        let response = self.transport.get_all(T::KIND.resource()).await?;

        let mut records = Vec::new();
        for row in Self::normalize_rows(response) {
            let record = self.mapper.from_backend(row)?;
            if filters.is_empty() || filters.matches(&serde_json::to_value(&record)?) {
                records.push(record);
            }
        }
        Ok(records)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<T>> {
        match self.transport.get_by_id(T::KIND.resource(), id).await {
            Ok(Value::Null) => Ok(None),
            Ok(value) => Ok(Some(self.mapper.from_backend(Self::normalize_record(value)?)?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn update(&self, id: &str, patch: T::Patch) -> Result<MutationOutcome<T>> {
        T::validate_patch(&patch)?;

        let body = self.mapper.to_backend_update(&patch)?;
        let response = self.transport.update(T::KIND.resource(), id, body).await?;
        let record = self.mapper.from_backend(Self::normalize_record(response)?)?;

        Ok(MutationOutcome::Applied(record))
    }

    async fn delete(&self, id: &str) -> Result<MutationOutcome<()>> {
        self.transport.delete(T::KIND.resource(), id).await?;
        debug!("Deleted remote {} {}", T::KIND, id);
        Ok(MutationOutcome::Applied(()))
    }
}
