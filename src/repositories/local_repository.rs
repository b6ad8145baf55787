use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use tokio::sync::Mutex;

use crate::errors::{Error, Result};
use crate::repositories::query::FilterSet;
use crate::repositories::repository_traits::{
    generate_id, Entity, EntityRepository, MutationOutcome,
};
use crate::storage::KeyValueStore;

/// Repository over the local key-value store: the whole collection lives
/// as one JSON array under the entity's storage key, read and rewritten
/// per mutation.
///
/// The mutex serializes the read-modify-write cycle so two concurrent
/// creates cannot overwrite each other's snapshot.
pub struct LocalRepository<T: Entity> {
    store: Arc<dyn KeyValueStore>,
    write_lock: Mutex<()>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> LocalRepository<T> {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        LocalRepository {
            store,
            write_lock: Mutex::new(()),
            _entity: PhantomData,
        }
    }

    fn load(&self) -> Result<Vec<T>> {
        match self.store.get(T::KIND.storage_key())? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    fn persist(&self, records: &[T]) -> Result<()> {
        self.store
            .set(T::KIND.storage_key(), &serde_json::to_string(records)?)
    }
}

#[async_trait]
impl<T: Entity> EntityRepository<T> for LocalRepository<T> {
    async fn create(&self, draft: T::Draft) -> Result<MutationOutcome<T>> {
        T::validate_draft(&draft)?;

        let _guard = self.write_lock.lock().await;
        let mut records = self.load()?;

        let record = T::materialize(draft, generate_id(T::KIND), Utc::now());
        records.push(record.clone());
        self.persist(&records)?;

        debug!("Created local {} {}", T::KIND, record.id());
        Ok(MutationOutcome::Applied(record))
    }

    async fn get_all(&self, filters: &FilterSet) -> Result<Vec<T>> {
        let records = self.load()?;
        if filters.is_empty() {
            return Ok(records);
        }

        let mut matched = Vec::new();
        for record in records {
            if filters.matches(&serde_json::to_value(&record)?) {
                matched.push(record);
            }
        }
        Ok(matched)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<T>> {
        Ok(self.load()?.into_iter().find(|r| r.id() == id))
    }

    async fn update(&self, id: &str, patch: T::Patch) -> Result<MutationOutcome<T>> {
        T::validate_patch(&patch)?;

        let _guard = self.write_lock.lock().await;
        let mut records = self.load()?;

        let record = records
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| Error::NotFound(T::KIND, id.to_string()))?;

        record.apply_patch(&patch, Utc::now());
        let updated = record.clone();
        self.persist(&records)?;

        Ok(MutationOutcome::Applied(updated))
    }

    async fn delete(&self, id: &str) -> Result<MutationOutcome<()>> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load()?;

        let index = records
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| Error::NotFound(T::KIND, id.to_string()))?;

        records.remove(index);
        self.persist(&records)?;

        debug!("Deleted local {} {}", T::KIND, id);
        Ok(MutationOutcome::Applied(()))
    }
}
