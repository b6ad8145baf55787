use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{
    STORAGE_KEY_BUDGETS, STORAGE_KEY_CATEGORIES, STORAGE_KEY_TRANSACTIONS, STORAGE_KEY_USERS,
    TEMP_ID_PREFIX,
};
use crate::errors::Result;
use crate::repositories::query::{FilterSet, PageRequest, PagedResult};

/// The persisted entity families the repositories operate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Transaction,
    Category,
    Budget,
    User,
}

impl EntityKind {
    pub fn storage_key(&self) -> &'static str {
        match self {
            EntityKind::Transaction => STORAGE_KEY_TRANSACTIONS,
            EntityKind::Category => STORAGE_KEY_CATEGORIES,
            EntityKind::Budget => STORAGE_KEY_BUDGETS,
            EntityKind::User => STORAGE_KEY_USERS,
        }
    }

    /// REST resource segment for the remote backend.
    pub fn resource(&self) -> &'static str {
        match self {
            EntityKind::Transaction => "transactions",
            EntityKind::Category => "categories",
            EntityKind::Budget => "budgets",
            EntityKind::User => "users",
        }
    }

    fn id_prefix(&self) -> &'static str {
        match self {
            EntityKind::Transaction => "txn",
            EntityKind::Category => "cat",
            EntityKind::Budget => "bud",
            EntityKind::User => "usr",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Transaction => "transaction",
            EntityKind::Category => "category",
            EntityKind::Budget => "budget",
            EntityKind::User => "user",
        };
        f.write_str(name)
    }
}

fn short_uuid() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    raw[..12].to_string()
}

/// Server-style id with an entity prefix, e.g. `cat_1f8a9b0c2d3e`.
pub fn generate_id(kind: EntityKind) -> String {
    format!("{}_{}", kind.id_prefix(), short_uuid())
}

/// Client-temporary id handed out for records created while offline.
pub fn generate_temp_id() -> String {
    format!("{}_{}", TEMP_ID_PREFIX, short_uuid())
}

pub fn is_temp_id(id: &str) -> bool {
    id.starts_with(TEMP_ID_PREFIX)
}

/// A persisted domain record with its creation/update payload shapes.
pub trait Entity:
    Clone + fmt::Debug + Send + Sync + Serialize + DeserializeOwned + 'static
{
    type Draft: Clone + fmt::Debug + Send + Sync + Serialize + DeserializeOwned + 'static;
    type Patch: Clone + fmt::Debug + Send + Sync + Serialize + DeserializeOwned + 'static;
    type Mapper: WireMapper<Self> + Default + 'static;

    const KIND: EntityKind;

    /// Whether offline mutations may be queued for later replay. Entities
    /// outside the replay domain write straight through.
    const DEFERRABLE: bool = true;

    fn id(&self) -> &str;

    /// Build a full record from a validated draft.
    fn materialize(draft: Self::Draft, id: String, now: DateTime<Utc>) -> Self;

    /// Apply a partial update in place, refreshing `updated_at`.
    fn apply_patch(&mut self, patch: &Self::Patch, now: DateTime<Utc>);

    fn validate_draft(draft: &Self::Draft) -> Result<()>;

    fn validate_patch(patch: &Self::Patch) -> Result<()> {
        let _ = patch;
        Ok(())
    }
}

/// Pure mapping between the backend wire format (snake_case, loosely typed)
/// and the in-process record. No I/O.
pub trait WireMapper<T: Entity>: Send + Sync {
    fn from_backend(&self, value: serde_json::Value) -> Result<T>;
    fn to_backend_create(&self, draft: &T::Draft) -> Result<serde_json::Value>;
    fn to_backend_update(&self, patch: &T::Patch) -> Result<serde_json::Value>;
}

/// Outcome of a mutating repository call.
///
/// `Queued` is the typed form of the original's synthetic
/// `{success, offline: true, operationId, data}` response: the write was
/// accepted into the offline queue, not applied against the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome<T> {
    Applied(T),
    Queued {
        operation_id: String,
        /// Local echo of the record for `create` (with a temporary id);
        /// absent for `update`/`delete`, where no stored record is at hand.
        echo: Option<T>,
    },
}

impl<T> MutationOutcome<T> {
    pub fn is_queued(&self) -> bool {
        matches!(self, MutationOutcome::Queued { .. })
    }

    pub fn applied(self) -> Option<T> {
        match self {
            MutationOutcome::Applied(value) => Some(value),
            MutationOutcome::Queued { .. } => None,
        }
    }

    /// The applied record, or the local echo when the write was queued.
    pub fn record(&self) -> Option<&T> {
        match self {
            MutationOutcome::Applied(value) => Some(value),
            MutationOutcome::Queued { echo, .. } => echo.as_ref(),
        }
    }
}

/// Per-item failure inside a bulk operation.
#[derive(Debug, Clone)]
pub struct BulkFailure {
    pub index: usize,
    pub id: Option<String>,
    pub error: String,
}

/// Aggregate result of a bulk operation. There is no rollback: items
/// applied before a failure stay applied.
#[derive(Debug, Clone)]
pub struct BulkOutcome<T> {
    pub succeeded: Vec<MutationOutcome<T>>,
    pub failed: Vec<BulkFailure>,
}

// Not derived: the derive would demand `T: Default` for empty vectors.
impl<T> Default for BulkOutcome<T> {
    fn default() -> Self {
        BulkOutcome {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }
}

impl<T> BulkOutcome<T> {
    pub fn success_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }
}

/// Uniform CRUD + query contract shared by the local and remote
/// repositories, so callers stay persistence-agnostic.
///
/// Every operation returns `Result`; the original's mixed
/// "writes return result objects, some reads throw" discipline is
/// deliberately normalized (see DESIGN.md).
#[async_trait]
pub trait EntityRepository<T: Entity>: Send + Sync {
    async fn create(&self, draft: T::Draft) -> Result<MutationOutcome<T>>;

    async fn get_all(&self, filters: &FilterSet) -> Result<Vec<T>>;

    async fn get_by_id(&self, id: &str) -> Result<Option<T>>;

    /// Fails with `Error::NotFound` if `id` is absent.
    async fn update(&self, id: &str, patch: T::Patch) -> Result<MutationOutcome<T>>;

    /// Fails with `Error::NotFound` if `id` is absent.
    async fn delete(&self, id: &str) -> Result<MutationOutcome<()>>;

    async fn create_multiple(&self, drafts: Vec<T::Draft>) -> Result<BulkOutcome<T>> {
        let mut outcome = BulkOutcome::default();
        for (index, draft) in drafts.into_iter().enumerate() {
            match self.create(draft).await {
                Ok(applied) => outcome.succeeded.push(applied),
                Err(e) => outcome.failed.push(BulkFailure {
                    index,
                    id: None,
                    error: e.to_string(),
                }),
            }
        }
        Ok(outcome)
    }

    async fn update_multiple(
        &self,
        patches: Vec<(String, T::Patch)>,
    ) -> Result<BulkOutcome<T>> {
        let mut outcome = BulkOutcome::default();
        for (index, (id, patch)) in patches.into_iter().enumerate() {
            match self.update(&id, patch).await {
                Ok(applied) => outcome.succeeded.push(applied),
                Err(e) => outcome.failed.push(BulkFailure {
                    index,
                    id: Some(id),
                    error: e.to_string(),
                }),
            }
        }
        Ok(outcome)
    }

    async fn delete_multiple(&self, ids: Vec<String>) -> Result<BulkOutcome<()>> {
        let mut outcome = BulkOutcome::default();
        for (index, id) in ids.into_iter().enumerate() {
            match self.delete(&id).await {
                Ok(applied) => outcome.succeeded.push(applied),
                Err(e) => outcome.failed.push(BulkFailure {
                    index,
                    id: Some(id),
                    error: e.to_string(),
                }),
            }
        }
        Ok(outcome)
    }

    async fn find_by(&self, criteria: &FilterSet) -> Result<Vec<T>> {
        self.get_all(criteria).await
    }

    /// Case-insensitive substring search across the named fields
    /// (camelCase, as serialized).
    async fn search(&self, query: &str, fields: &[&str]) -> Result<Vec<T>> {
        let needle = query.to_lowercase();
        let all = self.get_all(&FilterSet::none()).await?;
        let mut hits = Vec::new();
        for record in all {
            let value = serde_json::to_value(&record)?;
            let matched = fields.iter().any(|field| {
                value
                    .get(*field)
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            });
            if matched {
                hits.push(record);
            }
        }
        Ok(hits)
    }

    async fn get_with_pagination(&self, request: &PageRequest) -> Result<PagedResult<T>> {
        let all = self.get_all(&FilterSet::none()).await?;
        crate::repositories::query::paginate(all, request)
    }
}
