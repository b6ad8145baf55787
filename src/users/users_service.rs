use std::sync::Arc;

use super::users_model::{User, UserDraft, UserPatch};
use crate::errors::Result;
use crate::repositories::{FilterSet, MutationOutcome, RepositoryFactory};

/// Thin passthrough; users carry no business rules beyond draft
/// validation.
pub struct UserService {
    factory: Arc<RepositoryFactory>,
}

impl UserService {
    pub fn new(factory: Arc<RepositoryFactory>) -> Self {
        UserService { factory }
    }

    pub async fn get_users(&self) -> Result<Vec<User>> {
        self.factory.users().get_all(&FilterSet::none()).await
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<User>> {
        self.factory.users().get_by_id(id).await
    }

    pub async fn create_user(&self, draft: UserDraft) -> Result<MutationOutcome<User>> {
        self.factory.users().create(draft).await
    }

    pub async fn update_user(&self, id: &str, patch: UserPatch) -> Result<MutationOutcome<User>> {
        self.factory.users().update(id, patch).await
    }

    pub async fn delete_user(&self, id: &str) -> Result<MutationOutcome<()>> {
        self.factory.users().delete(id).await
    }
}
