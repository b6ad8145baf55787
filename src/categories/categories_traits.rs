use async_trait::async_trait;

use super::categories_model::{Category, CategoryDraft, CategoryKind, CategoryPatch, CategoryWithChildren};
use crate::errors::Result;
use crate::repositories::MutationOutcome;

/// Trait for category service operations
#[async_trait]
pub trait CategoryServiceTrait: Send + Sync {
    async fn get_categories(&self) -> Result<Vec<Category>>;
    async fn get_categories_hierarchical(&self) -> Result<Vec<CategoryWithChildren>>;
    async fn get_categories_by_kind(&self, kind: CategoryKind) -> Result<Vec<CategoryWithChildren>>;
    async fn get_category(&self, id: &str) -> Result<Option<Category>>;

    async fn create_category(&self, draft: CategoryDraft) -> Result<MutationOutcome<Category>>;
    async fn update_category(
        &self,
        id: &str,
        patch: CategoryPatch,
    ) -> Result<MutationOutcome<Category>>;
    async fn delete_category(&self, id: &str) -> Result<MutationOutcome<()>>;
}
