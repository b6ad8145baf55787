use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use log::warn;

use super::categories_model::{
    Category, CategoryDraft, CategoryKind, CategoryPatch, CategoryWithChildren,
};
use super::categories_traits::CategoryServiceTrait;
use crate::constants::MAX_HIERARCHY_WALK;
use crate::errors::{BusinessRuleError, Error, Result};
use crate::repositories::{
    EntityKind, EntityRepository, FilterSet, MutationOutcome, RepositoryFactory,
};

/// Category business rules on top of whichever repository the factory
/// resolves: one-level hierarchy, unique names per type, immutable
/// structure for seeded defaults, and delete protection.
pub struct CategoryService {
    factory: Arc<RepositoryFactory>,
}

impl CategoryService {
    pub fn new(factory: Arc<RepositoryFactory>) -> Self {
        CategoryService { factory }
    }

    fn organize_hierarchically(&self, categories: Vec<Category>) -> Vec<CategoryWithChildren> {
        let parents: Vec<Category> = categories
            .iter()
            .filter(|c| c.is_root())
            .cloned()
            .collect();

        parents
            .into_iter()
            .map(|parent| {
                let children: Vec<Category> = categories
                    .iter()
                    .filter(|c| c.parent_id.as_deref() == Some(parent.id.as_str()))
                    .cloned()
                    .collect();
                CategoryWithChildren {
                    category: parent,
                    children,
                }
            })
            .collect()
    }

    async fn ensure_unique_name(
        &self,
        repo: &Arc<dyn EntityRepository<Category>>,
        name: &str,
        kind: CategoryKind,
        exclude_id: Option<&str>,
    ) -> Result<()> {
        let all = repo.get_all(&FilterSet::none()).await?;
        let duplicate = all.iter().any(|c| {
            c.kind == kind
                && c.name.eq_ignore_ascii_case(name)
                && Some(c.id.as_str()) != exclude_id
        });
        if duplicate {
            return Err(BusinessRuleError::DuplicateCategoryName {
                name: name.to_string(),
                kind: kind.to_string(),
            }
            .into());
        }
        Ok(())
    }

    async fn ensure_valid_parent(
        &self,
        repo: &Arc<dyn EntityRepository<Category>>,
        parent_id: &str,
        kind: CategoryKind,
    ) -> Result<Category> {
        let parent = repo
            .get_by_id(parent_id)
            .await?
            .ok_or_else(|| BusinessRuleError::ParentNotFound(parent_id.to_string()))?;
        if parent.kind != kind {
            return Err(BusinessRuleError::ParentKindMismatch.into());
        }
        if !parent.is_root() {
            // A child may not itself be a parent: nesting stops at one level.
            return Err(BusinessRuleError::HierarchyTooDeep.into());
        }
        Ok(parent)
    }

    /// Walks the parent chain from `new_parent_id` with a bounded
    /// visited-set guard. A detected cycle OR a failure during the walk
    /// rejects the re-parent, failing safe.
    async fn ensure_no_cycle(
        &self,
        repo: &Arc<dyn EntityRepository<Category>>,
        category_id: &str,
        new_parent_id: &str,
    ) -> Result<()> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut current = Some(new_parent_id.to_string());

        while let Some(id) = current {
            if id == category_id || !visited.insert(id.clone()) {
                return Err(BusinessRuleError::CircularHierarchy.into());
            }
            if visited.len() > MAX_HIERARCHY_WALK {
                warn!("Parent chain walk exceeded {} hops", MAX_HIERARCHY_WALK);
                return Err(BusinessRuleError::CircularHierarchy.into());
            }
            current = repo
                .get_by_id(&id)
                .await
                .map_err(|e| {
                    warn!("Parent chain walk failed, rejecting re-parent: {}", e);
                    Error::BusinessRule(BusinessRuleError::CircularHierarchy)
                })?
                .and_then(|c| c.parent_id);
        }
        Ok(())
    }
}

#[async_trait]
impl CategoryServiceTrait for CategoryService {
    async fn get_categories(&self) -> Result<Vec<Category>> {
        self.factory.categories().get_all(&FilterSet::none()).await
    }

    async fn get_categories_hierarchical(&self) -> Result<Vec<CategoryWithChildren>> {
        let all = self.get_categories().await?;
        Ok(self.organize_hierarchically(all))
    }

    async fn get_categories_by_kind(
        &self,
        kind: CategoryKind,
    ) -> Result<Vec<CategoryWithChildren>> {
        let matching = self
            .factory
            .categories()
            .get_all(&FilterSet::new().eq("type", kind.to_string()))
            .await?;
        Ok(self.organize_hierarchically(matching))
    }

    async fn get_category(&self, id: &str) -> Result<Option<Category>> {
        self.factory.categories().get_by_id(id).await
    }

    async fn create_category(&self, draft: CategoryDraft) -> Result<MutationOutcome<Category>> {
        let repo = self.factory.categories();

        self.ensure_unique_name(&repo, &draft.name, draft.kind, None)
            .await?;
        if let Some(parent_id) = &draft.parent_id {
            self.ensure_valid_parent(&repo, parent_id, draft.kind).await?;
        }

        repo.create(draft).await
    }

    async fn update_category(
        &self,
        id: &str,
        patch: CategoryPatch,
    ) -> Result<MutationOutcome<Category>> {
        let repo = self.factory.categories();

        let existing = repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound(EntityKind::Category, id.to_string()))?;

        if existing.is_default && (patch.name.is_some() || patch.parent_id.is_some()) {
            return Err(BusinessRuleError::DefaultCategoryImmutable.into());
        }

        if let Some(name) = &patch.name {
            self.ensure_unique_name(&repo, name, existing.kind, Some(id))
                .await?;
        }

        if let Some(Some(new_parent_id)) = &patch.parent_id {
            self.ensure_no_cycle(&repo, id, new_parent_id).await?;
            self.ensure_valid_parent(&repo, new_parent_id, existing.kind)
                .await?;

            // Gaining a parent while having children would nest three deep.
            let children = repo
                .get_all(&FilterSet::new().eq("parentId", id.to_string()))
                .await?;
            if !children.is_empty() {
                return Err(BusinessRuleError::HierarchyTooDeep.into());
            }
        }

        repo.update(id, patch).await
    }

    async fn delete_category(&self, id: &str) -> Result<MutationOutcome<()>> {
        let repo = self.factory.categories();

        let existing = repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound(EntityKind::Category, id.to_string()))?;

        if existing.is_default {
            return Err(BusinessRuleError::DefaultCategoryImmutable.into());
        }

        let children = repo
            .get_all(&FilterSet::new().eq("parentId", id.to_string()))
            .await?;
        if !children.is_empty() {
            return Err(BusinessRuleError::CategoryHasChildren.into());
        }

        // Cross-entity check: a category referenced by transactions stays.
        let referencing = self
            .factory
            .transactions()
            .find_by(&FilterSet::new().eq("categoryId", id.to_string()))
            .await?;
        if !referencing.is_empty() {
            return Err(BusinessRuleError::CategoryInUse(referencing.len()).into());
        }

        repo.delete(id).await
    }
}
