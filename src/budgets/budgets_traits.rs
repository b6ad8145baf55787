use async_trait::async_trait;

use super::budgets_model::{Budget, BudgetAlert, BudgetDraft, BudgetPatch, BudgetUtilization};
use crate::errors::Result;
use crate::repositories::MutationOutcome;

/// Trait for budget service operations
#[async_trait]
pub trait BudgetServiceTrait: Send + Sync {
    async fn get_budgets(&self) -> Result<Vec<Budget>>;
    async fn get_budget(&self, id: &str) -> Result<Option<Budget>>;

    async fn create_budget(&self, draft: BudgetDraft) -> Result<MutationOutcome<Budget>>;
    async fn update_budget(&self, id: &str, patch: BudgetPatch)
        -> Result<MutationOutcome<Budget>>;
    async fn delete_budget(&self, id: &str) -> Result<MutationOutcome<()>>;

    async fn get_utilization(&self, id: &str) -> Result<BudgetUtilization>;
    /// Scans every active budget and returns the alerts that newly crossed
    /// their threshold. A budget alerts at most once per window.
    async fn check_alerts(&self) -> Result<Vec<BudgetAlert>>;
}
