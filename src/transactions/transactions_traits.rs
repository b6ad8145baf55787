use async_trait::async_trait;
use chrono::NaiveDate;

use super::transactions_model::{
    MonthlyTotals, Transaction, TransactionDraft, TransactionPatch, TransactionTotals,
};
use crate::errors::Result;
use crate::repositories::MutationOutcome;

/// Trait for transaction service operations
#[async_trait]
pub trait TransactionServiceTrait: Send + Sync {
    async fn get_transactions(&self) -> Result<Vec<Transaction>>;
    async fn get_transaction(&self, id: &str) -> Result<Option<Transaction>>;
    async fn get_transactions_by_category(&self, category_id: &str) -> Result<Vec<Transaction>>;
    async fn get_transactions_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Transaction>>;

    async fn create_transaction(
        &self,
        draft: TransactionDraft,
    ) -> Result<MutationOutcome<Transaction>>;
    async fn update_transaction(
        &self,
        id: &str,
        patch: TransactionPatch,
    ) -> Result<MutationOutcome<Transaction>>;
    async fn delete_transaction(&self, id: &str) -> Result<MutationOutcome<()>>;

    async fn calculate_totals(&self) -> Result<TransactionTotals>;
    async fn monthly_breakdown(&self) -> Result<Vec<MonthlyTotals>>;
    async fn export_csv(&self) -> Result<String>;
}
