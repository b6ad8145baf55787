use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use super::transactions_model::{
    MonthlyTotals, Transaction, TransactionDraft, TransactionPatch, TransactionTotals,
};
use super::transactions_traits::TransactionServiceTrait;
use crate::categories::CategoryKind;
use crate::errors::{BusinessRuleError, Error, Result, ValidationError};
use crate::repositories::{Entity, EntityKind, FilterSet, MutationOutcome, RepositoryFactory};

/// Transaction business rules: every write is checked against the
/// referenced category (it must exist and sit on the same side of the
/// ledger), and the read side offers the derived aggregates the app's
/// dashboard is built from.
pub struct TransactionService {
    factory: Arc<RepositoryFactory>,
}

impl TransactionService {
    pub fn new(factory: Arc<RepositoryFactory>) -> Self {
        TransactionService { factory }
    }

    async fn ensure_category_matches(&self, category_id: &str, kind: CategoryKind) -> Result<()> {
        let category = self
            .factory
            .categories()
            .get_by_id(category_id)
            .await?
            .ok_or_else(|| BusinessRuleError::CategoryNotFound(category_id.to_string()))?;
        if category.kind != kind {
            return Err(BusinessRuleError::CategoryKindMismatch.into());
        }
        Ok(())
    }
}

#[async_trait]
impl TransactionServiceTrait for TransactionService {
    async fn get_transactions(&self) -> Result<Vec<Transaction>> {
        self.factory.transactions().get_all(&FilterSet::none()).await
    }

    async fn get_transaction(&self, id: &str) -> Result<Option<Transaction>> {
        self.factory.transactions().get_by_id(id).await
    }

    async fn get_transactions_by_category(&self, category_id: &str) -> Result<Vec<Transaction>> {
        self.factory
            .transactions()
            .find_by(&FilterSet::new().eq("categoryId", category_id.to_string()))
            .await
    }

    async fn get_transactions_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Transaction>> {
        if from > to {
            return Err(ValidationError::InvalidDateRange(from, to).into());
        }
        let all = self.get_transactions().await?;
        Ok(all
            .into_iter()
            .filter(|t| t.date >= from && t.date <= to)
            .collect())
    }

    async fn create_transaction(
        &self,
        draft: TransactionDraft,
    ) -> Result<MutationOutcome<Transaction>> {
        Transaction::validate_draft(&draft)?;
        self.ensure_category_matches(&draft.category_id, draft.kind)
            .await?;
        self.factory.transactions().create(draft).await
    }

    async fn update_transaction(
        &self,
        id: &str,
        patch: TransactionPatch,
    ) -> Result<MutationOutcome<Transaction>> {
        Transaction::validate_patch(&patch)?;

        let repo = self.factory.transactions();
        let existing = repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound(EntityKind::Transaction, id.to_string()))?;

        // Re-check the pairing whenever either side of it changes.
        if patch.category_id.is_some() || patch.kind.is_some() {
            let category_id = patch
                .category_id
                .as_deref()
                .unwrap_or(&existing.category_id);
            let kind = patch.kind.unwrap_or(existing.kind);
            self.ensure_category_matches(category_id, kind).await?;
        }

        repo.update(id, patch).await
    }

    async fn delete_transaction(&self, id: &str) -> Result<MutationOutcome<()>> {
        self.factory.transactions().delete(id).await
    }

    async fn calculate_totals(&self) -> Result<TransactionTotals> {
        let mut totals = TransactionTotals::default();
        for transaction in self.get_transactions().await? {
            totals.add(&transaction);
        }
        Ok(totals)
    }

    async fn monthly_breakdown(&self) -> Result<Vec<MonthlyTotals>> {
        let mut by_month: BTreeMap<String, TransactionTotals> = BTreeMap::new();
        for transaction in self.get_transactions().await? {
            let month = transaction.date.format("%Y-%m").to_string();
            by_month.entry(month).or_default().add(&transaction);
        }
        Ok(by_month
            .into_iter()
            .map(|(month, totals)| MonthlyTotals { month, totals })
            .collect())
    }

    async fn export_csv(&self) -> Result<String> {
        let mut transactions = self.get_transactions().await?;
        transactions.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(["id", "date", "type", "amount", "description", "categoryId"])
            .map_err(|e| Error::Unknown(e.to_string()))?;
        for t in &transactions {
            writer
                .write_record([
                    t.id.as_str(),
                    &t.date.format("%Y-%m-%d").to_string(),
                    &t.kind.to_string(),
                    &t.amount.to_string(),
                    t.description.as_str(),
                    t.category_id.as_str(),
                ])
                .map_err(|e| Error::Unknown(e.to_string()))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| Error::Unknown(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| Error::Unknown(e.to_string()))
    }
}
