use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use log::info;
use rust_decimal::Decimal;

use super::budgets_model::{Budget, BudgetAlert, BudgetDraft, BudgetPatch, BudgetUtilization};
use super::budgets_traits::BudgetServiceTrait;
use crate::categories::CategoryKind;
use crate::errors::{BusinessRuleError, Error, Result, ValidationError};
use crate::repositories::{Entity, EntityKind, FilterSet, MutationOutcome, RepositoryFactory};

/// Budget business rules: every budget references an existing category,
/// utilization is computed from the expense transactions inside the
/// budget's window, and threshold alerts fire once per window.
pub struct BudgetService {
    factory: Arc<RepositoryFactory>,
    // budget id -> window key of the last alert raised for it.
    alert_ledger: DashMap<String, String>,
}

impl BudgetService {
    pub fn new(factory: Arc<RepositoryFactory>) -> Self {
        BudgetService {
            factory,
            alert_ledger: DashMap::new(),
        }
    }

    async fn ensure_category_exists(&self, category_id: &str) -> Result<()> {
        self.factory
            .categories()
            .get_by_id(category_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| BusinessRuleError::CategoryNotFound(category_id.to_string()).into())
    }

    async fn spent_within(&self, budget: &Budget) -> Result<Decimal> {
        let transactions = self
            .factory
            .transactions()
            .find_by(
                &FilterSet::new()
                    .eq("categoryId", budget.category_id.clone())
                    .eq("type", CategoryKind::Expense.to_string()),
            )
            .await?;
        Ok(transactions
            .iter()
            .filter(|t| budget.window_contains(t.date))
            .map(|t| t.amount)
            .sum())
    }

    fn utilization_of(&self, budget: &Budget, spent: Decimal) -> BudgetUtilization {
        let percent = if budget.amount > Decimal::ZERO {
            (spent / budget.amount * Decimal::from(100)).round_dp(2)
        } else {
            Decimal::ZERO
        };
        BudgetUtilization {
            budget_id: budget.id.clone(),
            category_id: budget.category_id.clone(),
            amount: budget.amount,
            spent,
            percent,
            over_budget: spent > budget.amount,
        }
    }

    fn window_key(budget: &Budget) -> String {
        format!("{}..{}", budget.start_date, budget.end_date)
    }
}

#[async_trait]
impl BudgetServiceTrait for BudgetService {
    async fn get_budgets(&self) -> Result<Vec<Budget>> {
        self.factory.budgets().get_all(&FilterSet::none()).await
    }

    async fn get_budget(&self, id: &str) -> Result<Option<Budget>> {
        self.factory.budgets().get_by_id(id).await
    }

    async fn create_budget(&self, draft: BudgetDraft) -> Result<MutationOutcome<Budget>> {
        Budget::validate_draft(&draft)?;
        self.ensure_category_exists(&draft.category_id).await?;
        self.factory.budgets().create(draft).await
    }

    async fn update_budget(
        &self,
        id: &str,
        patch: BudgetPatch,
    ) -> Result<MutationOutcome<Budget>> {
        Budget::validate_patch(&patch)?;

        let repo = self.factory.budgets();

        // A patch carrying only one edge must not invert the stored window.
        if let Some(end) = patch.end_date {
            let existing = repo
                .get_by_id(id)
                .await?
                .ok_or_else(|| Error::NotFound(EntityKind::Budget, id.to_string()))?;
            let start = patch.start_date.unwrap_or(existing.start_date);
            if start > end {
                return Err(ValidationError::InvalidDateRange(start, end).into());
            }
        }

        repo.update(id, patch).await
    }

    async fn delete_budget(&self, id: &str) -> Result<MutationOutcome<()>> {
        self.alert_ledger.remove(id);
        self.factory.budgets().delete(id).await
    }

    async fn get_utilization(&self, id: &str) -> Result<BudgetUtilization> {
        let budget = self
            .get_budget(id)
            .await?
            .ok_or_else(|| Error::NotFound(EntityKind::Budget, id.to_string()))?;
        let spent = self.spent_within(&budget).await?;
        Ok(self.utilization_of(&budget, spent))
    }

    async fn check_alerts(&self) -> Result<Vec<BudgetAlert>> {
        let budgets = self.get_budgets().await?;
        let mut alerts = Vec::new();

        for budget in budgets.iter().filter(|b| b.is_active) {
            let spent = self.spent_within(budget).await?;
            let utilization = self.utilization_of(budget, spent);
            if utilization.percent < Decimal::from(budget.alert_threshold) {
                continue;
            }

            let window = Self::window_key(budget);
            let already_raised = self
                .alert_ledger
                .get(&budget.id)
                .map(|w| *w == window)
                .unwrap_or(false);
            if already_raised {
                continue;
            }

            self.alert_ledger.insert(budget.id.clone(), window);
            info!(
                "Budget {} crossed its alert threshold ({}% of {})",
                budget.id, utilization.percent, budget.amount
            );
            alerts.push(BudgetAlert {
                budget_id: budget.id.clone(),
                category_id: budget.category_id.clone(),
                amount: budget.amount,
                spent,
                percent: utilization.percent,
                threshold: budget.alert_threshold,
            });
        }

        Ok(alerts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budgets::BudgetPeriod;
    use crate::categories::{CategoryDraft, CategoryService, CategoryServiceTrait};
    use crate::config::AppConfig;
    use crate::connectivity::ConnectivityObserver;
    use crate::queue::OperationQueue;
    use crate::storage::{KeyValueStore, MemoryStore};
    use crate::test_support::MockTransport;
    use crate::transactions::TransactionDraft;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    struct Fixture {
        service: BudgetService,
        factory: Arc<RepositoryFactory>,
        category_id: String,
    }

    async fn fixture() -> Fixture {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let queue = Arc::new(OperationQueue::new(Arc::clone(&store)));
        let factory = Arc::new(RepositoryFactory::new(
            AppConfig::default(),
            ConnectivityObserver::new(true),
            store,
            Arc::new(MockTransport::new()),
            queue,
        ));

        let categories = CategoryService::new(Arc::clone(&factory));
        let groceries = categories
            .create_category(CategoryDraft {
                name: "Groceries".to_string(),
                kind: CategoryKind::Expense,
                color: None,
                icon: None,
                parent_id: None,
                is_default: false,
                is_active: true,
            })
            .await
            .unwrap()
            .applied()
            .unwrap();

        Fixture {
            service: BudgetService::new(Arc::clone(&factory)),
            factory,
            category_id: groceries.id,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn spend(f: &Fixture, amount: Decimal, on: NaiveDate) {
        f.factory
            .transactions()
            .create(TransactionDraft {
                kind: CategoryKind::Expense,
                amount,
                description: "Shop".to_string(),
                category_id: f.category_id.clone(),
                date: on,
            })
            .await
            .unwrap();
    }

    fn monthly_draft(category_id: &str, amount: Decimal) -> BudgetDraft {
        BudgetDraft {
            category_id: category_id.to_string(),
            amount,
            period: BudgetPeriod::Monthly,
            start_date: date(2024, 1, 1),
            end_date: None,
            alert_threshold: 80,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn budgets_require_an_existing_category() {
        let f = fixture().await;
        let err = f
            .service
            .create_budget(monthly_draft("cat_missing", dec!(100)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::BusinessRule(BusinessRuleError::CategoryNotFound(_))
        ));
    }

    #[tokio::test]
    async fn utilization_counts_window_spend_only() {
        let f = fixture().await;
        let budget = f
            .service
            .create_budget(monthly_draft(&f.category_id, dec!(200)))
            .await
            .unwrap()
            .applied()
            .unwrap();
        assert_eq!(budget.end_date, date(2024, 1, 31));

        spend(&f, dec!(50), date(2024, 1, 10)).await;
        spend(&f, dec!(100), date(2024, 1, 25)).await;
        spend(&f, dec!(999), date(2024, 2, 1)).await; // outside the window

        let utilization = f.service.get_utilization(&budget.id).await.unwrap();
        assert_eq!(utilization.spent, dec!(150));
        assert_eq!(utilization.percent, dec!(75.00));
        assert!(!utilization.over_budget);

        spend(&f, dec!(100), date(2024, 1, 30)).await;
        let utilization = f.service.get_utilization(&budget.id).await.unwrap();
        assert!(utilization.over_budget);
    }

    #[tokio::test]
    async fn end_only_patch_cannot_invert_the_window() {
        let f = fixture().await;
        let budget = f
            .service
            .create_budget(monthly_draft(&f.category_id, dec!(200)))
            .await
            .unwrap()
            .applied()
            .unwrap();
        assert_eq!(budget.start_date, date(2024, 1, 1));

        let err = f
            .service
            .update_budget(
                &budget.id,
                BudgetPatch {
                    end_date: Some(date(2023, 12, 1)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::InvalidDateRange(_, _))
        ));

        // Moving both edges together is still allowed.
        let updated = f
            .service
            .update_budget(
                &budget.id,
                BudgetPatch {
                    start_date: Some(date(2023, 11, 1)),
                    end_date: Some(date(2023, 11, 30)),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .applied()
            .unwrap();
        assert_eq!(updated.end_date, date(2023, 11, 30));
    }

    #[tokio::test]
    async fn alerts_fire_once_per_window() {
        let f = fixture().await;
        let budget = f
            .service
            .create_budget(monthly_draft(&f.category_id, dec!(100)))
            .await
            .unwrap()
            .applied()
            .unwrap();

        spend(&f, dec!(50), date(2024, 1, 5)).await;
        assert!(f.service.check_alerts().await.unwrap().is_empty());

        spend(&f, dec!(40), date(2024, 1, 10)).await;
        let alerts = f.service.check_alerts().await.unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].budget_id, budget.id);
        assert_eq!(alerts[0].percent, dec!(90.00));

        // Spending more in the same window does not re-alert.
        spend(&f, dec!(30), date(2024, 1, 15)).await;
        assert!(f.service.check_alerts().await.unwrap().is_empty());

        // A new window alerts again.
        f.service
            .update_budget(
                &budget.id,
                BudgetPatch {
                    start_date: Some(date(2024, 2, 1)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        spend(&f, dec!(95), date(2024, 2, 10)).await;
        let alerts = f.service.check_alerts().await.unwrap();
        assert_eq!(alerts.len(), 1);
    }
}
