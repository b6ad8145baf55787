pub mod budgets_model;
pub mod budgets_service;
pub mod budgets_traits;
pub mod budgets_transformer;

pub use budgets_model::{
    Budget, BudgetAlert, BudgetDraft, BudgetPatch, BudgetPeriod, BudgetUtilization,
};
pub use budgets_service::BudgetService;
pub use budgets_traits::BudgetServiceTrait;
pub use budgets_transformer::BudgetMapper;
