pub mod transactions_model;
pub mod transactions_service;
pub mod transactions_traits;
pub mod transactions_transformer;

pub use transactions_model::{
    MonthlyTotals, Transaction, TransactionDraft, TransactionPatch, TransactionTotals,
};
pub use transactions_service::TransactionService;
pub use transactions_traits::TransactionServiceTrait;
pub use transactions_transformer::TransactionMapper;
