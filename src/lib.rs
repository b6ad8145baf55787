pub mod config;
pub mod connectivity;
pub mod constants;
pub mod errors;

pub mod budgets;
pub mod categories;
pub mod queue;
pub mod repositories;
pub mod storage;
pub mod transactions;
pub mod users;

#[cfg(test)]
pub mod test_support;

pub use errors::{Error, Result};
pub use repositories::{Backend, MutationOutcome, RepositoryFactory};
