use thiserror::Error;

use crate::repositories::EntityKind;

// Create a type alias for Result using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the budget application
#[derive(Error, Debug)]
pub enum Error {
    #[error("{0} not found: {1}")]
    NotFound(EntityKind, String),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Business rule violated: {0}")]
    BusinessRule(#[from] BusinessRuleError),

    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("Storage operation failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unexpected error: {0}")]
    Unknown(String),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_, _))
    }
}

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Amount must be greater than zero")]
    NonPositiveAmount,

    #[error("Description must not be empty")]
    EmptyDescription,

    #[error("Name must not be empty")]
    EmptyName,

    #[error("Invalid color '{0}': expected a hex value like #4f9d69")]
    InvalidColor(String),

    #[error("Alert threshold must be between 0 and 100, got {0}")]
    ThresholdOutOfRange(u8),

    #[error("Start date {0} is after end date {1}")]
    InvalidDateRange(chrono::NaiveDate, chrono::NaiveDate),
}

#[derive(Error, Debug)]
pub enum BusinessRuleError {
    #[error("A {kind} category named '{name}' already exists")]
    DuplicateCategoryName { name: String, kind: String },

    #[error("Parent category not found: {0}")]
    ParentNotFound(String),

    #[error("Parent category must be of the same type")]
    ParentKindMismatch,

    #[error("Category nesting is limited to one level")]
    HierarchyTooDeep,

    #[error("Category hierarchy would contain a cycle")]
    CircularHierarchy,

    #[error("Default categories cannot be renamed or re-parented")]
    DefaultCategoryImmutable,

    #[error("Category has child categories and cannot be deleted")]
    CategoryHasChildren,

    #[error("Category is referenced by {0} transactions and cannot be deleted")]
    CategoryInUse(usize),

    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    #[error("Transaction type does not match the category type")]
    CategoryKindMismatch,
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to initialize storage at {path}: {reason}")]
    InitFailed { path: String, reason: String },

    #[error("Failed to read key '{key}': {reason}")]
    ReadFailed { key: String, reason: String },

    #[error("Failed to write key '{key}': {reason}")]
    WriteFailed { key: String, reason: String },
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request to {url} failed: {reason}")]
    RequestFailed { url: String, reason: String },

    #[error("Unexpected status {status} from {url}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("Failed to decode response from {url}: {reason}")]
    DecodeFailed { url: String, reason: String },
}
