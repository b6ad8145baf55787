pub mod categories_model;
pub mod categories_service;
pub mod categories_traits;
pub mod categories_transformer;

pub use categories_model::{
    Category, CategoryDraft, CategoryKind, CategoryPatch, CategoryWithChildren,
};
pub use categories_service::CategoryService;
pub use categories_traits::CategoryServiceTrait;
pub use categories_transformer::CategoryMapper;
