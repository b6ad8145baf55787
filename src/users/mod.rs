pub mod users_model;
pub mod users_service;
pub mod users_transformer;

pub use users_model::{User, UserDraft, UserPatch};
pub use users_service::UserService;
pub use users_transformer::UserMapper;
