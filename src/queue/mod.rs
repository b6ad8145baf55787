pub mod offline_repository;
pub mod operation_queue;
pub mod queue_model;
pub mod sync_processor;

pub use offline_repository::OfflineAwareRepository;
pub use operation_queue::OperationQueue;
pub use queue_model::{QueuedAction, QueuedOperation, ReplayError, SyncNotification};
pub use sync_processor::SyncProcessor;
