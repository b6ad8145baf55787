pub mod local_repository;
pub mod query;
pub mod remote_repository;
pub mod repository_factory;
pub mod repository_traits;
pub mod transport;
pub mod wire;

pub use local_repository::LocalRepository;
pub use query::{FilterOp, FilterSet, PageRequest, PagedResult, SortOrder};
pub use remote_repository::RemoteRepository;
pub use repository_factory::{Backend, RepositoryFactory};
pub use repository_traits::{
    generate_id, generate_temp_id, is_temp_id, BulkFailure, BulkOutcome, Entity, EntityKind,
    EntityRepository, MutationOutcome, WireMapper,
};
pub use transport::{HttpTransport, Transport};
