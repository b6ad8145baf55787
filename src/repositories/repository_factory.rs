use std::any::Any;
use std::sync::Arc;

use dashmap::DashMap;
use log::{debug, info};

use crate::budgets::Budget;
use crate::categories::Category;
use crate::config::AppConfig;
use crate::connectivity::ConnectivityObserver;
use crate::queue::{OfflineAwareRepository, OperationQueue};
use crate::repositories::local_repository::LocalRepository;
use crate::repositories::remote_repository::RemoteRepository;
use crate::repositories::repository_traits::{Entity, EntityKind, EntityRepository};
use crate::repositories::transport::Transport;
use crate::storage::KeyValueStore;
use crate::transactions::Transaction;
use crate::users::User;

/// Which persistence backend handles an entity's calls right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Local,
    Remote,
}

struct CacheEntry {
    backend: Backend,
    // Holds an `Arc<dyn EntityRepository<T>>` for the entry's entity type.
    handle: Box<dyn Any + Send + Sync>,
}

/// Selects and caches the active repository per entity.
///
/// Rule: Remote only when the API is enabled AND the observer reports
/// online; otherwise Local. A cached instance is reused only while the
/// rule still resolves to the backend it was built for, so a connectivity
/// flip hands out a fresh instance on the next access. `force_local`
/// bypasses the cache entirely.
pub struct RepositoryFactory {
    config: AppConfig,
    connectivity: ConnectivityObserver,
    store: Arc<dyn KeyValueStore>,
    transport: Arc<dyn Transport>,
    queue: Arc<OperationQueue>,
    cache: DashMap<EntityKind, CacheEntry>,
}

impl RepositoryFactory {
    pub fn new(
        config: AppConfig,
        connectivity: ConnectivityObserver,
        store: Arc<dyn KeyValueStore>,
        transport: Arc<dyn Transport>,
        queue: Arc<OperationQueue>,
    ) -> Self {
        RepositoryFactory {
            config,
            connectivity,
            store,
            transport,
            queue,
            cache: DashMap::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn connectivity(&self) -> &ConnectivityObserver {
        &self.connectivity
    }

    pub fn queue(&self) -> Arc<OperationQueue> {
        Arc::clone(&self.queue)
    }

    pub fn resolve_backend(&self, force_local: bool) -> Backend {
        if force_local {
            return Backend::Local;
        }
        if self.config.api_enabled && self.connectivity.is_online() {
            Backend::Remote
        } else {
            Backend::Local
        }
    }

    /// Drops every cached instance so the next access re-evaluates the
    /// selection rule.
    pub fn invalidate_all(&self) {
        self.cache.clear();
        debug!("Repository cache invalidated");
    }

    /// Spawns a task that clears the cache on every connectivity
    /// transition.
    pub fn spawn_connectivity_listener(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let factory = Arc::clone(self);
        let mut rx = self.connectivity.subscribe();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let online = *rx.borrow();
                info!(
                    "Connectivity flip observed (online={}), invalidating repositories",
                    online
                );
                factory.invalidate_all();
            }
        })
    }

    fn build<T: Entity>(&self, backend: Backend) -> Arc<dyn EntityRepository<T>> {
        match backend {
            Backend::Local => Arc::new(LocalRepository::<T>::new(Arc::clone(&self.store))),
            Backend::Remote => {
                let remote = Arc::new(RemoteRepository::<T>::new(Arc::clone(&self.transport)));
                if !T::DEFERRABLE {
                    // The sync processor has no replay target for these, so
                    // queueing would poison the queue. Write through.
                    return remote;
                }
                Arc::new(OfflineAwareRepository::new(
                    remote,
                    Arc::clone(&self.queue),
                    self.connectivity.clone(),
                ))
            }
        }
    }

    fn repository<T: Entity>(&self, force_local: bool) -> Arc<dyn EntityRepository<T>> {
        let backend = self.resolve_backend(force_local);

        if force_local {
            return self.build::<T>(Backend::Local);
        }

        if let Some(entry) = self.cache.get(&T::KIND) {
            if entry.backend == backend {
                if let Some(repo) = entry
                    .handle
                    .downcast_ref::<Arc<dyn EntityRepository<T>>>()
                {
                    return Arc::clone(repo);
                }
            }
        }

        let repo = self.build::<T>(backend);
        self.cache.insert(
            T::KIND,
            CacheEntry {
                backend,
                handle: Box::new(Arc::clone(&repo)),
            },
        );
        debug!("Resolved {} repository to {:?}", T::KIND, backend);
        repo
    }

    pub fn transactions(&self) -> Arc<dyn EntityRepository<Transaction>> {
        self.repository::<Transaction>(false)
    }

    pub fn categories(&self) -> Arc<dyn EntityRepository<Category>> {
        self.repository::<Category>(false)
    }

    pub fn budgets(&self) -> Arc<dyn EntityRepository<Budget>> {
        self.repository::<Budget>(false)
    }

    pub fn users(&self) -> Arc<dyn EntityRepository<User>> {
        self.repository::<User>(false)
    }

    /// `force_local` accessors always select Local, bypassing the cache.
    pub fn transactions_local(&self) -> Arc<dyn EntityRepository<Transaction>> {
        self.repository::<Transaction>(true)
    }

    pub fn categories_local(&self) -> Arc<dyn EntityRepository<Category>> {
        self.repository::<Category>(true)
    }

    pub fn budgets_local(&self) -> Arc<dyn EntityRepository<Budget>> {
        self.repository::<Budget>(true)
    }

    pub fn users_local(&self) -> Arc<dyn EntityRepository<User>> {
        self.repository::<User>(true)
    }
}
