//! Connectivity tracking.
//!
//! Replaces the browser's global online/offline flag with an explicit
//! observer handle that the factory, the offline decorator and the sync
//! processor receive at construction. Tests drive transitions directly
//! through [`ConnectivityObserver::set_online`] / [`set_offline`].

use std::sync::Arc;

use log::info;
use tokio::sync::watch;

/// Shared handle over the current connectivity status.
///
/// Cloning is cheap; all clones observe and drive the same state.
#[derive(Clone)]
pub struct ConnectivityObserver {
    tx: Arc<watch::Sender<bool>>,
}

impl ConnectivityObserver {
    pub fn new(initially_online: bool) -> Self {
        let (tx, _rx) = watch::channel(initially_online);
        ConnectivityObserver { tx: Arc::new(tx) }
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn set_online(&self) {
        let changed = self.tx.send_if_modified(|state| {
            let was = *state;
            *state = true;
            !was
        });
        if changed {
            info!("Connectivity changed: offline -> online");
        }
    }

    pub fn set_offline(&self) {
        let changed = self.tx.send_if_modified(|state| {
            let was = *state;
            *state = false;
            was
        });
        if changed {
            info!("Connectivity changed: online -> offline");
        }
    }

    /// Subscribe to connectivity transitions. The receiver only wakes on
    /// actual state changes, not on redundant set calls.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for ConnectivityObserver {
    fn default() -> Self {
        ConnectivityObserver::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn transitions_are_observed() {
        let observer = ConnectivityObserver::new(true);
        assert!(observer.is_online());

        let mut rx = observer.subscribe();
        observer.set_offline();
        assert!(!observer.is_online());

        rx.changed().await.unwrap();
        assert!(!*rx.borrow());

        observer.set_online();
        rx.changed().await.unwrap();
        assert!(*rx.borrow());
    }

    #[tokio::test]
    async fn redundant_sets_do_not_notify() {
        let observer = ConnectivityObserver::new(true);
        let mut rx = observer.subscribe();

        observer.set_online();
        observer.set_online();

        // No transition happened, so nothing is pending on the receiver.
        assert!(!rx.has_changed().unwrap());
    }
}
