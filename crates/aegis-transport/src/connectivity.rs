//! Online/offline signaling.
//!
//! The host environment (browser events, a platform reachability API, or a
//! test harness) drives the signal; the queue subscribes and reacts to
//! edges. Windows expire passively, so this is the only place the layer
//! waits on anything.

use std::sync::Arc;

use tokio::sync::watch;

/// Shared connectivity signal. Cheap to clone; all clones observe the same
/// state.
#[derive(Clone)]
pub struct Connectivity {
    tx: Arc<watch::Sender<bool>>,
}

impl Connectivity {
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self { tx: Arc::new(tx) }
    }

    /// Start in the online state.
    pub fn online() -> Self {
        Self::new(true)
    }

    /// Start in the offline state.
    pub fn offline() -> Self {
        Self::new(false)
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Drive the signal. Setting the current value again is a no-op for
    /// subscribers.
    pub fn set_online(&self, online: bool) {
        self.tx.send_if_modified(|state| {
            if *state != online {
                *state = online;
                true
            } else {
                false
            }
        });
    }

    /// Subscribe to transitions.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::online()
    }
}

impl std::fmt::Debug for Connectivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connectivity")
            .field("online", &self.is_online())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_state_visible_to_all_clones() {
        let conn = Connectivity::online();
        let clone = conn.clone();

        conn.set_online(false);
        assert!(!clone.is_online());

        clone.set_online(true);
        assert!(conn.is_online());
    }

    #[tokio::test]
    async fn test_subscribers_see_edges() {
        let conn = Connectivity::offline();
        let mut rx = conn.subscribe();
        assert!(!*rx.borrow_and_update());

        conn.set_online(true);
        rx.changed().await.unwrap();
        assert!(*rx.borrow_and_update());
    }

    #[tokio::test]
    async fn test_redundant_set_does_not_wake_subscribers() {
        let conn = Connectivity::online();
        let mut rx = conn.subscribe();
        rx.borrow_and_update();

        conn.set_online(true);
        assert!(!rx.has_changed().unwrap());
    }
}
