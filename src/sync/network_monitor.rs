//! # Network Monitor
//!
//! Holds the host-reported connectivity state and reacts to transitions.
//!
//! ## Features
//!
//! - **Connectivity Detection**: `is_online()` is the current host report
//! - **Transition Feed**: `subscribe()` yields every published change
//! - **Sync on Recovery**: the listener starts a sync run when the host comes back online

use crate::sync::SyncOrchestrator;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    Online,
    Offline,
}

impl NetworkStatus {
    pub fn from_online(online: bool) -> Self {
        if online {
            NetworkStatus::Online
        } else {
            NetworkStatus::Offline
        }
    }
}

/// Source of connectivity truth for the enqueuer and orchestrator
#[derive(Debug)]
pub struct ConnectivityWatcher {
    status: watch::Sender<NetworkStatus>,
}

impl ConnectivityWatcher {
    pub fn new(online: bool) -> Self {
        let (status, _) = watch::channel(NetworkStatus::from_online(online));
        Self { status }
    }

    pub fn status(&self) -> NetworkStatus {
        *self.status.borrow()
    }

    pub fn is_online(&self) -> bool {
        self.status() == NetworkStatus::Online
    }

    /// Report connectivity from the host. Returns whether the state changed.
    pub fn set_online(&self, online: bool) -> bool {
        let next = NetworkStatus::from_online(online);
        self.status.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        })
    }

    /// Receive subsequent transitions
    pub fn subscribe(&self) -> watch::Receiver<NetworkStatus> {
        self.status.subscribe()
    }

    /// Start a background task that syncs whenever the host comes back online
    ///
    /// The task runs until aborted; the sync runs it starts are not awaited.
    pub fn spawn_listener(&self, orchestrator: Arc<SyncOrchestrator>) -> JoinHandle<()> {
        let mut transitions = self.subscribe();
        tokio::spawn(async move {
            while transitions.changed().await.is_ok() {
                let status = *transitions.borrow_and_update();
                match status {
                    NetworkStatus::Online => {
                        tracing::info!("Connection restored - syncing");
                        orchestrator.spawn_sync();
                    }
                    NetworkStatus::Offline => {
                        tracing::info!("Connection lost - queueing submissions");
                    }
                }
            }
        })
    }
}

impl Default for ConnectivityWatcher {
    fn default() -> Self {
        Self::new(true)
    }
}
