//! Sync session flag.
//!
//! Guards against two overlapping sync runs delivering the same records. The
//! flag is claimed with a single compare-and-swap before the run does any
//! asynchronous work, and released when the returned guard drops, so an
//! early return or a panic inside the run cannot leave it set.

use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct SyncSession {
    running: AtomicBool,
}

impl SyncSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the session, or `None` if a run is already in flight
    pub fn try_begin(&self) -> Option<SyncGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SyncGuard { session: self })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Held for the duration of one sync run
#[derive(Debug)]
pub struct SyncGuard<'a> {
    session: &'a SyncSession,
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.session.running.store(false, Ordering::Release);
    }
}
