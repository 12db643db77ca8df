//! Common test utilities and helpers
//!
//! - Delivery doubles that count or hold back attempts
//! - A notifier that records every confirmation
//! - Polling helpers for background sync runs

#![allow(dead_code)]

use async_trait::async_trait;
use pgclosets_offline::offline::OfflineSyncManager;
use pgclosets_offline::shared::SubmissionType;
use pgclosets_offline::sync::delivery::{Delivery, DeliveryError};
use pgclosets_offline::sync::notifier::Notifier;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};

/// Records every confirmation it receives
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<SubmissionType>>,
}

impl RecordingNotifier {
    pub fn seen(&self) -> Vec<SubmissionType> {
        self.seen.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify_success(&self, kind: SubmissionType) {
        self.seen.lock().unwrap().push(kind);
    }
}

/// Acknowledges every payload, but only once released
///
/// Signals `entered` on each attempt so a test can act while a run is
/// parked inside delivery.
#[derive(Debug)]
pub struct GatedDelivery {
    pub entered: Notify,
    release: Semaphore,
    attempts: Mutex<HashMap<String, usize>>,
}

impl GatedDelivery {
    pub fn new() -> Self {
        Self {
            entered: Notify::new(),
            release: Semaphore::new(0),
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Let every parked and future attempt through
    pub fn open(&self) {
        self.release.add_permits(1);
    }

    /// Attempts per payload
    pub fn attempts(&self) -> HashMap<String, usize> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Delivery for GatedDelivery {
    async fn deliver(&self, _kind: SubmissionType, payload: &Value) -> Result<(), DeliveryError> {
        *self
            .attempts
            .lock()
            .unwrap()
            .entry(payload.to_string())
            .or_default() += 1;
        self.entered.notify_one();

        let _permit = self
            .release
            .acquire()
            .await
            .map_err(|_| DeliveryError::transport("gate closed"))?;
        Ok(())
    }
}

/// Wait for background sync runs to drain the queue and finish
pub async fn wait_until_empty(manager: &OfflineSyncManager) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while manager.has_pending_submissions().await.unwrap() || manager.orchestrator().is_syncing() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("queue did not drain in time");
}

/// Wait until every record of `kind` has failed at least `attempts` times
/// and the run that recorded it has finished
pub async fn wait_until_retried(manager: &OfflineSyncManager, kind: SubmissionType, attempts: u32) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let records = manager.queue().get_all(kind).await.unwrap();
            let retried = !records.is_empty() && records.iter().all(|r| r.retry_count >= attempts);
            if retried && !manager.orchestrator().is_syncing() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("submissions were not retried in time");
}
