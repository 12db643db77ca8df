//! # Sync Orchestrator
//!
//! Replays queued submissions against the storefront API.
//!
//! ## Run Semantics
//!
//! - At most one run per orchestrator is in flight. A call arriving during a
//!   run returns [`SyncOutcome::AlreadyRunning`] immediately and is not
//!   deferred.
//! - A call while the host is offline returns [`SyncOutcome::Offline`] without
//!   touching the queue.
//! - Partitions are processed in [`SubmissionType::ALL`] order, records in the
//!   order the store returns them.
//! - A record with `retry_count >= max_retries` is skipped and counted as stuck.
//! - Success removes the record, then notifies. Failure bumps the retry count,
//!   stores the diagnostic and moves on. No single failure aborts the run.
//! - Rows the store cannot decode are skipped and counted as store errors;
//!   the readable records of the same partition are still delivered.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pgclosets_offline::sync::{SyncOrchestrator, SyncOutcome};
//! # use std::sync::Arc;
//! # async fn example(orchestrator: Arc<SyncOrchestrator>) {
//! match orchestrator.sync_all().await {
//!     SyncOutcome::Completed(report) => println!("delivered {}", report.delivered),
//!     SyncOutcome::AlreadyRunning | SyncOutcome::Offline => {}
//! }
//!
//! // Fire-and-forget from a non-async context
//! orchestrator.spawn_sync();
//! # }
//! ```

pub mod delivery;
pub mod network_monitor;
pub mod notifier;
pub mod sync_state;

use crate::offline::queue::SubmissionQueue;
use crate::offline::retry::{RetryDecision, RetryPolicy};
use crate::shared::submission::{PendingSubmission, SubmissionType};
use delivery::Delivery;
use network_monitor::ConnectivityWatcher;
use notifier::Notifier;
use std::sync::Arc;
use sync_state::SyncSession;
use tokio::task::JoinHandle;

/// Tally of one completed sync run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Records acknowledged by the API
    pub delivered: usize,
    /// Records whose delivery failed and were kept for retry
    pub failed: usize,
    /// Records skipped because they exhausted their retries
    pub stuck: usize,
    /// Store reads, removals or updates that failed during the run, plus
    /// stored rows that could not be decoded
    pub store_errors: usize,
}

impl SyncReport {
    /// Delivery attempts made during the run
    pub fn attempted(&self) -> usize {
        self.delivered + self.failed
    }
}

/// Result of asking for a sync run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The run went through every partition
    Completed(SyncReport),
    /// Another run was in flight; nothing was done
    AlreadyRunning,
    /// The host is offline; nothing was done
    Offline,
}

/// Delivers pending submissions and keeps their retry bookkeeping
#[derive(Debug)]
pub struct SyncOrchestrator {
    queue: SubmissionQueue,
    delivery: Arc<dyn Delivery>,
    connectivity: Arc<ConnectivityWatcher>,
    notifier: Arc<dyn Notifier>,
    retry: RetryPolicy,
    session: SyncSession,
}

impl SyncOrchestrator {
    pub fn new(
        queue: SubmissionQueue,
        delivery: Arc<dyn Delivery>,
        connectivity: Arc<ConnectivityWatcher>,
        notifier: Arc<dyn Notifier>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            queue,
            delivery,
            connectivity,
            notifier,
            retry,
            session: SyncSession::new(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Whether a run is currently in flight
    pub fn is_syncing(&self) -> bool {
        self.session.is_running()
    }

    /// Attempt delivery of every eligible pending submission
    pub async fn sync_all(&self) -> SyncOutcome {
        let Some(_guard) = self.session.try_begin() else {
            tracing::info!("Sync already in progress");
            return SyncOutcome::AlreadyRunning;
        };

        if !self.connectivity.is_online() {
            tracing::info!("Offline - skipping sync");
            return SyncOutcome::Offline;
        }

        tracing::info!("Starting sync of pending submissions");
        let mut report = SyncReport::default();
        for kind in SubmissionType::ALL {
            self.sync_type(kind, &mut report).await;
        }

        tracing::info!(
            delivered = report.delivered,
            failed = report.failed,
            stuck = report.stuck,
            store_errors = report.store_errors,
            "Sync completed"
        );
        SyncOutcome::Completed(report)
    }

    /// Run [`Self::sync_all`] on the runtime without waiting for it
    pub fn spawn_sync(self: &Arc<Self>) -> JoinHandle<SyncOutcome> {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move { orchestrator.sync_all().await })
    }

    async fn sync_type(&self, kind: SubmissionType, report: &mut SyncReport) {
        let scan = match self.queue.scan(kind).await {
            Ok(scan) => scan,
            Err(e) => {
                tracing::error!(%kind, error = %e, "Failed to read pending submissions");
                report.store_errors += 1;
                return;
            }
        };

        if scan.unreadable > 0 {
            tracing::error!(%kind, unreadable = scan.unreadable, "Skipping unreadable submissions");
            report.store_errors += scan.unreadable;
        }

        let submissions = scan.records;

        if submissions.is_empty() {
            return;
        }
        tracing::info!(%kind, count = submissions.len(), "Syncing submissions");

        for submission in submissions {
            self.sync_one(submission, report).await;
        }
    }

    async fn sync_one(&self, mut submission: PendingSubmission, report: &mut SyncReport) {
        let kind = submission.kind;

        if self.retry.decide(&submission) == RetryDecision::Exhausted {
            tracing::warn!(
                id = %submission.id,
                retry_count = submission.retry_count,
                "Max retries exceeded - manual intervention needed"
            );
            report.stuck += 1;
            return;
        }

        match self.delivery.deliver(kind, &submission.payload).await {
            Ok(()) => {
                report.delivered += 1;
                match self.queue.remove(kind, &submission.id).await {
                    Ok(()) => {
                        tracing::info!(id = %submission.id, "Synced submission");
                        self.notifier.notify_success(kind);
                    }
                    Err(e) => {
                        tracing::error!(id = %submission.id, error = %e, "Delivered but failed to remove");
                        report.store_errors += 1;
                    }
                }
            }
            Err(e) => {
                report.failed += 1;
                submission.record_failure(e.to_string());
                tracing::warn!(
                    id = %submission.id,
                    retry_count = submission.retry_count,
                    retries_left = self.retry.remaining(&submission),
                    error = %e,
                    "Failed to sync submission"
                );
                if let Err(e) = self.queue.update(&submission).await {
                    tracing::error!(id = %submission.id, error = %e, "Failed to record retry");
                    report.store_errors += 1;
                }
            }
        }
    }
}
