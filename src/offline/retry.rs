//! # Retry Policy
//!
//! Decides whether a queued submission is still eligible for automatic
//! delivery. Retries are not time-based: a failed item is simply attempted
//! again on the next sync run until its retry count reaches the ceiling,
//! after which it stays in the store for manual handling.

use crate::shared::config::DEFAULT_MAX_RETRIES;
use crate::shared::submission::PendingSubmission;

/// Outcome of checking a record against the policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Deliver the record now
    Attempt,
    /// Leave the record alone; it needs manual intervention
    Exhausted,
}

/// Retry ceiling for queued submissions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
}

impl RetryPolicy {
    /// Create a policy allowing `max_retries` failed attempts
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Check whether `record` may be attempted
    pub fn decide(&self, record: &PendingSubmission) -> RetryDecision {
        if record.is_stuck(self.max_retries) {
            RetryDecision::Exhausted
        } else {
            RetryDecision::Attempt
        }
    }

    /// Attempts left before `record` stops being retried
    pub fn remaining(&self, record: &PendingSubmission) -> u32 {
        self.max_retries.saturating_sub(record.retry_count)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES)
    }
}
