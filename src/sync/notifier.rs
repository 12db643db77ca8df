//! # Success Notifications
//!
//! Turns a delivered submission into a shopper-facing confirmation. Notifying
//! happens after the record has been removed from the queue and can never
//! fail the delivery: implementations swallow every problem.
//!
//! - [`TracingNotifier`] logs the confirmation
//! - [`ChannelNotifier`] publishes a [`SyncNotification`] for the host UI,
//!   gated by the shopper's [`NotificationPermission`]

use crate::shared::config::NotificationConfig;
use crate::shared::submission::SubmissionType;
use std::sync::atomic::{AtomicU8, Ordering};
use tokio::sync::broadcast;

/// Receives one call per successfully delivered submission
pub trait Notifier: Send + Sync + std::fmt::Debug {
    fn notify_success(&self, kind: SubmissionType);
}

/// Logs confirmations
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify_success(&self, kind: SubmissionType) {
        tracing::info!(%kind, "{}", kind.success_message());
    }
}

/// Whether the shopper allowed notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationPermission {
    /// Never asked
    Default,
    Granted,
    Denied,
}

impl NotificationPermission {
    fn to_u8(self) -> u8 {
        match self {
            NotificationPermission::Default => 0,
            NotificationPermission::Granted => 1,
            NotificationPermission::Denied => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => NotificationPermission::Granted,
            2 => NotificationPermission::Denied,
            _ => NotificationPermission::Default,
        }
    }
}

/// A confirmation ready to be shown by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncNotification {
    pub kind: SubmissionType,
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    /// Notifications sharing a tag replace each other
    pub tag: String,
}

/// Publishes confirmations on a broadcast channel
#[derive(Debug)]
pub struct ChannelNotifier {
    sender: broadcast::Sender<SyncNotification>,
    permission: AtomicU8,
    appearance: NotificationConfig,
}

impl ChannelNotifier {
    pub fn new(appearance: NotificationConfig, permission: NotificationPermission) -> Self {
        let (sender, _) = broadcast::channel(16);
        Self {
            sender,
            permission: AtomicU8::new(permission.to_u8()),
            appearance,
        }
    }

    /// Receive confirmations published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<SyncNotification> {
        self.sender.subscribe()
    }

    pub fn permission(&self) -> NotificationPermission {
        NotificationPermission::from_u8(self.permission.load(Ordering::Acquire))
    }

    /// Record a permission change reported by the host
    pub fn set_permission(&self, permission: NotificationPermission) {
        self.permission.store(permission.to_u8(), Ordering::Release);
    }
}

impl Notifier for ChannelNotifier {
    fn notify_success(&self, kind: SubmissionType) {
        if self.permission() != NotificationPermission::Granted {
            tracing::debug!(%kind, "Notification permission not granted");
            return;
        }

        let notification = SyncNotification {
            kind,
            title: self.appearance.title.clone(),
            body: kind.success_message().to_string(),
            icon: self.appearance.icon.clone(),
            badge: self.appearance.badge.clone(),
            tag: self.appearance.tag.clone(),
        };

        // No subscriber means no UI is listening
        if self.sender.send(notification).is_err() {
            tracing::debug!(%kind, "No notification subscribers");
        }
    }
}
