//! Submission Types
//!
//! Defines the closed set of submission categories and the queued record
//! that carries a form payload until the storefront API acknowledges it.
//!
//! # Identifiers
//!
//! Ids follow the `{TYPE}_{millis}_{suffix}` shape, e.g.
//! `QUOTES_1718042400000_k3j9x0a2b`. The suffix is nine random lowercase
//! alphanumerics taken from a v4 UUID.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Category of a queued form submission
///
/// The category selects both the storage partition the record lives in and
/// the remote endpoint that receives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionType {
    /// Quote request form
    Quotes,
    /// Contact form
    Contacts,
    /// Cart update
    Cart,
    /// Favorites change
    Favorites,
}

impl SubmissionType {
    /// Every category, in the order sync runs process them
    pub const ALL: [SubmissionType; 4] = [
        SubmissionType::Quotes,
        SubmissionType::Contacts,
        SubmissionType::Cart,
        SubmissionType::Favorites,
    ];

    /// Upper-case name used in ids and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionType::Quotes => "QUOTES",
            SubmissionType::Contacts => "CONTACTS",
            SubmissionType::Cart => "CART",
            SubmissionType::Favorites => "FAVORITES",
        }
    }

    /// Name of the storage partition holding this category
    pub fn partition(&self) -> &'static str {
        match self {
            SubmissionType::Quotes => "pending_quotes",
            SubmissionType::Contacts => "pending_contacts",
            SubmissionType::Cart => "pending_cart_updates",
            SubmissionType::Favorites => "pending_favorites",
        }
    }

    /// Default API path receiving this category
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            SubmissionType::Quotes => "/api/quotes",
            SubmissionType::Contacts => "/api/contact",
            SubmissionType::Cart => "/api/cart",
            SubmissionType::Favorites => "/api/favorites",
        }
    }

    /// Confirmation shown to the shopper once a queued submission goes through
    pub fn success_message(&self) -> &'static str {
        match self {
            SubmissionType::Quotes => "Your quote request has been submitted",
            SubmissionType::Contacts => "Your contact form has been submitted",
            SubmissionType::Cart => "Your cart has been updated",
            SubmissionType::Favorites => "Your favorites have been synced",
        }
    }
}

impl fmt::Display for SubmissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of a queued submission
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(String);

impl SubmissionId {
    /// Generate a fresh id for a submission of `kind` enqueued at `enqueued_at`
    pub fn generate(kind: SubmissionType, enqueued_at: i64) -> Self {
        let suffix: String = Uuid::new_v4().simple().to_string().chars().take(9).collect();
        Self(format!("{}_{}_{}", kind.as_str(), enqueued_at, suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SubmissionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SubmissionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A form submission waiting for delivery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSubmission {
    /// Unique id, fixed at enqueue time
    pub id: SubmissionId,
    /// Category, selects partition and endpoint
    #[serde(rename = "type")]
    pub kind: SubmissionType,
    /// Original request body, passed through untouched
    pub payload: Value,
    /// Milliseconds since the Unix epoch when the record was created
    pub enqueued_at: i64,
    /// Failed delivery attempts so far
    pub retry_count: u32,
    /// Diagnostic from the most recent failed attempt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl PendingSubmission {
    /// Build a new record stamped with the current time
    pub fn new(kind: SubmissionType, payload: Value) -> Self {
        let enqueued_at = chrono::Utc::now().timestamp_millis();
        Self {
            id: SubmissionId::generate(kind, enqueued_at),
            kind,
            payload,
            enqueued_at,
            retry_count: 0,
            last_error: None,
        }
    }

    /// Whether the record has used up its automatic retries
    pub fn is_stuck(&self, max_retries: u32) -> bool {
        self.retry_count >= max_retries
    }

    /// Record one failed delivery attempt
    pub fn record_failure(&mut self, error: impl Into<String>) {
        self.retry_count = self.retry_count.saturating_add(1);
        self.last_error = Some(error.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_shape() {
        let id = SubmissionId::generate(SubmissionType::Quotes, 1718042400000);
        let parts: Vec<&str> = id.as_str().split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "QUOTES");
        assert_eq!(parts[1], "1718042400000");
        assert_eq!(parts[2].len(), 9);
        assert!(parts[2].chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = SubmissionId::generate(SubmissionType::Cart, 42);
        let b = SubmissionId::generate(SubmissionType::Cart, 42);
        assert_ne!(a, b);
    }

    #[test]
    fn test_new_submission_defaults() {
        let submission = PendingSubmission::new(SubmissionType::Contacts, json!({"name": "Jane Doe"}));
        assert_eq!(submission.kind, SubmissionType::Contacts);
        assert_eq!(submission.retry_count, 0);
        assert!(submission.last_error.is_none());
        assert!(submission.id.as_str().starts_with("CONTACTS_"));
        assert!(submission.enqueued_at > 0);
    }

    #[test]
    fn test_record_failure_is_monotonic() {
        let mut submission = PendingSubmission::new(SubmissionType::Favorites, json!({}));
        submission.record_failure("HTTP 500: Internal Server Error");
        submission.record_failure("connection refused");
        assert_eq!(submission.retry_count, 2);
        assert_eq!(submission.last_error.as_deref(), Some("connection refused"));
        assert!(!submission.is_stuck(3));
        submission.record_failure("timeout");
        assert!(submission.is_stuck(3));
    }

    #[test]
    fn test_serialized_shape() {
        let mut submission = PendingSubmission::new(SubmissionType::Quotes, json!({"email": "jane@example.com"}));
        submission.id = SubmissionId::from("QUOTES_1_abc");
        let value = serde_json::to_value(&submission).unwrap();
        assert_eq!(value["type"], "QUOTES");
        assert_eq!(value["retryCount"], 0);
        assert!(value.get("lastError").is_none());
    }
}
