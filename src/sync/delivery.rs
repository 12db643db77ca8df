//! # Delivery
//!
//! Sends a queued payload to the storefront endpoint for its submission type.
//! Any 2xx response acknowledges the submission; every other status and every
//! transport failure (including timeouts) is a [`DeliveryError`] that the
//! orchestrator records on the item and retries on a later run.

use crate::shared::config::SyncConfig;
use crate::shared::submission::SubmissionType;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// A delivery attempt that was not acknowledged
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The endpoint answered with a non-success status
    #[error("HTTP {status}: {reason}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Canonical reason phrase, empty if unknown
        reason: String,
    },

    /// The request never produced a response
    #[error("{message}")]
    Transport {
        /// Human-readable error message
        message: String,
    },
}

impl DeliveryError {
    /// Create a new transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}

/// Transport used by the orchestrator to hand payloads to the remote API
#[async_trait]
pub trait Delivery: Send + Sync + std::fmt::Debug {
    async fn deliver(&self, kind: SubmissionType, payload: &Value) -> Result<(), DeliveryError>;
}

/// JSON-over-HTTP delivery to the configured endpoint table
#[derive(Debug, Clone)]
pub struct HttpDelivery {
    client: reqwest::Client,
    config: SyncConfig,
}

impl HttpDelivery {
    /// Build a client honouring the configured request timeout
    pub fn new(config: &SyncConfig) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| DeliveryError::transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }
}

#[async_trait]
impl Delivery for HttpDelivery {
    async fn deliver(&self, kind: SubmissionType, payload: &Value) -> Result<(), DeliveryError> {
        let url = self.config.endpoint_url(kind);

        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DeliveryError::transport(format!("request to {} timed out", url))
                } else {
                    DeliveryError::transport(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(DeliveryError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn delivery_for(server: &MockServer) -> HttpDelivery {
        let config = SyncConfig::builder()
            .base_url(server.uri())
            .request_timeout(Duration::from_millis(500))
            .build()
            .unwrap();
        HttpDelivery::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_posts_json_to_type_endpoint() {
        let server = MockServer::start().await;
        let payload = json!({"name": "Jane Doe", "email": "jane@example.com"});

        Mock::given(method("POST"))
            .and(path("/api/quotes"))
            .and(header("content-type", "application/json"))
            .and(body_json(&payload))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let delivery = delivery_for(&server);
        assert!(delivery.deliver(SubmissionType::Quotes, &payload).await.is_ok());
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/contact"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let delivery = delivery_for(&server);
        let error = delivery
            .deliver(SubmissionType::Contacts, &json!({}))
            .await
            .unwrap_err();
        assert_eq!(
            error,
            DeliveryError::Status {
                status: 503,
                reason: "Service Unavailable".to_string()
            }
        );
        assert_eq!(error.to_string(), "HTTP 503: Service Unavailable");
    }

    #[tokio::test]
    async fn test_timeout_is_transport_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/cart"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let delivery = delivery_for(&server);
        let error = delivery.deliver(SubmissionType::Cart, &json!({})).await.unwrap_err();
        assert!(matches!(error, DeliveryError::Transport { .. }));
        assert!(error.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_failure() {
        let config = SyncConfig::builder()
            .base_url("http://127.0.0.1:9")
            .request_timeout(Duration::from_millis(500))
            .build()
            .unwrap();
        let delivery = HttpDelivery::new(&config).unwrap();
        let error = delivery
            .deliver(SubmissionType::Favorites, &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(error, DeliveryError::Transport { .. }));
    }
}
