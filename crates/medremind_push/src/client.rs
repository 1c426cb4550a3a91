//! Expo push gateway client
//!
//! [`PushTransport`] is the seam between the pipeline and the network: one
//! call posts one batch and yields the gateway's tickets in request order.
//! [`ExpoClient`] is the reqwest implementation used in production.

use crate::error::PushError;
use crate::models::{ExpoMessage, ExpoPushResponse, PushTicket};
use medremind_common::create_client;
use medremind_config::{env_vars::SECRET_MARKER, PushConfig};
use reqwest::{header, Client};
use std::future::Future;
use tracing::{debug, error};

/// Sends one batch of messages to a push gateway
pub trait PushTransport: Send + Sync {
    /// Posts `messages` in a single request
    ///
    /// # Errors
    ///
    /// Interrupted connections must surface as [`PushError::TransientTransport`];
    /// every other failure as a permanent variant.
    fn send_batch(
        &self,
        messages: &[ExpoMessage],
    ) -> impl Future<Output = Result<Vec<PushTicket>, PushError>> + Send;
}

/// Client for the Expo push HTTP API
#[derive(Debug, Clone)]
pub struct ExpoClient {
    /// HTTP client carrying the configured request timeout
    client: Client,

    gateway_url: String,

    /// Sent as a bearer token when present
    access_token: Option<String>,
}

impl ExpoClient {
    /// Creates a client from the push configuration
    ///
    /// # Errors
    ///
    /// Fails with [`PushError::Config`] when the gateway URL is empty or the
    /// HTTP client cannot be built.
    pub fn new(config: &PushConfig) -> Result<Self, PushError> {
        if config.gateway_url.trim().is_empty() {
            return Err(PushError::Config("push gateway_url is empty".to_string()));
        }

        let client = create_client(config.timeout_secs, true)
            .map_err(|e| PushError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            gateway_url: config.gateway_url.clone(),
            access_token: config
                .access_token
                .clone()
                .filter(|token| !token.trim().is_empty() && token != SECRET_MARKER),
        })
    }

    pub fn gateway_url(&self) -> &str {
        &self.gateway_url
    }
}

impl PushTransport for ExpoClient {
    async fn send_batch(&self, messages: &[ExpoMessage]) -> Result<Vec<PushTicket>, PushError> {
        debug!(
            "Posting {} push messages to {}",
            messages.len(),
            self.gateway_url
        );

        let mut request = self
            .client
            .post(&self.gateway_url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json")
            .json(messages);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(PushError::from_transport)?;
        let status = response.status();

        // a body cut off mid-read is as transient as a failed send
        let body = response.bytes().await.map_err(PushError::from_transport)?;

        if !status.is_success() {
            let message = String::from_utf8_lossy(&body).into_owned();
            error!("Push gateway returned {}: {}", status, message);
            return Err(PushError::Gateway {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ExpoPushResponse = serde_json::from_slice(&body)
            .map_err(|e| PushError::InvalidResponse(e.to_string()))?;
        Ok(parsed.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TicketStatus;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn message(token: &str) -> ExpoMessage {
        ExpoMessage {
            to: token.to_string(),
            title: Some("Medication reminder".to_string()),
            body: Some("Time for your 8:00 dose".to_string()),
            data: Some(json!({ "eventId": "evt-1" })),
            sound: None,
            priority: None,
            channel_id: None,
        }
    }

    fn config(server: &MockServer, access_token: Option<&str>) -> PushConfig {
        PushConfig {
            gateway_url: format!("{}/--/api/v2/push/send", server.uri()),
            access_token: access_token.map(str::to_string),
            ..PushConfig::default()
        }
    }

    #[tokio::test]
    async fn test_send_batch_posts_json_array_with_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/--/api/v2/push/send"))
            .and(header("content-type", "application/json"))
            .and(header("authorization", "Bearer expo-secret"))
            .and(body_json(json!([
                {
                    "to": "ExponentPushToken[a]",
                    "title": "Medication reminder",
                    "body": "Time for your 8:00 dose",
                    "data": { "eventId": "evt-1" }
                },
                {
                    "to": "ExponentPushToken[b]",
                    "title": "Medication reminder",
                    "body": "Time for your 8:00 dose",
                    "data": { "eventId": "evt-1" }
                }
            ])))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    { "status": "ok", "id": "r1" },
                    { "status": "error", "details": { "error": "DeviceNotRegistered" } }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ExpoClient::new(&config(&server, Some("expo-secret"))).unwrap();
        let tickets = client
            .send_batch(&[message("ExponentPushToken[a]"), message("ExponentPushToken[b]")])
            .await
            .unwrap();

        assert_eq!(tickets.len(), 2);
        assert_eq!(tickets[0].status, TicketStatus::Ok);
        assert_eq!(tickets[1].error_code(), Some("DeviceNotRegistered"));
    }

    #[tokio::test]
    async fn test_no_authorization_header_without_credential() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(|request: &Request| {
                if request.headers.keys().any(|name| name.as_str() == "authorization") {
                    ResponseTemplate::new(401)
                } else {
                    ResponseTemplate::new(200).set_body_json(json!({ "data": [{ "status": "ok" }] }))
                }
            })
            .mount(&server)
            .await;

        let client = ExpoClient::new(&config(&server, None)).unwrap();
        let tickets = client
            .send_batch(&[message("ExponentPushToken[a]")])
            .await
            .unwrap();
        assert_eq!(tickets.len(), 1);
    }

    #[tokio::test]
    async fn test_blank_credential_is_ignored() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
            .mount(&server)
            .await;

        let client = ExpoClient::new(&config(&server, Some("  "))).unwrap();
        assert!(client.send_batch(&[]).await.unwrap().is_empty());

        // an unresolved secret placeholder is no credential either
        let client = ExpoClient::new(&config(&server, Some("secret_from_env"))).unwrap();
        assert!(client.send_batch(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_error_status_is_gateway_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("too many messages"))
            .expect(1)
            .mount(&server)
            .await;

        let client = ExpoClient::new(&config(&server, None)).unwrap();
        let err = client
            .send_batch(&[message("ExponentPushToken[a]")])
            .await
            .unwrap_err();

        match err {
            PushError::Gateway { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "too many messages");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unparseable_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let client = ExpoClient::new(&config(&server, None)).unwrap();
        let err = client
            .send_batch(&[message("ExponentPushToken[a]")])
            .await
            .unwrap_err();
        assert!(matches!(err, PushError::InvalidResponse(_)));
    }

    #[test]
    fn test_empty_gateway_url_is_config_error() {
        let config = PushConfig {
            gateway_url: String::new(),
            ..PushConfig::default()
        };
        assert!(matches!(ExpoClient::new(&config), Err(PushError::Config(_))));
    }
}
