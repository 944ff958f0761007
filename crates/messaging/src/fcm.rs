//! Single-device sends through the FCM HTTP v1 `messages:send` endpoint.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use geofence::{
    AccessTokenSource, CredentialError, DeliveryError, DeviceToken, NotificationPayload, PushSender,
};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

/// Connection settings for [`FcmClient`].
#[derive(Debug, Clone)]
pub struct FcmConfig {
    /// API root, e.g. `https://fcm.googleapis.com`.
    pub base_url: String,
    pub project_id: String,
    pub request_timeout: Duration,
}

#[derive(Debug, Error)]
pub enum FcmError {
    #[error("invalid FCM base URL '{url}': {message}")]
    InvalidBaseUrl { url: String, message: String },

    /// FCM refused the message.
    #[error("FCM returned HTTP {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error(transparent)]
    Credentials(#[from] CredentialError),

    /// Network, DNS, timeout, or body decoding failure.
    #[error("FCM request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl From<FcmError> for DeliveryError {
    fn from(err: FcmError) -> Self {
        match err {
            FcmError::Rejected { status, message } => DeliveryError::Rejected { status, message },
            other => DeliveryError::Transport {
                message: other.to_string(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(crate) struct SendRequest<'a> {
    message: Message<'a>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    token: &'a str,
    notification: Notification<'a>,
}

#[derive(Debug, Serialize)]
struct Notification<'a> {
    title: &'a str,
    body: &'a str,
}

impl<'a> SendRequest<'a> {
    pub(crate) fn new(token: &'a DeviceToken, payload: &'a NotificationPayload) -> Self {
        Self {
            message: Message {
                token: token.as_str(),
                notification: Notification {
                    title: &payload.title,
                    body: &payload.body,
                },
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDetail {
    #[serde(default)]
    error_code: Option<String>,
}

/// Summarises an FCM error body as `CODE: message`.
///
/// The FCM-specific `errorCode` (e.g. `UNREGISTERED`) wins over the generic
/// RPC status when both are present.
fn error_message(body: &str) -> String {
    let Ok(ErrorEnvelope { error }) = serde_json::from_str::<ErrorEnvelope>(body) else {
        return body.trim().to_string();
    };
    let code = error
        .details
        .iter()
        .find_map(|d| d.error_code.clone())
        .unwrap_or(error.status);
    if code.is_empty() {
        error.message
    } else {
        format!("{code}: {}", error.message)
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Sends notifications to single devices.
///
/// Each send asks the [`AccessTokenSource`] for a token carrying the
/// `firebase.messaging` scope.
#[derive(Clone)]
pub struct FcmClient {
    http: reqwest::Client,
    send_url: Url,
    tokens: Arc<dyn AccessTokenSource>,
}

impl FcmClient {
    pub fn new(config: FcmConfig, tokens: Arc<dyn AccessTokenSource>) -> Result<Self, FcmError> {
        let invalid = |message: String| FcmError::InvalidBaseUrl {
            url: config.base_url.clone(),
            message,
        };
        let mut send_url = Url::parse(&config.base_url).map_err(|e| invalid(e.to_string()))?;
        send_url
            .path_segments_mut()
            .map_err(|()| invalid("URL cannot be used as a base".into()))?
            .pop_if_empty()
            .extend([
                "v1",
                "projects",
                config.project_id.as_str(),
                "messages:send",
            ]);

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            send_url,
            tokens,
        })
    }

    pub fn send_url(&self) -> &Url {
        &self.send_url
    }

    /// Posts one message and returns its FCM resource name.
    #[instrument(skip_all)]
    pub async fn send_message(
        &self,
        token: &DeviceToken,
        payload: &NotificationPayload,
    ) -> Result<String, FcmError> {
        let access_token = self.tokens.access_token().await?;
        let response = self
            .http
            .post(self.send_url.clone())
            .bearer_auth(access_token)
            .json(&SendRequest::new(token, payload))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FcmError::Rejected {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let SendResponse { name } = response.json().await?;
        debug!(message = %name, "FCM accepted message");
        Ok(name)
    }
}

#[async_trait]
impl PushSender for FcmClient {
    async fn send(
        &self,
        token: &DeviceToken,
        payload: &NotificationPayload,
    ) -> Result<String, DeliveryError> {
        Ok(self.send_message(token, payload).await?)
    }
}

#[cfg(test)]
mod tests {
    use geofence::StaticToken;
    use serde_json::json;

    use super::*;

    fn config(base_url: &str) -> FcmConfig {
        FcmConfig {
            base_url: base_url.to_string(),
            project_id: "demo".into(),
            request_timeout: Duration::from_secs(5),
        }
    }

    fn client(base_url: &str) -> FcmClient {
        FcmClient::new(config(base_url), Arc::new(StaticToken::new("token"))).unwrap()
    }

    fn payload() -> NotificationPayload {
        NotificationPayload {
            title: "t".into(),
            body: "b".into(),
        }
    }

    #[test]
    fn send_url_targets_project_endpoint() {
        let client = client("https://fcm.googleapis.com");
        assert_eq!(
            client.send_url().as_str(),
            "https://fcm.googleapis.com/v1/projects/demo/messages:send"
        );
    }

    #[test]
    fn request_body_carries_token_and_notification() {
        let token = DeviceToken::new("tok123").unwrap();
        let payload = NotificationPayload {
            title: "You have entered an area".into(),
            body: "You are near Central Park".into(),
        };

        let body = serde_json::to_value(SendRequest::new(&token, &payload)).unwrap();

        assert_eq!(
            body,
            json!({
                "message": {
                    "token": "tok123",
                    "notification": {
                        "title": "You have entered an area",
                        "body": "You are near Central Park"
                    }
                }
            })
        );
    }

    #[test]
    fn error_message_prefers_fcm_error_code() {
        let body = json!({
            "error": {
                "code": 404,
                "message": "Requested entity was not found.",
                "status": "NOT_FOUND",
                "details": [{
                    "@type": "type.googleapis.com/google.firebase.fcm.v1.FcmError",
                    "errorCode": "UNREGISTERED"
                }]
            }
        })
        .to_string();
        assert_eq!(
            error_message(&body),
            "UNREGISTERED: Requested entity was not found."
        );
    }

    #[test]
    fn error_message_falls_back_to_status_then_raw_body() {
        let body = r#"{"error":{"code":400,"message":"bad token","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(error_message(body), "INVALID_ARGUMENT: bad token");
        assert_eq!(error_message("<html>502</html>"), "<html>502</html>");
    }

    #[test]
    fn rejection_maps_to_delivery_rejected() {
        let err = DeliveryError::from(FcmError::Rejected {
            status: 404,
            message: "UNREGISTERED: gone".into(),
        });
        assert_eq!(
            err,
            DeliveryError::Rejected {
                status: 404,
                message: "UNREGISTERED: gone".into(),
            }
        );
    }

    #[tokio::test]
    async fn unreachable_service_is_a_transport_failure() {
        let client = client("http://127.0.0.1:9");
        let err = client
            .send(&DeviceToken::new("tok").unwrap(), &payload())
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Transport { .. }));
    }

    struct Revoked;

    #[async_trait]
    impl AccessTokenSource for Revoked {
        async fn access_token(&self) -> Result<String, CredentialError> {
            Err(CredentialError {
                message: "token file is empty".into(),
            })
        }
    }

    #[tokio::test]
    async fn unavailable_credentials_are_a_retryable_transport_failure() {
        let client = FcmClient::new(config("http://127.0.0.1:9"), Arc::new(Revoked)).unwrap();
        let err = client
            .send(&DeviceToken::new("tok").unwrap(), &payload())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            DeliveryError::Transport {
                message: "access token unavailable: token file is empty".into(),
            }
        );
        assert!(matches!(
            err.retry_policy(),
            geofence::RetryPolicy::Retryable { .. }
        ));
    }
}
