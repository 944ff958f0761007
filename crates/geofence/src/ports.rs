//! Collaborator traits implemented by the infrastructure crates.
//!
//! The three collaborator traits are read-only or send-only: nothing the
//! dispatcher calls can mutate an event, user, or geofence record.
//! [`AccessTokenSource`] is the credential seam those adapters share.

use async_trait::async_trait;

use crate::{
    CredentialError, DeliveryError, DeviceToken, GeofenceId, GeofenceRecord, LookupError,
    NotificationPayload, UserId, UserRecord,
};

/// Point lookup of user records by primary key.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_user(&self, user_id: &UserId) -> Result<UserRecord, LookupError>;
}

/// Point lookup of geofence definitions by primary key.
#[async_trait]
pub trait GeofenceCatalog: Send + Sync {
    async fn get_geofence(&self, geofence_id: &GeofenceId) -> Result<GeofenceRecord, LookupError>;
}

/// Best-effort delivery of one notification to one device.
#[async_trait]
pub trait PushSender: Send + Sync {
    /// Sends `payload` to `token`, returning the provider's message id.
    async fn send(
        &self,
        token: &DeviceToken,
        payload: &NotificationPayload,
    ) -> Result<String, DeliveryError>;
}

/// Supplies the OAuth 2.0 bearer token attached to each outbound request.
///
/// Adapters query it per request, so a source backed by an external minter
/// can rotate tokens without restarting the process.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, CredentialError>;
}

/// A fixed token. Suitable for emulators and short-lived single-shot runs.
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl AccessTokenSource for StaticToken {
    async fn access_token(&self) -> Result<String, CredentialError> {
        Ok(self.0.clone())
    }
}
