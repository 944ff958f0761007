//! The notification dispatcher: one stored geofence event in, one push send out.
//!
//! The pipeline is strictly linear. The user lookup runs first, then the
//! geofence lookup, then the send; a failure at any step ends the dispatch and
//! later collaborators are never called.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::ports::{GeofenceCatalog, PushSender, UserDirectory};
use crate::{DeliveryError, DispatchError, DispatchReceipt, GeofenceEvent, NotificationPayload};

/// Turns geofence events into push notifications.
///
/// Holds its collaborators behind `Arc` so one dispatcher can serve concurrent
/// invocations; it keeps no state of its own between calls.
#[derive(Clone)]
pub struct NotificationDispatcher {
    users: Arc<dyn UserDirectory>,
    geofences: Arc<dyn GeofenceCatalog>,
    push: Arc<dyn PushSender>,
}

impl NotificationDispatcher {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        geofences: Arc<dyn GeofenceCatalog>,
        push: Arc<dyn PushSender>,
    ) -> Self {
        Self {
            users,
            geofences,
            push,
        }
    }

    /// Resolves the recipient and geofence for `event` and sends the notification.
    ///
    /// Returns the provider receipt on success. Lookup failures come back as
    /// [`DispatchError::UserLookup`] / [`DispatchError::GeofenceLookup`]; a
    /// missing device token or a refused send comes back as
    /// [`DispatchError::Delivery`].
    #[instrument(
        skip(self, event),
        fields(
            event_id = %event.id,
            user_id = %event.user_id,
            geofence_id = %event.geofence_id,
            kind = %event.kind,
        )
    )]
    pub async fn dispatch(&self, event: &GeofenceEvent) -> Result<DispatchReceipt, DispatchError> {
        let user = self
            .users
            .get_user(&event.user_id)
            .await
            .map_err(|source| DispatchError::UserLookup {
                user_id: event.user_id.clone(),
                source,
            })?;

        let geofence = self
            .geofences
            .get_geofence(&event.geofence_id)
            .await
            .map_err(|source| DispatchError::GeofenceLookup {
                geofence_id: event.geofence_id.clone(),
                source,
            })?;

        let payload = NotificationPayload::compose(event.kind, &geofence);

        let token = user
            .device_token
            .ok_or_else(|| DeliveryError::MissingDeviceToken {
                user_id: event.user_id.clone(),
            })?;

        let message_id = self.push.send(&token, &payload).await?;
        info!(message_id = %message_id, "Notification sent successfully");

        Ok(DispatchReceipt {
            event_id: event.id.clone(),
            message_id,
        })
    }
}
