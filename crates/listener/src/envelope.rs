//! Decoding of the document-created trigger payload into a [`GeofenceEvent`].
//!
//! The trigger delivers the new document in Firestore's typed-value form:
//!
//! ```json
//! { "value": {
//!     "name": "projects/p/databases/(default)/documents/geofence_events/abc",
//!     "fields": {
//!       "userId":     { "stringValue": "u1" },
//!       "geofenceId": { "stringValue": "g1" },
//!       "event":      { "stringValue": "enter" } },
//!     "createTime": "2024-05-01T10:15:00Z" } }
//! ```

use firestore::Document;
use geofence::{
    DispatchError, EventId, EventKind, GeofenceEvent, GeofenceId, UnknownEventPolicy, UserId,
};
use serde::Deserialize;
use tracing::warn;

/// Collection whose document creations trigger a dispatch.
pub const EVENTS_COLLECTION: &str = "geofence_events";

/// Body of one document-created delivery.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentCreated {
    /// The document as created.
    pub value: Document,
}

impl DocumentCreated {
    /// Converts the created document into a [`GeofenceEvent`].
    ///
    /// `userId` and `geofenceId` must be non-empty strings. A missing `event`
    /// field reads as the empty string and is resolved by `policy` like any
    /// other unrecognised value.
    pub fn decode(&self, policy: UnknownEventPolicy) -> Result<GeofenceEvent, DispatchError> {
        let document = &self.value;
        let id = EventId::new(document.id());
        let invalid = |reason: String| DispatchError::InvalidEvent {
            event_id: id.clone(),
            reason,
        };

        if let Some(collection) = document.collection() {
            if collection != EVENTS_COLLECTION {
                warn!(
                    collection,
                    "Trigger delivered a document from an unexpected collection"
                );
            }
        }

        let event_id = id
            .clone()
            .ok_or_else(|| invalid("document name has no id".into()))?;
        let user_id = document
            .string_field("userId")
            .and_then(UserId::new)
            .ok_or_else(|| invalid("missing or empty 'userId'".into()))?;
        let geofence_id = document
            .string_field("geofenceId")
            .and_then(GeofenceId::new)
            .ok_or_else(|| invalid("missing or empty 'geofenceId'".into()))?;

        let raw_kind = document.string_field("event").unwrap_or_default();
        let kind = EventKind::decode(raw_kind, policy)
            .ok_or_else(|| invalid(format!("unrecognised event type '{raw_kind}'")))?;
        if kind.as_str() != raw_kind {
            warn!(
                event_id = %event_id,
                raw = raw_kind,
                "Unrecognised event type treated as exit"
            );
        }

        Ok(GeofenceEvent {
            id: event_id,
            user_id,
            geofence_id,
            kind,
        })
    }
}
