//! Records and value types for the geofence notification domain.
//!
//! [`GeofenceEvent`], [`UserRecord`], and [`GeofenceRecord`] are read-only
//! snapshots of documents owned by other subsystems. [`NotificationPayload`] is
//! the only value the dispatcher constructs itself.

use serde::{Deserialize, Serialize};

use crate::{DeviceToken, EventId, GeofenceId, UserId};

// ---------------------------------------------------------------------------
// Event kind
// ---------------------------------------------------------------------------

/// Direction of a geofence boundary crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// The user moved into the geofence.
    Enter,
    /// The user moved out of the geofence.
    Exit,
}

impl EventKind {
    /// Decodes the raw `event` field of a stored event.
    ///
    /// Returns `None` when `raw` is neither `"enter"` nor `"exit"` and `policy`
    /// is [`UnknownEventPolicy::Reject`].
    pub fn decode(raw: &str, policy: UnknownEventPolicy) -> Option<Self> {
        match (raw, policy) {
            ("enter", _) => Some(Self::Enter),
            ("exit", _) => Some(Self::Exit),
            (_, UnknownEventPolicy::TreatAsExit) => Some(Self::Exit),
            (_, UnknownEventPolicy::Reject) => None,
        }
    }

    /// Returns the wire spelling of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enter => "enter",
            Self::Exit => "exit",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an `event` value other than `"enter"` or `"exit"` is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownEventPolicy {
    /// Anything that is not `"enter"` is an exit.
    #[default]
    TreatAsExit,
    /// Unrecognised values are refused at the trigger boundary.
    Reject,
}

impl std::str::FromStr for UnknownEventPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "treat-as-exit" => Ok(Self::TreatAsExit),
            "reject" => Ok(Self::Reject),
            other => Err(format!(
                "unknown event policy '{other}' (expected 'treat-as-exit' or 'reject')"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A newly created document in the `geofence_events` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeofenceEvent {
    /// Store-assigned identifier of the event document.
    pub id: EventId,
    /// User who crossed the boundary.
    pub user_id: UserId,
    /// Geofence whose boundary was crossed.
    pub geofence_id: GeofenceId,
    /// Direction of the crossing.
    pub kind: EventKind,
}

/// The fields of a user document the dispatcher reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Push address of the user's device. `None` when the field is absent.
    pub device_token: Option<DeviceToken>,
}

/// The fields of a geofence document the dispatcher reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeofenceRecord {
    /// Human-readable description shown in the notification body.
    pub description: String,
}

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

/// Title and body of one push notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
}

impl NotificationPayload {
    /// Composes the notification for a crossing of the described geofence.
    ///
    /// The description is inserted verbatim.
    pub fn compose(kind: EventKind, geofence: &GeofenceRecord) -> Self {
        let verb = match kind {
            EventKind::Enter => "entered",
            EventKind::Exit => "exited",
        };
        Self {
            title: format!("You have {verb} an area"),
            body: format!("You are near {}", geofence.description),
        }
    }
}

/// Proof of a successful send, as reported by the push collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReceipt {
    /// Event that produced the notification.
    pub event_id: EventId,
    /// Provider-assigned message name, e.g. `projects/p/messages/0:123`.
    pub message_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geofence(description: &str) -> GeofenceRecord {
        GeofenceRecord {
            description: description.to_string(),
        }
    }

    #[test]
    fn enter_composes_entered_title() {
        let payload = NotificationPayload::compose(EventKind::Enter, &geofence("Central Park"));
        assert_eq!(payload.title, "You have entered an area");
        assert_eq!(payload.body, "You are near Central Park");
    }

    #[test]
    fn exit_composes_exited_title() {
        let payload = NotificationPayload::compose(EventKind::Exit, &geofence("Main Library"));
        assert_eq!(payload.title, "You have exited an area");
        assert_eq!(payload.body, "You are near Main Library");
    }

    #[test]
    fn description_is_not_transformed() {
        let payload = NotificationPayload::compose(EventKind::Exit, &geofence("  café <b>42</b> "));
        assert_eq!(payload.body, "You are near   café <b>42</b> ");
    }

    #[test]
    fn non_enter_values_decode_as_exit_by_default() {
        for raw in ["exit", "EXIT", "Enter", "teleport", ""] {
            assert_eq!(
                EventKind::decode(raw, UnknownEventPolicy::TreatAsExit),
                Some(EventKind::Exit),
                "raw value {raw:?}"
            );
        }
        assert_eq!(
            EventKind::decode("enter", UnknownEventPolicy::TreatAsExit),
            Some(EventKind::Enter)
        );
    }

    #[test]
    fn reject_policy_refuses_unrecognised_values() {
        assert_eq!(EventKind::decode("teleport", UnknownEventPolicy::Reject), None);
        assert_eq!(
            EventKind::decode("exit", UnknownEventPolicy::Reject),
            Some(EventKind::Exit)
        );
    }

    #[test]
    fn policy_parses_from_kebab_case() {
        assert_eq!(
            "reject".parse::<UnknownEventPolicy>(),
            Ok(UnknownEventPolicy::Reject)
        );
        assert_eq!(
            "treat-as-exit".parse::<UnknownEventPolicy>(),
            Ok(UnknownEventPolicy::TreatAsExit)
        );
        assert!("exit".parse::<UnknownEventPolicy>().is_err());
    }
}
