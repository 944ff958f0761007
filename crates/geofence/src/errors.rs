//! Error and retry-policy types for the geofence notification domain.
//!
//! Collaborator failures are split into two families. [`LookupError`] covers the
//! reads of reference data; [`DeliveryError`] covers the final push send.
//! [`DispatchError`] wraps both and is the single failure type returned by
//! [`crate::NotificationDispatcher::dispatch`]; whether a failure is propagated
//! or swallowed is decided by the trigger layer, not here.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CollectionName, EventId, GeofenceId, UserId};

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is worth redelivering and, if so, after what delay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may succeed if repeated.
    Retryable {
        /// Minimum back-off before the next attempt. `None` leaves the delay
        /// to the trigger runtime.
        after: Option<Duration>,
    },
    /// Repeating the operation will fail the same way.
    NonRetryable,
}

// ---------------------------------------------------------------------------
// Collaborator errors
// ---------------------------------------------------------------------------

/// A reference-data read failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("document '{id}' not found in '{collection}'")]
    NotFound {
        collection: CollectionName,
        id: String,
    },

    /// The document exists but lacks a field the dispatcher requires.
    #[error("document '{id}' in '{collection}' has no string field '{field}'")]
    MissingField {
        collection: CollectionName,
        id: String,
        field: &'static str,
    },

    /// The document was returned but could not be decoded.
    #[error("document '{id}' in '{collection}' could not be decoded: {message}")]
    Malformed {
        collection: CollectionName,
        id: String,
        message: String,
    },

    /// The store could not be reached or answered with an unexpected status.
    #[error("document store unavailable: {message}")]
    Unavailable { message: String },
}

impl LookupError {
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::Unavailable { .. } => RetryPolicy::Retryable { after: None },
            Self::NotFound { .. } | Self::MissingField { .. } | Self::Malformed { .. } => {
                RetryPolicy::NonRetryable
            }
        }
    }
}

/// The push send failed or could not be attempted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeliveryError {
    /// The user record carries no device token to address.
    #[error("user '{user_id}' has no device token")]
    MissingDeviceToken { user_id: UserId },

    /// The push service refused the message (invalid or expired token,
    /// malformed payload, quota).
    #[error("push service rejected the message with HTTP {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The push service could not be reached.
    #[error("push service transport failure: {message}")]
    Transport { message: String },
}

impl DeliveryError {
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::Transport { .. } => RetryPolicy::Retryable { after: None },
            Self::Rejected { status, .. } if *status == 429 || *status >= 500 => {
                RetryPolicy::Retryable { after: None }
            }
            Self::Rejected { .. } | Self::MissingDeviceToken { .. } => RetryPolicy::NonRetryable,
        }
    }
}

/// No bearer token could be obtained for an outbound call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("access token unavailable: {message}")]
pub struct CredentialError {
    pub message: String,
}

// ---------------------------------------------------------------------------
// Dispatch errors
// ---------------------------------------------------------------------------

/// Every way a single dispatch can fail.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// The trigger payload could not be turned into a [`crate::GeofenceEvent`].
    #[error("invalid geofence event{}: {reason}", quoted_id(.event_id))]
    InvalidEvent {
        event_id: Option<EventId>,
        reason: String,
    },

    #[error("user lookup for '{user_id}' failed: {source}")]
    UserLookup {
        user_id: UserId,
        #[source]
        source: LookupError,
    },

    #[error("geofence lookup for '{geofence_id}' failed: {source}")]
    GeofenceLookup {
        geofence_id: GeofenceId,
        #[source]
        source: LookupError,
    },

    #[error("notification delivery failed: {0}")]
    Delivery(#[from] DeliveryError),
}

fn quoted_id(id: &Option<EventId>) -> String {
    id.as_ref().map(|id| format!(" '{id}'")).unwrap_or_default()
}

impl DispatchError {
    /// Returns `true` for failures of the final send step.
    pub fn is_delivery(&self) -> bool {
        matches!(self, Self::Delivery(_))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::InvalidEvent { .. } => RetryPolicy::NonRetryable,
            Self::UserLookup { source, .. } | Self::GeofenceLookup { source, .. } => {
                source.retry_policy()
            }
            Self::Delivery(e) => e.retry_policy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_store_is_retryable() {
        let err = DispatchError::UserLookup {
            user_id: UserId::new("u1").unwrap(),
            source: LookupError::Unavailable {
                message: "connection refused".into(),
            },
        };
        assert_eq!(err.retry_policy(), RetryPolicy::Retryable { after: None });
        assert!(!err.is_delivery());
    }

    #[test]
    fn missing_document_is_not_retryable() {
        let err = DispatchError::GeofenceLookup {
            geofence_id: GeofenceId::new("g9").unwrap(),
            source: LookupError::NotFound {
                collection: CollectionName::new("HeatPoints").unwrap(),
                id: "g9".into(),
            },
        };
        assert_eq!(err.retry_policy(), RetryPolicy::NonRetryable);
        assert_eq!(
            err.to_string(),
            "geofence lookup for 'g9' failed: document 'g9' not found in 'HeatPoints'"
        );
    }

    #[test]
    fn undecodable_document_is_not_retryable() {
        let err = LookupError::Malformed {
            collection: CollectionName::new("users").unwrap(),
            id: "u1".into(),
            message: "expected value at line 1 column 1".into(),
        };
        assert_eq!(err.retry_policy(), RetryPolicy::NonRetryable);
    }

    #[test]
    fn rejected_token_is_a_non_retryable_delivery_failure() {
        let err = DispatchError::from(DeliveryError::Rejected {
            status: 404,
            message: "UNREGISTERED".into(),
        });
        assert!(err.is_delivery());
        assert_eq!(err.retry_policy(), RetryPolicy::NonRetryable);
    }

    #[test]
    fn throttled_delivery_is_retryable() {
        let err = DeliveryError::Rejected {
            status: 429,
            message: "QUOTA_EXCEEDED".into(),
        };
        assert_eq!(err.retry_policy(), RetryPolicy::Retryable { after: None });
    }

    #[test]
    fn invalid_event_mentions_the_event_id_when_known() {
        let err = DispatchError::InvalidEvent {
            event_id: EventId::new("e1"),
            reason: "missing userId".into(),
        };
        assert_eq!(err.to_string(), "invalid geofence event 'e1': missing userId");

        let err = DispatchError::InvalidEvent {
            event_id: None,
            reason: "no document".into(),
        };
        assert_eq!(err.to_string(), "invalid geofence event: no document");
    }
}
