//! The trigger entry point and its propagation policy.
//!
//! [`geofence::NotificationDispatcher::dispatch`] reports every failure the same
//! way. This module decides what the trigger runtime sees:
//!
//! | Dispatch result | Logged | Reported to the runtime |
//! |-----------------|--------|-------------------------|
//! | receipt | success (by the dispatcher) | [`Acknowledgement::Delivered`] |
//! | delivery failure | error | [`Acknowledgement::DeliveryFailed`] (swallowed) |
//! | lookup failure / invalid event | error | `Err`, so the runtime may redeliver |

use geofence::{
    DeliveryError, DispatchError, DispatchReceipt, InvocationId, NotificationDispatcher,
    UnknownEventPolicy,
};
use serde::Serialize;
use tracing::{error, info_span, Instrument};

use crate::DocumentCreated;

/// Outcome of an invocation that completed without a runtime-visible failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Acknowledgement {
    Delivered {
        message_id: String,
    },
    /// The send failed; the failure was logged and not propagated.
    DeliveryFailed {
        reason: String,
    },
}

impl Acknowledgement {
    fn delivered(receipt: DispatchReceipt) -> Self {
        Self::Delivered {
            message_id: receipt.message_id,
        }
    }

    fn delivery_failed(err: &DeliveryError) -> Self {
        Self::DeliveryFailed {
            reason: err.to_string(),
        }
    }
}

/// Runs one dispatch per delivered trigger payload.
#[derive(Clone)]
pub struct TriggerHandler {
    dispatcher: NotificationDispatcher,
    policy: UnknownEventPolicy,
}

impl TriggerHandler {
    pub fn new(dispatcher: NotificationDispatcher, policy: UnknownEventPolicy) -> Self {
        Self { dispatcher, policy }
    }

    /// Handles one document-created delivery.
    pub async fn handle(
        &self,
        created: &DocumentCreated,
    ) -> Result<Acknowledgement, DispatchError> {
        let invocation_id = InvocationId::new_random();
        let span = info_span!(
            "geofence_trigger",
            invocation_id = %invocation_id,
            document = %created.value.name,
        );
        async move {
            let result = match created.decode(self.policy) {
                Ok(event) => self.dispatcher.dispatch(&event).await,
                Err(err) => Err(err),
            };
            settle(result)
        }
        .instrument(span)
        .await
    }
}

/// Applies the propagation policy to a dispatch result.
fn settle(
    result: Result<DispatchReceipt, DispatchError>,
) -> Result<Acknowledgement, DispatchError> {
    match result {
        Ok(receipt) => Ok(Acknowledgement::delivered(receipt)),
        Err(DispatchError::Delivery(err)) => {
            error!(
                error = %err,
                retry = ?err.retry_policy(),
                "Error sending notification"
            );
            Ok(Acknowledgement::delivery_failed(&err))
        }
        Err(err) => {
            error!(
                error = %err,
                retry = ?err.retry_policy(),
                "Geofence event could not be dispatched"
            );
            Err(err)
        }
    }
}
