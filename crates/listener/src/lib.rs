//! Trigger surface for geofence event documents.
//!
//! Turns document-created deliveries from the `geofence_events` collection into
//! [`geofence::NotificationDispatcher::dispatch`] calls and decides how each
//! result is reported back to the trigger runtime.
//!
//! - [`DocumentCreated`] — the delivered payload and its decoding into a
//!   [`geofence::GeofenceEvent`].
//! - [`TriggerHandler`] — one invocation per delivery, with the propagation
//!   policy (delivery failures are logged and swallowed; lookup failures are
//!   propagated).
//! - [`server`] — an axum receiver for runtimes that push deliveries over HTTP.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Payload formats and transport live here. The
//! [`geofence`] crate sees only a typed [`geofence::GeofenceEvent`].

pub mod envelope;
pub mod handler;
pub mod server;

pub use envelope::{DocumentCreated, EVENTS_COLLECTION};
pub use handler::{Acknowledgement, TriggerHandler};
