//! Core domain for the geofence notifier.
//!
//! This crate turns one stored geofence event into one push notification. It
//! defines the records it reads, the payload it composes, the collaborator
//! traits it calls through, and the error taxonomy it reports. Infrastructure
//! crates implement the traits defined here; they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`EventId`, `UserId`, `GeofenceId`, etc.) |
//! | [`types`] | Records, `EventKind`, and `NotificationPayload` composition |
//! | [`errors`] | `LookupError`, `DeliveryError`, `DispatchError`, `RetryPolicy`, etc. |
//! | [`ports`] | `UserDirectory`, `GeofenceCatalog`, `PushSender`, `AccessTokenSource` |
//! | [`dispatcher`] | `NotificationDispatcher` |

pub mod dispatcher;
pub mod errors;
pub mod identifiers;
pub mod ports;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use dispatcher::NotificationDispatcher;
pub use errors::{CredentialError, DeliveryError, DispatchError, LookupError, RetryPolicy};
pub use identifiers::{CollectionName, DeviceToken, EventId, GeofenceId, InvocationId, UserId};
pub use ports::{AccessTokenSource, GeofenceCatalog, PushSender, StaticToken, UserDirectory};
pub use types::{
    DispatchReceipt, EventKind, GeofenceEvent, GeofenceRecord, NotificationPayload,
    UnknownEventPolicy, UserRecord,
};
