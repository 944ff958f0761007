//! Newtype domain identifiers.
//!
//! Every key the dispatcher handles is a distinct newtype wrapping a string, so a
//! [`UserId`] can never be passed where a [`GeofenceId`] is expected even though
//! both are opaque document keys in the store.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers — store-assigned keys
// ---------------------------------------------------------------------------

string_id! {
    /// Identifies a document in the `geofence_events` collection.
    ///
    /// Assigned by the store when the upstream location tracker records a
    /// boundary crossing; the last path segment of the document name.
    EventId
}

string_id! {
    /// Primary key of a user record.
    UserId
}

string_id! {
    /// Primary key of a geofence definition record.
    GeofenceId
}

string_id! {
    /// Opaque push-delivery address of one installed application instance.
    DeviceToken
}

string_id! {
    /// Name of a document collection (e.g. `"users"`, `"HeatPoints"`).
    CollectionName
}

// ---------------------------------------------------------------------------
// Identifiers — UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single trigger invocation.
///
/// Generated fresh for every delivered event and attached to the tracing span,
/// so a redelivered event shows up as a second invocation of the same
/// [`EventId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvocationId(Uuid);

impl InvocationId {
    /// Generates a new random invocation identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for InvocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
