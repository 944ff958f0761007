//! Firestore document-store adapter.
//!
//! Implements the lookup traits defined in the [`geofence`] crate
//! (`UserDirectory`, `GeofenceCatalog`) as point reads against the Firestore
//! REST API, and exposes the typed-value [`Document`] model that trigger
//! payloads share with REST responses.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules. HTTP
//! transport, URL layout, authentication headers, and Firestore value decoding
//! live here; the [`geofence`] crate never sees them.

pub mod client;
pub mod document;
pub mod error;

pub use client::{FirestoreClient, FirestoreConfig};
pub use document::{Document, Value};
pub use error::FirestoreError;
