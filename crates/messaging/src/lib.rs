//! Push-delivery adapter.
//!
//! Implements the [`geofence::PushSender`] trait for Firebase Cloud Messaging.
//! Other providers are added as new `impl` blocks in this crate without any
//! changes to the `geofence` crate.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport, request formatting, bearer
//! authentication, and provider error decoding live here. The [`geofence`]
//! crate sees only [`geofence::PushSender`] and [`geofence::DeliveryError`].

pub mod fcm;

pub use fcm::{FcmClient, FcmConfig, FcmError};
