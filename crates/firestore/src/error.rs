//! Firestore adapter errors and their mapping into [`geofence::LookupError`].

use geofence::{CollectionName, CredentialError, LookupError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FirestoreError {
    #[error("invalid Firestore base URL '{url}': {message}")]
    InvalidBaseUrl { url: String, message: String },

    #[error("document '{id}' not found in '{collection}'")]
    NotFound {
        collection: CollectionName,
        id: String,
    },

    /// The REST API answered with a non-success status other than 404.
    #[error("Firestore returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The document body arrived but is not a Firestore document.
    #[error("document '{id}' in '{collection}' could not be decoded: {message}")]
    Decode {
        collection: CollectionName,
        id: String,
        message: String,
    },

    #[error(transparent)]
    Credentials(#[from] CredentialError),

    /// Network, DNS, or timeout failure.
    #[error("Firestore request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl From<FirestoreError> for LookupError {
    fn from(err: FirestoreError) -> Self {
        match err {
            FirestoreError::NotFound { collection, id } => LookupError::NotFound { collection, id },
            FirestoreError::Decode {
                collection,
                id,
                message,
            } => LookupError::Malformed {
                collection,
                id,
                message,
            },
            other => LookupError::Unavailable {
                message: other.to_string(),
            },
        }
    }
}
