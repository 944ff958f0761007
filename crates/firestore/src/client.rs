//! Point reads against the Firestore REST API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use geofence::{
    AccessTokenSource, CollectionName, DeviceToken, GeofenceCatalog, GeofenceId, GeofenceRecord,
    LookupError, UserDirectory, UserId, UserRecord,
};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{Document, FirestoreError};

/// Connection settings for [`FirestoreClient`].
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    /// API root, e.g. `https://firestore.googleapis.com` or an emulator address.
    pub base_url: String,
    pub project_id: String,
    /// Database id; `(default)` for the project's default database.
    pub database: String,
    pub users_collection: CollectionName,
    pub geofences_collection: CollectionName,
    pub request_timeout: Duration,
}

/// Reads user and geofence documents over HTTPS.
///
/// The bearer token is fetched from the [`AccessTokenSource`] on every
/// request.
#[derive(Clone)]
pub struct FirestoreClient {
    http: reqwest::Client,
    base_url: Url,
    config: FirestoreConfig,
    tokens: Arc<dyn AccessTokenSource>,
}

impl std::fmt::Debug for FirestoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirestoreClient")
            .field("base_url", &self.base_url)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Google API error envelope: `{"error": {"code", "message", "status"}}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

impl FirestoreClient {
    pub fn new(
        config: FirestoreConfig,
        tokens: Arc<dyn AccessTokenSource>,
    ) -> Result<Self, FirestoreError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| FirestoreError::InvalidBaseUrl {
            url: config.base_url.clone(),
            message: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(FirestoreError::InvalidBaseUrl {
                url: config.base_url.clone(),
                message: "URL cannot be used as a base".into(),
            });
        }
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url,
            config,
            tokens,
        })
    }

    /// Builds the REST URL of one document. Segments are percent-encoded.
    pub fn document_url(&self, collection: &CollectionName, id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "v1",
                "projects",
                self.config.project_id.as_str(),
                "databases",
                self.config.database.as_str(),
                "documents",
                collection.as_str(),
                id,
            ]);
        }
        url
    }

    /// Fetches a single document.
    #[instrument(skip(self, collection), fields(collection = %collection))]
    pub async fn get_document(
        &self,
        collection: &CollectionName,
        id: &str,
    ) -> Result<Document, FirestoreError> {
        let url = self.document_url(collection, id);
        let token = self.tokens.access_token().await?;
        let response = self.http.get(url).bearer_auth(token).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FirestoreError::NotFound {
                collection: collection.clone(),
                id: id.to_string(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FirestoreError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let body = response.text().await?;
        let document = decode_document(collection, id, &body)?;
        debug!(fields = document.fields.len(), "Document fetched");
        Ok(document)
    }
}

fn decode_document(
    collection: &CollectionName,
    id: &str,
    body: &str,
) -> Result<Document, FirestoreError> {
    serde_json::from_str(body).map_err(|e| FirestoreError::Decode {
        collection: collection.clone(),
        id: id.to_string(),
        message: e.to_string(),
    })
}

/// Extracts `STATUS: message` from a Google API error body, falling back to
/// the raw body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope { error }) if !error.status.is_empty() => {
            format!("{}: {}", error.status, error.message)
        }
        Ok(ErrorEnvelope { error }) => error.message,
        Err(_) => body.trim().to_string(),
    }
}

/// Reads the fields the dispatcher needs out of a user document.
pub fn user_record(document: &Document) -> UserRecord {
    UserRecord {
        device_token: document
            .string_field("deviceToken")
            .and_then(DeviceToken::new),
    }
}

/// Reads the fields the dispatcher needs out of a geofence document.
pub fn geofence_record(
    collection: &CollectionName,
    document: &Document,
) -> Result<GeofenceRecord, LookupError> {
    let description =
        document
            .string_field("description")
            .ok_or_else(|| LookupError::MissingField {
                collection: collection.clone(),
                id: document.id().to_string(),
                field: "description",
            })?;
    Ok(GeofenceRecord {
        description: description.to_string(),
    })
}

#[async_trait]
impl UserDirectory for FirestoreClient {
    async fn get_user(&self, user_id: &UserId) -> Result<UserRecord, LookupError> {
        let document = self
            .get_document(&self.config.users_collection, user_id.as_str())
            .await?;
        Ok(user_record(&document))
    }
}

#[async_trait]
impl GeofenceCatalog for FirestoreClient {
    async fn get_geofence(&self, geofence_id: &GeofenceId) -> Result<GeofenceRecord, LookupError> {
        let collection = &self.config.geofences_collection;
        let document = self.get_document(collection, geofence_id.as_str()).await?;
        geofence_record(collection, &document)
    }
}
