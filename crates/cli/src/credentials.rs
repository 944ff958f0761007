//! Bearer-token sources for the Firestore and FCM clients.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use geofence::{AccessTokenSource, CredentialError, StaticToken};

use crate::config::Credentials;

/// Reads the token from a file on every call.
///
/// Whatever keeps the file current (a metadata-server sidecar, a cron job
/// running `gcloud auth print-access-token`) rotates the token without the
/// process restarting.
#[derive(Debug, Clone)]
pub struct TokenFile {
    path: PathBuf,
}

impl TokenFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl AccessTokenSource for TokenFile {
    async fn access_token(&self) -> Result<String, CredentialError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| CredentialError {
                message: format!("failed to read {}: {e}", self.path.display()),
            })?;
        let token = raw.trim();
        if token.is_empty() {
            return Err(CredentialError {
                message: format!("{} is empty", self.path.display()),
            });
        }
        Ok(token.to_string())
    }
}

impl Credentials {
    pub fn source(&self) -> Arc<dyn AccessTokenSource> {
        match self {
            Credentials::Static(token) => Arc::new(StaticToken::new(token.clone())),
            Credentials::File(path) => Arc::new(TokenFile::new(path.clone())),
        }
    }
}
