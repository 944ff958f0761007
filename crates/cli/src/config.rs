//! Runtime configuration loaded from environment variables.
//!
//! | Variable | Required | Default |
//! |----------|----------|---------|
//! | `FIREBASE_PROJECT_ID` | yes | — |
//! | `GOOGLE_ACCESS_TOKEN` | one of the two | — |
//! | `GOOGLE_ACCESS_TOKEN_FILE` | one of the two | — |
//! | `FIRESTORE_DATABASE` | no | `(default)` |
//! | `FIRESTORE_BASE_URL` | no | `https://firestore.googleapis.com` |
//! | `FCM_BASE_URL` | no | `https://fcm.googleapis.com` |
//! | `USERS_COLLECTION` | no | `users` |
//! | `GEOFENCES_COLLECTION` | no | `HeatPoints` |
//! | `UNKNOWN_EVENT_POLICY` | no | `treat-as-exit` |
//! | `REQUEST_TIMEOUT_SECS` | no | `30` |
//! | `LISTEN_ADDR` | no | `0.0.0.0:8080` |
//! | `LOG_FORMAT` | no | `json` |
//!
//! Google OAuth 2.0 access tokens expire after about an hour.
//! `GOOGLE_ACCESS_TOKEN` is read once at startup, so it only suits single
//! `dispatch` runs and emulators. A long-running `serve` should point
//! `GOOGLE_ACCESS_TOKEN_FILE` at a file that an external minter (a metadata
//! server sidecar, `gcloud auth print-access-token` on a timer) keeps fresh.
//! The file is re-read on every outbound request. When both are set the file
//! wins.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use firestore::FirestoreConfig;
use geofence::{CollectionName, UnknownEventPolicy};
use messaging::FcmConfig;
use thiserror::Error;

const CREDENTIAL_VARS: &str = "GOOGLE_ACCESS_TOKEN or GOOGLE_ACCESS_TOKEN_FILE";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{var} is invalid: {message}")]
    Invalid { var: &'static str, message: String },
}

/// Where outbound requests get their bearer token from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Fixed for the lifetime of the process.
    Static(String),
    /// Re-read on every request.
    File(PathBuf),
}

/// Output format of the log layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub project_id: String,
    pub credentials: Credentials,
    pub firestore_database: String,
    pub firestore_base_url: String,
    pub fcm_base_url: String,
    pub users_collection: CollectionName,
    pub geofences_collection: CollectionName,
    pub unknown_event_policy: UnknownEventPolicy,
    pub request_timeout: Duration,
    pub listen_addr: SocketAddr,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &'static str| lookup(var).filter(|v| !v.trim().is_empty());
        let required = |var: &'static str| get(var).ok_or(ConfigError::Missing(var));
        let or_default =
            |var: &'static str, default: &str| get(var).unwrap_or_else(|| default.to_string());
        let collection = |var: &'static str, default: &str| {
            CollectionName::new(or_default(var, default)).ok_or(ConfigError::Invalid {
                var,
                message: "collection name must not be empty".into(),
            })
        };

        let project_id = required("FIREBASE_PROJECT_ID")?;
        let credentials = match (get("GOOGLE_ACCESS_TOKEN_FILE"), get("GOOGLE_ACCESS_TOKEN")) {
            (Some(path), _) => Credentials::File(PathBuf::from(path)),
            (None, Some(token)) => Credentials::Static(token),
            (None, None) => return Err(ConfigError::Missing(CREDENTIAL_VARS)),
        };

        let unknown_event_policy = match get("UNKNOWN_EVENT_POLICY") {
            Some(raw) => raw
                .parse::<UnknownEventPolicy>()
                .map_err(|message| ConfigError::Invalid {
                    var: "UNKNOWN_EVENT_POLICY",
                    message,
                })?,
            None => UnknownEventPolicy::default(),
        };

        let timeout_secs: u64 = or_default("REQUEST_TIMEOUT_SECS", "30")
            .parse()
            .map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                var: "REQUEST_TIMEOUT_SECS",
                message: e.to_string(),
            })?;

        let listen_addr: SocketAddr = or_default("LISTEN_ADDR", "0.0.0.0:8080")
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                var: "LISTEN_ADDR",
                message: e.to_string(),
            })?;

        let log_format = match or_default("LOG_FORMAT", "json").as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            other => {
                return Err(ConfigError::Invalid {
                    var: "LOG_FORMAT",
                    message: format!("expected 'json' or 'pretty', got '{other}'"),
                })
            }
        };

        Ok(Self {
            project_id,
            credentials,
            firestore_database: or_default("FIRESTORE_DATABASE", "(default)"),
            firestore_base_url: or_default(
                "FIRESTORE_BASE_URL",
                "https://firestore.googleapis.com",
            ),
            fcm_base_url: or_default("FCM_BASE_URL", "https://fcm.googleapis.com"),
            users_collection: collection("USERS_COLLECTION", "users")?,
            geofences_collection: collection("GEOFENCES_COLLECTION", "HeatPoints")?,
            unknown_event_policy,
            request_timeout: Duration::from_secs(timeout_secs),
            listen_addr,
            log_format,
        })
    }

    pub fn firestore(&self) -> FirestoreConfig {
        FirestoreConfig {
            base_url: self.firestore_base_url.clone(),
            project_id: self.project_id.clone(),
            database: self.firestore_database.clone(),
            users_collection: self.users_collection.clone(),
            geofences_collection: self.geofences_collection.clone(),
            request_timeout: self.request_timeout,
        }
    }

    pub fn fcm(&self) -> FcmConfig {
        FcmConfig {
            base_url: self.fcm_base_url.clone(),
            project_id: self.project_id.clone(),
            request_timeout: self.request_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|var| vars.get(var).cloned())
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("FIREBASE_PROJECT_ID", "demo"),
        ("GOOGLE_ACCESS_TOKEN", "ya29.token"),
    ];

    #[test]
    fn defaults_apply_when_only_required_vars_are_set() {
        let config = load(&REQUIRED).unwrap();

        assert_eq!(config.project_id, "demo");
        assert_eq!(config.firestore_database, "(default)");
        assert_eq!(config.users_collection.as_str(), "users");
        assert_eq!(config.geofences_collection.as_str(), "HeatPoints");
        assert_eq!(config.unknown_event_policy, UnknownEventPolicy::TreatAsExit);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.listen_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn missing_project_is_reported() {
        let err = load(&[("GOOGLE_ACCESS_TOKEN", "t")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing("FIREBASE_PROJECT_ID"));
    }

    #[test]
    fn blank_token_counts_as_missing() {
        let err = load(&[
            ("FIREBASE_PROJECT_ID", "demo"),
            ("GOOGLE_ACCESS_TOKEN", "  "),
        ])
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing(CREDENTIAL_VARS));
    }

    #[test]
    fn static_token_is_used_when_no_file_is_configured() {
        let config = load(&REQUIRED).unwrap();
        assert_eq!(config.credentials, Credentials::Static("ya29.token".into()));
    }

    #[test]
    fn token_file_takes_precedence_over_static_token() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("GOOGLE_ACCESS_TOKEN_FILE", "/var/run/secrets/token"));
        let config = load(&vars).unwrap();
        assert_eq!(
            config.credentials,
            Credentials::File(PathBuf::from("/var/run/secrets/token"))
        );

        let config = load(&[
            ("FIREBASE_PROJECT_ID", "demo"),
            ("GOOGLE_ACCESS_TOKEN_FILE", "/var/run/secrets/token"),
        ])
        .unwrap();
        assert!(matches!(config.credentials, Credentials::File(_)));
    }

    #[test]
    fn overrides_are_honoured() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("FIRESTORE_BASE_URL", "http://localhost:8081"),
            ("GEOFENCES_COLLECTION", "geofences"),
            ("UNKNOWN_EVENT_POLICY", "reject"),
            ("REQUEST_TIMEOUT_SECS", "5"),
            ("LOG_FORMAT", "pretty"),
        ]);
        let config = load(&vars).unwrap();

        assert_eq!(config.firestore().base_url, "http://localhost:8081");
        assert_eq!(config.firestore().geofences_collection.as_str(), "geofences");
        assert_eq!(config.unknown_event_policy, UnknownEventPolicy::Reject);
        assert_eq!(config.fcm().request_timeout, Duration::from_secs(5));
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("REQUEST_TIMEOUT_SECS", "soon"));
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::Invalid { var: "REQUEST_TIMEOUT_SECS", .. }
        ));

        let mut vars = REQUIRED.to_vec();
        vars.push(("UNKNOWN_EVENT_POLICY", "ignore"));
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::Invalid { var: "UNKNOWN_EVENT_POLICY", .. }
        ));
    }
}
