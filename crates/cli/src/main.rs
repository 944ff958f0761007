//! Geofence notifier entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Load configuration** — environment variables, optionally from `.env`.
//!    Access tokens expire after about an hour; `serve` should be given
//!    `GOOGLE_ACCESS_TOKEN_FILE`, which is re-read per request, rather than a
//!    fixed `GOOGLE_ACCESS_TOKEN`.
//! 2. **Wire observability** — `tracing-subscriber` with a JSON or pretty layer,
//!    plus an OpenTelemetry OTLP exporter when one is configured.
//! 3. **Construct infrastructure** — a `FirestoreClient` (user and geofence
//!    lookups) and an `FcmClient` (push sends), injected into the
//!    `NotificationDispatcher`.
//! 4. **Select trigger mode**:
//!    - `serve` — run the HTTP receiver until SIGINT/SIGTERM.
//!    - `dispatch <FILE|->` — handle one document-created payload and exit
//!      non-zero if the failure would have been propagated.

mod config;
mod credentials;
mod telemetry;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use firestore::FirestoreClient;
use geofence::NotificationDispatcher;
use listener::{DocumentCreated, TriggerHandler};
use messaging::FcmClient;
use tokio::io::AsyncReadExt;

use crate::config::{Config, Credentials};

#[derive(Parser)]
#[command(name = "geofence-notifier")]
#[command(version, about = "Sends a push notification for every new geofence event")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Receive document-created deliveries over HTTP
    Serve,
    /// Handle a single document-created payload
    Dispatch {
        /// JSON payload file, or `-` for stdin
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::from_env()?;
    let telemetry = telemetry::init(config.log_format)?;

    let result = run(cli.command, config).await;
    if let Err(e) = &result {
        tracing::error!(error = %format!("{e:#}"), "geofence-notifier exited with an error");
    }

    telemetry.shutdown();
    result
}

async fn run(command: Command, config: Config) -> anyhow::Result<()> {
    let tokens = config.credentials.source();
    let store = Arc::new(FirestoreClient::new(config.firestore(), tokens.clone())?);
    let push = Arc::new(FcmClient::new(config.fcm(), tokens)?);
    let dispatcher = NotificationDispatcher::new(store.clone(), store, push);
    let handler = TriggerHandler::new(dispatcher, config.unknown_event_policy);

    match command {
        Command::Serve => {
            if matches!(config.credentials, Credentials::Static(_)) {
                tracing::warn!(
                    "Serving with a fixed GOOGLE_ACCESS_TOKEN; requests will fail once it expires"
                );
            }
            let tcp = tokio::net::TcpListener::bind(config.listen_addr)
                .await
                .with_context(|| format!("failed to bind {}", config.listen_addr))?;
            tracing::info!(addr = %config.listen_addr, "Listening for geofence events");
            listener::server::serve(tcp, handler, shutdown_signal()).await?;
            tracing::info!("Receiver stopped");
        }
        Command::Dispatch { input } => {
            let raw = read_input(&input).await?;
            let created: DocumentCreated =
                serde_json::from_str(&raw).context("payload is not a document-created event")?;
            let ack = handler.handle(&created).await?;
            println!("{}", serde_json::to_string(&ack)?);
        }
    }
    Ok(())
}

async fn read_input(input: &Path) -> anyhow::Result<String> {
    if input.as_os_str() == "-" {
        let mut raw = String::new();
        tokio::io::stdin().read_to_string(&mut raw).await?;
        Ok(raw)
    } else {
        tokio::fs::read_to_string(input)
            .await
            .with_context(|| format!("failed to read {}", input.display()))
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
