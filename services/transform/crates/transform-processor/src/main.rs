//! tasklaunch processor entry point.
//!
//! Initialises tracing, loads the transform configuration from
//! `TASKLAUNCHREQUEST_*` and the service configuration from
//! `TASKLAUNCH_PROCESSOR_*` environment variables, connects to Valkey, and
//! turns every message on the input list into a launch request on the
//! output list.

mod channel;
mod processor;

use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::StatusCode;
use serde::Deserialize;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use tasklaunch_common::channels::keys;
use tasklaunch_common::{TransformConfig, validate_channel_key};

use crate::channel::{ChannelKeys, ValkeyChannels};
use crate::processor::Processor;

// ===================================================================
// Configuration
// ===================================================================

/// Service configuration loaded from environment variables via `envy`.
///
/// Each field maps to `TASKLAUNCH_PROCESSOR_<FIELD>`:
///   - `TASKLAUNCH_PROCESSOR_LISTEN_ADDR`       (default `0.0.0.0:8080`)
///   - `TASKLAUNCH_PROCESSOR_VALKEY_URL`        (default `redis://valkey:6379`)
///   - `TASKLAUNCH_PROCESSOR_VALKEY_USER`       (optional ACL user)
///   - `TASKLAUNCH_PROCESSOR_VALKEY_PASS_FILE`  (optional, path to secret)
///   - `TASKLAUNCH_PROCESSOR_INPUT_CHANNEL`     (default `tasklaunch:input`)
///   - `TASKLAUNCH_PROCESSOR_PROCESSING_CHANNEL` (default `tasklaunch:processing`)
///   - `TASKLAUNCH_PROCESSOR_OUTPUT_CHANNEL`    (default `tasklaunch:output`)
///   - `TASKLAUNCH_PROCESSOR_ERROR_CHANNEL`     (default `tasklaunch:errors`)
///   - `TASKLAUNCH_PROCESSOR_POLL_TIMEOUT_SECS` (default `5`)
#[derive(Debug, Deserialize)]
struct Config {
    /// Socket address for the health endpoint.
    #[serde(default = "default_listen_addr")]
    listen_addr: String,

    /// Valkey connection URL (`rediss://` enables TLS).
    #[serde(default = "default_valkey_url")]
    valkey_url: String,

    /// ACL username for Valkey authentication.
    valkey_user: Option<String>,

    /// Path to file containing the ACL password (Docker secret).
    valkey_pass_file: Option<String>,

    #[serde(default = "default_input_channel")]
    input_channel: String,

    /// Holds claimed messages until they are emitted or rejected. Must be
    /// private to one processor instance.
    #[serde(default = "default_processing_channel")]
    processing_channel: String,

    #[serde(default = "default_output_channel")]
    output_channel: String,

    #[serde(default = "default_error_channel")]
    error_channel: String,

    /// Upper bound on a single BLMOVE, and so on shutdown latency.
    #[serde(default = "default_poll_timeout_secs")]
    poll_timeout_secs: u64,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_valkey_url() -> String {
    "redis://valkey:6379".to_string()
}

fn default_input_channel() -> String {
    keys::INPUT.to_string()
}

fn default_processing_channel() -> String {
    keys::PROCESSING.to_string()
}

fn default_output_channel() -> String {
    keys::OUTPUT.to_string()
}

fn default_error_channel() -> String {
    keys::ERRORS.to_string()
}

fn default_poll_timeout_secs() -> u64 {
    5
}

impl Config {
    fn channel_keys(&self) -> Result<ChannelKeys> {
        for (name, key) in [
            ("input", &self.input_channel),
            ("processing", &self.processing_channel),
            ("output", &self.output_channel),
            ("error", &self.error_channel),
        ] {
            validate_channel_key(key)
                .map_err(|e| anyhow::anyhow!("invalid {name} channel '{key}': {e}"))?;
        }
        if self.input_channel == self.output_channel || self.input_channel == self.error_channel {
            anyhow::bail!("input channel must differ from output and error channels");
        }
        if [&self.input_channel, &self.output_channel, &self.error_channel]
            .contains(&&self.processing_channel)
        {
            anyhow::bail!("processing channel must differ from input, output and error channels");
        }
        Ok(ChannelKeys {
            input: self.input_channel.clone(),
            processing: self.processing_channel.clone(),
            output: self.output_channel.clone(),
            errors: self.error_channel.clone(),
        })
    }
}

// ===================================================================
// Health endpoint
// ===================================================================

/// Minimal health-check handler for Docker / load-balancer probes.
async fn health() -> StatusCode {
    StatusCode::OK
}

// ===================================================================
// Entry point
// ===================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialise tracing with RUST_LOG env filter.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("tasklaunch-processor starting");

    // 2. Load configuration.
    let config: Config = envy::prefixed("TASKLAUNCH_PROCESSOR_")
        .from_env()
        .context("failed to load config from TASKLAUNCH_PROCESSOR_* env vars")?;

    let transform: TransformConfig = envy::prefixed(tasklaunch_common::config::ENV_PREFIX)
        .from_env()
        .context("failed to load config from TASKLAUNCHREQUEST_* env vars")?;

    let channel_keys = config.channel_keys()?;

    tracing::info!(
        listen_addr = %config.listen_addr,
        valkey_url = %config.valkey_url,
        uri = transform.uri.as_deref().unwrap_or("<unset>"),
        application_name = transform
            .application_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or("<generated>"),
        datasource = transform.data_source_url.is_some(),
        "configuration loaded",
    );

    // Every message will be rejected with these; say so once up front.
    for problem in transform.diagnose() {
        tracing::warn!(error = %problem, "transform configuration problem");
    }

    // 3. Read password from the secret file, if configured.
    let valkey_pass = match &config.valkey_pass_file {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read password from {path}"))?
                .trim()
                .to_string(),
        ),
        None => None,
    };

    // 4. Connect the channels.
    let channels = ValkeyChannels::connect(
        &config.valkey_url,
        config.valkey_user.as_deref(),
        valkey_pass.as_deref(),
        channel_keys,
        Duration::from_secs(config.poll_timeout_secs.max(1)),
    )
    .await
    .context("failed to initialise Valkey channels")?;

    let requeued = channels
        .requeue_unacked()
        .await
        .context("failed to requeue unacknowledged messages")?;
    if requeued > 0 {
        tracing::warn!(requeued, "requeued messages left unacknowledged by a previous run");
    }

    // 5. Shutdown signal shared by the receive loop and the health server.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown_tx.send_replace(true);
    });

    // 6. Health endpoint.
    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .context("failed to bind TCP listener")?;
    let router = axum::Router::new().route("/health", axum::routing::get(health));
    let mut health_shutdown = shutdown_rx.clone();
    let health_server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = health_shutdown.wait_for(|stop| *stop).await;
            })
            .await
    });
    tracing::info!("health check ready at http://{}/health", config.listen_addr);

    // 7. Receive loop.
    let processor = Processor::new(transform);
    let outcome = processor.run(&channels, &channels, shutdown_rx).await;

    if let Err(e) = channels.close().await {
        tracing::warn!(error = %e, "failed to close Valkey connection");
    }

    let stats = outcome.context("receive loop failed")?;
    health_server
        .await
        .context("health server task panicked")?
        .context("HTTP server error")?;

    tracing::info!(
        received = stats.received,
        emitted = stats.emitted,
        rejected = stats.rejected,
        "tasklaunch-processor shut down",
    );
    Ok(())
}

/// Wait for SIGINT (Ctrl-C) for graceful shutdown.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("received shutdown signal");
}
