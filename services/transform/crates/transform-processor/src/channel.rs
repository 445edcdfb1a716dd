//! Valkey lists as message channels, via a Fred client.

use std::time::Duration;

use anyhow::{Context, Result};
use fred::prelude::*;
use fred::types::lists::LMoveDirection;

use tasklaunch_common::{BuildError, IncomingMessage, OutgoingMessage};

use crate::processor::{MessageSink, MessageSource};

/// Header stamped on every message this processor pushes.
const TIMESTAMP_HEADER: &str = "timestamp";

/// List keys for the three channels.
#[derive(Debug, Clone)]
pub struct ChannelKeys {
    pub input: String,
    pub processing: String,
    pub output: String,
    pub errors: String,
}

#[derive(Clone)]
pub struct ValkeyChannels {
    client: Client,
    keys: ChannelKeys,
    poll_timeout: Duration,
}

impl ValkeyChannels {
    /// Connect to Valkey and verify connectivity with PING.
    pub async fn connect(
        valkey_url: &str,
        user: Option<&str>,
        password: Option<&str>,
        keys: ChannelKeys,
        poll_timeout: Duration,
    ) -> Result<Self> {
        let mut config = Config::from_url(valkey_url).context("invalid Valkey URL")?;
        config.username = user.map(str::to_string);
        config.password = password.map(str::to_string);

        let client = Builder::from_config(config)
            .with_connection_config(|conn_config| {
                conn_config.connection_timeout = Duration::from_secs(5);
                conn_config.internal_command_timeout = Duration::from_secs(10);
            })
            .set_policy(ReconnectPolicy::new_exponential(0, 100, 5000, 5))
            .build()?;

        client.init().await.context("failed to connect to Valkey")?;

        client
            .ping::<String>(None)
            .await
            .context("Valkey startup PING failed")?;

        tracing::info!(
            input = %keys.input,
            processing = %keys.processing,
            output = %keys.output,
            errors = %keys.errors,
            "Valkey channels ready",
        );

        Ok(Self {
            client,
            keys,
            poll_timeout,
        })
    }

    /// Move entries left in the processing list by an earlier run back to
    /// the head of the input list, keeping their order. Returns how many
    /// were moved.
    pub async fn requeue_unacked(&self) -> Result<usize> {
        let mut moved = 0;
        loop {
            let entry: Option<String> = self
                .client
                .lmove(
                    &self.keys.processing,
                    &self.keys.input,
                    LMoveDirection::Right,
                    LMoveDirection::Left,
                )
                .await
                .with_context(|| {
                    format!("failed to LMOVE from {} to {}", self.keys.processing, self.keys.input)
                })?;
            if entry.is_none() {
                return Ok(moved);
            }
            moved += 1;
        }
    }

    pub async fn close(&self) -> Result<()> {
        self.client.quit().await?;
        Ok(())
    }

    async fn push(&self, key: &str, json: String) -> Result<()> {
        self.client
            .rpush::<(), _, _>(key, json)
            .await
            .with_context(|| format!("failed to RPUSH to {key}"))
    }
}

fn stamp(headers: &mut tasklaunch_common::Headers) {
    headers.insert(
        TIMESTAMP_HEADER.to_string(),
        chrono::Utc::now().timestamp_millis().to_string(),
    );
}

impl MessageSource for ValkeyChannels {
    /// The raw entry as it sits in the processing list.
    type Receipt = String;

    async fn receive(&self) -> Result<Option<(IncomingMessage, String)>> {
        let claimed: Option<String> = self
            .client
            .blmove(
                &self.keys.input,
                &self.keys.processing,
                LMoveDirection::Left,
                LMoveDirection::Right,
                self.poll_timeout.as_secs_f64(),
            )
            .await
            .with_context(|| format!("failed to BLMOVE from {}", self.keys.input))?;

        Ok(claimed.map(|raw| (IncomingMessage::from_wire(&raw), raw)))
    }

    async fn ack(&self, receipt: String) -> Result<()> {
        self.client
            .lrem::<i64, _, _>(&self.keys.processing, 1, receipt)
            .await
            .with_context(|| format!("failed to LREM from {}", self.keys.processing))?;
        Ok(())
    }
}

impl MessageSink for ValkeyChannels {
    async fn emit(&self, message: &OutgoingMessage) -> Result<()> {
        let mut message = message.clone();
        stamp(&mut message.headers);
        let json = message.to_wire()?;
        self.push(&self.keys.output, json).await
    }

    async fn reject(&self, message: &IncomingMessage, error: &BuildError) -> Result<()> {
        let mut dead = message.rejected(error, &self.keys.input);
        stamp(&mut dead.headers);
        let json = dead.to_wire()?;
        self.push(&self.keys.errors, json).await
    }
}
