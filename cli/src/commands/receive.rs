//! `tasklaunch receive`: pop one message from the output or error channel.

use anyhow::{Result, bail};
use clap::{Args, ValueEnum};

use tasklaunch_common::channels::keys;
use tasklaunch_common::validate_channel_key;

use super::ValkeyArgs;
use crate::output::OutputContext;
use crate::valkey::ValkeyClient;

/// Which processor channel to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Source {
    /// Emitted launch requests
    Output,
    /// Rejected messages
    Errors,
}

impl Source {
    fn default_key(self) -> &'static str {
        match self {
            Self::Output => keys::OUTPUT,
            Self::Errors => keys::ERRORS,
        }
    }
}

/// Arguments for `tasklaunch receive`.
#[derive(Args, Debug)]
pub struct ReceiveArgs {
    /// Channel to read
    #[arg(long, value_enum, default_value_t = Source::Output)]
    pub from: Source,

    /// Explicit channel key (overrides --from)
    #[arg(long)]
    pub channel: Option<String>,

    /// Seconds to wait for a message (0 waits forever)
    #[arg(long, default_value_t = 5)]
    pub timeout: u64,

    #[command(flatten)]
    pub valkey: ValkeyArgs,
}

impl ReceiveArgs {
    fn channel_key(&self) -> Result<String> {
        let key = self
            .channel
            .clone()
            .unwrap_or_else(|| self.from.default_key().to_string());
        validate_channel_key(&key).map_err(|e| anyhow::anyhow!(e))?;
        Ok(key)
    }
}

/// Run the receive command, printing the raw envelope JSON on stdout.
///
/// # Errors
///
/// Returns an error if Valkey is unreachable or nothing arrives in time.
pub async fn run(ctx: &OutputContext, args: &ReceiveArgs) -> Result<()> {
    let key = args.channel_key()?;
    let client = ValkeyClient::new(&args.valkey.to_config())?;

    #[allow(clippy::cast_precision_loss)]
    let timeout = args.timeout as f64;
    match client.pop(&key, timeout).await? {
        Some(entry) => {
            println!("{entry}");
            Ok(())
        }
        None => {
            ctx.info(&format!("no message on {key}"));
            bail!("timed out after {}s waiting on {key}", args.timeout)
        }
    }
}
