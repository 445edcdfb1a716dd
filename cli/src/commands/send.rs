//! `tasklaunch send`: push a message onto the processor's input channel.

use anyhow::{Context, Result};
use clap::Args;

use tasklaunch_common::channels::keys;
use tasklaunch_common::{IncomingMessage, parse_properties, validate_channel_key};

use super::ValkeyArgs;
use crate::output::OutputContext;
use crate::valkey::ValkeyClient;

/// Arguments for `tasklaunch send`.
#[derive(Args, Debug)]
pub struct SendArgs {
    /// Message payload (may be empty)
    #[arg(default_value = "", allow_hyphen_values = true)]
    pub payload: String,

    /// Message headers as key=value,key=value
    #[arg(long)]
    pub headers: Option<String>,

    /// Input channel key
    #[arg(long, default_value = keys::INPUT)]
    pub channel: String,

    #[command(flatten)]
    pub valkey: ValkeyArgs,
}

/// Build the envelope described by the arguments.
///
/// # Errors
///
/// Returns an error if the channel key or header string is invalid.
pub fn envelope(args: &SendArgs) -> Result<IncomingMessage> {
    validate_channel_key(&args.channel).map_err(|e| anyhow::anyhow!(e))?;
    let headers = match &args.headers {
        Some(raw) => parse_properties(raw).context("invalid --headers")?,
        None => Default::default(),
    };
    Ok(IncomingMessage {
        payload: args.payload.clone(),
        headers,
    })
}

/// Run the send command.
///
/// # Errors
///
/// Returns an error if the arguments are invalid or Valkey is unreachable.
pub async fn run(ctx: &OutputContext, args: &SendArgs) -> Result<()> {
    let message = envelope(args)?;
    let client = ValkeyClient::new(&args.valkey.to_config())?;
    let depth = client.push(&args.channel, &message.to_wire()?).await?;
    ctx.success(&format!("sent to {} (queue depth {depth})", args.channel));
    Ok(())
}
