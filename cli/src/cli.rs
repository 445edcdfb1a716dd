//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;
use crate::output::OutputContext;

/// Build, inspect and exchange task launch requests
#[derive(Parser)]
#[command(
    name = "tasklaunch",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Suppress non-error status output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output (also disabled by any `NO_COLOR` value)
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Turn payloads (arguments or stdin lines) into launch requests
    Transform(commands::transform::TransformArgs),

    /// Parse a key=value property string and print it as JSON
    Properties(commands::properties::PropertiesArgs),

    /// Push a message onto the processor's input channel
    Send(commands::send::SendArgs),

    /// Pop a message from the output or error channel
    Receive(commands::receive::ReceiveArgs),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<()> {
        let Cli {
            quiet,
            no_color,
            command,
        } = self;
        let ctx = OutputContext::new(no_color, quiet);
        match command {
            Command::Transform(args) => commands::transform::run(&ctx, &args),
            Command::Properties(args) => commands::properties::run(&args),
            Command::Send(args) => commands::send::run(&ctx, &args).await,
            Command::Receive(args) => commands::receive::run(&ctx, &args).await,
            Command::Version => {
                commands::version::run();
                Ok(())
            }
        }
    }
}
