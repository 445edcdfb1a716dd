//! `tasklaunch transform`: run the launch-request transform locally.
//!
//! Configuration comes from flags, falling back to the same
//! `TASKLAUNCHREQUEST_*` environment variables the processor reads.

use std::io::{BufRead, Write};

use anyhow::{Context, Result, bail};
use clap::Args;

use tasklaunch_common::{IncomingMessage, LaunchRequestBuilder, TransformConfig};

use crate::output::OutputContext;
use crate::output::json::format_rejection;

/// Arguments for `tasklaunch transform`.
#[derive(Args, Debug, Default)]
pub struct TransformArgs {
    /// Payloads to transform; stdin is read line by line when none are given
    pub payloads: Vec<String>,

    /// Artifact URI of the task to launch
    #[arg(long, env = "TASKLAUNCHREQUEST_URI")]
    pub uri: Option<String>,

    /// Application name (a Task-<uuid> name is generated when unset)
    #[arg(long, env = "TASKLAUNCHREQUEST_APPLICATION_NAME")]
    pub application_name: Option<String>,

    /// Space-separated command-line arguments for the task
    #[arg(
        long,
        env = "TASKLAUNCHREQUEST_COMMAND_LINE_ARGUMENTS",
        allow_hyphen_values = true
    )]
    pub command_line_arguments: Option<String>,

    /// Deployment properties as key=value,key="quoted,value"
    #[arg(long, env = "TASKLAUNCHREQUEST_DEPLOYMENT_PROPERTIES")]
    pub deployment_properties: Option<String>,

    /// Environment properties as key=value,key="quoted,value"
    #[arg(long, env = "TASKLAUNCHREQUEST_ENVIRONMENT_PROPERTIES")]
    pub environment_properties: Option<String>,

    #[arg(long, env = "TASKLAUNCHREQUEST_DATA_SOURCE_URL")]
    pub data_source_url: Option<String>,

    #[arg(long, env = "TASKLAUNCHREQUEST_DATA_SOURCE_USER_NAME")]
    pub data_source_user_name: Option<String>,

    #[arg(
        long,
        env = "TASKLAUNCHREQUEST_DATA_SOURCE_PASSWORD",
        hide_env_values = true
    )]
    pub data_source_password: Option<String>,

    #[arg(long, env = "TASKLAUNCHREQUEST_DATA_SOURCE_DRIVER_CLASS_NAME")]
    pub data_source_driver_class_name: Option<String>,

    /// Print the full outgoing envelope (payload + headers) instead of the
    /// bare launch request
    #[arg(long)]
    pub envelope: bool,

    /// Print rejections as JSON objects on stdout, keeping one output line
    /// per input
    #[arg(long)]
    pub inline_errors: bool,
}

impl TransformArgs {
    /// The transform configuration these arguments describe.
    #[must_use]
    pub fn to_config(&self) -> TransformConfig {
        TransformConfig {
            uri: self.uri.clone(),
            application_name: self.application_name.clone(),
            command_line_arguments: self.command_line_arguments.clone(),
            deployment_properties: self.deployment_properties.clone(),
            environment_properties: self.environment_properties.clone(),
            data_source_url: self.data_source_url.clone(),
            data_source_user_name: self.data_source_user_name.clone(),
            data_source_password: self.data_source_password.clone(),
            data_source_driver_class_name: self.data_source_driver_class_name.clone(),
        }
    }
}

/// Counts from one `transform` invocation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransformSummary {
    pub emitted: usize,
    pub rejected: usize,
}

/// Run the transform command against stdin/stdout.
///
/// # Errors
///
/// Returns an error if I/O fails or any message was rejected.
pub fn run(ctx: &OutputContext, args: &TransformArgs) -> Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout().lock();

    let summary = if args.payloads.is_empty() {
        transform_lines(ctx, args, stdin.lock(), &mut stdout)?
    } else {
        let payloads = args.payloads.iter().cloned().map(Ok);
        transform_each(ctx, args, payloads, &mut stdout)?
    };

    if summary.rejected > 0 {
        bail!(
            "{} of {} message(s) rejected",
            summary.rejected,
            summary.emitted + summary.rejected
        );
    }
    ctx.success(&format!("{} launch request(s) emitted", summary.emitted));
    Ok(())
}

/// Transform each input line and write one output line per success.
///
/// Each line is decoded like a channel entry: a JSON envelope or a bare
/// payload.
///
/// # Errors
///
/// Returns an error if reading input or writing output fails.
pub fn transform_lines(
    ctx: &OutputContext,
    args: &TransformArgs,
    input: impl BufRead,
    out: &mut impl Write,
) -> Result<TransformSummary> {
    transform_each(ctx, args, input.lines(), out)
}

fn transform_each(
    ctx: &OutputContext,
    args: &TransformArgs,
    lines: impl Iterator<Item = std::io::Result<String>>,
    out: &mut impl Write,
) -> Result<TransformSummary> {
    let config = args.to_config();
    for problem in config.diagnose() {
        ctx.warn(&format!("configuration problem: {problem}"));
    }
    let builder = LaunchRequestBuilder::new(&config);
    let mut summary = TransformSummary::default();

    for (idx, line) in lines.enumerate() {
        let line = line.context("failed to read input")?;
        let message = IncomingMessage::from_wire(&line);

        match builder.transform(&message) {
            Ok(outgoing) => {
                let rendered = if args.envelope {
                    outgoing.to_wire()?
                } else {
                    outgoing.payload
                };
                writeln!(out, "{rendered}").context("failed to write output")?;
                summary.emitted += 1;
            }
            Err(e) => {
                let line_no = idx + 1;
                if args.inline_errors {
                    writeln!(out, "{}", format_rejection(line_no, &e)?)
                        .context("failed to write output")?;
                } else {
                    ctx.error(&format!("line {line_no}: {e}"));
                }
                summary.rejected += 1;
            }
        }
    }

    Ok(summary)
}
