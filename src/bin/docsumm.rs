//! CLI binary for docsumm.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `PipelineConfig` and runs either the polling host or a single
//! workflow instance.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docsumm::{default_capabilities, Host, PipelineConfig};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve: watch the input container, summarize every upload
  docsumm run

  # One-shot: summarize a single object already in the input container
  docsumm process report.pdf

  # Nested object names keep their inner path
  docsumm process reports/q3.pdf

  # Faster retries while developing against local stub services
  docsumm --retry-interval-ms 500 --max-attempts 2 run

STORAGE LAYOUT:
  <storage-root>/input/    uploads land here
  <storage-root>/output/   summaries are written here
  <storage-root>/.state/   one history file per workflow instance

ENVIRONMENT VARIABLES:
  DOCSUMM_STORAGE_ROOT            Blob store root directory
  DOCSUMM_ANALYSIS_ENDPOINT       Document-analysis service base URL
  DOCSUMM_ANALYSIS_KEY            Document-analysis subscription key
  DOCSUMM_COMPLETION_ENDPOINT     Text-completion service base URL
  DOCSUMM_COMPLETION_KEY          Text-completion bearer key
  DOCSUMM_COMPLETION_DEPLOYMENT   Model deployment name
  DOCSUMM_INPUT_CONTAINER         Input container name (default: input)
  DOCSUMM_OUTPUT_CONTAINER        Output container name (default: output)

SETUP:
  1. Export the six required variables above.
  2. Serve:      docsumm run
  3. Upload:     cp report.pdf $DOCSUMM_STORAGE_ROOT/input/
"#;

/// Summarize uploaded documents through a durable, replayable pipeline.
#[derive(Parser, Debug)]
#[command(
    name = "docsumm",
    version,
    about = "Durable document-summarization pipeline over external analysis and completion services",
    arg_required_else_help = true,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Blob store root directory.
    #[arg(long, env = "DOCSUMM_STORAGE_ROOT")]
    storage_root: PathBuf,

    /// Document-analysis service base URL.
    #[arg(long, env = "DOCSUMM_ANALYSIS_ENDPOINT")]
    analysis_endpoint: String,

    /// Document-analysis subscription key.
    #[arg(long, env = "DOCSUMM_ANALYSIS_KEY", hide_env_values = true)]
    analysis_key: String,

    /// Text-completion service base URL.
    #[arg(long, env = "DOCSUMM_COMPLETION_ENDPOINT")]
    completion_endpoint: String,

    /// Text-completion bearer key.
    #[arg(long, env = "DOCSUMM_COMPLETION_KEY", hide_env_values = true)]
    completion_key: String,

    /// Model deployment name submitted with every completion request.
    #[arg(long, env = "DOCSUMM_COMPLETION_DEPLOYMENT")]
    completion_deployment: String,

    /// Input container name.
    #[arg(long, env = "DOCSUMM_INPUT_CONTAINER", default_value = "input")]
    input_container: String,

    /// Output container name.
    #[arg(long, env = "DOCSUMM_OUTPUT_CONTAINER", default_value = "output")]
    output_container: String,

    /// Wait between failed activity attempts, in milliseconds.
    #[arg(long, env = "DOCSUMM_RETRY_INTERVAL_MS", default_value_t = 5000)]
    retry_interval_ms: u64,

    /// Activity attempts, including the first.
    #[arg(long, env = "DOCSUMM_MAX_ATTEMPTS", default_value_t = 3)]
    max_attempts: u32,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCSUMM_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCSUMM_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Watch the input container and summarize every upload.
    Run {
        /// Input container listing interval, in seconds.
        #[arg(long, env = "DOCSUMM_POLL_INTERVAL_SECS", default_value_t = 5)]
        poll_interval_secs: u64,

        /// Warmup tick period, in seconds.
        #[arg(long, env = "DOCSUMM_WARMUP_INTERVAL_SECS", default_value_t = 300)]
        warmup_interval_secs: u64,
    },
    /// Run one workflow instance for an object in the input container.
    Process {
        /// Object name within the input container, e.g. `report.pdf`.
        identifier: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli).context("Invalid configuration")?;
    let caps = default_capabilities(&config);
    let host = Host::new(config, caps).context("Host startup validation failed")?;

    match cli.command {
        Command::Run { .. } => {
            host.run().await.context("Host stopped with an error")?;
        }
        Command::Process { ref identifier } => {
            let destination = host
                .process(identifier)
                .await
                .with_context(|| format!("Workflow for '{identifier}' failed"))?;
            println!("{destination}");
        }
    }

    Ok(())
}

/// Map CLI args to `PipelineConfig`.
fn build_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .storage_root(&cli.storage_root)
        .input_container(&cli.input_container)
        .output_container(&cli.output_container)
        .analysis_endpoint(&cli.analysis_endpoint)
        .analysis_key(&cli.analysis_key)
        .completion_endpoint(&cli.completion_endpoint)
        .completion_key(&cli.completion_key)
        .completion_deployment(&cli.completion_deployment)
        .first_retry_interval_ms(cli.retry_interval_ms)
        .max_attempts(cli.max_attempts);

    if let Command::Run {
        poll_interval_secs,
        warmup_interval_secs,
    } = cli.command
    {
        builder = builder
            .poll_interval(Duration::from_secs(poll_interval_secs))
            .warmup_interval(Duration::from_secs(warmup_interval_secs));
    }

    Ok(builder.build()?)
}
