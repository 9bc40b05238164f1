#![forbid(unsafe_code)]

mod cmd;
mod config;
mod output;

use std::env;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use provwatch_client::WatchError;
use provwatch_core::ErrorCode;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use output::{CliError, OutputMode, render_error, resolve_output_mode};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "provwatch: live provisioning-state watcher",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Output format (pretty, text, json). Wins over FORMAT and the config
    /// file.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Emit JSON output (alias for --format json).
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "One-shot view of a state snapshot",
        after_help = "EXAMPLES:\n    # Buckets, progress, and errored resources\n    pvw status --snapshot state.json\n\n    # Include the operation description\n    pvw status --snapshot state.json --operation op.json\n\n    # Emit machine-readable output\n    pvw status --snapshot state.json --format json"
    )]
    Status(cmd::status::StatusArgs),

    #[command(
        about = "Replay a recorded operation end to end",
        after_help = "EXAMPLES:\n    # Drive a full watch session over recorded inputs\n    pvw watch --snapshot state.json --operation op.json --events events.jsonl\n\n    # Pin the channel identity\n    pvw watch --snapshot state.json --operation op.json --events events.jsonl \\\n        --project-id 12 --infra-id 34"
    )]
    Watch(cmd::watch::WatchArgs),

    #[command(
        about = "Print the operation description sentence",
        after_help = "EXAMPLES:\n    pvw describe --operation op.json"
    )]
    Describe(cmd::describe::DescribeArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("PVW_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "provwatch=debug,info"
        } else {
            "provwatch=info,warn"
        })
    });

    let format = env::var("PVW_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry.with(fmt::layer().json().with_ansi(false)).init();
        }
        _ => {
            registry.with(fmt::layer().compact()).init();
        }
    }
}

/// Map a command failure to the structured error the output layer renders.
fn to_cli_error(err: &anyhow::Error) -> CliError {
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        return cli_err.clone();
    }
    if let Some(watch_err) = err.downcast_ref::<WatchError>() {
        return CliError::from(watch_err);
    }
    CliError::new(format!("{err:#}"))
}

fn run(cli: Cli, output: OutputMode, config: &config::CliConfig) -> anyhow::Result<()> {
    match cli.command {
        Commands::Status(ref args) => cmd::status::run_status(args, output),
        Commands::Watch(ref args) => cmd::watch::run_watch(args, output, config),
        Commands::Describe(ref args) => cmd::describe::run_describe(args, output),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let config = config::load_config();
    let config_format = config
        .as_ref()
        .ok()
        .and_then(|config| config.format.clone());
    let output = resolve_output_mode(cli.format, cli.json, config_format.as_deref());

    let result = config
        .map_err(|err| {
            let code = ErrorCode::ConfigParseError;
            anyhow::Error::new(CliError {
                message: format!("{err:#}"),
                suggestion: code.hint().map(str::to_string),
                error_code: Some(code.code().to_string()),
            })
        })
        .and_then(|config| run(cli, output, &config));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let cli_error = to_cli_error(&err);
            let _ = render_error(output, &cli_error);
            ExitCode::FAILURE
        }
    }
}
