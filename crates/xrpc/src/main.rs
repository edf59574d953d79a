mod cmd;
mod exit;
mod logging;
mod output;
mod signaling;

use std::path::PathBuf;

use clap::Parser;

use crate::cmd::{Command, Context};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "xrpc", version, about = "Signaling relay client for the xrpc backend protocol")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    /// Service configuration file (TOML, one [xrpc.NAME] table per service).
    #[arg(long, value_name = "FILE", env = "XRPC_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Service endpoints, NAME=HOST:PORT[,HOST:PORT...]. Repeatable; overrides the file.
    #[arg(long = "service", short = 's', value_name = "SPEC", global = true)]
    services: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let ctx = Context {
        format: cli.format.unwrap_or_else(OutputFormat::default_for_stdout),
        config: cli.config,
        services: cli.services,
    };

    match cmd::run(cli.command, &ctx) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}
