use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use xrpc_client::{ServiceRegistry, XrpcConfig};

use crate::exit::{config_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;
use crate::signaling::XRTC_SERVICE;

pub mod call;
pub mod echo;
pub mod pull;
pub mod push;
pub mod services;
pub mod stop_pull;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send one raw request to a service and print the response.
    Call(CallArgs),
    /// Publish a stream: send the offer SDP, print the backend answer.
    Push(PushArgs),
    /// Subscribe to a stream: send the offer SDP, print the backend answer.
    Pull(PullArgs),
    /// Stop a subscription.
    StopPull(StopPullArgs),
    /// Run a mock backend that answers every request.
    Echo(EchoArgs),
    /// List configured services.
    Services(ServicesArgs),
    /// Show version information.
    Version(VersionArgs),
}

/// Options shared by every command.
#[derive(Debug)]
pub struct Context {
    pub format: OutputFormat,
    pub config: Option<PathBuf>,
    pub services: Vec<String>,
}

impl Context {
    /// The config file (if any) with `--service` overrides applied.
    pub fn load_config(&self) -> CliResult<XrpcConfig> {
        let mut config = match &self.config {
            Some(path) => XrpcConfig::load(path).map_err(|err| config_error("config", err))?,
            None => XrpcConfig::default(),
        };
        for spec in &self.services {
            config
                .apply_service_spec(spec)
                .map_err(|err| config_error("--service", err))?;
        }
        Ok(config)
    }

    pub fn registry(&self) -> CliResult<ServiceRegistry> {
        let config = self.load_config()?;
        ServiceRegistry::from_config(&config).map_err(|err| config_error("config", err))
    }
}

pub fn run(command: Command, ctx: &Context) -> CliResult<i32> {
    match command {
        Command::Call(args) => call::run(args, ctx),
        Command::Push(args) => push::run(args, ctx),
        Command::Pull(args) => pull::run(args, ctx),
        Command::StopPull(args) => stop_pull::run(args, ctx),
        Command::Echo(args) => echo::run(args),
        Command::Services(args) => services::run(args, ctx),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct CallArgs {
    /// Logical service name.
    pub service: String,
    /// JSON payload.
    #[arg(long, conflicts_with_all = ["data", "file"])]
    pub json: Option<String>,
    /// Raw string payload.
    #[arg(long, conflicts_with_all = ["json", "file"])]
    pub data: Option<String>,
    /// Read payload from file.
    #[arg(long, conflicts_with_all = ["json", "data"])]
    pub file: Option<PathBuf>,
    /// Command id carried in the header.
    #[arg(long, default_value = "0")]
    pub id: u16,
    /// Correlation id. Default: random.
    #[arg(long)]
    pub log_id: Option<u32>,
}

/// Stream identity shared by the signaling verbs.
#[derive(Args, Debug)]
pub struct StreamArgs {
    /// Logical service name.
    #[arg(long, default_value = XRTC_SERVICE)]
    pub target: String,
    /// User id (positive).
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub uid: u64,
    /// Stream name.
    #[arg(long, value_parser = non_empty)]
    pub stream_name: String,
    /// Correlation id. Default: random.
    #[arg(long)]
    pub log_id: Option<u32>,
}

/// Offer SDP and media selection for push/pull.
#[derive(Args, Debug)]
pub struct OfferArgs {
    /// Offer SDP.
    #[arg(long, required_unless_present = "sdp_file", conflicts_with = "sdp_file")]
    pub sdp: Option<String>,
    /// Read the offer SDP from a file.
    #[arg(long)]
    pub sdp_file: Option<PathBuf>,
    /// Include audio.
    #[arg(long)]
    pub audio: bool,
    /// Include video.
    #[arg(long)]
    pub video: bool,
}

impl OfferArgs {
    pub fn resolve_sdp(&self) -> CliResult<String> {
        let sdp = match (&self.sdp, &self.sdp_file) {
            (Some(sdp), _) => sdp.clone(),
            (None, Some(path)) => std::fs::read_to_string(path).map_err(|err| {
                crate::exit::io_error(&format!("failed reading {}", path.display()), err)
            })?,
            (None, None) => String::new(),
        };
        if sdp.trim().is_empty() {
            return Err(CliError::new(USAGE, "sdp is null"));
        }
        Ok(sdp)
    }
}

#[derive(Args, Debug)]
pub struct PushArgs {
    #[command(flatten)]
    pub stream: StreamArgs,
    #[command(flatten)]
    pub offer: OfferArgs,
    /// Disable DTLS on the media path.
    #[arg(long)]
    pub no_dtls: bool,
}

#[derive(Args, Debug)]
pub struct PullArgs {
    #[command(flatten)]
    pub stream: StreamArgs,
    #[command(flatten)]
    pub offer: OfferArgs,
}

#[derive(Args, Debug)]
pub struct StopPullArgs {
    #[command(flatten)]
    pub stream: StreamArgs,
}

#[derive(Args, Debug)]
pub struct EchoArgs {
    /// Address to listen on (e.g. 127.0.0.1:9000).
    pub addr: String,
    /// Answer every request with this JSON instead of echoing the body.
    #[arg(long)]
    pub reply: Option<String>,
    /// Exit after answering N requests.
    #[arg(long)]
    pub count: Option<usize>,
    /// Wait this long before answering (e.g. 200ms, 1s).
    #[arg(long)]
    pub delay: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct ServicesArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

fn non_empty(value: &str) -> Result<String, String> {
    if value.trim().is_empty() {
        Err("must not be empty".to_string())
    } else {
        Ok(value.to_string())
    }
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "ms")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

/// The caller's correlation id, or a fresh one.
pub fn log_id_or_new(log_id: Option<u32>) -> u32 {
    log_id.unwrap_or_else(xrpc_client::new_log_id)
}
