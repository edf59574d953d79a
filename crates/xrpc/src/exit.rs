use std::fmt;
use std::io;

use xrpc_client::{ConfigError, RpcError};
use xrpc_frame::FrameError;
use xrpc_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::BrokenPipe => TRANSPORT_ERROR,
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::DialTimeout { .. } => CliError::new(TIMEOUT, format!("{context}: {err}")),
        TransportError::Bind { .. } => CliError::new(FAILURE, format!("{context}: {err}")),
        TransportError::Accept(source) | TransportError::Io(source) => io_error(context, source),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::BodyTooLarge { .. } => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn config_error(context: &str, err: ConfigError) -> CliError {
    CliError::new(USAGE, format!("{context}: {err}"))
}

pub fn rpc_error(context: &str, err: RpcError) -> CliError {
    if err.is_timeout() {
        return CliError::new(TIMEOUT, format!("{context}: {err}"));
    }
    match err {
        RpcError::UnknownService(_) | RpcError::Selector(_) => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        RpcError::Encode(_) | RpcError::Decode(_) | RpcError::Request(_) => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        RpcError::Transport(inner) => transport_error(context, inner),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

/// A well-formed reply that carries a non-zero backend errno.
pub fn backend_error(verb: &str, err_no: i32, err_msg: &str) -> CliError {
    let message = if err_msg.is_empty() {
        format!("{verb} failed: backend process errno: {err_no}")
    } else {
        format!("{verb} failed: backend process errno: {err_no} ({err_msg})")
    };
    CliError::new(FAILURE, message)
}
