use std::net::SocketAddr;
use std::time::Duration;

use xrpc_frame::FrameError;
use xrpc_transport::{is_timeout, TransportError};

use crate::selector::SelectorError;

/// Errors surfaced by a backend call. Every variant is a single-attempt
/// failure; the client and selector stay usable afterwards.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// No client is registered under the requested service name.
    #[error("[{0}] service not found")]
    UnknownService(String),

    /// No endpoint could be picked.
    #[error("selector error: {0}")]
    Selector(#[from] SelectorError),

    /// The backend did not accept the connection in time.
    #[error("dial {addr} timed out after {timeout:?}")]
    DialTimeout { addr: SocketAddr, timeout: Duration },

    /// The connection attempt failed.
    #[error("dial {addr} failed: {source}")]
    Dial {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// The request could not be written before the write deadline.
    #[error("write to {addr} timed out after {timeout:?}")]
    WriteTimeout { addr: SocketAddr, timeout: Duration },

    /// Writing the request failed.
    #[error("write to {addr} failed: {source}")]
    Write { addr: SocketAddr, source: FrameError },

    /// The response did not arrive before the read deadline.
    #[error("read from {addr} timed out after {timeout:?}")]
    ReadTimeout { addr: SocketAddr, timeout: Duration },

    /// Reading the response failed at the socket level.
    #[error("read from {addr} failed: {source}")]
    Read {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// The response frame was malformed (short header or body, bad magic).
    #[error("bad response from {addr}: {source}")]
    Frame { addr: SocketAddr, source: FrameError },

    /// The request could not be framed.
    #[error("request framing failed: {0}")]
    Request(FrameError),

    /// The request value could not be serialized.
    #[error("encode request: {0}")]
    Encode(serde_json::Error),

    /// The response body could not be deserialized.
    #[error("decode response: {0}")]
    Decode(serde_json::Error),

    /// Transport error outside of the dial/read/write steps.
    #[error("transport error: {0}")]
    Transport(TransportError),
}

impl RpcError {
    /// True for the deadline-driven variants.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::DialTimeout { .. } | Self::WriteTimeout { .. } | Self::ReadTimeout { .. }
        )
    }

    pub(crate) fn from_dial(err: TransportError) -> Self {
        match err {
            TransportError::DialTimeout { addr, timeout } => Self::DialTimeout { addr, timeout },
            TransportError::Dial { addr, source } => Self::Dial { addr, source },
            other => Self::Transport(other),
        }
    }

    pub(crate) fn from_write(addr: SocketAddr, timeout: Duration, err: FrameError) -> Self {
        match err {
            FrameError::Io(io) if is_timeout(&io) => Self::WriteTimeout { addr, timeout },
            other => Self::Write {
                addr,
                source: other,
            },
        }
    }

    pub(crate) fn from_read(addr: SocketAddr, timeout: Duration, err: FrameError) -> Self {
        match err {
            FrameError::Io(io) if is_timeout(&io) => Self::ReadTimeout { addr, timeout },
            FrameError::Io(source) => Self::Read { addr, source },
            other => Self::Frame {
                addr,
                source: other,
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, RpcError>;
