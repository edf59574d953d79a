use std::io::ErrorKind;
use std::net::SocketAddr;
use std::time::Duration;

/// Errors that can occur in xrpc transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to bind to the specified address.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    /// The connection could not be established before the dial deadline.
    #[error("dial {addr} timed out after {timeout:?}")]
    DialTimeout { addr: SocketAddr, timeout: Duration },

    /// Failed to connect to the specified address.
    #[error("failed to dial {addr}: {source}")]
    Dial {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// Failed to accept an incoming connection.
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// Returns true if the I/O error was produced by an expired socket timeout.
///
/// Unix sockets report an elapsed `SO_RCVTIMEO`/`SO_SNDTIMEO` as `WouldBlock`,
/// Windows as `TimedOut`.
pub fn is_timeout(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock)
}
