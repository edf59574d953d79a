use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{is_timeout, Result, TransportError};
use crate::stream::RpcStream;

/// Open a new connection to `addr`, giving up after `timeout`.
///
/// Every call pays the full connection cost; streams are never pooled.
pub fn connect(addr: SocketAddr, timeout: Duration) -> Result<RpcStream> {
    let stream = TcpStream::connect_timeout(&addr, timeout)
        .map_err(|source| dial_error(addr, timeout, source))?;
    debug!(%addr, "connected to backend");
    Ok(RpcStream::from_tcp(stream))
}

fn dial_error(addr: SocketAddr, timeout: Duration, source: std::io::Error) -> TransportError {
    if is_timeout(&source) {
        TransportError::DialTimeout { addr, timeout }
    } else {
        TransportError::Dial { addr, source }
    }
}

/// TCP listener for the backend side of an xrpc exchange.
pub struct RpcListener {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl RpcListener {
    /// Bind and listen on `addr` (e.g. `"127.0.0.1:9000"`, port 0 for any).
    pub fn bind(addr: impl ToSocketAddrs + std::fmt::Display) -> Result<Self> {
        let display = addr.to_string();
        let listener = TcpListener::bind(&addr).map_err(|source| TransportError::Bind {
            addr: display.clone(),
            source,
        })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| TransportError::Bind {
                addr: display,
                source,
            })?;

        info!(%local_addr, "listening for xrpc connections");

        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<RpcStream> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(%peer, "accepted connection");
        Ok(RpcStream::from_tcp(stream))
    }

    /// The address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}
