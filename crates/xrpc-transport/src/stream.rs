use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::{Duration, Instant};


/// A connected xrpc stream; implements `Read` and `Write`.
///
/// Deadlines are absolute: once armed, every blocking read (or write) may
/// only use the time left until the deadline. An operation started after the
/// deadline passed fails immediately with `ErrorKind::TimedOut`.
pub struct RpcStream {
    inner: TcpStream,
    peer: Option<SocketAddr>,
    read_deadline: Option<Instant>,
    write_deadline: Option<Instant>,
}

impl RpcStream {
    pub(crate) fn from_tcp(inner: TcpStream) -> Self {
        let peer = inner.peer_addr().ok();
        Self {
            inner,
            peer,
            read_deadline: None,
            write_deadline: None,
        }
    }

    /// Arm the read deadline. `None` removes it.
    pub fn set_read_deadline(&mut self, deadline: Option<Instant>) {
        self.read_deadline = deadline;
    }

    /// Arm the write deadline. `None` removes it.
    pub fn set_write_deadline(&mut self, deadline: Option<Instant>) {
        self.write_deadline = deadline;
    }

    /// Arm the read deadline at `now + timeout`.
    pub fn set_read_timeout(&mut self, timeout: Duration) {
        self.read_deadline = Some(Instant::now() + timeout);
    }

    /// Arm the write deadline at `now + timeout`.
    pub fn set_write_timeout(&mut self, timeout: Duration) {
        self.write_deadline = Some(Instant::now() + timeout);
    }

    /// Current read deadline.
    pub fn read_deadline(&self) -> Option<Instant> {
        self.read_deadline
    }

    /// Current write deadline.
    pub fn write_deadline(&self) -> Option<Instant> {
        self.write_deadline
    }

    /// Address of the remote end, if known.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Shut down both halves of the connection.
    ///
    /// Errors are ignored: the peer may already have closed its side.
    pub fn close(self) {
        let _ = self.inner.shutdown(Shutdown::Both);
    }
}

/// Socket timeout for an operation bounded by `deadline`.
fn remaining(deadline: Option<Instant>) -> std::io::Result<Option<Duration>> {
    match deadline {
        None => Ok(None),
        Some(deadline) => {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                Err(std::io::Error::new(
                    ErrorKind::TimedOut,
                    "deadline exceeded",
                ))
            } else {
                Ok(Some(left))
            }
        }
    }
}

impl Read for RpcStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let timeout = remaining(self.read_deadline)?;
        self.inner.set_read_timeout(timeout)?;
        self.inner.read(buf)
    }
}

impl Write for RpcStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let timeout = remaining(self.write_deadline)?;
        self.inner.set_write_timeout(timeout)?;
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl std::fmt::Debug for RpcStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcStream")
            .field("peer", &self.peer)
            .field("read_deadline", &self.read_deadline)
            .field("write_deadline", &self.write_deadline)
            .finish()
    }
}
