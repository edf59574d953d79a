use std::io::{BufReader, BufWriter, Write};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};
use xrpc_frame::{FrameConfig, FrameError, KnownLength, Request, Response};
use xrpc_transport::{connect, RpcStream};

use crate::error::{Result, RpcError};
use crate::selector::{RoundRobinSelector, ServerSelector};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(100);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(500);
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_millis(500);

/// Per-client deadlines. `None` falls back to the defaults
/// (100 ms connect, 500 ms read, 500 ms write).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    pub connect_timeout: Option<Duration>,
    pub read_timeout: Option<Duration>,
    pub write_timeout: Option<Duration>,
    /// Largest response body accepted. `None` uses the frame default.
    pub max_body_size: Option<usize>,
}

impl ClientConfig {
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = Some(timeout);
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        effective(self.connect_timeout, DEFAULT_CONNECT_TIMEOUT)
    }

    pub fn read_timeout(&self) -> Duration {
        effective(self.read_timeout, DEFAULT_READ_TIMEOUT)
    }

    pub fn write_timeout(&self) -> Duration {
        effective(self.write_timeout, DEFAULT_WRITE_TIMEOUT)
    }

    fn frame_config(&self) -> FrameConfig {
        let mut config = FrameConfig::default();
        if let Some(max) = self.max_body_size {
            config.max_body_size = max;
        }
        config
    }
}

// Zero means "unset", matching the configuration file semantics.
fn effective(value: Option<Duration>, default: Duration) -> Duration {
    match value {
        Some(timeout) if !timeout.is_zero() => timeout,
        _ => default,
    }
}

/// One logical backend service: a selector plus deadlines.
///
/// `Client` is cheap to share across threads; every call opens and closes
/// its own connection.
#[derive(Clone)]
pub struct Client {
    selector: Arc<dyn ServerSelector>,
    config: ClientConfig,
}

impl Client {
    /// A client over `host:port` endpoints with default deadlines.
    pub fn new<S: AsRef<str>>(servers: &[S]) -> Result<Self> {
        let selector = RoundRobinSelector::new();
        selector.set_servers(servers)?;
        Ok(Self::with_selector(Arc::new(selector), ClientConfig::default()))
    }

    /// A client over an explicit selector.
    pub fn with_selector(selector: Arc<dyn ServerSelector>, config: ClientConfig) -> Self {
        Self { selector, config }
    }

    /// Replace the deadline configuration.
    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Exchange one request/response pair with the next backend.
    ///
    /// Picks an endpoint, dials it under the connect deadline, writes the
    /// request through a buffered writer under the write deadline, reads
    /// and validates the response under the read deadline, and closes the
    /// connection whatever the outcome.
    pub fn call<B: KnownLength>(&self, mut request: Request<B>) -> Result<Response> {
        let addr = self.selector.pick_server()?;
        let log_id = request.header().log_id;
        debug!(%addr, log_id, "calling backend");

        let started = Instant::now();
        let mut stream =
            connect(addr, self.config.connect_timeout()).map_err(RpcError::from_dial)?;

        let result = self.exchange(&mut stream, addr, &mut request);
        stream.close();

        match &result {
            Ok(resp) => debug!(
                %addr,
                log_id,
                body_len = resp.header.body_len,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "backend call complete"
            ),
            Err(err) => warn!(%addr, log_id, error = %err, "backend call failed"),
        }
        result
    }

    fn exchange<B: KnownLength>(
        &self,
        stream: &mut RpcStream,
        addr: SocketAddr,
        request: &mut Request<B>,
    ) -> Result<Response> {
        let frame_config = self.config.frame_config();
        let read_timeout = self.config.read_timeout();
        let write_timeout = self.config.write_timeout();

        stream.set_read_timeout(read_timeout);
        stream.set_write_timeout(write_timeout);

        {
            let mut writer = BufWriter::new(&mut *stream);
            request
                .write_to(&mut writer)
                .and_then(|_| writer.flush().map_err(FrameError::Io))
                .map_err(|err| RpcError::from_write(addr, write_timeout, err))?;
        }

        let mut reader = BufReader::new(&mut *stream);
        Response::read_with_config(&mut reader, &frame_config)
            .map_err(|err| RpcError::from_read(addr, read_timeout, err))
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;

    use xrpc_frame::{read_frame, Header, DEFAULT_MAX_BODY, HEADER_SIZE, MAGIC_NUM};

    use super::*;
    use crate::selector::SelectorError;

    /// Serve `n` connections with `handler`, one thread.
    fn backend<F>(n: usize, handler: F) -> (SocketAddr, JoinHandle<()>)
    where
        F: Fn(std::net::TcpStream) + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = std::thread::spawn(move || {
            for _ in 0..n {
                let (stream, _) = listener.accept().unwrap();
                handler(stream);
            }
        });
        (addr, handle)
    }

    fn echo(mut stream: std::net::TcpStream) {
        let req = read_frame(&mut stream, DEFAULT_MAX_BODY).unwrap();
        Response::reply_to(&req.header, req.body)
            .unwrap()
            .write_to(&mut stream)
            .unwrap();
    }

    fn client_for(addrs: Vec<SocketAddr>, config: ClientConfig) -> Client {
        let selector = RoundRobinSelector::with_endpoints(addrs).unwrap();
        Client::with_selector(Arc::new(selector), config)
    }

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.connect_timeout(), Duration::from_millis(100));
        assert_eq!(config.read_timeout(), Duration::from_millis(500));
        assert_eq!(config.write_timeout(), Duration::from_millis(500));
    }

    #[test]
    fn zero_timeout_means_default() {
        let config = ClientConfig::default()
            .with_connect_timeout(Duration::ZERO)
            .with_read_timeout(Duration::from_millis(900));
        assert_eq!(config.connect_timeout(), DEFAULT_CONNECT_TIMEOUT);
        assert_eq!(config.read_timeout(), Duration::from_millis(900));
    }

    #[test]
    fn echo_roundtrip() {
        let (addr, server) = backend(1, echo);
        let client = client_for(vec![addr], ClientConfig::default());

        let req = Request::new(&b"hello"[..], 42).unwrap().with_id(1).with_version(1);
        let resp = client.call(req).unwrap();

        assert_eq!(resp.header.log_id, 42);
        assert_eq!(resp.header.id, 1);
        assert_eq!(resp.header.magic_num, MAGIC_NUM);
        assert_eq!(resp.body.as_ref(), b"hello");
        server.join().unwrap();
    }

    #[test]
    fn calls_rotate_across_backends() {
        let (a, server_a) = backend(2, |mut stream| {
            let req = read_frame(&mut stream, DEFAULT_MAX_BODY).unwrap();
            Response::reply_to(&req.header, &b"a"[..])
                .unwrap()
                .write_to(&mut stream)
                .unwrap();
        });
        let (b, server_b) = backend(2, |mut stream| {
            let req = read_frame(&mut stream, DEFAULT_MAX_BODY).unwrap();
            Response::reply_to(&req.header, &b"b"[..])
                .unwrap()
                .write_to(&mut stream)
                .unwrap();
        });
        let client = client_for(vec![a, b], ClientConfig::default());

        let bodies: Vec<Vec<u8>> = (0..4)
            .map(|i| client.call(Request::empty(i)).unwrap().body.to_vec())
            .collect();
        assert_eq!(bodies, vec![b"a".to_vec(), b"b".to_vec(), b"a".to_vec(), b"b".to_vec()]);

        server_a.join().unwrap();
        server_b.join().unwrap();
    }

    #[test]
    fn bad_magic_is_protocol_mismatch() {
        let (addr, server) = backend(1, |mut stream| {
            let _ = read_frame(&mut stream, DEFAULT_MAX_BODY).unwrap();
            let header = Header {
                magic_num: 0xdead_beef,
                body_len: 2,
                ..Header::default()
            };
            stream.write_all(&header.encode()).unwrap();
            stream.write_all(b"ok").unwrap();
        });
        let client = client_for(vec![addr], ClientConfig::default());

        let err = client.call(Request::empty(1)).unwrap_err();
        assert!(matches!(
            err,
            RpcError::Frame {
                source: FrameError::ProtocolMismatch { magic: 0xdead_beef },
                ..
            }
        ));
        server.join().unwrap();
    }

    #[test]
    fn truncated_body_is_incomplete() {
        let (addr, server) = backend(1, |mut stream| {
            let _ = read_frame(&mut stream, DEFAULT_MAX_BODY).unwrap();
            stream.write_all(&Header::new(1, 10).encode()).unwrap();
            stream.write_all(b"short").unwrap();
        });
        let client = client_for(vec![addr], ClientConfig::default());

        let err = client.call(Request::empty(1)).unwrap_err();
        assert!(matches!(
            err,
            RpcError::Frame {
                source: FrameError::IncompleteBody {
                    expected: 10,
                    read: 5
                },
                ..
            }
        ));
        server.join().unwrap();
    }

    #[test]
    fn backend_hangs_up_is_incomplete_header() {
        let (addr, server) = backend(1, |mut stream| {
            let mut head = [0u8; HEADER_SIZE];
            stream.read_exact(&mut head).unwrap();
        });
        let client = client_for(vec![addr], ClientConfig::default());

        let err = client.call(Request::empty(1)).unwrap_err();
        server.join().unwrap();
        assert!(matches!(
            err,
            RpcError::Frame {
                source: FrameError::IncompleteHeader { .. },
                ..
            } | RpcError::Read { .. }
        ));
    }

    #[test]
    fn silent_backend_hits_read_timeout() {
        let (tx, rx) = std::sync::mpsc::channel::<()>();
        let (addr, server) = backend(1, move |stream| {
            // Hold the connection open until the client gave up.
            let _ = rx.recv();
            drop(stream);
        });
        let read_timeout = Duration::from_millis(100);
        let client = client_for(
            vec![addr],
            ClientConfig::default().with_read_timeout(read_timeout),
        );

        let start = Instant::now();
        let err = client.call(Request::empty(1)).unwrap_err();
        let elapsed = start.elapsed();
        tx.send(()).unwrap();
        server.join().unwrap();

        assert!(matches!(err, RpcError::ReadTimeout { .. }), "got {err:?}");
        assert!(elapsed >= read_timeout);
        assert!(elapsed < read_timeout + Duration::from_secs(1));
    }

    #[test]
    fn stalled_backend_hits_write_timeout() {
        let (tx, rx) = std::sync::mpsc::channel::<()>();
        let (addr, server) = backend(1, move |stream| {
            // Never read; the socket buffers fill and the writer stalls.
            let _ = rx.recv();
            drop(stream);
        });
        let write_timeout = Duration::from_millis(100);
        let client = client_for(
            vec![addr],
            ClientConfig::default().with_write_timeout(write_timeout),
        );
        let body = std::io::Cursor::new(vec![0u8; 64 * 1024 * 1024]);

        let start = Instant::now();
        let err = client.call(Request::new(body, 1).unwrap()).unwrap_err();
        let elapsed = start.elapsed();
        tx.send(()).unwrap();
        server.join().unwrap();

        assert!(
            matches!(err, RpcError::WriteTimeout { timeout, .. } if timeout == write_timeout),
            "got {err:?}"
        );
        assert!(err.is_timeout());
        assert!(elapsed < write_timeout + Duration::from_millis(500));
    }

    #[test]
    fn refused_connection_is_dial_error() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let client = client_for(vec![addr], ClientConfig::default());

        let err = client.call(Request::empty(1)).unwrap_err();
        assert!(matches!(
            err,
            RpcError::Dial { .. } | RpcError::DialTimeout { .. }
        ));
    }

    #[test]
    fn unreachable_endpoint_bounded_by_connect_timeout() {
        // TEST-NET-1 is never routed; the dial either times out or fails fast.
        let addr = SocketAddr::from(([192, 0, 2, 1], 9));
        let connect_timeout = Duration::from_millis(100);
        let client = client_for(
            vec![addr],
            ClientConfig::default().with_connect_timeout(connect_timeout),
        );

        let start = Instant::now();
        let err = client.call(Request::empty(1)).unwrap_err();
        let elapsed = start.elapsed();

        assert!(matches!(
            err,
            RpcError::DialTimeout { .. } | RpcError::Dial { .. }
        ));
        assert!(elapsed < connect_timeout + Duration::from_millis(500));
    }

    #[test]
    fn empty_selector_fails_before_dialing() {
        let client = Client::with_selector(
            Arc::new(RoundRobinSelector::new()),
            ClientConfig::default(),
        );
        let err = client.call(Request::empty(1)).unwrap_err();
        assert!(matches!(
            err,
            RpcError::Selector(SelectorError::NoEndpoints)
        ));
    }

    #[test]
    fn failed_call_leaves_client_usable() {
        let dead = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let (live, server) = backend(1, echo);
        let client = client_for(vec![dead, live], ClientConfig::default());

        assert!(client.call(Request::empty(1)).is_err());
        let resp = client.call(Request::new(&b"ok"[..], 2).unwrap()).unwrap();
        assert_eq!(resp.body.as_ref(), b"ok");
        server.join().unwrap();
    }

    #[test]
    fn oversized_response_rejected() {
        let (addr, server) = backend(1, |mut stream| {
            let _ = read_frame(&mut stream, DEFAULT_MAX_BODY).unwrap();
            let _ = stream.write_all(&Header::new(1, 64).encode());
        });
        let client = client_for(
            vec![addr],
            ClientConfig {
                max_body_size: Some(16),
                ..ClientConfig::default()
            },
        );

        let err = client.call(Request::empty(1)).unwrap_err();
        assert!(matches!(
            err,
            RpcError::Frame {
                source: FrameError::BodyTooLarge { .. },
                ..
            }
        ));
        server.join().unwrap();
    }

    #[test]
    fn concurrent_calls_share_one_client() {
        let (addr, server) = backend(8, echo);
        let client = client_for(vec![addr], ClientConfig::default());

        let handles: Vec<_> = (0..8u32)
            .map(|i| {
                let client = client.clone();
                std::thread::spawn(move || {
                    let body = format!("msg-{i}").into_bytes();
                    let resp = client
                        .call(Request::new(std::io::Cursor::new(body.clone()), i).unwrap())
                        .unwrap();
                    assert_eq!(resp.header.log_id, i);
                    assert_eq!(resp.body.as_ref(), body.as_slice());
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        server.join().unwrap();
    }
}
