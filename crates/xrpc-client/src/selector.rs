use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

/// Errors from endpoint selection.
#[derive(Debug, thiserror::Error)]
pub enum SelectorError {
    /// An empty endpoint list was handed to the selector.
    #[error("endpoint list is empty")]
    EmptyEndpointList,

    /// The selector holds no endpoints to pick from.
    #[error("no server to pick")]
    NoEndpoints,

    /// An endpoint string did not resolve to a socket address.
    #[error("failed to resolve endpoint {endpoint}: {source}")]
    Resolve {
        endpoint: String,
        source: std::io::Error,
    },
}

/// Hands out the backend address for the next call.
pub trait ServerSelector: Send + Sync {
    fn pick_server(&self) -> Result<SocketAddr, SelectorError>;
}

#[derive(Debug, Default)]
struct Endpoints {
    addrs: Vec<SocketAddr>,
    cursor: usize,
}

/// Cycles through a fixed endpoint list, one step per pick.
///
/// There is no health feedback: a dead endpoint keeps getting its turn.
#[derive(Debug, Default)]
pub struct RoundRobinSelector {
    state: Mutex<Endpoints>,
}

impl RoundRobinSelector {
    /// An empty selector. Every pick fails until endpoints are set.
    pub fn new() -> Self {
        Self::default()
    }

    /// A selector over already resolved addresses.
    pub fn with_endpoints(addrs: Vec<SocketAddr>) -> Result<Self, SelectorError> {
        let selector = Self::new();
        selector.set_endpoints(addrs)?;
        Ok(selector)
    }

    /// Resolve `host:port` strings and replace the endpoint list.
    ///
    /// Each entry contributes its first resolved address.
    pub fn set_servers<S: AsRef<str>>(&self, servers: &[S]) -> Result<(), SelectorError> {
        if servers.is_empty() {
            return Err(SelectorError::EmptyEndpointList);
        }

        let addrs = servers
            .iter()
            .map(|server| resolve(server.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        self.set_endpoints(addrs)
    }

    /// Replace the endpoint list. The cursor is kept and wrapped on the
    /// next pick.
    pub fn set_endpoints(&self, addrs: Vec<SocketAddr>) -> Result<(), SelectorError> {
        if addrs.is_empty() {
            return Err(SelectorError::EmptyEndpointList);
        }
        debug!(endpoints = addrs.len(), "endpoint list replaced");
        self.lock().addrs = addrs;
        Ok(())
    }

    /// The next endpoint in rotation.
    pub fn pick_next(&self) -> Result<SocketAddr, SelectorError> {
        let mut state = self.lock();
        let len = state.addrs.len();
        if len == 0 {
            return Err(SelectorError::NoEndpoints);
        }

        let index = state.cursor % len;
        state.cursor = (index + 1) % len;
        Ok(state.addrs[index])
    }

    /// Snapshot of the configured endpoints.
    pub fn endpoints(&self) -> Vec<SocketAddr> {
        self.lock().addrs.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().addrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // The guarded state is a plain list and an index; a panic elsewhere
    // cannot leave it half-updated, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Endpoints> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ServerSelector for RoundRobinSelector {
    fn pick_server(&self) -> Result<SocketAddr, SelectorError> {
        self.pick_next()
    }
}

fn resolve(endpoint: &str) -> Result<SocketAddr, SelectorError> {
    let mut addrs = endpoint
        .to_socket_addrs()
        .map_err(|source| SelectorError::Resolve {
            endpoint: endpoint.to_string(),
            source,
        })?;
    addrs.next().ok_or_else(|| SelectorError::Resolve {
        endpoint: endpoint.to_string(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses"),
    })
}
