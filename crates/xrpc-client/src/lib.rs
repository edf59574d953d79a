//! Round-robin client for the xrpc backend protocol.
//!
//! This is the layer the signaling actions talk to. A [`ServiceRegistry`]
//! maps logical service names to [`Client`]s; each client picks the next
//! backend from its [`RoundRobinSelector`], dials it, exchanges exactly one
//! request/response pair under fixed deadlines and closes the connection.
//!
//! No pooling, no retries: a failed call is returned to the caller as-is.

pub mod client;
pub mod config;
pub mod error;
pub mod log_id;
pub mod registry;
pub mod selector;

pub use client::{
    Client, ClientConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT, DEFAULT_WRITE_TIMEOUT,
};
pub use config::{parse_endpoints, ConfigError, ServiceConfig, XrpcConfig};
pub use error::{Result, RpcError};
pub use log_id::new_log_id;
pub use registry::ServiceRegistry;
pub use selector::{RoundRobinSelector, SelectorError, ServerSelector};
