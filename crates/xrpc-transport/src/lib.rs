//! TCP transport for the xrpc backend protocol.
//!
//! Provides the two halves every xrpc exchange needs:
//! - [`connect`] opens a fresh connection to a backend with a dial deadline
//! - [`RpcListener`] binds and accepts connections on the backend side
//!
//! Both hand out an [`RpcStream`], which implements `Read + Write` and
//! enforces absolute read/write deadlines. This is the lowest layer of xrpc;
//! framing and the client build on top of it.

pub mod error;
pub mod stream;
pub mod tcp;

pub use error::{is_timeout, Result, TransportError};
pub use stream::RpcStream;
pub use tcp::{connect, RpcListener};
