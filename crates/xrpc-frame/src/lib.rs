//! Fixed-header framing for the xrpc backend protocol.
//!
//! Every frame on the wire is a 36-byte little-endian [`Header`] followed by
//! exactly `body_len` opaque body bytes. Requests stream their body from a
//! source of known length; responses are read fully into memory.
//!
//! The body is never inspected here.

pub mod error;
pub mod header;
pub mod request;
pub mod response;

pub use error::{FrameError, Result};
pub use header::{FrameConfig, Header, DEFAULT_MAX_BODY, HEADER_SIZE, MAGIC_NUM, PROVIDER_SIZE};
pub use request::{KnownLength, Request};
pub use response::{read_frame, Response};
