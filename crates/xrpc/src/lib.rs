//! Framed RPC from WebRTC signaling to a media backend cluster.
//!
//! xrpc carries push/pull/stop requests from the signaling relay to the
//! media servers over short-lived TCP connections, one 36-byte-header frame
//! each way.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP dial/listen with absolute I/O deadlines
//! - [`frame`]: Header codec, request builder, response reader
//! - [`client`]: Round-robin selector, client and service registry (behind `client` feature)

/// Re-export transport types.
pub mod transport {
    pub use xrpc_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use xrpc_frame::*;
}

/// Re-export client types (requires `client` feature).
#[cfg(feature = "client")]
pub mod client {
    pub use xrpc_client::*;
}
