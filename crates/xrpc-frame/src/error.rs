/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Fewer than 36 bytes were handed to the header decoder.
    #[error("buffer too short for header ({len} bytes, need 36)")]
    BufferTooShort { len: usize },

    /// The stream ended before a full header arrived.
    #[error("incomplete header ({read} of 36 bytes)")]
    IncompleteHeader { read: usize },

    /// The stream ended before `body_len` body bytes arrived.
    #[error("incomplete body ({read} of {expected} bytes)")]
    IncompleteBody { expected: u32, read: usize },

    /// The header carries the wrong magic number.
    #[error("protocol mismatch: invalid magic num {magic:#x}")]
    ProtocolMismatch { magic: u32 },

    /// The body exceeds what the frame can carry or the configured cap.
    #[error("body too large ({size} bytes, max {max})")]
    BodyTooLarge { size: u64, max: u64 },

    /// The request body source ran dry before `body_len` bytes were written.
    #[error("body source ended early ({written} of {expected} bytes written)")]
    ShortBody { expected: u32, written: u64 },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
