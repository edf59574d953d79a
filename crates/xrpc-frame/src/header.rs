use bytes::{Buf, BufMut, BytesMut};

use crate::error::{FrameError, Result};

/// Header size on the wire.
pub const HEADER_SIZE: usize = 36;

/// Width of the opaque provider tag.
pub const PROVIDER_SIZE: usize = 16;

/// Magic number carried by every well-formed frame.
pub const MAGIC_NUM: u32 = 0xfb20_2212;

/// Default maximum body size accepted by readers: 16 MiB.
pub const DEFAULT_MAX_BODY: usize = 16 * 1024 * 1024;

/// Frame header shared by requests and responses.
///
/// Wire format (all integers little-endian):
/// ```text
/// ┌────────┬─────────┬───────┬───────────┬──────────┬──────────┬─────────┐
/// │ Id     │ Version │ LogId │ Provider  │ MagicNum │ Reserved │ BodyLen │
/// │ (2B)   │ (2B)    │ (4B)  │ (16B)     │ (4B)     │ (4B)     │ (4B)    │
/// └────────┴─────────┴───────┴───────────┴──────────┴──────────┴─────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Header {
    /// Command identifier, assigned by the caller.
    pub id: u16,
    /// Protocol version. Carried, never validated.
    pub version: u16,
    /// Correlation id propagated from the originating request.
    pub log_id: u32,
    /// Opaque routing/identity tag, zero-filled if unused.
    pub provider: [u8; PROVIDER_SIZE],
    /// Must equal [`MAGIC_NUM`]; checked by readers, not the codec.
    pub magic_num: u32,
    /// Carried unchanged.
    pub reserved: u32,
    /// Exact number of body bytes following the header.
    pub body_len: u32,
}

impl Header {
    /// A header with the protocol magic set and everything else zeroed.
    pub fn new(log_id: u32, body_len: u32) -> Self {
        Self {
            log_id,
            magic_num: MAGIC_NUM,
            body_len,
            ..Self::default()
        }
    }

    /// Encode into a fixed 36-byte buffer.
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        let mut dst = &mut buf[..];
        dst.put_u16_le(self.id);
        dst.put_u16_le(self.version);
        dst.put_u32_le(self.log_id);
        dst.put_slice(&self.provider);
        dst.put_u32_le(self.magic_num);
        dst.put_u32_le(self.reserved);
        dst.put_u32_le(self.body_len);
        buf
    }

    /// Append the encoded header to `dst`.
    pub fn encode_into(&self, dst: &mut BytesMut) {
        dst.reserve(HEADER_SIZE);
        dst.put_slice(&self.encode());
    }

    /// Decode a header from the first 36 bytes of `buf`.
    ///
    /// No validation is performed; see [`Header::has_valid_magic`].
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(FrameError::BufferTooShort { len: buf.len() });
        }

        let mut src = &buf[..HEADER_SIZE];
        let id = src.get_u16_le();
        let version = src.get_u16_le();
        let log_id = src.get_u32_le();
        let mut provider = [0u8; PROVIDER_SIZE];
        src.copy_to_slice(&mut provider);
        let magic_num = src.get_u32_le();
        let reserved = src.get_u32_le();
        let body_len = src.get_u32_le();

        Ok(Self {
            id,
            version,
            log_id,
            provider,
            magic_num,
            reserved,
            body_len,
        })
    }

    pub fn has_valid_magic(&self) -> bool {
        self.magic_num == MAGIC_NUM
    }

    /// The total wire size of the frame this header describes.
    pub fn frame_size(&self) -> usize {
        HEADER_SIZE + self.body_len as usize
    }
}

/// Configuration for frame readers.
///
/// Deadlines belong to the stream, not the codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum body size in bytes accepted on read. Default: 16 MiB.
    pub max_body_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_body_size: DEFAULT_MAX_BODY,
        }
    }
}
