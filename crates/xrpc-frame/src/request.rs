use std::io::{Cursor, ErrorKind, Read, Take, Write};

use bytes::{Buf, Bytes};
use tracing::trace;

use crate::error::{FrameError, Result};
use crate::header::{Header, HEADER_SIZE, PROVIDER_SIZE};

/// A body source whose remaining length is known before it is read.
///
/// Only such sources can be framed: the header must carry the exact body
/// length before the first body byte goes out.
pub trait KnownLength: Read {
    /// Bytes still to be read from this source.
    fn remaining_len(&self) -> u64;
}

impl KnownLength for &[u8] {
    fn remaining_len(&self) -> u64 {
        self.len() as u64
    }
}

impl<T: AsRef<[u8]>> KnownLength for Cursor<T> {
    fn remaining_len(&self) -> u64 {
        let len = self.get_ref().as_ref().len() as u64;
        len.saturating_sub(self.position())
    }
}

impl KnownLength for bytes::buf::Reader<Bytes> {
    fn remaining_len(&self) -> u64 {
        self.get_ref().remaining() as u64
    }
}

/// An outgoing frame: header plus a body source of known length.
#[derive(Debug)]
pub struct Request<B> {
    header: Header,
    body: Take<B>,
}

impl<B: KnownLength> Request<B> {
    /// Frame `body` for sending, stamping `log_id` into the header.
    ///
    /// Fails with [`FrameError::BodyTooLarge`] if the body does not fit the
    /// 32-bit length field.
    pub fn new(body: B, log_id: u32) -> Result<Self> {
        let len = body.remaining_len();
        let body_len = u32::try_from(len).map_err(|_| FrameError::BodyTooLarge {
            size: len,
            max: u64::from(u32::MAX),
        })?;

        Ok(Self {
            header: Header::new(log_id, body_len),
            body: body.take(u64::from(body_len)),
        })
    }
}

impl Request<&'static [u8]> {
    /// A request without a body.
    pub fn empty(log_id: u32) -> Self {
        Self {
            header: Header::new(log_id, 0),
            body: Read::take(&[][..], 0),
        }
    }
}

impl<B: Read> Request<B> {
    pub fn with_id(mut self, id: u16) -> Self {
        self.header.id = id;
        self
    }

    pub fn with_version(mut self, version: u16) -> Self {
        self.header.version = version;
        self
    }

    pub fn with_provider(mut self, provider: [u8; PROVIDER_SIZE]) -> Self {
        self.header.provider = provider;
        self
    }

    pub fn with_reserved(mut self, reserved: u32) -> Self {
        self.header.reserved = reserved;
        self
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Write the header followed by exactly `body_len` body bytes.
    ///
    /// Returns the number of bytes written. Nothing is retried: any I/O
    /// failure aborts the write and leaves the stream unusable.
    pub fn write_to<W: Write>(&mut self, w: &mut W) -> Result<u64> {
        w.write_all(&self.header.encode())?;

        let expected = self.header.body_len;
        let written = copy_body(&mut self.body, w)?;
        if written < u64::from(expected) {
            return Err(FrameError::ShortBody { expected, written });
        }

        trace!(log_id = self.header.log_id, body_len = expected, "request written");
        Ok(HEADER_SIZE as u64 + written)
    }
}

const COPY_CHUNK_SIZE: usize = 8 * 1024;

fn copy_body<R: Read, W: Write>(body: &mut R, w: &mut W) -> Result<u64> {
    let mut chunk = [0u8; COPY_CHUNK_SIZE];
    let mut written = 0u64;
    loop {
        let read = match body.read(&mut chunk) {
            Ok(0) => return Ok(written),
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FrameError::Io(err)),
        };
        w.write_all(&chunk[..read])?;
        written += read as u64;
    }
}
