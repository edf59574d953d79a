use std::io::{ErrorKind, Read, Write};

use bytes::Bytes;
use tracing::{debug, trace};

use crate::error::{FrameError, Result};
use crate::header::{FrameConfig, Header, DEFAULT_MAX_BODY, HEADER_SIZE, MAGIC_NUM};

/// A fully buffered incoming frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub header: Header,
    pub body: Bytes,
}

impl Response {
    /// Build a response frame around `body`.
    ///
    /// The header's magic number and body length are set from the body;
    /// the other fields are taken from `header` as given.
    pub fn new(header: Header, body: impl Into<Bytes>) -> Result<Self> {
        let body = body.into();
        let body_len = u32::try_from(body.len()).map_err(|_| FrameError::BodyTooLarge {
            size: body.len() as u64,
            max: u64::from(u32::MAX),
        })?;
        Ok(Self {
            header: Header {
                magic_num: MAGIC_NUM,
                body_len,
                ..header
            },
            body,
        })
    }

    /// Build the reply to a request, echoing its id, version, log id and
    /// provider.
    pub fn reply_to(request: &Header, body: impl Into<Bytes>) -> Result<Self> {
        Self::new(
            Header {
                reserved: 0,
                ..*request
            },
            body,
        )
    }

    /// Read one response with the default body cap.
    pub fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        read_frame(r, DEFAULT_MAX_BODY)
    }

    /// Read one response using the body cap from `config`.
    pub fn read_with_config<R: Read>(r: &mut R, config: &FrameConfig) -> Result<Self> {
        read_frame(r, config.max_body_size)
    }

    /// Write header and body.
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_all(&self.header.encode())?;
        w.write_all(&self.body)?;
        Ok(())
    }

    /// The total wire size of this frame (header + body).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.body.len()
    }
}

/// Read one complete frame from `r` (blocking).
///
/// Reads exactly 36 header bytes, rejects a bad magic number without
/// touching the body, then reads exactly `body_len` body bytes.
pub fn read_frame<R: Read>(r: &mut R, max_body: usize) -> Result<Response> {
    let mut head = [0u8; HEADER_SIZE];
    let read = read_full(r, &mut head)?;
    if read < HEADER_SIZE {
        return Err(FrameError::IncompleteHeader { read });
    }

    let header = Header::decode(&head)?;
    if !header.has_valid_magic() {
        debug!(magic = header.magic_num, "discarding frame with bad magic");
        return Err(FrameError::ProtocolMismatch {
            magic: header.magic_num,
        });
    }

    let expected = header.body_len;
    if expected as usize > max_body {
        return Err(FrameError::BodyTooLarge {
            size: u64::from(expected),
            max: max_body as u64,
        });
    }

    let mut body = vec![0u8; expected as usize];
    let read = read_full(r, &mut body)?;
    if read < body.len() {
        return Err(FrameError::IncompleteBody { expected, read });
    }

    trace!(log_id = header.log_id, body_len = expected, "frame read");
    Ok(Response {
        header,
        body: Bytes::from(body),
    })
}

/// Fill `buf`, stopping early only at end of stream. Returns bytes read.
fn read_full<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0usize;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::request::Request;

    fn frame(header: Header, body: &[u8]) -> Vec<u8> {
        let mut wire = header.encode().to_vec();
        wire.extend_from_slice(body);
        wire
    }

    #[test]
    fn hello_frame_end_to_end() {
        let header = Header {
            id: 1,
            version: 1,
            log_id: 42,
            magic_num: MAGIC_NUM,
            body_len: 5,
            ..Header::default()
        };
        let wire = frame(header, b"hello");
        assert_eq!(wire.len(), 41);

        let resp = Response::read_from(&mut Cursor::new(wire)).unwrap();
        assert_eq!(resp.header, header);
        assert_eq!(resp.body.as_ref(), b"hello");
    }

    #[test]
    fn request_bytes_read_back() {
        let mut req = Request::new(&b"{\"err_no\":0}"[..], 77).unwrap().with_id(3);
        let mut wire = Vec::new();
        req.write_to(&mut wire).unwrap();

        let resp = Response::read_from(&mut Cursor::new(wire)).unwrap();
        assert_eq!(resp.header, *req.header());
        assert_eq!(resp.body.as_ref(), b"{\"err_no\":0}");
    }

    #[test]
    fn bad_magic_stops_before_body() {
        let header = Header {
            magic_num: 0x1234_5678,
            body_len: 5,
            ..Header::default()
        };
        let mut cursor = Cursor::new(frame(header, b"hello"));

        let err = Response::read_from(&mut cursor).unwrap_err();
        assert!(matches!(
            err,
            FrameError::ProtocolMismatch { magic: 0x1234_5678 }
        ));
        assert_eq!(cursor.position(), HEADER_SIZE as u64);
    }

    #[test]
    fn short_body_is_incomplete() {
        let header = Header::new(1, 10);
        let err = Response::read_from(&mut Cursor::new(frame(header, b"only"))).unwrap_err();
        assert!(matches!(
            err,
            FrameError::IncompleteBody {
                expected: 10,
                read: 4
            }
        ));
    }

    #[test]
    fn exact_body_leaves_trailing_bytes_unread() {
        let header = Header::new(1, 3);
        let mut cursor = Cursor::new(frame(header, b"abcdef"));

        let resp = Response::read_from(&mut cursor).unwrap();
        assert_eq!(resp.body.as_ref(), b"abc");
        assert_eq!(cursor.position(), (HEADER_SIZE + 3) as u64);
    }

    #[test]
    fn empty_stream_is_incomplete_header() {
        let err = Response::read_from(&mut Cursor::new(Vec::<u8>::new())).unwrap_err();
        assert!(matches!(err, FrameError::IncompleteHeader { read: 0 }));
    }

    #[test]
    fn truncated_header() {
        let wire = Header::new(1, 0).encode();
        let err = Response::read_from(&mut Cursor::new(wire[..20].to_vec())).unwrap_err();
        assert!(matches!(err, FrameError::IncompleteHeader { read: 20 }));
    }

    #[test]
    fn zero_length_body() {
        let resp = Response::read_from(&mut Cursor::new(frame(Header::new(5, 0), b""))).unwrap();
        assert!(resp.body.is_empty());
        assert_eq!(resp.wire_size(), HEADER_SIZE);
    }

    #[test]
    fn body_over_cap_rejected_before_allocation() {
        let cfg = FrameConfig { max_body_size: 4 };
        let wire = frame(Header::new(1, 1024), b"");
        let err = Response::read_with_config(&mut Cursor::new(wire), &cfg).unwrap_err();
        assert!(matches!(err, FrameError::BodyTooLarge { size: 1024, max: 4 }));
    }

    #[test]
    fn partial_reads_are_reassembled() {
        let wire = frame(Header::new(8, 4), b"slow");
        let mut reader = ByteByByteReader { bytes: wire, pos: 0 };

        let resp = Response::read_from(&mut reader).unwrap();
        assert_eq!(resp.header.log_id, 8);
        assert_eq!(resp.body.as_ref(), b"slow");
    }

    #[test]
    fn interrupted_read_retries() {
        let wire = frame(Header::new(8, 2), b"ok");
        let mut reader = InterruptedThenData {
            interrupted: false,
            inner: Cursor::new(wire),
        };

        let resp = Response::read_from(&mut reader).unwrap();
        assert_eq!(resp.body.as_ref(), b"ok");
    }

    #[test]
    fn timeout_propagates_as_io_error() {
        let mut reader = TimedOutReader;
        let err = Response::read_from(&mut reader).unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::WouldBlock));
    }

    #[test]
    fn reply_echoes_request_identity() {
        let request = Header {
            id: 2,
            version: 1,
            log_id: 1234,
            provider: *b"signaling-node-1",
            magic_num: MAGIC_NUM,
            reserved: 99,
            body_len: 100,
        };
        let resp = Response::reply_to(&request, &b"{\"offer\":\"v=0\"}"[..]).unwrap();

        assert_eq!(resp.header.id, 2);
        assert_eq!(resp.header.version, 1);
        assert_eq!(resp.header.log_id, 1234);
        assert_eq!(resp.header.provider, request.provider);
        assert_eq!(resp.header.reserved, 0);
        assert_eq!(resp.header.body_len, 15);

        let mut wire = Vec::new();
        resp.write_to(&mut wire).unwrap();
        let decoded = Response::read_from(&mut Cursor::new(wire)).unwrap();
        assert_eq!(decoded, resp);
    }

    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct InterruptedThenData {
        interrupted: bool,
        inner: Cursor<Vec<u8>>,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.inner.read(buf)
        }
    }

    struct TimedOutReader;

    impl Read for TimedOutReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::WouldBlock))
        }
    }
}
