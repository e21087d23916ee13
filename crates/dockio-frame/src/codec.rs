use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::stream_type::StreamType;

/// Frame header: stream type (1) + reserved (3) + length (4) = 8 bytes.
pub const HEADER_SIZE: usize = 8;

/// Default maximum payload size: everything the 32-bit length field can express.
pub const DEFAULT_MAX_PAYLOAD: usize = u32::MAX as usize;

/// One multiplexed unit of output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The output stream this payload was written to.
    pub stream: StreamType,
    /// The frame payload.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(stream: StreamType, payload: impl Into<Bytes>) -> Self {
        Self {
            stream,
            payload: payload.into(),
        }
    }

    /// Shorthand for a stdout frame.
    pub fn stdout(payload: impl Into<Bytes>) -> Self {
        Self::new(StreamType::Stdout, payload)
    }

    /// Shorthand for a stderr frame.
    pub fn stderr(payload: impl Into<Bytes>) -> Self {
        Self::new(StreamType::Stderr, payload)
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌────────────┬──────────────┬──────────────┬────────────────┐
/// │ Stream (1B)│ Reserved (3B)│ Length       │ Payload        │
/// │ 1=out 2=err│ 0x00 0x00 0x00│ (4B BE)     │ (Length bytes) │
/// └────────────┴──────────────┴──────────────┴────────────────┘
/// ```
pub fn encode_frame(stream: StreamType, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    let len = u32::try_from(payload.len()).map_err(|_| FrameError::PayloadTooLarge {
        size: payload.len(),
        max: DEFAULT_MAX_PAYLOAD,
    })?;
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_u8(stream.as_byte());
    dst.put_bytes(0, 3);
    dst.put_u32(len);
    dst.put_slice(payload);
    Ok(())
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Frame>> {
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    let stream = StreamType::from_byte(src[0]);
    let payload_len = u32::from_be_bytes([src[4], src[5], src[6], src[7]]) as usize;

    if payload_len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    if src.len() - HEADER_SIZE < payload_len {
        return Ok(None);
    }

    src.advance(HEADER_SIZE);
    let payload = src.split_to(payload_len).freeze();

    Ok(Some(Frame { stream, payload }))
}

/// Configuration for frame decoding.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: [`DEFAULT_MAX_PAYLOAD`].
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_roundtrip() {
        let mut buf = BytesMut::new();
        let payload = b"hello, container!";

        encode_frame(StreamType::Stderr, payload, &mut buf).unwrap();

        assert_eq!(buf.len(), HEADER_SIZE + payload.len());

        let frame = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .unwrap();

        assert_eq!(frame.stream, StreamType::Stderr);
        assert_eq!(frame.payload.as_ref(), payload);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_header_layout_is_big_endian() {
        let mut buf = BytesMut::new();
        encode_frame(StreamType::Stdout, b"test", &mut buf).unwrap();
        assert_eq!(&buf[..], b"\x01\x00\x00\x00\x00\x00\x00\x04test");
    }

    #[test]
    fn test_decode_incomplete_header() {
        let mut buf = BytesMut::from(&[0x01, 0x00, 0x00][..]);
        let result = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap();
        assert!(result.is_none());
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn test_decode_incomplete_payload() {
        let mut buf = BytesMut::new();
        encode_frame(StreamType::Stdout, b"hello", &mut buf).unwrap();
        buf.truncate(HEADER_SIZE + 2);

        let result = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap();
        assert!(result.is_none());
        assert_eq!(buf.len(), HEADER_SIZE + 2);
    }

    #[test]
    fn test_reserved_bytes_are_ignored() {
        let mut buf = BytesMut::from(&b"\x02\xff\xee\xdd\x00\x00\x00\x02ok"[..]);
        let frame = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .unwrap();
        assert_eq!(frame, Frame::stderr(&b"ok"[..]));
    }

    #[test]
    fn test_unknown_stream_type_is_preserved() {
        let mut buf = BytesMut::from(&b"\x07\x00\x00\x00\x00\x00\x00\x01x"[..]);
        let frame = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .unwrap();
        assert_eq!(frame.stream, StreamType::Other(7));
    }

    #[test]
    fn test_decode_max_declared_length_waits_for_payload() {
        let mut buf = BytesMut::new();
        buf.put_u8(1);
        buf.put_bytes(0, 3);
        buf.put_u32(u32::MAX);
        buf.put_slice(b"abc");

        assert!(decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap().is_none());
        assert_eq!(buf.len(), HEADER_SIZE + 3);
    }

    #[test]
    fn test_decode_payload_too_large() {
        let mut buf = BytesMut::new();
        buf.put_u8(1);
        buf.put_bytes(0, 3);
        buf.put_u32(1024 * 1024 * 32);

        let result = decode_frame(&mut buf, 16 * 1024 * 1024);
        assert!(matches!(result, Err(FrameError::PayloadTooLarge { .. })));
    }

    #[test]
    fn test_multiple_frames() {
        let mut buf = BytesMut::new();
        encode_frame(StreamType::Stdout, b"first", &mut buf).unwrap();
        encode_frame(StreamType::Stderr, b"second", &mut buf).unwrap();

        let f1 = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .unwrap();
        assert_eq!(f1, Frame::stdout(&b"first"[..]));

        let f2 = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .unwrap();
        assert_eq!(f2, Frame::stderr(&b"second"[..]));

        assert!(buf.is_empty());
    }

    #[test]
    fn test_empty_payload() {
        let mut buf = BytesMut::new();
        encode_frame(StreamType::Stdout, b"", &mut buf).unwrap();

        let frame = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .unwrap();
        assert_eq!(frame.stream, StreamType::Stdout);
        assert!(frame.payload.is_empty());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_frame_wire_size() {
        let frame = Frame::stdout(Bytes::from_static(b"test"));
        assert_eq!(frame.wire_size(), HEADER_SIZE + 4);
    }
}
