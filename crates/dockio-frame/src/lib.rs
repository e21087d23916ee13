//! Multiplexed stdout/stderr framing for container-engine attach, exec and logs.
//!
//! When a container runs without a TTY, the engine interleaves its output
//! streams on one HTTP body. Every frame carries:
//! - A 1-byte stream type (1 = stdout, 2 = stderr)
//! - 3 reserved bytes
//! - A 4-byte big-endian payload length
//!
//! [`MultiplexParser`] reassembles frames from arbitrarily chunked input;
//! [`FrameReader`] and [`FrameWriter`] do the same over blocking I/O.

pub mod codec;
pub mod error;
pub mod parser;
pub mod reader;
pub mod stream_type;
pub mod writer;

pub use codec::{
    decode_frame, encode_frame, Frame, FrameConfig, DEFAULT_MAX_PAYLOAD, HEADER_SIZE,
};
pub use error::{FrameError, Result};
pub use parser::MultiplexParser;
pub use reader::FrameReader;
pub use stream_type::{StreamType, STDERR, STDIN, STDOUT};
pub use writer::FrameWriter;
