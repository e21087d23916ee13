use bytes::BytesMut;
use tracing::trace;

use crate::codec::{decode_frame, Frame, FrameConfig};
use crate::error::Result;

/// Incremental frame demultiplexer.
///
/// Owns the reassembly buffer for exactly one multiplexed stream. Chunks are
/// pushed in arrival order; every frame completed by a chunk is returned in
/// the order it was received, and any trailing partial frame stays buffered
/// until more bytes arrive.
#[derive(Debug, Default)]
pub struct MultiplexParser {
    buf: BytesMut,
    config: FrameConfig,
}

impl MultiplexParser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self::with_config(FrameConfig::default())
    }

    /// Create a new parser with explicit configuration.
    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            buf: BytesMut::new(),
            config,
        }
    }

    /// Append `chunk` and extract every frame that is now complete.
    ///
    /// Frames whose declared length exceeds the configured maximum are
    /// rejected as soon as their header is buffered.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<Frame>> {
        self.buf.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(frame) = decode_frame(&mut self.buf, self.config.max_payload_size)? {
            trace!(
                stream = %frame.stream,
                len = frame.payload.len(),
                "demultiplexed frame"
            );
            frames.push(frame);
        }
        Ok(frames)
    }

    /// Returns true if no partial frame is buffered.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Number of bytes waiting for the rest of their frame.
    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }

    /// Drop any buffered partial frame.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Current parser configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}
