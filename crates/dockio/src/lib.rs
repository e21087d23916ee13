//! Non-blocking streaming core for container-engine API clients.
//!
//! Turns in-flight HTTP responses from the engine into readable streams of
//! bytes, decoded JSON events or demultiplexed stdout/stderr payloads, and
//! collapses them into single results when a caller wants everything at once.
//!
//! # Crate Structure
//!
//! - [`frame`]: the 8-byte-header stdout/stderr multiplexing format
//! - [`stream`]: response adapters, aggregation and piping

/// Re-export frame types.
pub mod frame {
    pub use dockio_frame::*;
}

/// Re-export stream adapters.
pub mod stream {
    pub use dockio_stream::*;
}

pub use dockio_stream::{
    buffer_all, collect_all, demultiplex, to_byte_stream, to_json_stream, PendingResponse,
    ReadableStream, ResponseStart, StreamError,
};
