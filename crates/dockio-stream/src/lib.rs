//! Streaming response adapters for the container-engine HTTP API.
//!
//! Long-running endpoints answer with a body that keeps flowing: raw bytes
//! (export, archives), concatenated JSON values (events, pull progress,
//! stats) or multiplexed stdout/stderr frames (attach, exec, logs). Every
//! adapter here is a [`ReadableStream`]: a `futures` stream of
//! `Result` items that yields at most one terminal error and then stays
//! closed.
//!
//! - [`to_byte_stream`] exposes the body of a [`PendingResponse`] before
//!   the request has settled.
//! - [`to_json_stream`] decodes JSON values and turns in-band error objects
//!   into [`StreamError::Remote`].
//! - [`demultiplex`] splits frames into `data` and an optional stderr event.
//! - [`buffer_all`] and [`collect_all`] collapse a stream into a
//!   cancellable [`Deferred`] result.
//!
//! ```no_run
//! use dockio_stream::{collect_all, to_json_stream, PendingResponse};
//!
//! # async fn run(pending: PendingResponse) -> dockio_stream::Result<()> {
//! let progress = to_json_stream(pending).with_event("progress");
//! for update in collect_all(progress, "progress").await? {
//!     println!("{update}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod buffered;
pub mod config;
pub mod demux;
pub mod error;
pub mod event;
pub mod json;
pub mod json_stream;
pub mod lifecycle;
pub mod pipe;
pub mod response;

#[cfg(test)]
mod testing;

use bytes::Bytes;

pub use aggregate::{buffer_all, collect_all, CancelHandle, Deferred, Emitted};
pub use buffered::{expect_empty, expect_json, expect_plain};
pub use config::{StreamConfig, DEFAULT_MAX_JSON_VALUE};
pub use demux::DemuxStream;
pub use error::{Result, StreamError, Unit};
pub use event::{Event, EventName};
pub use json::JsonStreamParser;
pub use json_stream::JsonStream;
pub use lifecycle::{CloseSignal, ReadableStream, StreamState};
pub use pipe::{pipe, pipe_split};
pub use response::{BodyStream, ByteStream, PendingResponse, ResponseStart};

/// The body of `pending` as a stream of byte chunks.
pub fn to_byte_stream(pending: PendingResponse) -> ByteStream {
    ByteStream::new(pending)
}

/// The body of `pending` as a stream of decoded JSON values.
pub fn to_json_stream(pending: PendingResponse) -> JsonStream {
    JsonStream::new(ByteStream::new(pending))
}

/// Split a multiplexed byte stream into stdout and stderr payloads.
///
/// With `stderr_event` set, stderr payloads are emitted on that event;
/// otherwise both streams are merged into `data`.
pub fn demultiplex<S>(input: S, stderr_event: Option<EventName>) -> DemuxStream<S>
where
    S: ReadableStream<Item = Result<Bytes>>,
{
    let config = StreamConfig {
        stderr_event,
        ..StreamConfig::default()
    };
    DemuxStream::with_config(input, &config)
}
