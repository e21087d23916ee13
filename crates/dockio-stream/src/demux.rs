//! Demultiplexing stream adapter for attach, exec and logs output.

use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use bytes::Bytes;
use dockio_frame::{Frame, MultiplexParser, StreamType};
use futures_core::Stream;
use tracing::{debug, warn};

use crate::config::StreamConfig;
use crate::error::{Result, StreamError, Unit};
use crate::event::{Event, EventName};
use crate::lifecycle::{CloseSignal, Lifecycle, ReadableStream};
use crate::response::ByteStream;

/// Splits a multiplexed byte stream back into stdout and stderr payloads.
///
/// Stdout payloads are emitted on [`EventName::DATA`]. Stderr payloads are
/// emitted on the configured stderr event, or on `data` as well when none
/// is configured, giving one merged stream.
pub struct DemuxStream<S = ByteStream> {
    upstream: S,
    parser: MultiplexParser,
    pending: VecDeque<Frame>,
    stderr_event: EventName,
    warned_unknown: bool,
    life: Lifecycle,
}

impl<S> DemuxStream<S>
where
    S: ReadableStream<Item = Result<Bytes>>,
{
    pub fn new(upstream: S) -> Self {
        Self::with_config(upstream, &StreamConfig::default())
    }

    pub fn with_config(upstream: S, config: &StreamConfig) -> Self {
        let mut stream = Self {
            parser: MultiplexParser::with_config(config.frame_config()),
            pending: VecDeque::new(),
            stderr_event: config.stderr_event.clone().unwrap_or_default(),
            warned_unknown: false,
            life: Lifecycle::new("demux"),
            upstream,
        };
        if !stream.upstream.is_readable() {
            stream.close();
        }
        stream
    }

    /// The event stderr payloads are emitted on.
    pub fn stderr_event(&self) -> &EventName {
        &self.stderr_event
    }

    pub fn get_ref(&self) -> &S {
        &self.upstream
    }

    fn route(&mut self, frame: Frame) -> Event<Bytes> {
        let name = match frame.stream {
            StreamType::Stderr => self.stderr_event.clone(),
            StreamType::Stdout | StreamType::Stdin => EventName::DATA,
            StreamType::Other(byte) => {
                if !self.warned_unknown {
                    self.warned_unknown = true;
                    warn!(stream_type = byte, "unknown stream type, treating as stdout");
                }
                EventName::DATA
            }
        };
        Event::new(name, frame.payload)
    }

    fn fail(&mut self, err: StreamError) -> Poll<Option<Result<Event<Bytes>>>> {
        debug!(error = %err, "demultiplexed stream failed");
        self.close();
        Poll::Ready(Some(Err(err)))
    }
}

impl<S> Stream for DemuxStream<S>
where
    S: ReadableStream<Item = Result<Bytes>>,
{
    type Item = Result<Event<Bytes>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if !this.life.is_open() {
                return Poll::Ready(None);
            }
            if this.life.park_if_paused(cx) {
                return Poll::Pending;
            }
            if let Some(frame) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(this.route(frame))));
            }

            match ready!(Pin::new(&mut this.upstream).poll_next(cx)) {
                Some(Ok(chunk)) => match this.parser.push(&chunk) {
                    Ok(frames) => this.pending.extend(frames),
                    Err(err) => return this.fail(err.into()),
                },
                Some(Err(err)) => return this.fail(err),
                None => {
                    if !this.parser.is_empty() {
                        debug!(
                            buffered = this.parser.buffered_len(),
                            "upstream ended inside a frame"
                        );
                        return this.fail(StreamError::Truncated(Unit::MultiplexedFrame));
                    }
                    this.close();
                    return Poll::Ready(None);
                }
            }
        }
    }
}

impl<S> ReadableStream for DemuxStream<S>
where
    S: ReadableStream<Item = Result<Bytes>>,
{
    fn is_readable(&self) -> bool {
        self.life.is_open()
    }

    fn pause(&mut self) {
        self.life.pause();
        self.upstream.pause();
    }

    fn resume(&mut self) {
        self.life.resume();
        self.upstream.resume();
    }

    fn close(&mut self) {
        if !self.life.close() {
            return;
        }
        self.upstream.close();
        self.pending.clear();
        self.parser.clear();
    }

    fn on_close(&self) -> CloseSignal {
        self.life.signal()
    }
}

impl<S> fmt::Debug for DemuxStream<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DemuxStream")
            .field("stderr_event", &self.stderr_event)
            .field("state", &self.life.state())
            .field("buffered", &self.parser.buffered_len())
            .finish()
    }
}
