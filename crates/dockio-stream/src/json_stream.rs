//! JSON event stream adapter.

use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use bytes::Bytes;
use futures_core::Stream;
use serde_json::Value;
use tracing::debug;

use crate::config::StreamConfig;
use crate::error::{Result, StreamError};
use crate::event::{Event, EventName};
use crate::json::JsonStreamParser;
use crate::lifecycle::{CloseSignal, Lifecycle, ReadableStream};
use crate::response::ByteStream;

/// Decodes a byte stream of concatenated JSON values into events.
///
/// Every decoded value is emitted on the configured event (default
/// [`EventName::DATA`]). An object with a non-null top-level `"error"`
/// member is an in-band failure: it is yielded as
/// [`StreamError::Remote`] and the stream closes without emitting any of
/// the values that followed it.
pub struct JsonStream<S = ByteStream> {
    upstream: S,
    parser: JsonStreamParser,
    pending: VecDeque<Value>,
    event: EventName,
    upstream_done: bool,
    life: Lifecycle,
}

impl<S> JsonStream<S>
where
    S: ReadableStream<Item = Result<Bytes>>,
{
    pub fn new(upstream: S) -> Self {
        Self::with_config(upstream, &StreamConfig::default())
    }

    pub fn with_config(upstream: S, config: &StreamConfig) -> Self {
        let mut stream = Self {
            parser: JsonStreamParser::with_max_value_size(config.max_json_value_size),
            pending: VecDeque::new(),
            event: EventName::DATA,
            upstream_done: false,
            life: Lifecycle::new("json"),
            upstream,
        };
        if !stream.upstream.is_readable() {
            stream.close();
        }
        stream
    }

    /// Emit decoded values on `event` instead of `data`.
    pub fn with_event(mut self, event: impl Into<EventName>) -> Self {
        self.event = event.into();
        self
    }

    pub fn event(&self) -> &EventName {
        &self.event
    }

    pub fn get_ref(&self) -> &S {
        &self.upstream
    }

    fn emit(&mut self, value: Value) -> Result<Event<Value>> {
        if is_error_object(&value) {
            debug!("remote reported an error");
            self.close();
            return Err(StreamError::remote(value));
        }
        Ok(Event::new(self.event.clone(), value))
    }

    fn fail(&mut self, err: StreamError) -> Poll<Option<Result<Event<Value>>>> {
        debug!(error = %err, "json stream failed");
        self.close();
        Poll::Ready(Some(Err(err)))
    }
}

fn is_error_object(value: &Value) -> bool {
    value.get("error").is_some_and(|error| !error.is_null())
}

impl<S> Stream for JsonStream<S>
where
    S: ReadableStream<Item = Result<Bytes>>,
{
    type Item = Result<Event<Value>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if !this.life.is_open() {
                return Poll::Ready(None);
            }
            if this.life.park_if_paused(cx) {
                return Poll::Pending;
            }
            if let Some(value) = this.pending.pop_front() {
                return Poll::Ready(Some(this.emit(value)));
            }
            if this.upstream_done {
                this.close();
                return Poll::Ready(None);
            }

            match ready!(Pin::new(&mut this.upstream).poll_next(cx)) {
                Some(Ok(chunk)) => match this.parser.push(&chunk) {
                    Ok(values) => this.pending.extend(values),
                    Err(err) => return this.fail(err),
                },
                Some(Err(err)) => return this.fail(err),
                None => {
                    this.upstream_done = true;
                    match this.parser.finish() {
                        Ok(Some(value)) => this.pending.push_back(value),
                        Ok(None) => {}
                        Err(err) => return this.fail(err),
                    }
                }
            }
        }
    }
}

impl<S> ReadableStream for JsonStream<S>
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

impl<S> fmt::Debug for JsonStream<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonStream")
            .field("event", &self.event)
            .field("state", &self.life.state())
            .field("pending", &self.pending.len())
            .field("buffered", &self.parser.buffered_len())
            .finish()
    }
}
