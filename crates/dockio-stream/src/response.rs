//! Pending responses and the plain byte stream adapter.
//!
//! A request is represented by a [`PendingResponse`]: a future that resolves
//! to a [`ResponseStart`] as soon as the response headers are in, carrying
//! the still-streaming body. [`ByteStream`] turns such a pending response
//! into a readable stream of body chunks that exists before the request
//! has settled.

use std::fmt;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use bytes::Bytes;
use futures_core::future::BoxFuture;
use futures_core::Stream;
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;
use tracing::{debug, trace};

use crate::error::{Result, StreamError};
use crate::lifecycle::{CloseSignal, Lifecycle, ReadableStream};

/// A response body as delivered by the transport.
pub type BodyStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

/// The "headers received" phase of a response.
pub struct ResponseStart {
    /// HTTP status code.
    pub status: u16,
    /// The body, still streaming.
    pub body: BodyStream,
}

impl ResponseStart {
    pub fn new<B>(status: u16, body: B) -> Self
    where
        B: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        Self {
            status,
            body: Box::pin(body),
        }
    }

    /// A response whose body is read from `reader`.
    pub fn from_reader<R>(status: u16, reader: R) -> Self
    where
        R: AsyncRead + Send + 'static,
    {
        Self::new(status, ReaderStream::new(reader))
    }
}

impl fmt::Debug for ResponseStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseStart")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// An in-flight request.
///
/// Resolves once response headers are available, or fails with the
/// transport error. Dropping it cancels the request where the transport
/// supports that.
#[must_use = "a pending response does nothing unless polled"]
pub struct PendingResponse {
    inner: BoxFuture<'static, io::Result<ResponseStart>>,
}

impl PendingResponse {
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = io::Result<ResponseStart>> + Send + 'static,
    {
        Self {
            inner: Box::pin(future),
        }
    }

    /// A response that has already started.
    pub fn ready(start: ResponseStart) -> Self {
        Self::new(std::future::ready(Ok(start)))
    }

    /// A request that failed before producing a response.
    pub fn rejected(err: io::Error) -> Self {
        Self::new(std::future::ready(Err(err)))
    }
}

impl Future for PendingResponse {
    type Output = io::Result<ResponseStart>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl fmt::Debug for PendingResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingResponse").finish_non_exhaustive()
    }
}

enum Phase {
    Pending(PendingResponse),
    Body(BodyStream),
    Done,
}

/// The body of a pending response as a stream of byte chunks.
///
/// Silent while the request is pending; yields the transport error and
/// closes if it is rejected; otherwise yields body chunks in transport
/// order until the body ends. Status and headers are not exposed.
pub struct ByteStream {
    phase: Phase,
    life: Lifecycle,
}

impl ByteStream {
    pub fn new(pending: PendingResponse) -> Self {
        Self {
            phase: Phase::Pending(pending),
            life: Lifecycle::new("bytes"),
        }
    }

    /// A stream over a body that is already available.
    pub fn from_body<B>(body: B) -> Self
    where
        B: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        Self {
            phase: Phase::Body(Box::pin(body)),
            life: Lifecycle::new("bytes"),
        }
    }

    /// Returns true once response headers have arrived.
    pub fn is_started(&self) -> bool {
        !matches!(self.phase, Phase::Pending(_))
    }
}

impl Stream for ByteStream {
    type Item = Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if !this.life.is_open() {
            return Poll::Ready(None);
        }
        if this.life.park_if_paused(cx) {
            return Poll::Pending;
        }

        loop {
            match &mut this.phase {
                Phase::Pending(pending) => match ready!(Pin::new(pending).poll(cx)) {
                    Ok(start) => {
                        debug!(status = start.status, "response started");
                        this.phase = Phase::Body(start.body);
                    }
                    Err(err) => {
                        debug!(error = %err, "request failed before response");
                        ReadableStream::close(this);
                        return Poll::Ready(Some(Err(StreamError::Transport(err))));
                    }
                },
                Phase::Body(body) => {
                    return match ready!(body.as_mut().poll_next(cx)) {
                        Some(Ok(chunk)) => {
                            trace!(len = chunk.len(), "body chunk");
                            Poll::Ready(Some(Ok(chunk)))
                        }
                        Some(Err(err)) => {
                            debug!(error = %err, "response body failed");
                            ReadableStream::close(this);
                            Poll::Ready(Some(Err(StreamError::Transport(err))))
                        }
                        None => {
                            debug!("response body ended");
                            ReadableStream::close(this);
                            Poll::Ready(None)
                        }
                    };
                }
                Phase::Done => return Poll::Ready(None),
            }
        }
    }
}

impl ReadableStream for ByteStream {
    fn is_readable(&self) -> bool {
        self.life.is_open()
    }

    fn pause(&mut self) {
        self.life.pause();
    }

    fn resume(&mut self) {
        self.life.resume();
    }

    fn close(&mut self) {
        if !self.life.close() {
            return;
        }
        if matches!(self.phase, Phase::Pending(_)) {
            debug!("cancelling pending request");
        }
        self.phase = Phase::Done;
    }

    fn on_close(&self) -> CloseSignal {
        self.life.signal()
    }
}

impl fmt::Debug for ByteStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self.phase {
            Phase::Pending(_) => "pending",
            Phase::Body(_) => "body",
            Phase::Done => "done",
        };
        f.debug_struct("ByteStream")
            .field("phase", &phase)
            .field("state", &self.life.state())
            .finish()
    }
}
