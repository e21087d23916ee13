//! Collapse a live stream into a single deferred result.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures_core::future::BoxFuture;
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{Result, StreamError};
use crate::event::{Event, EventName};
use crate::lifecycle::ReadableStream;

static DATA_EVENT: EventName = EventName::DATA;

/// Something a stream emits on a named event.
///
/// Plain byte chunks are always emitted on `data`.
pub trait Emitted {
    type Item;

    fn event(&self) -> &EventName;

    fn into_item(self) -> Self::Item;
}

impl Emitted for Bytes {
    type Item = Bytes;

    fn event(&self) -> &EventName {
        &DATA_EVENT
    }

    fn into_item(self) -> Bytes {
        self
    }
}

impl<T> Emitted for Event<T> {
    type Item = T;

    fn event(&self) -> &EventName {
        &self.name
    }

    fn into_item(self) -> T {
        self.item
    }
}

/// The eventual result of an aggregation.
///
/// Resolves once the stream ends. Cancelling closes the stream and
/// settles with [`StreamError::Cancelled`] unless the result was already
/// available. Dropping a `Deferred` drops, and thereby closes, the stream.
#[must_use = "a deferred result does nothing unless awaited"]
pub struct Deferred<T> {
    inner: BoxFuture<'static, Result<T>>,
    cancel: CancellationToken,
}

/// Cancels a [`Deferred`] from elsewhere.
#[derive(Debug, Clone)]
pub struct CancelHandle(CancellationToken);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.cancel();
    }
}

impl<T: Send + 'static> Deferred<T> {
    /// A result that has already failed.
    pub fn rejected(err: StreamError) -> Self {
        Self {
            inner: Box::pin(std::future::ready(Err(err))),
            cancel: CancellationToken::new(),
        }
    }

    /// Close the stream now and settle with [`StreamError::Cancelled`].
    pub fn cancel(&mut self) {
        self.cancel.cancel();
        self.inner = Box::pin(std::future::ready(Err(StreamError::Cancelled)));
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(self.cancel.clone())
    }
}

impl<T> Future for Deferred<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl<T> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Concatenate every `data` chunk of `stream` into one buffer.
///
/// Chunks emitted on other events are skipped. Fails immediately with
/// [`StreamError::NotReadable`] if the stream is already closed.
pub fn buffer_all<S, E>(stream: S) -> Deferred<Bytes>
where
    S: ReadableStream<Item = Result<E>> + Send + 'static,
    E: Emitted + Send + 'static,
    E::Item: AsRef<[u8]>,
{
    if !stream.is_readable() {
        return Deferred::rejected(StreamError::NotReadable);
    }
    let Deferred { inner, cancel } = drive(stream, BytesMut::new(), |buf, emitted: E| {
        if emitted.event().is_data() {
            buf.extend_from_slice(emitted.into_item().as_ref());
        }
    });
    Deferred {
        inner: Box::pin(async move { inner.await.map(BytesMut::freeze) }),
        cancel,
    }
}

/// Collect every item emitted on `event`, in order.
///
/// Items on other events are skipped. Fails immediately with
/// [`StreamError::NotReadable`] if the stream is already closed.
pub fn collect_all<S, E>(stream: S, event: impl Into<EventName>) -> Deferred<Vec<E::Item>>
where
    S: ReadableStream<Item = Result<E>> + Send + 'static,
    E: Emitted + Send + 'static,
    E::Item: Send + 'static,
{
    if !stream.is_readable() {
        return Deferred::rejected(StreamError::NotReadable);
    }
    let event = event.into();
    drive(stream, Vec::new(), move |items, emitted: E| {
        if emitted.event() == &event {
            items.push(emitted.into_item());
        }
    })
}

/// Closes the wrapped stream when an aggregation is dropped before it ends.
struct CloseOnDrop<S: ReadableStream>(S);

impl<S: ReadableStream> Drop for CloseOnDrop<S> {
    fn drop(&mut self) {
        if self.0.is_readable() {
            debug!("aggregation dropped before the stream ended");
            self.0.close();
        }
    }
}

fn drive<S, E, A, F>(stream: S, mut acc: A, mut absorb: F) -> Deferred<A>
where
    S: ReadableStream<Item = Result<E>> + Send + 'static,
    E: Send + 'static,
    A: Send + 'static,
    F: FnMut(&mut A, E) + Send + 'static,
{
    let cancel = CancellationToken::new();
    let cancelled = cancel.clone();
    let mut stream = CloseOnDrop(stream);
    let inner = async move {
        loop {
            tokio::select! {
                biased;
                _ = cancelled.cancelled() => {
                    debug!("aggregation cancelled");
                    stream.0.close();
                    return Err(StreamError::Cancelled);
                }
                next = stream.0.next() => match next {
                    Some(Ok(emitted)) => absorb(&mut acc, emitted),
                    Some(Err(err)) => {
                        stream.0.close();
                        return Err(err);
                    }
                    None => return Ok(acc),
                },
            }
        }
    };
    Deferred {
        inner: Box::pin(inner),
        cancel,
    }
}
