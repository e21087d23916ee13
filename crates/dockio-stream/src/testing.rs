//! Test doubles for driving adapters chunk by chunk.

use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_core::Stream;
use tokio::sync::{mpsc, oneshot};

use crate::error::Result;
use crate::lifecycle::{CloseSignal, Lifecycle, ReadableStream};
use crate::response::{PendingResponse, ResponseStart};

pub(crate) type BodySender = mpsc::UnboundedSender<io::Result<Bytes>>;

/// A response whose body chunks are pushed by the test.
pub(crate) fn body_channel() -> (BodySender, ResponseStart) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let body = futures_util::stream::poll_fn(move |cx| rx.poll_recv(cx));
    (tx, ResponseStart::new(200, body))
}

/// A pending response settled by the test.
pub(crate) fn pending_channel() -> (oneshot::Sender<io::Result<ResponseStart>>, PendingResponse) {
    let (tx, rx) = oneshot::channel();
    let pending = PendingResponse::new(async move {
        rx.await
            .unwrap_or_else(|_| Err(io::Error::other("responder dropped")))
    });
    (tx, pending)
}

/// Set when the guard it hands out is dropped.
#[derive(Debug, Default, Clone)]
pub(crate) struct DropFlag(pub(crate) Arc<AtomicBool>);

impl DropFlag {
    pub(crate) fn guard(&self) -> DropGuard {
        DropGuard(self.0.clone())
    }
}

pub(crate) struct DropGuard(Arc<AtomicBool>);

impl Drop for DropGuard {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Calls observed by a [`ScriptedStream`].
#[derive(Debug, Default)]
pub(crate) struct Calls {
    pub(crate) pause: usize,
    pub(crate) resume: usize,
    pub(crate) close: usize,
}

/// An upstream that replays a fixed script and records flow-control calls.
pub(crate) struct ScriptedStream<T> {
    items: VecDeque<T>,
    calls: Arc<std::sync::Mutex<Calls>>,
    life: Lifecycle,
}

impl<T> ScriptedStream<T> {
    pub(crate) fn new(items: impl IntoIterator<Item = T>) -> Self {
        Self {
            items: items.into_iter().collect(),
            calls: Arc::default(),
            life: Lifecycle::new("scripted"),
        }
    }

    pub(crate) fn calls(&self) -> Arc<std::sync::Mutex<Calls>> {
        self.calls.clone()
    }
}

impl<T> Unpin for ScriptedStream<T> {}

impl<T> Stream for ScriptedStream<T> {
    type Item = Result<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if !this.life.is_open() {
            return Poll::Ready(None);
        }
        if this.life.park_if_paused(cx) {
            return Poll::Pending;
        }
        match this.items.pop_front() {
            Some(item) => Poll::Ready(Some(Ok(item))),
            None => {
                this.life.close();
                Poll::Ready(None)
            }
        }
    }
}

impl<T> ReadableStream for ScriptedStream<T> {
    fn is_readable(&self) -> bool {
        self.life.is_open()
    }

    fn pause(&mut self) {
        self.calls.lock().unwrap().pause += 1;
        self.life.pause();
    }

    fn resume(&mut self) {
        self.calls.lock().unwrap().resume += 1;
        self.life.resume();
    }

    fn close(&mut self) {
        self.calls.lock().unwrap().close += 1;
        self.life.close();
    }

    fn on_close(&self) -> CloseSignal {
        self.life.signal()
    }
}
