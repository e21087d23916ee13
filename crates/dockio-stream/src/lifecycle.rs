//! Open/closed state shared by every streaming adapter.
//!
//! A logical stream yields zero or more items, at most one terminal error,
//! and is then closed exactly once. Closing is one-shot: later calls are
//! no-ops and observers holding a [`CloseSignal`] are released only once.

use std::task::{Context, Waker};

use futures_core::Stream;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Lifecycle state of a logical stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Items may still be emitted.
    Open,
    /// Terminal. No further items or errors will be emitted.
    Closed,
}

/// A pull-based logical stream with flow control and explicit close.
///
/// Adapters that wrap another `ReadableStream` own it exclusively: pausing,
/// resuming and closing the wrapper is forwarded to the wrapped stream, and
/// the wrapper closes itself when the wrapped stream ends or fails.
pub trait ReadableStream: Stream + Unpin {
    /// Returns true until the stream has been closed.
    fn is_readable(&self) -> bool;

    /// Stop delivering items until [`resume`](Self::resume) is called.
    fn pause(&mut self);

    /// Resume delivering items after [`pause`](Self::pause).
    fn resume(&mut self);

    /// Close the stream and release its upstream. Idempotent.
    fn close(&mut self);

    /// A handle that resolves once this stream is closed.
    fn on_close(&self) -> CloseSignal;
}

/// Resolves once the stream it was obtained from has closed.
#[derive(Debug, Clone)]
pub struct CloseSignal {
    token: CancellationToken,
}

impl CloseSignal {
    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait until the stream is closed.
    pub async fn closed(&self) {
        self.token.cancelled().await;
    }
}

#[derive(Debug)]
pub(crate) struct Lifecycle {
    kind: &'static str,
    state: StreamState,
    paused: bool,
    parked: Option<Waker>,
    token: CancellationToken,
}

impl Lifecycle {
    pub(crate) fn new(kind: &'static str) -> Self {
        Self {
            kind,
            state: StreamState::Open,
            paused: false,
            parked: None,
            token: CancellationToken::new(),
        }
    }

    pub(crate) fn state(&self) -> StreamState {
        self.state
    }

    pub(crate) fn is_open(&self) -> bool {
        self.state == StreamState::Open
    }

    /// Move to `Closed`. Returns false if the stream was already closed.
    pub(crate) fn close(&mut self) -> bool {
        if self.state == StreamState::Closed {
            return false;
        }
        self.state = StreamState::Closed;
        self.paused = false;
        self.token.cancel();
        if let Some(waker) = self.parked.take() {
            waker.wake();
        }
        debug!(stream = self.kind, "stream closed");
        true
    }

    pub(crate) fn pause(&mut self) {
        if self.is_open() {
            self.paused = true;
        }
    }

    pub(crate) fn resume(&mut self) {
        self.paused = false;
        if let Some(waker) = self.parked.take() {
            waker.wake();
        }
    }

    pub(crate) fn is_paused(&self) -> bool {
        self.paused
    }

    /// Park the polling task while paused. Returns true if the caller must
    /// return `Poll::Pending`.
    pub(crate) fn park_if_paused(&mut self, cx: &mut Context<'_>) -> bool {
        if self.paused {
            self.parked = Some(cx.waker().clone());
        }
        self.paused
    }

    pub(crate) fn signal(&self) -> CloseSignal {
        CloseSignal {
            token: self.token.clone(),
        }
    }
}

impl Drop for Lifecycle {
    fn drop(&mut self) {
        if self.state == StreamState::Open {
            debug!(stream = self.kind, "stream dropped while open");
            self.token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::task::Wake;

    use super::*;

    struct CountingWaker(AtomicUsize);

    impl Wake for CountingWaker {
        fn wake(self: Arc<Self>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn close_is_one_shot() {
        let mut life = Lifecycle::new("test");
        let signal = life.signal();

        assert!(life.close());
        assert!(!life.close());
        assert_eq!(life.state(), StreamState::Closed);
        assert!(signal.is_closed());
    }

    #[test]
    fn pause_parks_and_resume_wakes() {
        let counter = Arc::new(CountingWaker(AtomicUsize::new(0)));
        let waker = Waker::from(counter.clone());
        let mut cx = Context::from_waker(&waker);

        let mut life = Lifecycle::new("test");
        assert!(!life.park_if_paused(&mut cx));

        life.pause();
        assert!(life.is_paused());
        assert!(life.park_if_paused(&mut cx));

        life.resume();
        assert!(!life.is_paused());
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn close_wakes_parked_task_and_clears_pause() {
        let counter = Arc::new(CountingWaker(AtomicUsize::new(0)));
        let waker = Waker::from(counter.clone());
        let mut cx = Context::from_waker(&waker);

        let mut life = Lifecycle::new("test");
        life.pause();
        life.park_if_paused(&mut cx);
        life.close();

        assert!(!life.is_paused());
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);

        life.pause();
        assert!(!life.is_paused(), "closed streams cannot be paused");
    }

    #[test]
    fn drop_releases_close_signal() {
        let life = Lifecycle::new("test");
        let signal = life.signal();
        drop(life);
        assert!(signal.is_closed());
    }

    #[tokio::test]
    async fn close_signal_resolves() {
        let mut life = Lifecycle::new("test");
        let signal = life.signal();
        let waiter = tokio::spawn(async move { signal.closed().await });

        life.close();
        waiter.await.unwrap();
    }
}
