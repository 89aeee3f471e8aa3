//! The ambient cancellation/timeout signal spec.md §4.D/§5 describes: "a
//! resolver may declare a leading context parameter; the executor supplies the
//! ambient cancellation/timeout context" and "a caller-supplied cancellation
//! signal is propagated into every resolver call."
//!
//! Rust resolvers have no implicit leading parameter the way the original's
//! callables do, so the token is instead carried explicitly on
//! [`crate::registry::InvokeArgs`] — a resolver that cares reads
//! `args.cancellation`, one that doesn't simply ignores the field.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::task::AtomicWaker;

struct Inner {
    cancelled: AtomicBool,
    waker: AtomicWaker,
}

/// A cheaply cloned handle a caller can use to signal cancellation, and that
/// the executor threads into every in-flight resolver invocation.
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationToken {
    /// Creates a fresh, not-yet-cancelled token.
    pub fn new() -> Self {
        CancellationToken {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                waker: AtomicWaker::new(),
            }),
        }
    }

    /// A token that will never be cancelled, for callers that don't need the
    /// feature.
    pub fn none() -> Self {
        Self::new()
    }

    /// Signals cancellation, waking any pending [`CancellationToken::cancelled`] future.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.waker.wake();
    }

    /// `true` once [`CancellationToken::cancel`] has been called.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// A future that resolves the moment this token is cancelled.
    pub fn cancelled(&self) -> Cancelled {
        Cancelled { token: self.clone() }
    }
}

/// See [`CancellationToken::cancelled`].
pub struct Cancelled {
    token: CancellationToken,
}

impl Future for Cancelled {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.token.is_cancelled() {
            return Poll::Ready(());
        }
        self.token.inner.waker.register(cx.waker());
        if self.token.is_cancelled() {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}
