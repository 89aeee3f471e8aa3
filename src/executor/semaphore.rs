//! A minimal async counting semaphore.
//!
//! The core library is deliberately runtime-agnostic (see SPEC_FULL.md §1
//! "Logging"/Cargo features): it depends on `futures` for its Future/Stream
//! plumbing but not on `tokio`, so `maxConcurrentResolvers` (spec.md §5 "Shared-
//! resource policy") cannot be enforced with a runtime-provided semaphore. This
//! hand-rolled one only needs `Future`/`Waker`, which `futures` already gives us.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};

pub(crate) struct Semaphore {
    permits: AtomicUsize,
    waiters: Mutex<VecDeque<Waker>>,
}

impl Semaphore {
    pub(crate) fn new(permits: usize) -> Self {
        Semaphore {
            permits: AtomicUsize::new(permits),
            waiters: Mutex::new(VecDeque::new()),
        }
    }

    fn try_acquire(&self) -> bool {
        let mut current = self.permits.load(Ordering::Acquire);
        loop {
            if current == 0 {
                return false;
            }
            match self.permits.compare_exchange_weak(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    fn release(&self) {
        self.permits.fetch_add(1, Ordering::AcqRel);
        if let Some(waker) = self.waiters.lock().expect("semaphore lock poisoned").pop_front() {
            waker.wake();
        }
    }

    pub(crate) fn acquire(self: &Arc<Self>) -> Acquire {
        Acquire { sem: Arc::clone(self) }
    }
}

pub(crate) struct Acquire {
    sem: Arc<Semaphore>,
}

impl Future for Acquire {
    type Output = SemaphoreGuard;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.sem.try_acquire() {
            return Poll::Ready(SemaphoreGuard { sem: Arc::clone(&self.sem) });
        }
        self.sem.waiters.lock().expect("semaphore lock poisoned").push_back(cx.waker().clone());
        // Re-check after registering the waker to avoid missing a concurrent release.
        if self.sem.try_acquire() {
            return Poll::Ready(SemaphoreGuard { sem: Arc::clone(&self.sem) });
        }
        Poll::Pending
    }
}

pub(crate) struct SemaphoreGuard {
    sem: Arc<Semaphore>,
}

impl Drop for SemaphoreGuard {
    fn drop(&mut self) {
        self.sem.release();
    }
}
