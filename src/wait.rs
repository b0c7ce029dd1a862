//! How a consumer waits for a future to settle.
//!
//! The `done` flag of a future lives in a [`Signal`]. Setting it is a
//! Release store; every check is an Acquire load, so whatever the producer
//! wrote before `set` is visible to a consumer that saw the flag. Blocking
//! consumers may spin, yield, or park; async consumers register a `Waker`.
//! Parked threads and wakers are only ever notified *after* the store.

use std::future::Future as StdFuture;
use std::hint;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::task::{Context, Poll, Waker};
use std::thread::{self, Thread};

use crate::{Error, Future, Outcome};

/// Strategy used by the blocking taking operations.
///
/// None of them time out: a taking call returns only once the future has
/// settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitStrategy {
    /// Busy-wait on the flag.
    #[default]
    Spin,
    /// Poll the flag, yielding the time slice between polls.
    Yield,
    /// Park the waiting thread until the producer unparks it.
    Park,
}

#[derive(Debug)]
enum Waiter {
    Idle,
    Thread(Thread),
    Task(Waker),
}

impl Waiter {
    fn wake(self) {
        match self {
            Waiter::Idle => {}
            Waiter::Thread(thread) => thread.unpark(),
            Waiter::Task(waker) => waker.wake(),
        }
    }
}

/// Completion flag plus whoever is waiting on it.
#[derive(Debug)]
pub(crate) struct Signal {
    done: AtomicBool,
    waiter: Mutex<Waiter>,
}

impl Signal {
    pub(crate) fn new() -> Self {
        Self {
            done: AtomicBool::new(false),
            waiter: Mutex::new(Waiter::Idle),
        }
    }

    pub(crate) fn is_set(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    /// Publishes completion, then wakes the registered waiter, if any.
    pub(crate) fn set(&self) {
        self.done.store(true, Ordering::Release);
        let waiter = std::mem::replace(&mut *self.lock_waiter(), Waiter::Idle);
        waiter.wake();
    }

    pub(crate) fn reset(&self) {
        self.done.store(false, Ordering::Release);
        *self.lock_waiter() = Waiter::Idle;
    }

    pub(crate) fn wait(&self, strategy: WaitStrategy) {
        match strategy {
            WaitStrategy::Spin => {
                while !self.is_set() {
                    hint::spin_loop();
                }
            }
            WaitStrategy::Yield => {
                while !self.is_set() {
                    thread::yield_now();
                }
            }
            WaitStrategy::Park => {
                // Checking the flag and parking happens in a loop since
                // `park` may return spuriously.
                while !self.is_set() {
                    *self.lock_waiter() = Waiter::Thread(thread::current());
                    if self.is_set() {
                        break;
                    }
                    thread::park();
                }
                *self.lock_waiter() = Waiter::Idle;
            }
        }
    }

    /// Returns `true` if set; otherwise registers `waker` for the next `set`.
    pub(crate) fn poll_set(&self, waker: &Waker) -> bool {
        if self.is_set() {
            return true;
        }
        *self.lock_waiter() = Waiter::Task(waker.clone());
        self.is_set()
    }

    fn lock_waiter(&self) -> std::sync::MutexGuard<'_, Waiter> {
        self.waiter
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Async counterpart of [`Future::take`], returned by [`Future::take_async`].
///
/// Dropping it before it resolves leaves the outcome in the future.
///
/// # Examples
///
/// ```
/// use futures::executor::block_on;
/// use pool_future::{Future, Outcome, PoolConfig, ThreadPool};
///
/// let pool = ThreadPool::new(PoolConfig::default().workers(1)).unwrap();
/// let mut future: Future<String> = Future::new();
/// future.start(&pool, |s: &str| Ok(s.to_uppercase()), ("hi",));
/// assert_eq!(block_on(future.take_async()), Outcome::Success("HI".to_string()));
/// ```
#[derive(Debug)]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Take<'a, T, E = Error> {
    future: &'a mut Future<T, E>,
}

impl<'a, T, E> Take<'a, T, E> {
    pub(crate) fn new(future: &'a mut Future<T, E>) -> Self {
        Self { future }
    }
}

impl<T, E> StdFuture for Take<'_, T, E> {
    type Output = Outcome<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if !this.future.started() {
            return Poll::Ready(Outcome::Pending);
        }
        if this.future.signal().poll_set(cx.waker()) {
            Poll::Ready(this.future.take_settled())
        } else {
            Poll::Pending
        }
    }
}
