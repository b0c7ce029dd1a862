//! The reusable single-producer/single-consumer future.
//!
//! One cycle goes: `start` (Idle -> Running), the worker stores the outcome
//! and publishes `done` (Running -> Settled), a taking operation moves the
//! outcome out and leaves `Pending` behind (Settled -> Idle). The outcome
//! cell is written by exactly one party per cycle, either the worker or
//! `start` itself when the pool refuses the job, and that write is published
//! by the Release store of `done`.
//!
//! `start` and the taking operations borrow the future mutably, so a second
//! consumer or a start racing a take is rejected at compile time. The flag
//! observers only need a shared borrow and can be called from any thread.

use std::any::Any;
use std::cell::UnsafeCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::pool::{Job, Pool};
use crate::task::{Task, TaskWith};
use crate::wait::{Signal, Take, WaitStrategy};
use crate::{Error, Outcome};

struct Shared<T, E> {
    outcome: UnsafeCell<Outcome<T, E>>,
    started: AtomicBool,
    done: Signal,
}

// The outcome cell is only touched by the single writer of a cycle before
// `done` is published, and by the `&mut` owner of the `Future` after it
// observed `done` (or before the cycle was submitted).
unsafe impl<T: Send, E: Send> Sync for Shared<T, E> {}

impl<T, E> Shared<T, E> {
    fn new() -> Self {
        Self {
            outcome: UnsafeCell::new(Outcome::Pending),
            started: AtomicBool::new(false),
            done: Signal::new(),
        }
    }

    /// Stores the final outcome and publishes `done`.
    ///
    /// # Safety
    ///
    /// Must be called at most once per cycle, by the only writer of that
    /// cycle, and nobody may read the outcome until `done` is observed.
    unsafe fn settle(&self, outcome: Outcome<T, E>) {
        unsafe { *self.outcome.get() = outcome };
        self.done.set();
    }
}

/// Eventual outcome of a task run on a [`Pool`].
///
/// # Examples
///
/// ```
/// use pool_future::{Future, PoolConfig, ThreadPool};
///
/// fn add(a: u64, b: u64) -> Result<u64, pool_future::Error> {
///     Ok(a + b)
/// }
///
/// let pool = ThreadPool::new(PoolConfig::default().workers(2)).unwrap();
/// let mut future: Future<u64> = Future::new();
///
/// future.start(&pool, add, (2, 40));
/// assert_eq!(future.take_unwrapped(), Ok(42));
///
/// // The same future can run another cycle.
/// future.start(&pool, add, (1, 1));
/// assert_eq!(future.take_unwrapped(), Ok(2));
/// ```
pub struct Future<T, E = Error> {
    shared: Arc<Shared<T, E>>,
    strategy: WaitStrategy,
}

impl<T, E> Default for Future<T, E> {
    fn default() -> Self {
        Self {
            shared: Arc::new(Shared::new()),
            strategy: WaitStrategy::default(),
        }
    }
}

impl<T, E> Future<T, E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_wait_strategy(mut self, strategy: WaitStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn set_wait_strategy(&mut self, strategy: WaitStrategy) {
        self.strategy = strategy;
    }

    pub fn wait_strategy(&self) -> WaitStrategy {
        self.strategy
    }

    /// Whether a submission has been attempted for the current cycle.
    pub fn started(&self) -> bool {
        self.shared.started.load(Ordering::Acquire)
    }

    /// Whether the current cycle has settled.
    pub fn done(&self) -> bool {
        self.shared.done.is_set()
    }

    /// Waits until settled, then moves the outcome out and leaves `Pending`.
    ///
    /// A future that was never started cannot settle and yields `Pending`
    /// right away. A second take in the same cycle also yields `Pending`.
    pub fn take(&mut self) -> Outcome<T, E> {
        if !self.started() {
            return Outcome::Pending;
        }
        self.shared.done.wait(self.strategy);
        self.take_settled()
    }

    /// Like [`take`](Self::take), but as a `Result`.
    ///
    /// `Pending` is reported as [`Error::NoValue`].
    pub fn take_unwrapped(&mut self) -> Result<T, E>
    where
        E: From<Error>,
    {
        self.take().into_result()
    }

    /// Non-blocking take: `None` while the current cycle is still running.
    pub fn try_take(&mut self) -> Option<Outcome<T, E>> {
        if !self.started() {
            return Some(Outcome::Pending);
        }
        if !self.done() {
            return None;
        }
        Some(self.take_settled())
    }

    /// Waits for the outcome without blocking the calling thread.
    pub fn take_async(&mut self) -> Take<'_, T, E> {
        Take::new(self)
    }

    pub(crate) fn signal(&self) -> &Signal {
        &self.shared.done
    }

    /// Caller must have observed `done` through an Acquire load.
    pub(crate) fn take_settled(&mut self) -> Outcome<T, E> {
        // SAFETY: `done` was observed, so the writer of this cycle is finished
        // with the cell, and `&mut self` excludes every other reader.
        unsafe { (*self.shared.outcome.get()).take() }
    }

    /// Returns the future to a state where a new cycle can be submitted.
    fn begin_cycle(&mut self) {
        if self.started() && !self.done() {
            // Running work cannot be stopped. Let it finish into its own slot.
            tracing::warn!("future restarted while running, previous cycle detached");
            self.shared = Arc::new(Shared::new());
            return;
        }

        // SAFETY: either nothing was submitted or the last cycle has settled,
        // so no writer will touch the cell again.
        let stale = unsafe { (*self.shared.outcome.get()).take() };
        if !stale.is_pending() {
            tracing::warn!("future restarted before its outcome was taken, outcome dropped");
        }
        drop(stale);
        self.shared.started.store(false, Ordering::Release);
        self.shared.done.reset();
    }
}

impl<T, E> Future<T, E>
where
    T: Send + 'static,
    E: From<Error> + Send + 'static,
{
    /// Submits `task(args...)` to `pool`.
    ///
    /// Failures of the task, and a refused submission, end up in the
    /// outcome; `start` itself never fails.
    pub fn start<P, F, Args>(&mut self, pool: &P, task: F, args: Args)
    where
        P: Pool + ?Sized,
        F: Task<Args, T, E> + Send + 'static,
        Args: Send + 'static,
    {
        self.submit(pool, move || task.call(args));
    }

    /// Like [`start`](Self::start), passing `allocator` as the task's first
    /// argument. Whatever the task allocates with it is owned by the future
    /// until taken, and by the caller afterwards.
    pub fn start_with_allocator<P, A, F, Args>(&mut self, pool: &P, allocator: A, task: F, args: Args)
    where
        P: Pool + ?Sized,
        A: Send + 'static,
        F: TaskWith<A, Args, T, E> + Send + 'static,
        Args: Send + 'static,
    {
        self.submit(pool, move || task.call_with(allocator, args));
    }

    fn submit<P, W>(&mut self, pool: &P, work: W)
    where
        P: Pool + ?Sized,
        W: FnOnce() -> Result<T, E> + Send + 'static,
    {
        self.begin_cycle();

        // Set ahead of submission so that `done` never precedes `started`.
        self.shared.started.store(true, Ordering::Release);

        let shared = Arc::clone(&self.shared);
        let job: Job = Box::new(move || {
            let outcome = run(work);
            tracing::trace!(success = outcome.is_success(), "future settled");
            // SAFETY: the worker running this job is the cycle's only writer.
            unsafe { shared.settle(outcome) };
        });

        if let Err(err) = pool.submit(job) {
            tracing::debug!(error = %err, "pool refused work, settling with failure");
            // A pool may still run a job it refused. Leave the captured slot
            // to that job and settle a fresh one.
            self.shared = Arc::new(Shared::new());
            self.shared.started.store(true, Ordering::Release);
            // SAFETY: nothing outside this future has seen the fresh slot.
            unsafe { self.shared.settle(Outcome::Failure(E::from(Error::Submit(err)))) };
        } else {
            tracing::trace!("work submitted");
        }
    }
}

impl<T, E> fmt::Debug for Future<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Future")
            .field("started", &self.started())
            .field("done", &self.done())
            .field("strategy", &self.strategy)
            .finish()
    }
}

fn run<T, E, W>(work: W) -> Outcome<T, E>
where
    E: From<Error>,
    W: FnOnce() -> Result<T, E>,
{
    match panic::catch_unwind(AssertUnwindSafe(work)) {
        Ok(result) => Outcome::from(result),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(panic = %message, "task panicked");
            Outcome::Failure(E::from(Error::Panicked(message)))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
