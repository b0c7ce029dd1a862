//! A reusable, single-producer/single-consumer future for work executed on a
//! worker pool.
//!
//! A [`Future`] starts out idle. [`Future::start`] submits a task to a
//! [`Pool`]; the worker that runs it stores the task's [`Outcome`] and then
//! publishes `done`. The consumer takes the outcome with [`Future::take`] or
//! [`Future::take_unwrapped`], which leaves the future idle again and ready
//! for another `start`.
//!
//! # Examples
//!
//! ```
//! use pool_future::{Future, Outcome, PoolConfig, ThreadPool};
//!
//! fn add(a: i32, b: i32) -> Result<i32, pool_future::Error> {
//!     Ok(a + b)
//! }
//!
//! let pool = ThreadPool::new(PoolConfig::default().workers(2)).unwrap();
//! let mut future: Future<i32> = Future::new();
//! future.start(&pool, add, (2, 40));
//! assert_eq!(future.take(), Outcome::Success(42));
//! assert_eq!(future.take(), Outcome::Pending);
//! ```
pub mod future;
pub mod outcome;
pub mod pool;
pub mod task;
pub mod wait;

pub use future::Future;
pub use outcome::Outcome;
pub use pool::{Job, Pool, PoolConfig, PoolError, SubmitError, ThreadPool};
pub use task::{Task, TaskWith};
pub use wait::{Take, WaitStrategy};

/// Errors a future can report on its own behalf.
///
/// Futures parameterized with a custom error type convert these through
/// `From<Error>`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("work submission failed: {0}")]
    Submit(#[from] SubmitError),
    #[error("future holds no value")]
    NoValue,
    #[error("task panicked: {0}")]
    Panicked(String),
    /// Never produced by the crate. Lets tasks of a `Future<T>` with the
    /// default error type report their own failures.
    #[error("task failed: {0}")]
    Work(String),
}
