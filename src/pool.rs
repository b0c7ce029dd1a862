//! Worker pool capability consumed by [`Future::start`](crate::Future::start).
//!
//! A pool only has to accept a boxed, zero-argument [`Job`] and run it on
//! some other thread. Submission may fail synchronously, in which case the
//! future settles with the [`SubmitError`] without any worker involvement.
//! [`ThreadPool`] is the bundled implementation: a fixed set of named threads
//! pulling jobs from one shared queue.

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender, SyncSender, TrySendError};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::{self, JoinHandle};

/// A unit of work handed to a pool.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Something that can run jobs on another thread.
pub trait Pool {
    fn submit(&self, job: Job) -> Result<(), SubmitError>;
}

impl<P: Pool + ?Sized> Pool for &P {
    fn submit(&self, job: Job) -> Result<(), SubmitError> {
        (**self).submit(job)
    }
}

impl<P: Pool + ?Sized> Pool for Arc<P> {
    fn submit(&self, job: Job) -> Result<(), SubmitError> {
        (**self).submit(job)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("job queue is full")]
    QueueFull,
    #[error("pool is shut down")]
    ShutDown,
    #[error("job rejected: {0}")]
    Rejected(String),
}

#[derive(thiserror::Error, Debug)]
pub enum PoolError {
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] io::Error),
    #[error("pool needs at least one worker")]
    NoWorkers,
}

/// Settings for [`ThreadPool`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub workers: usize,
    /// `None` means an unbounded queue. `Some(0)` is a rendezvous queue:
    /// a submission is refused unless a worker is idle and waiting.
    pub queue_capacity: Option<usize>,
    pub thread_name: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: std::env::var("POOL_FUTURE_WORKERS")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .filter(|&n| n > 0)
                .or_else(|| thread::available_parallelism().ok().map(|n| n.get()))
                .unwrap_or(1),
            queue_capacity: std::env::var("POOL_FUTURE_QUEUE_CAPACITY")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .filter(|&n| n > 0),
            thread_name: "pool-future-worker".to_string(),
        }
    }
}

impl PoolConfig {
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    pub fn unbounded(mut self) -> Self {
        self.queue_capacity = None;
        self
    }

    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }
}

enum QueueSender {
    Bounded(SyncSender<Job>),
    Unbounded(Sender<Job>),
}

impl QueueSender {
    fn send(&self, job: Job) -> Result<(), SubmitError> {
        match self {
            QueueSender::Bounded(tx) => tx.try_send(job).map_err(|err| match err {
                TrySendError::Full(_) => SubmitError::QueueFull,
                TrySendError::Disconnected(_) => SubmitError::ShutDown,
            }),
            QueueSender::Unbounded(tx) => tx.send(job).map_err(|_| SubmitError::ShutDown),
        }
    }
}

/// Fixed-size pool of worker threads.
///
/// # Examples
///
/// ```
/// use pool_future::{Pool, PoolConfig, ThreadPool};
/// use std::sync::mpsc::channel;
///
/// let pool = ThreadPool::new(PoolConfig::default().workers(1)).unwrap();
/// let (tx, rx) = channel();
/// pool.submit(Box::new(move || tx.send("🍓").unwrap())).unwrap();
/// assert_eq!(rx.recv().unwrap(), "🍓");
/// ```
pub struct ThreadPool {
    sender: RwLock<Option<QueueSender>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    workers: usize,
}

impl ThreadPool {
    pub fn new(config: PoolConfig) -> Result<Self, PoolError> {
        if config.workers == 0 {
            return Err(PoolError::NoWorkers);
        }

        let (sender, receiver) = match config.queue_capacity {
            Some(capacity) => {
                let (tx, rx) = mpsc::sync_channel(capacity);
                (QueueSender::Bounded(tx), rx)
            }
            None => {
                let (tx, rx) = mpsc::channel();
                (QueueSender::Unbounded(tx), rx)
            }
        };
        let receiver = Arc::new(Mutex::new(receiver));

        let mut handles = Vec::with_capacity(config.workers);
        for index in 0..config.workers {
            let receiver = Arc::clone(&receiver);
            let handle = thread::Builder::new()
                .name(format!("{}-{index}", config.thread_name))
                .spawn(move || worker_loop(receiver))?;
            handles.push(handle);
        }

        tracing::debug!(
            workers = config.workers,
            queue_capacity = ?config.queue_capacity,
            "thread pool started"
        );

        Ok(Self {
            sender: RwLock::new(Some(sender)),
            handles: Mutex::new(handles),
            workers: config.workers,
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn is_shut_down(&self) -> bool {
        self.sender
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_none()
    }

    /// Stops accepting new jobs. Jobs already queued still run.
    pub fn shutdown(&self) {
        let sender = self
            .sender
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if sender.is_some() {
            tracing::debug!(workers = self.workers, "thread pool shutting down");
        }
    }
}

impl Pool for ThreadPool {
    fn submit(&self, job: Job) -> Result<(), SubmitError> {
        let sender = self
            .sender
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match sender.as_ref() {
            Some(sender) => sender.send(job),
            None => Err(SubmitError::ShutDown),
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
        let handles = std::mem::take(
            self.handles
                .get_mut()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        );
        let current = thread::current().id();
        for handle in handles {
            // A pool dropped from one of its own jobs cannot join itself.
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                tracing::error!("worker thread exited with a panic");
            }
        }
    }
}

fn worker_loop(receiver: Arc<Mutex<Receiver<Job>>>) {
    loop {
        let job = {
            let receiver = receiver
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            receiver.recv()
        };
        let Ok(job) = job else {
            break;
        };
        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
            tracing::error!("job panicked on worker thread");
        }
    }
}
