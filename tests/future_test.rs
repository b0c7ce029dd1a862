#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use futures::future::join_all;
    use pool_future::{
        Error, Future, Job, Outcome, Pool, PoolConfig, SubmitError, ThreadPool, WaitStrategy,
    };
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{mpsc, Arc, Barrier};
    use std::thread;
    use std::time::{Duration, Instant};
    use tracing_subscriber::EnvFilter;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn pool(workers: usize) -> ThreadPool {
        init_tracing();
        ThreadPool::new(PoolConfig::default().workers(workers)).expect("pool should start")
    }

    fn add(a: i32, b: i32) -> Result<i32, Error> {
        Ok(a + b)
    }

    fn wait(ms: u64) -> Result<bool, Error> {
        thread::sleep(Duration::from_millis(ms));
        Ok(true)
    }

    fn divide(a: i32, b: i32) -> Result<i32, MathError> {
        if b == 0 {
            Err(MathError::DivideByZero)
        } else {
            Ok(a / b)
        }
    }

    #[derive(Debug, PartialEq, thiserror::Error)]
    enum MathError {
        #[error("division by zero")]
        DivideByZero,
        #[error(transparent)]
        Future(#[from] Error),
    }

    #[test]
    fn test_add_after_done() {
        let pool = pool(2);
        let mut future: Future<i32> = Future::new();
        future.start(&pool, add, (2, 40));
        assert!(future.started());
        while !future.done() {
            thread::yield_now();
        }
        assert_eq!(future.take(), Outcome::Success(42));
        assert_eq!(future.take(), Outcome::Pending);
    }

    #[test]
    fn test_take_unwrapped_blocks_until_settled() {
        let pool = pool(1);
        let mut future: Future<bool> = Future::new();
        let begin = Instant::now();
        future.start(&pool, wait, (1000,));
        assert_eq!(future.take_unwrapped(), Ok(true));
        assert!(begin.elapsed() >= Duration::from_millis(1000));
    }

    #[test]
    fn test_refused_submission_never_runs() {
        let pool = pool(1);
        pool.shutdown();

        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        let mut future: Future<()> = Future::new();
        future.start(
            &pool,
            move || {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            },
            (),
        );

        assert!(future.started());
        assert!(future.done());
        assert_eq!(
            future.take(),
            Outcome::Failure(Error::Submit(SubmitError::ShutDown))
        );
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_queue_full_settles_immediately() {
        let pool = ThreadPool::new(PoolConfig::default().workers(1).queue_capacity(1)).unwrap();
        let started = Arc::new(Barrier::new(2));
        let release = Arc::new(Barrier::new(2));

        let (s, r) = (Arc::clone(&started), Arc::clone(&release));
        let mut busy: Future<()> = Future::new();
        busy.start(
            &pool,
            move || {
                s.wait();
                r.wait();
                Ok(())
            },
            (),
        );
        started.wait();

        let mut queued: Future<i32> = Future::new();
        queued.start(&pool, add, (1, 2));
        let mut refused: Future<i32> = Future::new();
        refused.start(&pool, add, (3, 4));
        assert_eq!(
            refused.take_unwrapped(),
            Err(Error::Submit(SubmitError::QueueFull))
        );

        release.wait();
        assert_eq!(busy.take_unwrapped(), Ok(()));
        assert_eq!(queued.take_unwrapped(), Ok(3));
    }

    #[test]
    fn test_custom_error_passes_through() {
        let pool = pool(2);
        let mut future: Future<i32, MathError> = Future::new();

        future.start(&pool, divide, (1, 0));
        assert_eq!(future.take(), Outcome::Failure(MathError::DivideByZero));

        future.start(&pool, divide, (1, 0));
        assert_eq!(future.take_unwrapped(), Err(MathError::DivideByZero));

        future.start(&pool, divide, (9, 3));
        assert_eq!(future.take_unwrapped(), Ok(3));
        assert_eq!(
            future.take_unwrapped(),
            Err(MathError::Future(Error::NoValue))
        );
    }

    #[test]
    fn test_reuse_is_independent() {
        let pool = pool(4);
        let mut future: Future<String> = Future::new();

        future.start(&pool, |s: &str, n: usize| Ok(s.repeat(n)), ("ab", 2));
        assert_eq!(future.take_unwrapped(), Ok("abab".to_string()));

        future.start(&pool, |s: &str, n: usize| Ok(s.repeat(n)), ("🍓", 3));
        assert_eq!(future.take_unwrapped(), Ok("🍓🍓🍓".to_string()));
        assert_eq!(future.take(), Outcome::Pending);
    }

    #[test]
    fn test_every_wait_strategy() {
        let pool = pool(4);
        for strategy in [WaitStrategy::Spin, WaitStrategy::Yield, WaitStrategy::Park] {
            let mut future: Future<i32> = Future::new().with_wait_strategy(strategy);
            for i in 0..200 {
                future.start(&pool, add, (i, 1));
                assert_eq!(future.take_unwrapped(), Ok(i + 1));
            }
        }
    }

    #[test]
    fn test_panicking_task_is_failure() {
        let pool = pool(1);
        let mut future: Future<i32> = Future::new();
        future.start(
            &pool,
            |v: Vec<i32>| -> Result<i32, Error> { Ok(v[10]) },
            (vec![1, 2, 3],),
        );
        match future.take() {
            Outcome::Failure(Error::Panicked(message)) => assert!(message.contains("index out of bounds")),
            other => panic!("expected a panic failure, got {other:?}"),
        }

        // The worker survived and the future is reusable.
        future.start(&pool, add, (20, 22));
        assert_eq!(future.take_unwrapped(), Ok(42));
    }

    #[test]
    fn test_try_take_while_running() {
        let pool = pool(1);
        let (tx, rx) = mpsc::channel::<()>();
        let mut future: Future<&'static str> = Future::new();
        future.start(
            &pool,
            move || -> Result<&'static str, Error> {
                rx.recv().map_err(|e| Error::Work(e.to_string()))?;
                Ok("🍓")
            },
            (),
        );

        assert_eq!(future.try_take(), None);
        assert!(future.started());
        assert!(!future.done());

        tx.send(()).unwrap();
        assert_eq!(future.take(), Outcome::Success("🍓"));
        assert_eq!(future.try_take(), Some(Outcome::Pending));
    }

    #[test]
    fn test_done_observed_from_another_thread() {
        let pool = pool(1);
        let mut future: Future<bool> = Future::new();
        future.start(&pool, wait, (50,));

        thread::scope(|scope| {
            let observer = scope.spawn(|| {
                while !future.done() {
                    thread::yield_now();
                }
                future.started()
            });
            assert!(observer.join().expect("The observer thread has panicked"));
        });

        assert_eq!(future.take_unwrapped(), Ok(true));
    }

    #[test]
    fn test_restart_while_running_detaches() {
        let pool = pool(2);
        let (tx, rx) = mpsc::channel::<()>();
        let (finished_tx, finished_rx) = mpsc::channel::<()>();
        let mut future: Future<i32> = Future::new();

        future.start(
            &pool,
            move || -> Result<i32, Error> {
                rx.recv().map_err(|e| Error::Work(e.to_string()))?;
                finished_tx.send(()).map_err(|e| Error::Work(e.to_string()))?;
                Ok(1)
            },
            (),
        );
        future.start(&pool, add, (2, 2));
        assert_eq!(future.take_unwrapped(), Ok(4));

        tx.send(()).unwrap();
        finished_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("detached cycle should still finish");
        assert_eq!(future.take(), Outcome::Pending);
    }

    #[test]
    fn test_take_async() {
        let pool = pool(2);
        let mut future: Future<bool> = Future::new();
        future.start(&pool, wait, (100,));
        assert_eq!(block_on(future.take_async()), Outcome::Success(true));
        assert_eq!(block_on(future.take_async()), Outcome::Pending);
    }

    #[test]
    fn test_take_async_many() {
        let pool = pool(4);
        let mut futures: Vec<Future<i32>> = (0..16).map(|_| Future::new()).collect();
        for (i, future) in futures.iter_mut().enumerate() {
            future.start(&pool, add, (i as i32, 100));
        }
        let outcomes = block_on(join_all(futures.iter_mut().map(Future::take_async)));
        let expected: Vec<Outcome<i32>> = (0..16).map(|i| Outcome::Success(i + 100)).collect();
        assert_eq!(outcomes, expected);
    }

    /// Runs every job on a freshly spawned thread.
    struct SpawnPerJob;

    impl Pool for SpawnPerJob {
        fn submit(&self, job: Job) -> Result<(), SubmitError> {
            thread::Builder::new()
                .spawn(job)
                .map(|_| ())
                .map_err(|e| SubmitError::Rejected(e.to_string()))
        }
    }

    #[test]
    fn test_custom_pool() {
        init_tracing();
        let pool = Arc::new(SpawnPerJob);
        let mut future: Future<i32> = Future::new();
        future.start(&pool, add, (40, 2));
        assert_eq!(future.take_unwrapped(), Ok(42));
    }
}
