use core::{
    future::Future,
    num::NonZero,
    pin::Pin,
    sync::atomic::{AtomicUsize, Ordering},
};
use std::{
    sync::{
        mpsc::{self, Sender},
        Arc, Mutex,
    },
    thread::{Builder, JoinHandle},
};

use anyhow::Error;
use tokio::runtime;

/// A unit of benchmarked work, boxed for submission.
pub type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Concurrency backend dispatching jobs.
///
/// A closed set of two variants behind one `submit` surface, selected when
/// the benchmark run is constructed. Submission never blocks the caller;
/// completion is observed through whatever the jobs themselves signal.
#[derive(Debug)]
pub enum Executor {
    BoundedPool(BoundedPool),
    Unbounded(Unbounded),
}

impl Executor {
    /// Constructs the bounded variant: a fixed pool of reusable OS worker
    /// threads.
    pub fn bounded_pool(workers: NonZero<usize>) -> Result<Self, Error> {
        Ok(Self::BoundedPool(BoundedPool::new(workers)?))
    }

    /// Constructs the unbounded variant: one lightweight task per submission,
    /// multiplexed over few OS threads.
    pub fn unbounded() -> Result<Self, Error> {
        Ok(Self::Unbounded(Unbounded::new()?))
    }

    /// Enqueues or spawns the given job and returns immediately.
    ///
    /// Jobs submitted after [`Executor::close`] are dropped.
    pub fn submit(&self, job: Job) {
        match self {
            Self::BoundedPool(v) => v.submit(job),
            Self::Unbounded(v) => v.submit(job),
        }
    }

    /// Number of currently live workers.
    pub fn live_workers(&self) -> usize {
        match self {
            Self::BoundedPool(v) => v.live_workers(),
            Self::Unbounded(v) => v.live_workers(),
        }
    }

    /// Shuts this executor down. Idempotent, never blocks.
    ///
    /// No further jobs are accepted afterwards. Worker teardown is deferred
    /// to drop so a metrics capture taken right after closing still observes
    /// the workers.
    pub fn close(&mut self) {
        match self {
            Self::BoundedPool(v) => v.close(),
            Self::Unbounded(v) => v.close(),
        }
    }
}

/// Fixed-size pool of OS worker threads.
///
/// Each worker owns a current-thread tokio runtime and drives one job at a
/// time to completion, so at most `workers` jobs ever run concurrently and
/// a job waiting on I/O occupies its worker for the whole wait. Excess jobs
/// queue until a worker frees.
#[derive(Debug)]
pub struct BoundedPool {
    tx: Option<Sender<Job>>,
    threads: Vec<JoinHandle<()>>,
    live: Arc<AtomicUsize>,
    closed: bool,
}

impl BoundedPool {
    pub fn new(workers: NonZero<usize>) -> Result<Self, Error> {
        let (tx, rx) = mpsc::channel::<Job>();
        let rx = Arc::new(Mutex::new(rx));
        let live = Arc::new(AtomicUsize::new(0));

        let name = "fanbench:w".to_string();
        let mut threads = Vec::with_capacity(workers.get());
        for _ in 0..workers.get() {
            let thread = {
                let rx = rx.clone();
                let live = live.clone();

                Builder::new().name(name.clone()).spawn(move || {
                    let rt = match runtime::Builder::new_current_thread().enable_all().build() {
                        Ok(rt) => rt,
                        Err(err) => {
                            log::error!("failed to build worker runtime: {err}");
                            return;
                        }
                    };

                    live.fetch_add(1, Ordering::Relaxed);
                    loop {
                        // The guard is released at the end of the statement,
                        // before the job runs.
                        let job = match rx.lock() {
                            Ok(rx) => rx.recv(),
                            Err(..) => break,
                        };

                        match job {
                            Ok(job) => rt.block_on(job),
                            // Channel closed and drained.
                            Err(..) => break,
                        }
                    }
                    live.fetch_sub(1, Ordering::Relaxed);
                })?
            };

            threads.push(thread);
        }

        Ok(Self {
            tx: Some(tx),
            threads,
            live,
            closed: false,
        })
    }

    pub fn submit(&self, job: Job) {
        if self.closed {
            log::debug!("job dropped: pool is closed");
            return;
        }

        match &self.tx {
            Some(tx) => {
                if tx.send(job).is_err() {
                    log::debug!("job dropped: all workers exited");
                }
            }
            None => log::debug!("job dropped: pool is closed"),
        }
    }

    pub fn live_workers(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }

    /// Shared live-worker gauge, for metrics collectors.
    pub fn worker_gauge(&self) -> Arc<AtomicUsize> {
        self.live.clone()
    }

    /// Stops accepting jobs. Never blocks.
    ///
    /// The workers drain whatever was already queued and then park; they
    /// exit and are joined when the pool is dropped, so the pool stays
    /// observable by metrics captures taken between close and drop.
    pub fn close(&mut self) {
        self.closed = true;
    }
}

impl Drop for BoundedPool {
    fn drop(&mut self) {
        self.closed = true;
        drop(self.tx.take());

        for thread in self.threads.drain(..) {
            if thread.join().is_err() {
                log::error!("worker thread panicked");
            }
        }
    }
}

/// One lightweight task per submission.
///
/// Owns a multi-thread tokio runtime; every job becomes a spawned task and
/// yields its OS thread back to the runtime while awaiting I/O, which is the
/// entire point of the comparison. The live worker count here is the
/// runtime's thread count, expected to stay far below the job count.
#[derive(Debug)]
pub struct Unbounded {
    rt: Option<runtime::Runtime>,
}

impl Unbounded {
    pub fn new() -> Result<Self, Error> {
        let rt = runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("fanbench:rt")
            .build()?;

        Ok(Self { rt: Some(rt) })
    }

    pub fn submit(&self, job: Job) {
        match &self.rt {
            Some(rt) => {
                rt.spawn(job);
            }
            None => log::debug!("job dropped: runtime is closed"),
        }
    }

    pub fn live_workers(&self) -> usize {
        self.rt.as_ref().map_or(0, |rt| rt.metrics().num_workers())
    }

    /// Shuts the runtime down without blocking on its worker threads.
    pub fn close(&mut self) {
        if let Some(rt) = self.rt.take() {
            rt.shutdown_background();
        }
    }
}

#[cfg(test)]
mod test {
    use core::time::Duration;
    use std::time::Instant;

    use super::*;
    use crate::latch::Latch;

    #[test]
    fn test_bounded_pool_caps_concurrency() {
        let workers = NonZero::new(4).unwrap();
        let mut exec = Executor::bounded_pool(workers).unwrap();

        let latch = Latch::new(32);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        for _ in 0..32 {
            let guard = latch.guard();
            let in_flight = in_flight.clone();
            let peak = peak.clone();

            exec.submit(Box::pin(async move {
                let _guard = guard;

                let cur = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(cur, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }));
        }

        latch.wait();
        exec.close();

        let peak = peak.load(Ordering::SeqCst);
        assert!(peak >= 1);
        assert!(peak <= 4, "peak concurrency {peak} exceeds pool size");
    }

    #[test]
    fn test_bounded_pool_reports_live_workers() {
        let workers = NonZero::new(3).unwrap();
        let mut exec = Executor::bounded_pool(workers).unwrap();

        // Workers register themselves after spawning.
        let deadline = Instant::now() + Duration::from_secs(1);
        while exec.live_workers() < 3 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(exec.live_workers(), 3);

        // Closing parks the workers but keeps them alive until drop.
        exec.close();
        assert_eq!(exec.live_workers(), 3);
    }

    #[test]
    fn test_close_does_not_block_on_inflight_jobs() {
        let workers = NonZero::new(2).unwrap();
        let mut exec = Executor::bounded_pool(workers).unwrap();

        let started = Latch::new(1);
        let done = Latch::new(1);
        {
            let started = started.clone();
            let guard = done.guard();

            exec.submit(Box::pin(async move {
                let _guard = guard;
                started.count_down();
                tokio::time::sleep(Duration::from_millis(200)).await;
            }));
        }

        started.wait();
        let closing = Instant::now();
        exec.close();

        assert!(closing.elapsed() < Duration::from_millis(100), "close blocked on a running job");
        assert!(exec.live_workers() >= 1);

        done.wait();
    }

    #[test]
    fn test_unbounded_runs_suspended_jobs_concurrently() {
        let mut exec = Executor::unbounded().unwrap();

        let latch = Latch::new(64);
        let start = Instant::now();

        for _ in 0..64 {
            let guard = latch.guard();

            exec.submit(Box::pin(async move {
                let _guard = guard;
                tokio::time::sleep(Duration::from_millis(50)).await;
            }));
        }

        latch.wait();
        let elapsed = start.elapsed();
        exec.close();

        // 64 serialized jobs would take 3.2s; concurrent ones take ~50ms.
        assert!(elapsed >= Duration::from_millis(50));
        assert!(elapsed < Duration::from_secs(1), "jobs were serialized: {elapsed:?}");
    }

    #[test]
    fn test_submit_after_close_is_dropped() {
        let workers = NonZero::new(1).unwrap();
        let mut exec = Executor::bounded_pool(workers).unwrap();
        exec.close();
        exec.close();

        let latch = Latch::new(1);
        let guard = latch.guard();
        exec.submit(Box::pin(async move {
            let _guard = guard;
        }));

        // The job is dropped unexecuted; dropping it releases the guard.
        latch.wait();
    }
}
