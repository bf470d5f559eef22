//! # Worker Pool
//!
//! A fixed-size set of worker threads pulling from one shared FIFO queue.
//!
//! ## Philosophy
//!
//! - **One queue, one lock**: submission and dequeue serialize through a
//!   single mutex paired with a wake signal.
//! - **Best-effort completion**: work still queued at shutdown is dropped,
//!   never run. Callers must not assume a submitted task always runs.
//! - **Explicit failure**: submitting to a stopped pool is an error, not a
//!   silent no-op.
//!
//! ## Example
//!
//! ```
//! use worker_pool::WorkerPool;
//!
//! let pool = WorkerPool::new(2);
//! let handle = pool.submit(|| 6 * 7).unwrap();
//! assert_eq!(handle.wait().unwrap(), 42);
//! pool.shutdown();
//! ```

mod handle;

pub use handle::TaskHandle;

use log::{debug, error};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use thiserror::Error;

/// Worker pool errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("Worker pool has been shut down")]
    ShutDown,

    #[error("Task was dropped before producing a result")]
    TaskDropped,
}

type Job = Box<dyn FnOnce() + Send + 'static>;

struct PoolState {
    queue: VecDeque<Job>,
    running: bool,
}

struct PoolShared {
    state: Mutex<PoolState>,
    available: Condvar,
}

/// Fixed-size worker pool
pub struct WorkerPool {
    shared: Arc<PoolShared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    threads: usize,
}

impl WorkerPool {
    /// Creates a pool with `threads` workers (at least one)
    pub fn new(threads: usize) -> Self {
        let threads = threads.max(1);
        let shared = Arc::new(PoolShared {
            state: Mutex::new(PoolState {
                queue: VecDeque::new(),
                running: true,
            }),
            available: Condvar::new(),
        });

        let mut workers = Vec::with_capacity(threads);
        for index in 0..threads {
            let shared = Arc::clone(&shared);
            let spawned = thread::Builder::new()
                .name(format!("worker-pool-{}", index))
                .spawn(move || worker_loop(index, shared));
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(err) => error!("failed to spawn worker {}: {}", index, err),
            }
        }
        debug!("worker pool started with {} threads", workers.len());

        Self {
            shared,
            workers: Mutex::new(workers),
            threads,
        }
    }

    /// Enqueues a unit of work
    ///
    /// Returns a handle that resolves to the task's result, or
    /// [`PoolError::ShutDown`] if the pool no longer accepts work.
    pub fn submit<F, T>(&self, task: F) -> Result<TaskHandle<T>, PoolError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (sender, receiver) = mpsc::sync_channel(1);
        let job: Job = Box::new(move || {
            // The receiver may already be gone; the result is then unwanted.
            let _ = sender.send(task());
        });

        let mut state = self.shared.state.lock();
        if !state.running {
            return Err(PoolError::ShutDown);
        }
        state.queue.push_back(job);
        drop(state);
        self.shared.available.notify_one();

        Ok(TaskHandle::new(receiver))
    }

    /// Stops accepting work and joins the workers
    ///
    /// Idle workers are woken, in-progress tasks run to completion, and
    /// tasks that have not started are dropped. Calling this more than
    /// once is harmless.
    pub fn shutdown(&self) {
        let dropped = {
            let mut state = self.shared.state.lock();
            state.running = false;
            std::mem::take(&mut state.queue)
        };
        if !dropped.is_empty() {
            debug!("worker pool dropping {} queued tasks", dropped.len());
        }
        drop(dropped);
        self.shared.available.notify_all();

        let workers = std::mem::take(&mut *self.workers.lock());
        for worker in workers {
            if worker.join().is_err() {
                error!("worker thread terminated abnormally");
            }
        }
    }

    /// Returns true while the pool accepts work
    pub fn is_running(&self) -> bool {
        self.shared.state.lock().running
    }

    /// Returns the number of tasks waiting for a worker
    pub fn queued(&self) -> usize {
        self.shared.state.lock().queue.len()
    }

    /// Returns the configured number of workers
    pub fn threads(&self) -> usize {
        self.threads
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(index: usize, shared: Arc<PoolShared>) {
    loop {
        let job = {
            let mut state = shared.state.lock();
            while state.running && state.queue.is_empty() {
                shared.available.wait(&mut state);
            }
            if !state.running {
                return;
            }
            match state.queue.pop_front() {
                Some(job) => job,
                None => continue,
            }
        };

        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
            error!("task panicked on worker {}", index);
        }
    }
}
