// Copyright © 2024 Pathway

use std::fmt;
use std::mem::take;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use crossbeam_channel::{self as channel, RecvTimeoutError};
use log::debug;
use rayon::{ThreadPool, ThreadPoolBuilder};

use super::config::{RouterConfig, DEFAULT_THREAD_NAME_PREFIX};
use super::error::{DynResult, Error, Result};

/// Fixed-size set of worker threads.
///
/// At most `size` submitted tasks run at once; the rest wait in submission
/// order and start as workers free up. Dropping the pool does not wait for
/// its threads: each exits in the background once its current task ends.
pub struct WorkerPool {
    pool: ThreadPool,
    size: usize,
    stragglers: Stragglers,
}

/// Completion signals of tasks whose handles gave up waiting on them. Each
/// receiver disconnects once its task has returned.
type Stragglers = Arc<Mutex<Vec<channel::Receiver<()>>>>;

impl WorkerPool {
    pub fn new(size: usize) -> Result<Self> {
        Self::build(size, DEFAULT_THREAD_NAME_PREFIX)
    }

    pub fn from_config(config: &RouterConfig) -> Result<Self> {
        Self::build(config.pool_size, &config.thread_name_prefix)
    }

    fn build(size: usize, thread_name_prefix: &str) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidPoolSize(size));
        }
        let prefix = thread_name_prefix.to_string();
        let pool = ThreadPoolBuilder::new()
            .num_threads(size)
            .thread_name(move |index| format!("{prefix}-{index}"))
            .build()
            .map_err(Error::PoolCreation)?;
        debug!("worker pool with {size} thread(s) started");
        Ok(Self {
            pool,
            size,
            stragglers: Stragglers::default(),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Enqueues `task` and returns immediately. Errors returned by the task
    /// and panics raised inside it are both delivered through the handle.
    pub fn submit<T, F>(&self, task: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> DynResult<T> + Send + 'static,
    {
        let (sender, receiver) = channel::bounded(1);
        let (done_sender, done) = channel::bounded::<()>(0);
        self.pool.spawn_fifo(move || {
            let _done = done_sender;
            let outcome = match catch_unwind(AssertUnwindSafe(task)) {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(error)) => Err(Error::from(error)),
                Err(payload) => Err(Error::from_panic_payload(payload)),
            };
            // The handle may have been dropped after its deadline expired.
            sender.send(outcome).unwrap_or(());
        });
        TaskHandle {
            receiver,
            done,
            stragglers: self.stragglers.clone(),
            submitted_at: Instant::now(),
        }
    }

    /// Blocks until every task abandoned by [`TaskHandle::join_deadline`]
    /// has returned, so that a later batch gets the workers to itself.
    pub fn settle(&self) {
        let stragglers = take(
            &mut *self
                .stragglers
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        if stragglers.is_empty() {
            return;
        }
        debug!("waiting for {} abandoned task(s) to return", stragglers.len());
        for done in stragglers {
            // Only ever disconnects.
            done.recv().unwrap_or(());
        }
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        debug!("worker pool with {} thread(s) shutting down", self.size);
    }
}

/// Receiving end of one submitted task.
#[must_use = "dropping a handle discards the task outcome"]
pub struct TaskHandle<T> {
    receiver: channel::Receiver<Result<T>>,
    done: channel::Receiver<()>,
    stragglers: Stragglers,
    submitted_at: Instant,
}

impl<T> TaskHandle<T> {
    /// Blocks until the task finishes.
    pub fn join(self) -> Result<T> {
        self.receiver.recv().unwrap_or(Err(Error::TaskLost))
    }

    /// Blocks until the task finishes or `deadline` passes, whichever is
    /// first. A task that misses the deadline keeps running on its worker
    /// and its outcome is discarded; [`WorkerPool::settle`] waits for it.
    pub fn join_deadline(self, deadline: Instant) -> Result<T> {
        match self.receiver.recv_deadline(deadline) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => {
                self.stragglers
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(self.done);
                Err(Error::DeadlineExceeded(
                    deadline.saturating_duration_since(self.submitted_at),
                ))
            }
            Err(RecvTimeoutError::Disconnected) => Err(Error::TaskLost),
        }
    }

    pub fn is_finished(&self) -> bool {
        !self.receiver.is_empty()
    }
}
