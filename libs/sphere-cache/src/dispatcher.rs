//! # Task Dispatcher
//!
//! Runs spherization jobs on a fixed-size rayon pool, keyed by task name.
//!
//! ## Behavior
//!
//! - **Non-blocking submit**: the job is queued and a [`TaskHandle`] returned
//! - **Single-flight**: submitting a name whose task is still pending returns
//!   the pending handle; the new job is dropped
//! - **Resubmission**: submitting a name whose task has finished replaces it
//!   with a fresh task
//! - **Blocking retrieval**: [`Dispatcher::result`] waits for a named task
//! - **Panics**: a panicking job completes with
//!   [`SpherizeError::ComputationFailure`] so waiters never hang
//!
//! ## Usage
//!
//! ```rust
//! use sphere_cache::{Dispatcher, DispatcherConfig};
//!
//! let dispatcher = Dispatcher::new(DispatcherConfig::with_workers(2)).unwrap();
//! dispatcher.submit("empty", |_cancel| Ok(Vec::new()));
//! assert!(dispatcher.result("empty").unwrap().is_empty());
//! ```

use crate::approximation::Approximation;
use crate::error::{SpherizeError, SpherizeResult};
use crate::lock;
use crate::params::DispatcherConfig;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use tracing::{debug, error};

/// Outcome of one task.
pub type TaskOutcome = SpherizeResult<Vec<Approximation>>;

// =============================================================================
// CANCELLATION
// =============================================================================

/// Cooperative cancellation flag shared between a handle and its job.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Returns true once cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

// =============================================================================
// TASK HANDLE
// =============================================================================

struct TaskState {
    name: String,
    outcome: Mutex<Option<TaskOutcome>>,
    done: Condvar,
    cancel: CancelToken,
}

/// Shared handle to a submitted task.
///
/// Cloning is cheap; every clone observes the same outcome.
#[derive(Clone)]
pub struct TaskHandle {
    state: Arc<TaskState>,
}

impl TaskHandle {
    fn new(name: String) -> Self {
        Self {
            state: Arc::new(TaskState {
                name,
                outcome: Mutex::new(None),
                done: Condvar::new(),
                cancel: CancelToken::default(),
            }),
        }
    }

    /// Task name.
    pub fn name(&self) -> &str {
        &self.state.name
    }

    /// Returns true once the task has completed, failed or been cancelled.
    pub fn is_finished(&self) -> bool {
        lock(&self.state.outcome).is_some()
    }

    /// Requests cancellation.
    ///
    /// A job that has not started yet completes with
    /// [`SpherizeError::Cancelled`]. A running job is only stopped if it
    /// checks its token.
    pub fn cancel(&self) {
        self.state.cancel.cancel();
    }

    /// Blocks until the task finishes and returns its outcome.
    pub fn wait(&self) -> TaskOutcome {
        let guard = lock(&self.state.outcome);
        let guard = self
            .state
            .done
            .wait_while(guard, |outcome| outcome.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(outcome) => outcome.clone(),
            None => Err(SpherizeError::computation(
                self.name(),
                "task finished without an outcome",
            )),
        }
    }

    fn token(&self) -> CancelToken {
        self.state.cancel.clone()
    }

    fn complete(&self, outcome: TaskOutcome) {
        *lock(&self.state.outcome) = Some(outcome);
        self.state.done.notify_all();
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("name", &self.state.name)
            .field("finished", &self.is_finished())
            .field("cancelled", &self.state.cancel.is_cancelled())
            .finish()
    }
}

// =============================================================================
// DISPATCHER
// =============================================================================

/// Bounded worker pool with a table of named tasks.
pub struct Dispatcher {
    pool: ThreadPool,
    tasks: Mutex<HashMap<String, TaskHandle>>,
}

impl Dispatcher {
    /// Starts a pool with `config.workers` threads.
    ///
    /// # Errors
    ///
    /// [`SpherizeError::InvalidParams`] for an out-of-range worker count,
    /// [`SpherizeError::WorkerPool`] if the threads cannot be spawned.
    pub fn new(config: DispatcherConfig) -> SpherizeResult<Self> {
        config.validate()?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(|index| format!("spherize-worker-{}", index))
            .build()
            .map_err(|err| SpherizeError::WorkerPool(err.to_string()))?;
        debug!(workers = config.workers, "started dispatcher");

        Ok(Self {
            pool,
            tasks: Mutex::new(HashMap::new()),
        })
    }

    /// Queues `job` under `name` and returns its handle.
    ///
    /// If a task with this name is still pending its handle is returned and
    /// `job` is dropped without running.
    pub fn submit<F>(&self, name: impl Into<String>, job: F) -> TaskHandle
    where
        F: FnOnce(&CancelToken) -> TaskOutcome + Send + 'static,
    {
        let name = name.into();
        let mut tasks = lock(&self.tasks);
        if let Some(existing) = tasks.get(&name) {
            if !existing.is_finished() {
                debug!(task = %name, "joining pending task");
                return existing.clone();
            }
        }

        let handle = TaskHandle::new(name.clone());
        tasks.insert(name, handle.clone());
        drop(tasks);

        let worker = handle.clone();
        self.pool.spawn(move || {
            let token = worker.token();
            if token.is_cancelled() {
                debug!(task = %worker.name(), "skipping cancelled task");
                worker.complete(Err(SpherizeError::Cancelled {
                    name: worker.name().to_string(),
                }));
                return;
            }

            let outcome = catch_unwind(AssertUnwindSafe(|| job(&token))).unwrap_or_else(|payload| {
                let message = panic_message(payload.as_ref());
                error!(task = %worker.name(), %message, "task panicked");
                Err(SpherizeError::computation(
                    worker.name(),
                    format!("worker panicked: {}", message),
                ))
            });
            worker.complete(outcome);
        });

        handle
    }

    /// Blocks until every tracked task has finished. The table is kept.
    pub fn await_all(&self) {
        let handles: Vec<TaskHandle> = lock(&self.tasks).values().cloned().collect();
        for handle in handles {
            // Outcomes are read later through `result`
            let _ = handle.wait();
        }
    }

    /// Blocks until the task named `name` finishes and returns its outcome.
    ///
    /// # Errors
    ///
    /// [`SpherizeError::UnknownTask`] if nothing was submitted under `name`,
    /// otherwise the task's own failure.
    pub fn result(&self, name: &str) -> TaskOutcome {
        self.handle(name)
            .ok_or_else(|| SpherizeError::UnknownTask {
                name: name.to_string(),
            })?
            .wait()
    }

    /// Handle of the task named `name`, if any.
    pub fn handle(&self, name: &str) -> Option<TaskHandle> {
        lock(&self.tasks).get(name).cloned()
    }

    /// Returns true if a task was ever submitted under `name`.
    pub fn contains(&self, name: &str) -> bool {
        lock(&self.tasks).contains_key(name)
    }

    /// Returns true if the task named `name` exists and has not finished.
    pub fn is_pending(&self, name: &str) -> bool {
        self.handle(name).is_some_and(|handle| !handle.is_finished())
    }

    /// Number of tasks queued or running.
    pub fn pending_count(&self) -> usize {
        lock(&self.tasks)
            .values()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    /// Number of worker threads.
    pub fn num_workers(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("workers", &self.num_workers())
            .field("tasks", &lock(&self.tasks).len())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
