//! Execution strategies.
//!
//! A driver decides on which thread queued jobs are processed. The passive
//! driver pumps on whichever thread fires or starts the machine. The active
//! driver owns one worker thread that sleeps until work arrives.

use super::Shared;
use crate::core::{EventId, StateId};
use crate::error::StateMachineError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

pub(crate) trait Driver<S: StateId, E: EventId>: Send + Sync {
    fn is_running(&self) -> bool;

    /// Returns `false` when the driver was already running.
    fn start(&self, shared: &Arc<Shared<S, E>>) -> Result<bool, StateMachineError>;

    /// Returns `false` when the driver was not running.
    fn stop(&self, shared: &Shared<S, E>) -> Result<bool, StateMachineError>;

    /// Make sure queued jobs get processed.
    fn execute(&self, shared: &Arc<Shared<S, E>>) -> Result<(), StateMachineError>;
}

/// Processes jobs on the calling thread.
///
/// The core lock is only ever tried, never waited for: a thread that finds
/// it taken leaves its job in the queue for the thread already pumping. This
/// makes firing from inside an action enqueue and return instead of recursing.
pub(crate) struct PassiveDriver {
    running: AtomicBool,
}

impl PassiveDriver {
    pub(crate) fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
        }
    }
}

impl<S: StateId, E: EventId> Driver<S, E> for PassiveDriver {
    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn start(&self, _shared: &Arc<Shared<S, E>>) -> Result<bool, StateMachineError> {
        Ok(!self.running.swap(true, Ordering::SeqCst))
    }

    fn stop(&self, _shared: &Shared<S, E>) -> Result<bool, StateMachineError> {
        Ok(self.running.swap(false, Ordering::SeqCst))
    }

    fn execute(&self, shared: &Arc<Shared<S, E>>) -> Result<(), StateMachineError> {
        loop {
            if !self.running.load(Ordering::SeqCst) {
                return Ok(());
            }
            let Some(mut engine) = shared.core.try_lock() else {
                return Ok(());
            };
            engine.pump(&shared.queue, || self.running.load(Ordering::SeqCst))?;
            drop(engine);

            // Jobs queued while the lock was held but after the pump looked.
            if shared.queue.is_empty() {
                return Ok(());
            }
        }
    }
}

/// Processes jobs on one dedicated worker thread.
pub(crate) struct ActiveDriver {
    worker: Mutex<Option<JoinHandle<Result<(), StateMachineError>>>>,
}

impl ActiveDriver {
    pub(crate) fn new() -> Self {
        Self {
            worker: Mutex::new(None),
        }
    }

    fn join(handle: JoinHandle<Result<(), StateMachineError>>) -> Result<(), StateMachineError> {
        match handle.join() {
            Ok(result) => result,
            Err(_) => Err(StateMachineError::WorkerFailed {
                reason: "worker thread panicked".to_string(),
            }),
        }
    }
}

impl<S: StateId, E: EventId> Driver<S, E> for ActiveDriver {
    fn is_running(&self) -> bool {
        self.worker
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn start(&self, shared: &Arc<Shared<S, E>>) -> Result<bool, StateMachineError> {
        let mut worker = self.worker.lock();
        if let Some(handle) = worker.take() {
            if !handle.is_finished() {
                *worker = Some(handle);
                return Ok(false);
            }
            // A worker that died on its own reports its fault here.
            Self::join(handle)?;
        }

        shared.queue.reset_stop();
        let thread_shared = Arc::clone(shared);
        let handle = thread::Builder::new()
            .name(format!("{}-worker", shared.name))
            .spawn(move || run_worker(thread_shared))
            .map_err(|e| StateMachineError::WorkerFailed {
                reason: e.to_string(),
            })?;
        *worker = Some(handle);
        Ok(true)
    }

    fn stop(&self, shared: &Shared<S, E>) -> Result<bool, StateMachineError> {
        let mut worker = self.worker.lock();
        let Some(handle) = worker.take() else {
            return Ok(false);
        };
        shared.queue.request_stop();

        if handle.thread().id() == thread::current().id() {
            // Stopping from a callback: the loop ends after the current job.
            *worker = Some(handle);
            return Ok(true);
        }
        drop(worker);

        Self::join(handle)?;
        Ok(true)
    }

    fn execute(&self, _shared: &Arc<Shared<S, E>>) -> Result<(), StateMachineError> {
        // Enqueueing already woke the worker.
        Ok(())
    }
}

fn run_worker<S: StateId, E: EventId>(shared: Arc<Shared<S, E>>) -> Result<(), StateMachineError> {
    debug!(machine = %shared.name, "Worker started");
    loop {
        if shared.queue.stop_requested() {
            break;
        }
        {
            let mut engine = shared.core.lock();
            if let Err(e) = engine.pump(&shared.queue, || !shared.queue.stop_requested()) {
                error!(machine = %shared.name, error = %e, "Worker failed");
                return Err(e);
            }
        }
        if !shared.queue.wait() {
            break;
        }
    }
    debug!(machine = %shared.name, "Worker stopped");
    Ok(())
}
