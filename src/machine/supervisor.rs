//! Do-action supervision.
//!
//! Each entry into a state starts a new occupancy identified by a
//! generation number. The do-actions of that occupancy run on their own
//! threads and share one cancellation token, which is cancelled when the
//! state is exited. Once every action returned `Ok` without being cancelled,
//! a `Completion` job tagged with the generation is queued; the engine drops
//! completions whose generation is no longer current.

use super::queue::Job;
use super::EventSender;
use crate::core::{ActionError, DoAction, EventId, StateId, TransitionContext};
use crate::hierarchy::StateKey;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};

struct Occupancy {
    generation: u64,
    cancellation: CancellationToken,
}

/// Outcome aggregation for the do-actions of one occupancy.
struct CompletionTracker {
    remaining: AtomicUsize,
    faulted: AtomicBool,
}

impl CompletionTracker {
    fn new(actions: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(actions),
            faulted: AtomicBool::new(false),
        }
    }

    fn fault(&self) {
        self.faulted.store(true, Ordering::SeqCst);
    }

    /// Record one finished action, returning true for the last one.
    fn finish(&self) -> bool {
        self.remaining.fetch_sub(1, Ordering::SeqCst) == 1
    }

    fn faulted(&self) -> bool {
        self.faulted.load(Ordering::SeqCst)
    }
}

/// Occupancy of one state being started.
pub(crate) struct Launch<'a, S: StateId, E: EventId> {
    pub(crate) state: StateKey,
    pub(crate) id: &'a S,
    pub(crate) actions: &'a [DoAction<S, E>],
    pub(crate) completes: bool,
}

pub(crate) struct Supervisor {
    machine: String,
    occupancies: HashMap<StateKey, Occupancy>,
    next_generation: u64,
}

impl Supervisor {
    pub(crate) fn new(machine: impl Into<String>) -> Self {
        Self {
            machine: machine.into(),
            occupancies: HashMap::new(),
            next_generation: 0,
        }
    }

    /// Start the do-actions of a freshly entered state.
    ///
    /// A state with completion transitions but no do-actions completes
    /// right away.
    pub(crate) fn start<S: StateId, E: EventId>(
        &mut self,
        launch: Launch<'_, S, E>,
        sender: &EventSender<S, E>,
    ) {
        let generation = self.next_generation;
        self.next_generation += 1;
        let cancellation = CancellationToken::new();
        self.occupancies.insert(
            launch.state,
            Occupancy {
                generation,
                cancellation: cancellation.clone(),
            },
        );

        if launch.actions.is_empty() {
            if launch.completes {
                trace!(machine = %self.machine, state = ?launch.id, "State completes on entry");
                sender.enqueue(Job::Completion {
                    state: launch.state,
                    generation,
                });
            }
            return;
        }

        let tracker = Arc::new(CompletionTracker::new(launch.actions.len()));
        for (index, action) in launch.actions.iter().enumerate() {
            let worker = DoActionWorker {
                state: launch.state,
                id: launch.id.clone(),
                generation,
                completes: launch.completes,
                action: action.clone(),
                cancellation: cancellation.child_token(),
                tracker: Arc::clone(&tracker),
                sender: sender.clone(),
            };
            let name = format!("{}-do-{:?}-{}", self.machine, launch.id, index);
            debug!(machine = %self.machine, state = ?launch.id, action = action.describe(), "Starting do-action");

            if let Err(spawn_error) = thread::Builder::new().name(name).spawn(move || worker.run()) {
                error!(machine = %self.machine, state = ?launch.id, error = %spawn_error, "Cannot spawn do-action thread");
                tracker.fault();
                sender.enqueue(Job::DoActionFault {
                    state: launch.state,
                    error: Box::new(spawn_error),
                });
            }
        }
    }

    /// Cancel the do-actions of an exited state.
    pub(crate) fn cancel(&mut self, state: StateKey) {
        if let Some(occupancy) = self.occupancies.remove(&state) {
            trace!(machine = %self.machine, generation = occupancy.generation, "Cancelling do-actions");
            occupancy.cancellation.cancel();
        }
    }

    /// Whether a completion belongs to the current occupancy of `state`.
    pub(crate) fn is_current(&self, state: StateKey, generation: u64) -> bool {
        self.occupancies
            .get(&state)
            .is_some_and(|occupancy| occupancy.generation == generation)
    }

    pub(crate) fn cancel_all(&mut self) {
        for (_, occupancy) in self.occupancies.drain() {
            occupancy.cancellation.cancel();
        }
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

struct DoActionWorker<S: StateId, E: EventId> {
    state: StateKey,
    id: S,
    generation: u64,
    completes: bool,
    action: DoAction<S, E>,
    cancellation: CancellationToken,
    tracker: Arc<CompletionTracker>,
    sender: EventSender<S, E>,
}

impl<S: StateId, E: EventId> DoActionWorker<S, E> {
    fn run(self) {
        let context = TransitionContext::new(Some(self.id.clone()), None, None, self.sender.clone());
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            self.action.execute(&context, self.cancellation.clone())
        }));

        let failure: Option<ActionError> = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(error)) => Some(error),
            Err(panic) => Some(panic_message(panic).into()),
        };

        if let Some(error) = failure {
            self.tracker.fault();
            self.sender.raise(Job::DoActionFault {
                state: self.state,
                error,
            });
        }

        let last = self.tracker.finish();
        if last && self.completes && !self.tracker.faulted() && !self.cancellation.is_cancelled() {
            self.sender.raise(Job::Completion {
                state: self.state,
                generation: self.generation,
            });
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("do-action panicked: {message}")
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("do-action panicked: {message}")
    } else {
        "do-action panicked".to_string()
    }
}
