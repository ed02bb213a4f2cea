//! Two-tier job queue shared by the drivers.

use crate::core::{ActionError, EventArgument, EventId};
use crate::hierarchy::StateKey;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::fmt;

/// Unit of work processed by the engine.
pub(crate) enum Job<E: EventId> {
    /// Deferred entry of the state passed to `initialize`.
    EnterInitialState(StateKey),
    Fire {
        event: E,
        argument: Option<EventArgument>,
    },
    /// Every do-action of one occupancy of `state` finished.
    Completion { state: StateKey, generation: u64 },
    /// A do-action of `state` failed or panicked.
    DoActionFault { state: StateKey, error: ActionError },
}

impl<E: EventId> fmt::Debug for Job<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnterInitialState(state) => f.debug_tuple("EnterInitialState").field(state).finish(),
            Self::Fire { event, .. } => f.debug_struct("Fire").field("event", event).finish(),
            Self::Completion { state, generation } => f
                .debug_struct("Completion")
                .field("state", state)
                .field("generation", generation)
                .finish(),
            Self::DoActionFault { state, error } => f
                .debug_struct("DoActionFault")
                .field("state", state)
                .field("error", &error.to_string())
                .finish(),
        }
    }
}

struct Queues<E: EventId> {
    priority: VecDeque<Job<E>>,
    normal: VecDeque<Job<E>>,
    /// Auto-reset wake flag, consumed by `wait`.
    signaled: bool,
    stop_requested: bool,
}

/// Priority and normal FIFO queues plus the worker wake signal.
///
/// Priority jobs always go first: `next` only hands out a normal job when no
/// priority job is waiting.
pub(crate) struct EventQueue<E: EventId> {
    queues: Mutex<Queues<E>>,
    wake: Condvar,
}

impl<E: EventId> EventQueue<E> {
    pub(crate) fn new() -> Self {
        Self {
            queues: Mutex::new(Queues {
                priority: VecDeque::new(),
                normal: VecDeque::new(),
                signaled: false,
                stop_requested: false,
            }),
            wake: Condvar::new(),
        }
    }

    pub(crate) fn push(&self, job: Job<E>) {
        let mut queues = self.queues.lock();
        queues.normal.push_back(job);
        queues.signaled = true;
        self.wake.notify_all();
    }

    pub(crate) fn push_priority(&self, job: Job<E>) {
        let mut queues = self.queues.lock();
        queues.priority.push_back(job);
        queues.signaled = true;
        self.wake.notify_all();
    }

    pub(crate) fn next(&self) -> Option<Job<E>> {
        let mut queues = self.queues.lock();
        match queues.priority.pop_front() {
            Some(job) => Some(job),
            None => queues.normal.pop_front(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        let queues = self.queues.lock();
        queues.priority.is_empty() && queues.normal.is_empty()
    }

    pub(crate) fn request_stop(&self) {
        let mut queues = self.queues.lock();
        queues.stop_requested = true;
        self.wake.notify_all();
    }

    pub(crate) fn reset_stop(&self) {
        self.queues.lock().stop_requested = false;
    }

    pub(crate) fn stop_requested(&self) -> bool {
        self.queues.lock().stop_requested
    }

    /// Block until work is signaled or a stop is requested.
    ///
    /// Returns `false` when the caller should shut down.
    pub(crate) fn wait(&self) -> bool {
        let mut queues = self.queues.lock();
        while !queues.signaled
            && !queues.stop_requested
            && queues.priority.is_empty()
            && queues.normal.is_empty()
        {
            self.wake.wait(&mut queues);
        }
        queues.signaled = false;
        !queues.stop_requested
    }
}
