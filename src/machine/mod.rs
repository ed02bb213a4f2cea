//! The runtime state machine.
//!
//! A `StateMachine` owns the hierarchy built by
//! [`StateMachineBuilder`](crate::StateMachineBuilder), a two-tier job queue
//! and a driver deciding where that queue is processed:
//!
//! - **Passive**: `start`, `fire` and `fire_priority` process the queue on the
//!   calling thread. Events fired from inside an action are queued and handled
//!   by the same pump once the current transition is done.
//! - **Active**: `start` spawns one worker thread. Firing only queues the
//!   event and wakes the worker.
//!
//! In both modes events queued before `start` wait until the machine runs,
//! and the entry into the initial state always comes first.

mod dispatch;
mod driver;
mod engine;
mod extension;
mod queue;
mod supervisor;
mod traversal;

pub use extension::{ExceptionHandler, Extension};

use crate::checkpoint::{Snapshot, StateMachineLoader, StateMachineSaver};
use crate::config::{ExecutionMode, MachineConfig};
use crate::core::{ActionError, EventArgument, EventId, StateId, TransitionContext};
use crate::error::StateMachineError;
use crate::hierarchy::StateTree;
use driver::{ActiveDriver, Driver, PassiveDriver};
use engine::Engine;
use extension::ExtensionHost;
use parking_lot::{Mutex, RwLock};
use queue::{EventQueue, Job};
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, error, info};

/// State shared between the machine handle, its worker and event senders.
pub(crate) struct Shared<S: StateId, E: EventId> {
    name: String,
    queue: EventQueue<E>,
    core: Mutex<Engine<S, E>>,
    initialized: AtomicBool,
    extensions: Arc<ExtensionHost<S, E>>,
    published: Arc<RwLock<Vec<S>>>,
    driver: Box<dyn Driver<S, E>>,
}

impl<S: StateId, E: EventId> Shared<S, E> {
    fn submit(
        self: &Arc<Self>,
        event: E,
        argument: Option<EventArgument>,
        priority: bool,
    ) -> Result<(), StateMachineError> {
        if !self.initialized.load(Ordering::SeqCst) {
            return Err(StateMachineError::NotInitialized);
        }

        debug!(machine = %self.name, event = ?event, priority, "Queueing event");
        self.extensions.for_each(|extension| {
            if priority {
                extension.event_queued_with_priority(&self.name, &event, argument.as_ref());
            } else {
                extension.event_queued(&self.name, &event, argument.as_ref());
            }
        });

        let job = Job::Fire { event, argument };
        if priority {
            self.queue.push_priority(job);
        } else {
            self.queue.push(job);
        }
        self.driver.execute(self)
    }
}

/// Handle for firing events into a machine without owning it.
///
/// Senders are handed to guards and actions through their
/// [`TransitionContext`] and can be cloned freely, e.g. into threads spawned
/// by a do-action. Once the machine is dropped every send fails with
/// `StateMachineError::MachineDropped`.
pub struct EventSender<S: StateId, E: EventId> {
    shared: Weak<Shared<S, E>>,
}

impl<S: StateId, E: EventId> EventSender<S, E> {
    pub(crate) fn new(shared: Weak<Shared<S, E>>) -> Self {
        Self { shared }
    }

    /// A sender not attached to any machine.
    #[cfg(test)]
    pub(crate) fn detached() -> Self {
        Self {
            shared: Weak::new(),
        }
    }

    fn upgrade(&self) -> Result<Arc<Shared<S, E>>, StateMachineError> {
        self.shared.upgrade().ok_or(StateMachineError::MachineDropped)
    }

    pub fn fire(&self, event: E) -> Result<(), StateMachineError> {
        self.upgrade()?.submit(event, None, false)
    }

    pub fn fire_with<T: Any + Send + Sync>(
        &self,
        event: E,
        argument: T,
    ) -> Result<(), StateMachineError> {
        self.upgrade()?
            .submit(event, Some(EventArgument::new(argument)), false)
    }

    pub fn fire_priority(&self, event: E) -> Result<(), StateMachineError> {
        self.upgrade()?.submit(event, None, true)
    }

    pub fn fire_priority_with<T: Any + Send + Sync>(
        &self,
        event: E,
        argument: T,
    ) -> Result<(), StateMachineError> {
        self.upgrade()?
            .submit(event, Some(EventArgument::new(argument)), true)
    }

    /// Queue an internal job ahead of events without pumping.
    pub(crate) fn enqueue(&self, job: Job<E>) {
        if let Some(shared) = self.shared.upgrade() {
            shared.queue.push_priority(job);
        }
    }

    /// Queue an internal job ahead of events and make sure it is processed.
    pub(crate) fn raise(&self, job: Job<E>) {
        let Some(shared) = self.shared.upgrade() else {
            return;
        };
        shared.queue.push_priority(job);
        if let Err(e) = shared.driver.execute(&shared) {
            error!(machine = %shared.name, error = %e, "Processing raised job failed");
        }
    }
}

impl<S: StateId, E: EventId> Clone for EventSender<S, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Weak::clone(&self.shared),
        }
    }
}

impl<S: StateId, E: EventId> fmt::Debug for EventSender<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSender")
            .field("attached", &(self.shared.strong_count() > 0))
            .finish()
    }
}

/// A hierarchical state machine with orthogonal regions.
///
/// Built with [`StateMachineBuilder`](crate::StateMachineBuilder). All
/// operations take `&self`; the machine can be shared across threads behind
/// an `Arc`.
///
/// # Example
///
/// ```rust
/// use statecraft::{MachineConfig, StateMachineBuilder};
///
/// #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
/// enum Door { Open, Closed }
///
/// #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
/// enum Push { Close, Open }
///
/// let mut builder = StateMachineBuilder::<Door, Push>::new();
/// builder.in_state(Door::Open).on(Push::Close, |t| t.goto(Door::Closed));
/// builder.in_state(Door::Closed).on(Push::Open, |t| t.goto(Door::Open));
///
/// let door = builder.build(MachineConfig::passive("door")).unwrap();
/// door.initialize(Door::Open).unwrap();
/// door.start().unwrap();
/// door.fire(Push::Close).unwrap();
///
/// assert_eq!(door.current_state_ids(), vec![Door::Closed]);
/// ```
pub struct StateMachine<S: StateId, E: EventId> {
    shared: Arc<Shared<S, E>>,
}

impl<S: StateId, E: EventId> StateMachine<S, E> {
    pub(crate) fn new(tree: StateTree<S, E>, config: MachineConfig) -> Self {
        let extensions = Arc::new(ExtensionHost::new());
        let published = Arc::new(RwLock::new(Vec::new()));
        let driver: Box<dyn Driver<S, E>> = match config.mode {
            ExecutionMode::Passive => Box::new(PassiveDriver::new()),
            ExecutionMode::Active => Box::new(ActiveDriver::new()),
        };

        let shared = Arc::new_cyclic(|weak| Shared {
            name: config.name.clone(),
            queue: EventQueue::new(),
            core: Mutex::new(Engine::new(
                config.name.clone(),
                tree,
                Arc::clone(&extensions),
                Arc::clone(&published),
                EventSender::new(weak.clone()),
            )),
            initialized: AtomicBool::new(false),
            extensions,
            published,
            driver,
        });

        Self { shared }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Queue the entry into `state`, ahead of every event.
    ///
    /// The entry runs once the machine is started.
    pub fn initialize(&self, state: S) -> Result<(), StateMachineError> {
        if self.shared.initialized.load(Ordering::SeqCst) {
            return Err(StateMachineError::AlreadyInitialized);
        }
        let key = self.shared.core.lock().tree().find(&state).ok_or_else(|| {
            StateMachineError::UnknownState {
                state: format!("{state:?}"),
            }
        })?;
        if self.shared.initialized.swap(true, Ordering::SeqCst) {
            return Err(StateMachineError::AlreadyInitialized);
        }

        info!(machine = %self.shared.name, state = ?state, "Initializing state machine");
        self.shared.queue.push_priority(Job::EnterInitialState(key));
        Ok(())
    }

    /// Start processing events. Starting a running machine does nothing.
    pub fn start(&self) -> Result<(), StateMachineError> {
        if !self.shared.initialized.load(Ordering::SeqCst) {
            return Err(StateMachineError::NotInitialized);
        }
        if !self.shared.driver.start(&self.shared)? {
            return Ok(());
        }

        info!(machine = %self.shared.name, "Started state machine");
        self.shared
            .extensions
            .for_each(|extension| extension.started_state_machine(&self.shared.name));
        self.shared.driver.execute(&self.shared)
    }

    /// Stop processing events. Queued events stay queued until the next start.
    ///
    /// In active mode this waits for the worker to finish its current job and
    /// returns the error that made the worker fail, if any.
    pub fn stop(&self) -> Result<(), StateMachineError> {
        if self.shared.driver.stop(&self.shared)? {
            info!(machine = %self.shared.name, "Stopped state machine");
            self.shared
                .extensions
                .for_each(|extension| extension.stopped_state_machine(&self.shared.name));
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.shared.driver.is_running()
    }

    pub fn fire(&self, event: E) -> Result<(), StateMachineError> {
        self.shared.submit(event, None, false)
    }

    pub fn fire_with<T: Any + Send + Sync>(
        &self,
        event: E,
        argument: T,
    ) -> Result<(), StateMachineError> {
        self.shared
            .submit(event, Some(EventArgument::new(argument)), false)
    }

    /// Fire an event ahead of every normal event already queued.
    pub fn fire_priority(&self, event: E) -> Result<(), StateMachineError> {
        self.shared.submit(event, None, true)
    }

    pub fn fire_priority_with<T: Any + Send + Sync>(
        &self,
        event: E,
        argument: T,
    ) -> Result<(), StateMachineError> {
        self.shared
            .submit(event, Some(EventArgument::new(argument)), true)
    }

    /// Ids of the active leaf states.
    pub fn current_state_ids(&self) -> Vec<S> {
        self.shared.published.read().clone()
    }

    pub fn add_extension(&self, extension: Arc<dyn Extension<S, E>>) {
        self.shared.extensions.add_extension(extension);
    }

    pub fn clear_extensions(&self) {
        self.shared.extensions.clear_extensions();
    }

    /// Register a receiver for failing guards and actions.
    ///
    /// Without any handler, the first failure aborts processing with
    /// `StateMachineError::NoExceptionListener`.
    pub fn add_exception_handler<F>(&self, handler: F)
    where
        F: Fn(&TransitionContext<S, E>, &ActionError) + Send + Sync + 'static,
    {
        self.shared.extensions.add_exception_handler(Arc::new(handler));
    }

    /// A sender for firing events from places that do not own the machine.
    pub fn sender(&self) -> EventSender<S, E> {
        EventSender::new(Arc::downgrade(&self.shared))
    }

    /// Write the active leaves and history pointers to `saver`.
    ///
    /// Must not be called from inside a guard or an action.
    pub fn save(&self, saver: &mut impl StateMachineSaver<S>) {
        let engine = self.shared.core.lock();
        saver.save_current_states(&engine.current_state_ids());
        saver.save_history_states(&engine.history_records());
        drop(engine);

        // A passive pump that found the lock taken left its job queued.
        if let Err(e) = self.shared.driver.execute(&self.shared) {
            error!(machine = %self.shared.name, error = %e, "Processing jobs queued during save failed");
        }
    }

    /// Save into a fresh [`Snapshot`].
    pub fn snapshot(&self) -> Snapshot<S> {
        let mut snapshot = Snapshot::new(self.shared.name.clone());
        self.save(&mut snapshot);
        snapshot
    }

    /// Restore a saved machine without running any entry action.
    ///
    /// Only an uninitialized machine can be loaded. Loading at least one
    /// active state initializes the machine; `start` then resumes it.
    pub fn load(&self, loader: &impl StateMachineLoader<S>) -> Result<(), StateMachineError> {
        if self.shared.initialized.load(Ordering::SeqCst) {
            return Err(StateMachineError::AlreadyInitialized);
        }
        let current = loader.load_current_states();
        let history = loader.load_history_states();

        let loaded = self.shared.core.lock().load(&current, &history)?;
        if loaded {
            self.shared.initialized.store(true, Ordering::SeqCst);
        }
        Ok(())
    }
}

impl<S: StateId, E: EventId> fmt::Debug for StateMachine<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("name", &self.shared.name)
            .field("running", &self.is_running())
            .field("current_states", &self.current_state_ids())
            .finish()
    }
}

impl<S: StateId, E: EventId> Drop for StateMachine<S, E> {
    fn drop(&mut self) {
        if let Err(e) = self.shared.driver.stop(&self.shared) {
            error!(machine = %self.shared.name, error = %e, "Worker failed before shutdown");
        }
    }
}
