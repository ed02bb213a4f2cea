//! Observer hooks and exception routing.

use crate::core::{ActionError, EventArgument, EventId, StateId, TransitionContext};
use crate::error::{FaultKind, StateMachineError};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::warn;

/// Observer of a running state machine.
///
/// Every hook has an empty default, so an extension only implements what it
/// cares about. Hooks run on the thread that processes the machine's queue
/// and must not block.
///
/// # Example
///
/// ```rust
/// use statecraft::Extension;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// #[derive(Default)]
/// struct SwitchCounter(AtomicUsize);
///
/// impl Extension<u8, u8> for SwitchCounter {
///     fn switched_state(&self, _machine: &str, _old: Option<&u8>, _new: &u8) {
///         self.0.fetch_add(1, Ordering::SeqCst);
///     }
/// }
/// ```
#[allow(unused_variables)]
pub trait Extension<S: StateId, E: EventId>: Send + Sync {
    fn started_state_machine(&self, machine: &str) {}

    fn stopped_state_machine(&self, machine: &str) {}

    fn entering_initial_state(&self, machine: &str, state: &S) {}

    fn entered_initial_state(&self, machine: &str, state: &S, context: &TransitionContext<S, E>) {}

    fn event_queued(&self, machine: &str, event: &E, argument: Option<&EventArgument>) {}

    fn event_queued_with_priority(
        &self,
        machine: &str,
        event: &E,
        argument: Option<&EventArgument>,
    ) {
    }

    fn firing_event(&self, machine: &str, event: &E, argument: Option<&EventArgument>) {}

    fn fired_event(&self, machine: &str, event: &E, argument: Option<&EventArgument>) {}

    /// No active state had a transition for the event.
    fn transition_declined(&self, machine: &str, context: &TransitionContext<S, E>) {}

    /// A leaf state was replaced. `old` is `None` when entering the initial state.
    fn switched_state(&self, machine: &str, old: Option<&S>, new: &S) {}

    fn executing_transition(
        &self,
        machine: &str,
        source: &S,
        target: Option<&S>,
        context: &TransitionContext<S, E>,
    ) {
    }

    fn executed_transition(
        &self,
        machine: &str,
        source: &S,
        target: Option<&S>,
        context: &TransitionContext<S, E>,
    ) {
    }

    /// A selected transition was not executed because an earlier transition
    /// of the same dispatch already left its source state.
    fn skipped_transition(
        &self,
        machine: &str,
        source: &S,
        target: Option<&S>,
        context: &TransitionContext<S, E>,
    ) {
    }

    fn handling_exception(
        &self,
        machine: &str,
        kind: FaultKind,
        context: &TransitionContext<S, E>,
        error: &ActionError,
    ) {
    }

    fn handled_exception(
        &self,
        machine: &str,
        kind: FaultKind,
        context: &TransitionContext<S, E>,
        error: &ActionError,
    ) {
    }
}

/// Callback receiving failures of guards and actions.
pub type ExceptionHandler<S, E> =
    Arc<dyn Fn(&TransitionContext<S, E>, &ActionError) + Send + Sync>;

/// Registered extensions and exception handlers of one machine.
pub(crate) struct ExtensionHost<S: StateId, E: EventId> {
    extensions: RwLock<Vec<Arc<dyn Extension<S, E>>>>,
    handlers: RwLock<Vec<ExceptionHandler<S, E>>>,
}

impl<S: StateId, E: EventId> ExtensionHost<S, E> {
    pub(crate) fn new() -> Self {
        Self {
            extensions: RwLock::new(Vec::new()),
            handlers: RwLock::new(Vec::new()),
        }
    }

    pub(crate) fn add_extension(&self, extension: Arc<dyn Extension<S, E>>) {
        self.extensions.write().push(extension);
    }

    pub(crate) fn clear_extensions(&self) {
        self.extensions.write().clear();
    }

    pub(crate) fn add_exception_handler(&self, handler: ExceptionHandler<S, E>) {
        self.handlers.write().push(handler);
    }

    /// Call `hook` on every extension.
    ///
    /// The list is copied first so hooks may register further extensions.
    pub(crate) fn for_each(&self, hook: impl Fn(&dyn Extension<S, E>)) {
        let extensions = self.extensions.read().clone();
        for extension in &extensions {
            hook(extension.as_ref());
        }
    }

    /// Route a callback failure to the exception handlers.
    ///
    /// Without any handler the failure cannot be delivered and is returned
    /// to the caller as `NoExceptionListener`.
    pub(crate) fn report(
        &self,
        machine: &str,
        kind: FaultKind,
        context: &TransitionContext<S, E>,
        error: ActionError,
    ) -> Result<(), StateMachineError> {
        warn!(
            machine = %machine,
            kind = %kind,
            state = ?context.source_state(),
            event = ?context.event_id(),
            error = %error,
            "Callback failed"
        );

        self.for_each(|extension| extension.handling_exception(machine, kind, context, &error));

        let handlers = self.handlers.read().clone();
        if handlers.is_empty() {
            return Err(StateMachineError::NoExceptionListener {
                kind,
                source: error,
            });
        }
        for handler in &handlers {
            handler(context, &error);
        }

        self.for_each(|extension| extension.handled_exception(machine, kind, context, &error));
        Ok(())
    }
}
