//! Context handed to guards and actions.

use crate::core::id::{EventId, StateId};
use crate::error::StateMachineError;
use crate::machine::EventSender;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Untyped payload travelling with a fired event.
///
/// Arguments are reference counted so one argument can be shared by every
/// guard and action that runs for the same dispatch.
///
/// # Example
///
/// ```rust
/// use statecraft::core::EventArgument;
///
/// let argument = EventArgument::new(42u32);
/// assert_eq!(argument.downcast_ref::<u32>(), Some(&42));
/// assert!(argument.downcast_ref::<String>().is_none());
/// ```
#[derive(Clone)]
pub struct EventArgument(Arc<dyn Any + Send + Sync>);

impl EventArgument {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.0.is::<T>()
    }
}

impl fmt::Debug for EventArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EventArgument(..)")
    }
}

/// Context of a single dispatch attempt.
///
/// Created once per transition attempt and dropped when it completes. The
/// event id is `None` for the two pseudo-events that have no trigger: entering
/// the initial state and completion of a state's do-actions.
///
/// Callbacks that need to raise follow-up events do so through the context;
/// the events are queued and processed after the current dispatch finishes.
#[derive(Clone)]
pub struct TransitionContext<S: StateId, E: EventId> {
    source_state: Option<S>,
    event_id: Option<E>,
    argument: Option<EventArgument>,
    sender: EventSender<S, E>,
}

impl<S: StateId, E: EventId> TransitionContext<S, E> {
    pub(crate) fn new(
        source_state: Option<S>,
        event_id: Option<E>,
        argument: Option<EventArgument>,
        sender: EventSender<S, E>,
    ) -> Self {
        Self {
            source_state,
            event_id,
            argument,
            sender,
        }
    }

    /// The active state the dispatch started from, `None` during initialization.
    pub fn source_state(&self) -> Option<&S> {
        self.source_state.as_ref()
    }

    pub fn event_id(&self) -> Option<&E> {
        self.event_id.as_ref()
    }

    pub fn argument(&self) -> Option<&EventArgument> {
        self.argument.as_ref()
    }

    /// Typed view of the event argument.
    pub fn argument_as<T: Any>(&self) -> Option<&T> {
        self.argument.as_ref().and_then(|a| a.downcast_ref::<T>())
    }

    /// Queue an event on the owning machine.
    pub fn fire(&self, event: E) -> Result<(), StateMachineError> {
        self.sender.fire(event)
    }

    /// Queue an event with an argument on the owning machine.
    pub fn fire_with<T: Any + Send + Sync>(
        &self,
        event: E,
        argument: T,
    ) -> Result<(), StateMachineError> {
        self.sender.fire_with(event, argument)
    }

    /// Queue an event ahead of all normal events on the owning machine.
    pub fn fire_priority(&self, event: E) -> Result<(), StateMachineError> {
        self.sender.fire_priority(event)
    }

    /// Handle for raising events after the callback returns, e.g. from a
    /// thread spawned by a do-action.
    pub fn sender(&self) -> EventSender<S, E> {
        self.sender.clone()
    }
}

impl<S: StateId, E: EventId> fmt::Debug for TransitionContext<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionContext")
            .field("source_state", &self.source_state)
            .field("event_id", &self.event_id)
            .field("has_argument", &self.argument.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(argument: Option<EventArgument>) -> TransitionContext<u8, u8> {
        TransitionContext::new(Some(1), Some(7), argument, EventSender::detached())
    }

    #[test]
    fn argument_downcasts_to_its_type() {
        let ctx = context(Some(EventArgument::new("payload".to_string())));

        assert_eq!(ctx.argument_as::<String>().map(String::as_str), Some("payload"));
        assert!(ctx.argument_as::<u32>().is_none());
        assert!(ctx.argument().is_some_and(|a| a.is::<String>()));
    }

    #[test]
    fn missing_argument_is_none() {
        let ctx = context(None);

        assert!(ctx.argument().is_none());
        assert!(ctx.argument_as::<String>().is_none());
    }

    #[test]
    fn exposes_source_and_event() {
        let ctx = context(None);

        assert_eq!(ctx.source_state(), Some(&1));
        assert_eq!(ctx.event_id(), Some(&7));
    }

    #[test]
    fn firing_through_detached_context_fails() {
        let ctx = context(None);

        assert!(matches!(ctx.fire(3), Err(StateMachineError::MachineDropped)));
    }
}
