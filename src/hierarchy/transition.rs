//! Transitions between states of the hierarchy.

use super::tree::StateKey;
use crate::core::{Action, ActionError, EventId, Guard, StateId, TransitionContext};

/// A declared transition.
///
/// A transition without a target is internal: its actions run but no state
/// is exited or entered.
#[derive(Clone)]
pub(crate) struct Transition<S: StateId, E: EventId> {
    pub(crate) source: StateKey,
    pub(crate) target: Option<StateKey>,
    pub(crate) guard: Option<Guard<S, E>>,
    pub(crate) actions: Vec<Action<S, E>>,
}

impl<S: StateId, E: EventId> Transition<S, E> {
    /// Whether the transition fires in this context. Missing guards always pass.
    pub(crate) fn will_fire(&self, context: &TransitionContext<S, E>) -> Result<bool, ActionError> {
        self.guard.as_ref().map_or(Ok(true), |guard| guard.check(context))
    }
}
