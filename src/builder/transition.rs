//! Builder for declaring transitions.

use crate::core::{Action, ActionError, EventId, Guard, StateId, TransitionContext};
use crate::hierarchy::{StateKey, StateTree, Transition};

/// Fluent declaration of one transition.
///
/// Handed to the closures of [`StateBuilder::on`](crate::builder::StateBuilder::on)
/// and [`StateBuilder::on_completion`](crate::builder::StateBuilder::on_completion).
/// A transition without `goto` is internal: its actions run, no state is
/// exited or entered.
pub struct TransitionBuilder<S: StateId, E: EventId> {
    target: Option<S>,
    guard: Option<Guard<S, E>>,
    actions: Vec<Action<S, E>>,
}

impl<S: StateId, E: EventId> TransitionBuilder<S, E> {
    /// Create a new transition builder.
    pub fn new() -> Self {
        Self {
            target: None,
            guard: None,
            actions: Vec::new(),
        }
    }

    /// Set the target state.
    pub fn goto(mut self, state: S) -> Self {
        self.target = Some(state);
        self
    }

    /// Add a guard predicate (optional).
    pub fn guard(mut self, guard: Guard<S, E>) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Add a guard using a closure (optional).
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&TransitionContext<S, E>) -> bool + Send + Sync + 'static,
    {
        self.guard = Some(Guard::new(predicate));
        self
    }

    /// Add a guard that may fail (optional). A failing guard is reported and
    /// treated as `false`.
    pub fn try_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&TransitionContext<S, E>) -> Result<bool, ActionError> + Send + Sync + 'static,
    {
        self.guard = Some(Guard::try_new(predicate));
        self
    }

    /// Append an action run between the exits and the entries.
    pub fn execute<F>(mut self, action: F) -> Self
    where
        F: Fn(&TransitionContext<S, E>) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        self.actions.push(Action::new(action));
        self
    }

    pub fn execute_named<F>(mut self, description: impl Into<String>, action: F) -> Self
    where
        F: Fn(&TransitionContext<S, E>) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        self.actions.push(Action::named(description, action));
        self
    }

    /// Build the transition, declaring its target state if needed.
    pub(crate) fn build(self, tree: &mut StateTree<S, E>, source: StateKey) -> Transition<S, E> {
        Transition {
            source,
            target: self.target.map(|target| tree.state_key(target)),
            guard: self.guard,
            actions: self.actions,
        }
    }
}

impl<S: StateId, E: EventId> Default for TransitionBuilder<S, E> {
    fn default() -> Self {
        Self::new()
    }
}
