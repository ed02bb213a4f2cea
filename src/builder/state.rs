//! Builder for the behaviour of a single state.

use crate::builder::transition::TransitionBuilder;
use crate::core::{Action, ActionError, DoAction, EventId, StateId, TransitionContext};
use crate::hierarchy::{StateKey, StateTree};
use tokio_util::sync::CancellationToken;

/// Fluent declaration of a state's actions and outgoing transitions.
///
/// Obtained from [`StateMachineBuilder::in_state`](crate::StateMachineBuilder::in_state).
/// Transitions for the same event are tried in the order they are declared.
pub struct StateBuilder<'a, S: StateId, E: EventId> {
    tree: &'a mut StateTree<S, E>,
    state: StateKey,
}

impl<'a, S: StateId, E: EventId> StateBuilder<'a, S, E> {
    pub(crate) fn new(tree: &'a mut StateTree<S, E>, state: StateKey) -> Self {
        Self { tree, state }
    }

    pub fn execute_on_entry<F>(self, action: F) -> Self
    where
        F: Fn(&TransitionContext<S, E>) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        self.tree
            .state_mut(self.state)
            .entry_actions
            .push(Action::new(action));
        self
    }

    pub fn execute_on_entry_named<F>(self, description: impl Into<String>, action: F) -> Self
    where
        F: Fn(&TransitionContext<S, E>) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        self.tree
            .state_mut(self.state)
            .entry_actions
            .push(Action::named(description, action));
        self
    }

    pub fn execute_on_exit<F>(self, action: F) -> Self
    where
        F: Fn(&TransitionContext<S, E>) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        self.tree
            .state_mut(self.state)
            .exit_actions
            .push(Action::new(action));
        self
    }

    pub fn execute_on_exit_named<F>(self, description: impl Into<String>, action: F) -> Self
    where
        F: Fn(&TransitionContext<S, E>) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        self.tree
            .state_mut(self.state)
            .exit_actions
            .push(Action::named(description, action));
        self
    }

    /// Run `action` on its own thread while the state is active.
    ///
    /// The token is cancelled when the state is exited. When every do-action
    /// of the state returns `Ok` without being cancelled, the state's
    /// completion transitions are tried.
    pub fn execute_while_active<F>(self, action: F) -> Self
    where
        F: Fn(&TransitionContext<S, E>, CancellationToken) -> Result<(), ActionError>
            + Send
            + Sync
            + 'static,
    {
        self.tree
            .state_mut(self.state)
            .do_actions
            .push(DoAction::new(action));
        self
    }

    pub fn execute_while_active_named<F>(self, description: impl Into<String>, action: F) -> Self
    where
        F: Fn(&TransitionContext<S, E>, CancellationToken) -> Result<(), ActionError>
            + Send
            + Sync
            + 'static,
    {
        self.tree
            .state_mut(self.state)
            .do_actions
            .push(DoAction::named(description, action));
        self
    }

    /// Declare a transition triggered by `event`.
    pub fn on<F>(self, event: E, configure: F) -> Self
    where
        F: FnOnce(TransitionBuilder<S, E>) -> TransitionBuilder<S, E>,
    {
        let transition = configure(TransitionBuilder::new()).build(self.tree, self.state);
        self.tree
            .state_mut(self.state)
            .transitions
            .entry(event)
            .or_default()
            .push(transition);
        self
    }

    /// Declare a transition taken when the state completes.
    ///
    /// A state completes when all of its do-actions finished successfully, or
    /// right after entry when it has none.
    pub fn on_completion<F>(self, configure: F) -> Self
    where
        F: FnOnce(TransitionBuilder<S, E>) -> TransitionBuilder<S, E>,
    {
        let transition = configure(TransitionBuilder::new()).build(self.tree, self.state);
        self.tree
            .state_mut(self.state)
            .completion_transitions
            .push(transition);
        self
    }
}
