//! Entry, exit, transition and do-actions.

use crate::core::context::TransitionContext;
use crate::core::id::{EventId, StateId};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Error returned by a failing guard or action.
pub type ActionError = Box<dyn std::error::Error + Send + Sync>;

type ActionFn<S, E> =
    Arc<dyn Fn(&TransitionContext<S, E>) -> Result<(), ActionError> + Send + Sync>;

type DoActionFn<S, E> = Arc<
    dyn Fn(&TransitionContext<S, E>, CancellationToken) -> Result<(), ActionError> + Send + Sync,
>;

const ANONYMOUS: &str = "anonymous";

/// Callback run on entry, on exit, or while a transition fires.
pub struct Action<S: StateId, E: EventId> {
    description: String,
    call: ActionFn<S, E>,
}

impl<S: StateId, E: EventId> Action<S, E> {
    pub fn new<F>(action: F) -> Self
    where
        F: Fn(&TransitionContext<S, E>) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        Self::named(ANONYMOUS, action)
    }

    pub fn named<F>(description: impl Into<String>, action: F) -> Self
    where
        F: Fn(&TransitionContext<S, E>) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            call: Arc::new(action),
        }
    }

    pub fn describe(&self) -> &str {
        &self.description
    }

    pub(crate) fn execute(&self, context: &TransitionContext<S, E>) -> Result<(), ActionError> {
        (self.call)(context)
    }
}

impl<S: StateId, E: EventId> Clone for Action<S, E> {
    fn clone(&self) -> Self {
        Self {
            description: self.description.clone(),
            call: Arc::clone(&self.call),
        }
    }
}

impl<S: StateId, E: EventId> fmt::Debug for Action<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Action").field(&self.description).finish()
    }
}

/// Long-running action executed while its state is active.
///
/// Each do-action runs on its own thread. The token is cancelled as soon as
/// the state is exited; the action is expected to observe it and return.
pub struct DoAction<S: StateId, E: EventId> {
    description: String,
    call: DoActionFn<S, E>,
}

impl<S: StateId, E: EventId> DoAction<S, E> {
    pub fn new<F>(action: F) -> Self
    where
        F: Fn(&TransitionContext<S, E>, CancellationToken) -> Result<(), ActionError>
            + Send
            + Sync
            + 'static,
    {
        Self::named(ANONYMOUS, action)
    }

    pub fn named<F>(description: impl Into<String>, action: F) -> Self
    where
        F: Fn(&TransitionContext<S, E>, CancellationToken) -> Result<(), ActionError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            description: description.into(),
            call: Arc::new(action),
        }
    }

    pub fn describe(&self) -> &str {
        &self.description
    }

    pub(crate) fn execute(
        &self,
        context: &TransitionContext<S, E>,
        cancellation: CancellationToken,
    ) -> Result<(), ActionError> {
        (self.call)(context, cancellation)
    }
}

impl<S: StateId, E: EventId> Clone for DoAction<S, E> {
    fn clone(&self) -> Self {
        Self {
            description: self.description.clone(),
            call: Arc::clone(&self.call),
        }
    }
}

impl<S: StateId, E: EventId> fmt::Debug for DoAction<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DoAction").field(&self.description).finish()
    }
}
