//! Guard predicates for controlling transitions.
//!
//! Guards decide whether a transition fires for the current dispatch. A
//! state may declare several transitions for the same event; they are tried
//! in declaration order and the first whose guard passes wins.

use crate::core::action::ActionError;
use crate::core::context::TransitionContext;
use crate::core::id::{EventId, StateId};
use std::sync::Arc;

type Predicate<S, E> =
    Arc<dyn Fn(&TransitionContext<S, E>) -> Result<bool, ActionError> + Send + Sync>;

/// Predicate that determines if a transition can fire.
///
/// A guard that fails is reported through the machine's exception handlers
/// and then treated as if it had returned `false`.
///
/// # Example
///
/// ```rust
/// use statecraft::core::Guard;
///
/// // Only fire when the event carries an even number.
/// let even: Guard<u8, u8> = Guard::new(|ctx| {
///     ctx.argument_as::<u32>().is_some_and(|n| n % 2 == 0)
/// });
/// # let _ = even;
/// ```
pub struct Guard<S: StateId, E: EventId> {
    predicate: Predicate<S, E>,
}

impl<S: StateId, E: EventId> Guard<S, E> {
    /// Create a guard from an infallible predicate.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&TransitionContext<S, E>) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Arc::new(move |ctx| Ok(predicate(ctx))),
        }
    }

    /// Create a guard from a predicate that may fail.
    pub fn try_new<F>(predicate: F) -> Self
    where
        F: Fn(&TransitionContext<S, E>) -> Result<bool, ActionError> + Send + Sync + 'static,
    {
        Guard {
            predicate: Arc::new(predicate),
        }
    }

    /// Evaluate the guard for this dispatch.
    pub fn check(&self, context: &TransitionContext<S, E>) -> Result<bool, ActionError> {
        (self.predicate)(context)
    }
}

impl<S: StateId, E: EventId> Clone for Guard<S, E> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
        }
    }
}
