//! Structural problems found in a state machine definition.

use thiserror::Error;

/// A problem with how states, regions or transitions were declared.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("A region of state {state} has no sub-states")]
    EmptyRegion { state: String },

    #[error("A region of state {state} has no initial sub-state")]
    RegionWithoutInitialState { state: String },

    #[error("State {state} declares {history} history but has no sub-states")]
    HistoryWithoutRegions { state: String, history: String },

    #[error("Transition #{index} of state {state} on event {event} can never fire: an earlier transition has no guard")]
    UnreachableTransition {
        state: String,
        event: String,
        index: usize,
    },

    #[error("Completion transition #{index} of state {state} can never fire: an earlier one has no guard")]
    UnreachableCompletionTransition { state: String, index: usize },
}
