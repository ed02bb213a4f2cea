//! Errors raised while building and running state machines.

use crate::core::ActionError;
use crate::validation::DefinitionError;
use std::fmt;
use thiserror::Error;

/// Errors building the state hierarchy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("Cannot add state {state} to super state {super_state}: it already has super state {existing}")]
    SuperStateAlreadySet {
        super_state: String,
        state: String,
        existing: String,
    },

    #[error("State {state} cannot be its own super state")]
    OwnSuperState { state: String },

    #[error("Cannot add state {state} below {super_state}: {state} is an ancestor of {super_state}")]
    CyclicHierarchy { super_state: String, state: String },

    #[error("State {state} cannot be the initial state of a region of {super_state}: it is not a direct sub-state of that region")]
    InitialStateNotInRegion { super_state: String, state: String },
}

/// Which kind of callback failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    Guard,
    TransitionAction,
    EntryAction,
    ExitAction,
    DoAction,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Guard => "guard",
            Self::TransitionAction => "transition action",
            Self::EntryAction => "entry action",
            Self::ExitAction => "exit action",
            Self::DoAction => "do-action",
        };
        f.write_str(name)
    }
}

/// Errors raised by state machine operations.
#[derive(Debug, Error)]
pub enum StateMachineError {
    #[error("The state machine is not initialized. Call initialize(state) first")]
    NotInitialized,

    #[error("The state machine is already initialized")]
    AlreadyInitialized,

    #[error("Unknown state {state}")]
    UnknownState { state: String },

    #[error("Cannot restore history: {state} is not a sub-state of {super_state}")]
    HistoryStateNotASubState { super_state: String, state: String },

    #[error("No exception listener is registered. A {kind} failed: {source}")]
    NoExceptionListener {
        kind: FaultKind,
        #[source]
        source: ActionError,
    },

    #[error("Invalid state machine definition: {}", format_violations(.0))]
    InvalidDefinition(Vec<DefinitionError>),

    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),

    #[error("State machine worker failed: {reason}")]
    WorkerFailed { reason: String },

    #[error("The state machine has been dropped")]
    MachineDropped,
}

fn format_violations(violations: &[DefinitionError]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
