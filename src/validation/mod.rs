//! Validation of state machine definitions.
//!
//! Definitions are checked with Stillwater's `Validation` type so that every
//! problem is collected instead of stopping at the first one. `build` turns
//! the accumulated failures into `StateMachineError::InvalidDefinition`.
//!
//! Checked rules:
//! - every region has at least one sub-state
//! - every region has an initial sub-state
//! - shallow and deep history are only declared on composite states
//! - no transition hides behind an earlier unguarded transition for the same
//!   trigger

pub(crate) mod rules;
pub mod violations;

pub(crate) use rules::DefinitionRules;
pub use violations::DefinitionError;
