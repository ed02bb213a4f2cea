//! Core building blocks shared by the hierarchy model and the runtime.
//!
//! This module contains the vocabulary every other module speaks:
//! - State and event identifiers via the `StateId` and `EventId` traits
//! - Guard predicates and entry/exit/transition/do-actions
//! - The per-dispatch `TransitionContext`
//! - The `HistoryType` policy of composite states

mod action;
mod context;
mod guard;
mod history;
mod id;

pub use action::{Action, ActionError, DoAction};
pub use context::{EventArgument, TransitionContext};
pub use guard::Guard;
pub use history::HistoryType;
pub use id::{EventId, StateId};
