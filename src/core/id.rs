//! Identifier traits for states and events.
//!
//! The machine never inspects identifiers beyond comparing, hashing and
//! ordering them, so any plain value type qualifies. Both traits are
//! blanket-implemented; enums declared with [`state_ids!`](crate::state_ids)
//! satisfy them out of the box.

use std::fmt::Debug;
use std::hash::Hash;

/// Identifier of an event that can be fired into a state machine.
///
/// # Required Traits
///
/// - `Clone`: events are queued and copied into transition contexts
/// - `Eq` + `Hash`: events key the per-state transition table
/// - `Ord`: kept for deterministic reporting
/// - `Debug`: events appear in logs and error messages
/// - `Send` + `Sync`: events cross into the active worker thread
pub trait EventId: Clone + Eq + Ord + Hash + Debug + Send + Sync + 'static {}

impl<T> EventId for T where T: Clone + Eq + Ord + Hash + Debug + Send + Sync + 'static {}

/// Identifier of a state.
///
/// State ids must be totally ordered: the dispatcher breaks ties between
/// active states of equal depth by id. To capture a machine in a
/// [`Snapshot`](crate::checkpoint::Snapshot) the id type must also implement
/// serde's `Serialize` and `Deserialize`.
///
/// # Example
///
/// ```rust
/// use statecraft::core::StateId;
///
/// fn assert_state_id<S: StateId>() {}
///
/// assert_state_id::<u32>();
/// assert_state_id::<String>();
/// assert_state_id::<&'static str>();
/// ```
pub trait StateId: Clone + Eq + Ord + Hash + Debug + Send + Sync + 'static {}

impl<T> StateId for T where T: Clone + Eq + Ord + Hash + Debug + Send + Sync + 'static {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
    enum TestState {
        Idle,
        Running,
        Done,
    }

    fn is_state_id<S: StateId>(_: &S) -> bool {
        true
    }

    fn is_event_id<E: EventId>(_: &E) -> bool {
        true
    }

    #[test]
    fn plain_enums_are_state_ids() {
        assert!(is_state_id(&TestState::Idle));
        assert!(is_event_id(&TestState::Running));
    }

    #[test]
    fn primitive_types_are_ids() {
        assert!(is_state_id(&1u8));
        assert!(is_state_id(&"name".to_string()));
        assert!(is_state_id(&"static"));
        assert!(is_event_id(&'x'));
    }

    #[test]
    fn state_ids_order_by_declaration() {
        let mut states = vec![TestState::Done, TestState::Idle, TestState::Running];
        states.sort();
        assert_eq!(
            states,
            vec![TestState::Idle, TestState::Running, TestState::Done]
        );
    }

    #[test]
    fn state_id_serializes_correctly() {
        let json = serde_json::to_string(&TestState::Running).unwrap();
        let deserialized: TestState = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, TestState::Running);
    }
}
