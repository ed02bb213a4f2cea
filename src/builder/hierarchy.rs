//! Builder for composite states and their regions.

use crate::core::{EventId, HistoryType, StateId};
use crate::error::HierarchyError;
use crate::hierarchy::{RegionKey, StateKey, StateTree};

/// Adds sub-states to one region of a composite state.
///
/// Every method that links states is fallible: a state can only have one
/// super state, a state cannot contain itself or one of its ancestors, and the
/// initial sub-state must belong to the region.
///
/// # Example
///
/// ```rust
/// use statecraft::core::HistoryType;
/// use statecraft::StateMachineBuilder;
///
/// let mut builder = StateMachineBuilder::<&str, u8>::new();
/// builder
///     .define_hierarchy_on("On")
///     .with_history_type(HistoryType::Shallow)
///     .with_initial_sub_state("Idle")?
///     .with_sub_state("Busy")?;
///
/// // a second, orthogonal region of the same state
/// builder
///     .define_region_on("On")
///     .with_initial_sub_state("Quiet")?
///     .with_sub_state("Loud")?;
/// # Ok::<(), statecraft::HierarchyError>(())
/// ```
pub struct HierarchyBuilder<'a, S: StateId, E: EventId> {
    tree: &'a mut StateTree<S, E>,
    owner: StateKey,
    region: RegionKey,
}

impl<'a, S: StateId, E: EventId> HierarchyBuilder<'a, S, E> {
    pub(crate) fn new(tree: &'a mut StateTree<S, E>, owner: StateKey, region: RegionKey) -> Self {
        Self {
            tree,
            owner,
            region,
        }
    }

    /// Set the history policy of the owning state.
    ///
    /// The policy applies to all regions of the state.
    pub fn with_history_type(self, history: HistoryType) -> Self {
        let node = self.tree.state_mut(self.owner);
        node.history = history;
        node.history_declared = true;
        self
    }

    /// Add `state` to the region and make it the region's initial state.
    pub fn with_initial_sub_state(self, state: S) -> Result<Self, HierarchyError> {
        let sub = self.tree.state_key(state);
        self.tree.add_sub_state(self.region, sub)?;
        self.tree.set_initial_state(self.region, sub)?;
        Ok(self)
    }

    pub fn with_sub_state(self, state: S) -> Result<Self, HierarchyError> {
        let sub = self.tree.state_key(state);
        self.tree.add_sub_state(self.region, sub)?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hierarchy<'a>(
        tree: &'a mut StateTree<&'static str, u8>,
        owner: &'static str,
    ) -> HierarchyBuilder<'a, &'static str, u8> {
        let owner = tree.state_key(owner);
        let region = tree.add_region(owner);
        HierarchyBuilder::new(tree, owner, region)
    }

    #[test]
    fn links_sub_states_into_the_region() {
        let mut tree = StateTree::new();

        hierarchy(&mut tree, "On")
            .with_initial_sub_state("Idle")
            .and_then(|h| h.with_sub_state("Busy"))
            .unwrap();

        let on = tree.find(&"On").unwrap();
        let idle = tree.find(&"Idle").unwrap();
        let region = tree.state(on).regions[0];
        assert_eq!(tree.region(region).initial, Some(idle));
        assert_eq!(tree.region(region).sub_states.len(), 2);
        assert_eq!(tree.level(Some(idle)), 2);
    }

    #[test]
    fn history_type_is_recorded_on_the_owner() {
        let mut tree = StateTree::new();

        hierarchy(&mut tree, "On").with_history_type(HistoryType::Deep);

        let on = tree.find(&"On").unwrap();
        assert_eq!(tree.state(on).history, HistoryType::Deep);
        assert!(tree.state(on).history_declared);
    }

    #[test]
    fn second_super_state_is_rejected() {
        let mut tree = StateTree::new();
        hierarchy(&mut tree, "A").with_sub_state("X").unwrap();

        let result = hierarchy(&mut tree, "B").with_sub_state("X");

        assert!(matches!(
            result,
            Err(HierarchyError::SuperStateAlreadySet { .. })
        ));
    }

    #[test]
    fn own_super_state_is_rejected() {
        let mut tree = StateTree::new();

        let result = hierarchy(&mut tree, "A").with_initial_sub_state("A");

        assert!(matches!(result, Err(HierarchyError::OwnSuperState { .. })));
    }
}
