//! Builder for constructing state machines.

use crate::builder::hierarchy::HierarchyBuilder;
use crate::builder::state::StateBuilder;
use crate::config::MachineConfig;
use crate::core::{EventId, StateId};
use crate::error::StateMachineError;
use crate::hierarchy::StateTree;
use crate::machine::StateMachine;
use crate::validation::DefinitionRules;
use stillwater::validation::Validation;

/// Collects states, regions and transitions, then builds a `StateMachine`.
///
/// States come into existence the first time they are named, whether by
/// `in_state`, as a transition target or as a sub-state.
pub struct StateMachineBuilder<S: StateId, E: EventId> {
    tree: StateTree<S, E>,
}

impl<S: StateId, E: EventId> StateMachineBuilder<S, E> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            tree: StateTree::new(),
        }
    }

    /// Declare the behaviour of `state`.
    pub fn in_state(&mut self, state: S) -> StateBuilder<'_, S, E> {
        let key = self.tree.state_key(state);
        StateBuilder::new(&mut self.tree, key)
    }

    /// Add sub-states to the first region of `state`, creating the region
    /// when the state has none yet.
    pub fn define_hierarchy_on(&mut self, state: S) -> HierarchyBuilder<'_, S, E> {
        let owner = self.tree.state_key(state);
        let region = match self.tree.state(owner).regions.first() {
            Some(region) => *region,
            None => self.tree.add_region(owner),
        };
        HierarchyBuilder::new(&mut self.tree, owner, region)
    }

    /// Add a new orthogonal region to `state`.
    pub fn define_region_on(&mut self, state: S) -> HierarchyBuilder<'_, S, E> {
        let owner = self.tree.state_key(state);
        let region = self.tree.add_region(owner);
        HierarchyBuilder::new(&mut self.tree, owner, region)
    }

    /// Validate the definition and build the machine.
    ///
    /// Returns `InvalidDefinition` listing every structural problem found.
    pub fn build(self, config: MachineConfig) -> Result<StateMachine<S, E>, StateMachineError> {
        if let Validation::Failure(errors) = DefinitionRules::new().validate(&self.tree) {
            return Err(StateMachineError::InvalidDefinition(
                errors.iter().cloned().collect(),
            ));
        }
        Ok(StateMachine::new(self.tree, config))
    }
}

impl<S: StateId, E: EventId> Default for StateMachineBuilder<S, E> {
    fn default() -> Self {
        Self::new()
    }
}
