//! Arena of states and regions.
//!
//! States and regions refer to each other through `StateKey` and `RegionKey`
//! indices instead of references, so the tree has a single owner and parent
//! links never form ownership cycles.

use super::transition::Transition;
use crate::core::{Action, DoAction, EventId, HistoryType, StateId};
use crate::error::HierarchyError;
use std::collections::HashMap;

/// Index of a state in its `StateTree`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct StateKey(usize);

/// Index of a region in its `StateTree`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct RegionKey(usize);

pub(crate) struct StateNode<S: StateId, E: EventId> {
    pub(crate) id: S,
    /// Depth in the hierarchy; root states are at level 1.
    pub(crate) level: usize,
    pub(crate) super_state: Option<StateKey>,
    /// The region of `super_state` this state belongs to.
    pub(crate) region: Option<RegionKey>,
    pub(crate) regions: Vec<RegionKey>,
    pub(crate) entry_actions: Vec<Action<S, E>>,
    pub(crate) exit_actions: Vec<Action<S, E>>,
    pub(crate) do_actions: Vec<DoAction<S, E>>,
    pub(crate) history: HistoryType,
    /// Explicitly configured history, used to flag history on simple states.
    pub(crate) history_declared: bool,
    pub(crate) transitions: HashMap<E, Vec<Transition<S, E>>>,
    pub(crate) completion_transitions: Vec<Transition<S, E>>,
}

impl<S: StateId, E: EventId> StateNode<S, E> {
    fn new(id: S) -> Self {
        Self {
            id,
            level: 1,
            super_state: None,
            region: None,
            regions: Vec::new(),
            entry_actions: Vec::new(),
            exit_actions: Vec::new(),
            do_actions: Vec::new(),
            history: HistoryType::None,
            history_declared: false,
            transitions: HashMap::new(),
            completion_transitions: Vec::new(),
        }
    }

    pub(crate) fn is_composite(&self) -> bool {
        !self.regions.is_empty()
    }
}

#[derive(Debug)]
pub(crate) struct RegionNode {
    pub(crate) owner: StateKey,
    pub(crate) sub_states: Vec<StateKey>,
    pub(crate) initial: Option<StateKey>,
    pub(crate) active: Option<StateKey>,
    pub(crate) last_active: Option<StateKey>,
}

pub(crate) struct StateTree<S: StateId, E: EventId> {
    states: Vec<StateNode<S, E>>,
    regions: Vec<RegionNode>,
    index: HashMap<S, StateKey>,
}

impl<S: StateId, E: EventId> StateTree<S, E> {
    pub(crate) fn new() -> Self {
        Self {
            states: Vec::new(),
            regions: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Key of the state with this id, declaring the state on first mention.
    pub(crate) fn state_key(&mut self, id: S) -> StateKey {
        if let Some(key) = self.index.get(&id) {
            return *key;
        }
        let key = StateKey(self.states.len());
        self.index.insert(id.clone(), key);
        self.states.push(StateNode::new(id));
        key
    }

    pub(crate) fn find(&self, id: &S) -> Option<StateKey> {
        self.index.get(id).copied()
    }

    pub(crate) fn state(&self, key: StateKey) -> &StateNode<S, E> {
        &self.states[key.0]
    }

    pub(crate) fn state_mut(&mut self, key: StateKey) -> &mut StateNode<S, E> {
        &mut self.states[key.0]
    }

    pub(crate) fn region(&self, key: RegionKey) -> &RegionNode {
        &self.regions[key.0]
    }

    pub(crate) fn region_mut(&mut self, key: RegionKey) -> &mut RegionNode {
        &mut self.regions[key.0]
    }

    pub(crate) fn id(&self, key: StateKey) -> &S {
        &self.states[key.0].id
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = StateKey> {
        (0..self.states.len()).map(StateKey)
    }

    pub(crate) fn region_keys(&self) -> impl Iterator<Item = RegionKey> {
        (0..self.regions.len()).map(RegionKey)
    }

    /// Level of a state, 0 for the synthetic root outside every state.
    pub(crate) fn level(&self, key: Option<StateKey>) -> usize {
        key.map_or(0, |key| self.state(key).level)
    }

    /// Super state of a state. The synthetic root is its own super state.
    pub(crate) fn super_state(&self, key: Option<StateKey>) -> Option<StateKey> {
        key.and_then(|key| self.state(key).super_state)
    }

    /// Whether `key` is `ancestor` or lies somewhere below it.
    pub(crate) fn is_within(&self, key: StateKey, ancestor: StateKey) -> bool {
        let mut current = Some(key);
        while let Some(state) = current {
            if state == ancestor {
                return true;
            }
            current = self.state(state).super_state;
        }
        false
    }

    pub(crate) fn add_region(&mut self, owner: StateKey) -> RegionKey {
        let key = RegionKey(self.regions.len());
        self.regions.push(RegionNode {
            owner,
            sub_states: Vec::new(),
            initial: None,
            active: None,
            last_active: None,
        });
        self.state_mut(owner).regions.push(key);
        key
    }

    /// Attach `sub` to `region`, recomputing levels of the attached subtree.
    pub(crate) fn add_sub_state(
        &mut self,
        region: RegionKey,
        sub: StateKey,
    ) -> Result<(), HierarchyError> {
        let owner = self.region(region).owner;
        if sub == owner {
            return Err(HierarchyError::OwnSuperState {
                state: self.label(sub),
            });
        }
        if let Some(existing) = self.state(sub).super_state {
            return Err(HierarchyError::SuperStateAlreadySet {
                super_state: self.label(owner),
                state: self.label(sub),
                existing: self.label(existing),
            });
        }
        if self.is_within(owner, sub) {
            return Err(HierarchyError::CyclicHierarchy {
                super_state: self.label(owner),
                state: self.label(sub),
            });
        }

        let node = self.state_mut(sub);
        node.super_state = Some(owner);
        node.region = Some(region);
        self.region_mut(region).sub_states.push(sub);

        let level = self.state(owner).level + 1;
        self.set_level(sub, level);
        Ok(())
    }

    pub(crate) fn set_initial_state(
        &mut self,
        region: RegionKey,
        sub: StateKey,
    ) -> Result<(), HierarchyError> {
        if self.state(sub).region != Some(region) {
            return Err(HierarchyError::InitialStateNotInRegion {
                super_state: self.label(self.region(region).owner),
                state: self.label(sub),
            });
        }
        self.region_mut(region).initial = Some(sub);
        Ok(())
    }

    /// Set the level of a state and propagate it to every descendant.
    pub(crate) fn set_level(&mut self, key: StateKey, level: usize) {
        let mut pending = vec![(key, level)];
        while let Some((key, level)) = pending.pop() {
            self.state_mut(key).level = level;
            for region in self.state(key).regions.clone() {
                for sub in &self.region(region).sub_states {
                    pending.push((*sub, level + 1));
                }
            }
        }
    }

    /// Transitions declared on `key` for `event`, in declaration order.
    pub(crate) fn transitions(&self, key: StateKey, event: &E) -> &[Transition<S, E>] {
        self.state(key)
            .transitions
            .get(event)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Currently active sub-states of `key`, innermost first.
    pub(crate) fn active_descendants(&self, key: StateKey) -> Vec<StateKey> {
        let mut descendants = Vec::new();
        self.collect_active(key, &mut descendants);
        descendants
    }

    fn collect_active(&self, key: StateKey, out: &mut Vec<StateKey>) {
        for region in &self.state(key).regions {
            if let Some(active) = self.region(*region).active {
                self.collect_active(active, out);
                out.push(active);
            }
        }
    }

    /// Whether a state has no active sub-state in any of its regions.
    pub(crate) fn is_leaf(&self, key: StateKey) -> bool {
        self.state(key)
            .regions
            .iter()
            .all(|region| self.region(*region).active.is_none())
    }

    /// Whether the containing region currently points at this state.
    /// Root states have no region and count as active once entered.
    pub(crate) fn is_marked_active(&self, key: StateKey) -> bool {
        self.state(key)
            .region
            .map_or(true, |region| self.region(region).active == Some(key))
    }

    pub(crate) fn label(&self, key: StateKey) -> String {
        format!("{:?}", self.id(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> StateTree<&'static str, u8> {
        StateTree::new()
    }

    #[test]
    fn states_are_declared_once() {
        let mut tree = tree();
        let first = tree.state_key("A");
        let second = tree.state_key("A");

        assert_eq!(first, second);
        assert_eq!(tree.find(&"A"), Some(first));
        assert_eq!(tree.find(&"B"), None);
    }

    #[test]
    fn sub_states_are_one_level_deeper() {
        let mut tree = tree();
        let a = tree.state_key("A");
        let a1 = tree.state_key("A1");
        let region = tree.add_region(a);

        tree.add_sub_state(region, a1).unwrap();

        assert_eq!(tree.state(a).level, 1);
        assert_eq!(tree.state(a1).level, 2);
        assert_eq!(tree.state(a1).super_state, Some(a));
        assert_eq!(tree.state(a1).region, Some(region));
    }

    #[test]
    fn attaching_a_subtree_relevels_descendants() {
        let mut tree = tree();
        let b = tree.state_key("B");
        let b1 = tree.state_key("B1");
        let region = tree.add_region(b);
        tree.add_sub_state(region, b1).unwrap();

        let a = tree.state_key("A");
        let region = tree.add_region(a);
        tree.add_sub_state(region, b).unwrap();

        assert_eq!(tree.state(b).level, 2);
        assert_eq!(tree.state(b1).level, 3);
    }

    #[test]
    fn state_cannot_have_two_super_states() {
        let mut tree = tree();
        let a = tree.state_key("A");
        let b = tree.state_key("B");
        let c = tree.state_key("C");
        let region_a = tree.add_region(a);
        let region_b = tree.add_region(b);
        tree.add_sub_state(region_a, c).unwrap();

        let error = tree.add_sub_state(region_b, c).unwrap_err();

        assert!(matches!(error, HierarchyError::SuperStateAlreadySet { .. }));
    }

    #[test]
    fn state_cannot_be_its_own_super_state() {
        let mut tree = tree();
        let a = tree.state_key("A");
        let region = tree.add_region(a);

        let error = tree.add_sub_state(region, a).unwrap_err();

        assert_eq!(
            error,
            HierarchyError::OwnSuperState {
                state: "\"A\"".to_string()
            }
        );
    }

    #[test]
    fn ancestors_cannot_become_sub_states() {
        let mut tree = tree();
        let a = tree.state_key("A");
        let a1 = tree.state_key("A1");
        let region = tree.add_region(a);
        tree.add_sub_state(region, a1).unwrap();

        let below = tree.add_region(a1);
        let error = tree.add_sub_state(below, a).unwrap_err();

        assert!(matches!(error, HierarchyError::CyclicHierarchy { .. }));
    }

    #[test]
    fn initial_state_must_belong_to_region() {
        let mut tree = tree();
        let a = tree.state_key("A");
        let a1 = tree.state_key("A1");
        let other = tree.state_key("X");
        let region = tree.add_region(a);
        tree.add_sub_state(region, a1).unwrap();

        assert!(tree.set_initial_state(region, a1).is_ok());
        assert!(matches!(
            tree.set_initial_state(region, other),
            Err(HierarchyError::InitialStateNotInRegion { .. })
        ));
        assert_eq!(tree.region(region).initial, Some(a1));
    }

    #[test]
    fn missing_transitions_are_an_empty_slice() {
        let mut tree = tree();
        let a = tree.state_key("A");

        assert!(tree.transitions(a, &1).is_empty());
    }

    #[test]
    fn active_descendants_are_innermost_first() {
        let mut tree = tree();
        let a = tree.state_key("A");
        let a1 = tree.state_key("A1");
        let a11 = tree.state_key("A11");
        let a2 = tree.state_key("A2");
        let first = tree.add_region(a);
        let second = tree.add_region(a);
        let inner = tree.add_region(a1);
        tree.add_sub_state(first, a1).unwrap();
        tree.add_sub_state(inner, a11).unwrap();
        tree.add_sub_state(second, a2).unwrap();

        tree.region_mut(first).active = Some(a1);
        tree.region_mut(inner).active = Some(a11);
        tree.region_mut(second).active = Some(a2);

        assert_eq!(tree.active_descendants(a), vec![a11, a1, a2]);
        assert!(!tree.is_leaf(a));
        assert!(tree.is_leaf(a11));
        assert!(tree.is_marked_active(a1));
    }

    #[test]
    fn synthetic_root_is_level_zero() {
        let mut tree = tree();
        let a = tree.state_key("A");

        assert_eq!(tree.level(None), 0);
        assert_eq!(tree.level(Some(a)), 1);
        assert_eq!(tree.super_state(Some(a)), None);
        assert_eq!(tree.super_state(None), None);
    }

    proptest::proptest! {
        #[test]
        fn levels_follow_super_states_in_any_attach_order(
            edges in proptest::collection::vec((0..12u8, 0..12u8), 0..40)
        ) {
            let mut tree: StateTree<u8, u8> = StateTree::new();
            for (owner, sub) in edges {
                let owner = tree.state_key(owner);
                let sub = tree.state_key(sub);
                let region = match tree.state(owner).regions.first() {
                    Some(region) => *region,
                    None => tree.add_region(owner),
                };
                // rejected edges leave the tree untouched
                let _ = tree.add_sub_state(region, sub);
            }

            for key in tree.keys() {
                let expected = tree.level(tree.state(key).super_state) + 1;
                proptest::prop_assert_eq!(tree.state(key).level, expected);
            }
        }
    }
}
