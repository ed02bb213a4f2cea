//! Definition rules checked with `Validation`.

use crate::core::{EventId, StateId};
use crate::hierarchy::{StateKey, StateTree, Transition};
use crate::validation::violations::DefinitionError;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Type alias for a single structural check.
pub(crate) type DefinitionCheck<S, E> =
    fn(&StateTree<S, E>, StateKey) -> Validation<(), NonEmptyVec<DefinitionError>>;

/// Rules every state of a definition must satisfy.
///
/// Every rule runs against every state and ALL violations are accumulated,
/// so a faulty definition is reported in one pass.
pub(crate) struct DefinitionRules<S: StateId, E: EventId> {
    checks: Vec<DefinitionCheck<S, E>>,
}

impl<S: StateId, E: EventId> DefinitionRules<S, E> {
    pub(crate) fn new() -> Self {
        Self {
            checks: vec![
                regions_have_sub_states as DefinitionCheck<S, E>,
                regions_have_initial_states as DefinitionCheck<S, E>,
                history_needs_regions as DefinitionCheck<S, E>,
                transitions_are_reachable as DefinitionCheck<S, E>,
                completion_transitions_are_reachable as DefinitionCheck<S, E>,
            ],
        }
    }

    pub(crate) fn validate(
        &self,
        tree: &StateTree<S, E>,
    ) -> Validation<(), NonEmptyVec<DefinitionError>> {
        let checks: Vec<Validation<(), NonEmptyVec<DefinitionError>>> = tree
            .keys()
            .flat_map(|key| self.checks.iter().map(move |check| check(tree, key)))
            .collect();

        if checks.is_empty() {
            return Validation::success(());
        }
        Validation::all_vec(checks).map(|_| ())
    }
}

fn regions_have_sub_states<S: StateId, E: EventId>(
    tree: &StateTree<S, E>,
    key: StateKey,
) -> Validation<(), NonEmptyVec<DefinitionError>> {
    let empty = tree
        .state(key)
        .regions
        .iter()
        .any(|region| tree.region(*region).sub_states.is_empty());
    if empty {
        Validation::fail(DefinitionError::EmptyRegion {
            state: tree.label(key),
        })
    } else {
        Validation::success(())
    }
}

fn regions_have_initial_states<S: StateId, E: EventId>(
    tree: &StateTree<S, E>,
    key: StateKey,
) -> Validation<(), NonEmptyVec<DefinitionError>> {
    let missing = tree.state(key).regions.iter().any(|region| {
        let region = tree.region(*region);
        !region.sub_states.is_empty() && region.initial.is_none()
    });
    if missing {
        Validation::fail(DefinitionError::RegionWithoutInitialState {
            state: tree.label(key),
        })
    } else {
        Validation::success(())
    }
}

fn history_needs_regions<S: StateId, E: EventId>(
    tree: &StateTree<S, E>,
    key: StateKey,
) -> Validation<(), NonEmptyVec<DefinitionError>> {
    let state = tree.state(key);
    if state.history_declared && state.history.remembers() && !state.is_composite() {
        Validation::fail(DefinitionError::HistoryWithoutRegions {
            state: tree.label(key),
            history: state.history.to_string(),
        })
    } else {
        Validation::success(())
    }
}

/// Index of the first transition shadowed by an earlier unguarded one.
fn first_unreachable<S: StateId, E: EventId>(transitions: &[Transition<S, E>]) -> Option<usize> {
    transitions
        .iter()
        .position(|transition| transition.guard.is_none())
        .map(|unguarded| unguarded + 1)
        .filter(|index| *index < transitions.len())
}

fn transitions_are_reachable<S: StateId, E: EventId>(
    tree: &StateTree<S, E>,
    key: StateKey,
) -> Validation<(), NonEmptyVec<DefinitionError>> {
    let mut events: Vec<&E> = tree.state(key).transitions.keys().collect();
    events.sort();

    let checks: Vec<Validation<(), NonEmptyVec<DefinitionError>>> = events
        .into_iter()
        .filter_map(|event| {
            first_unreachable(tree.transitions(key, event)).map(|index| {
                Validation::fail(DefinitionError::UnreachableTransition {
                    state: tree.label(key),
                    event: format!("{event:?}"),
                    index,
                })
            })
        })
        .collect();

    if checks.is_empty() {
        Validation::success(())
    } else {
        Validation::all_vec(checks).map(|_| ())
    }
}

fn completion_transitions_are_reachable<S: StateId, E: EventId>(
    tree: &StateTree<S, E>,
    key: StateKey,
) -> Validation<(), NonEmptyVec<DefinitionError>> {
    match first_unreachable(&tree.state(key).completion_transitions) {
        Some(index) => Validation::fail(DefinitionError::UnreachableCompletionTransition {
            state: tree.label(key),
            index,
        }),
        None => Validation::success(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Guard, HistoryType};

    #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
    enum Event {
        Go,
    }

    type Tree = StateTree<&'static str, Event>;

    fn transition(tree: &mut Tree, from: &'static str, guarded: bool) -> Transition<&'static str, Event> {
        Transition {
            source: tree.state_key(from),
            target: None,
            guard: guarded.then(|| Guard::new(|_| true)),
            actions: Vec::new(),
        }
    }

    fn failures(tree: &Tree) -> Vec<DefinitionError> {
        match DefinitionRules::new().validate(tree) {
            Validation::Success(_) => Vec::new(),
            Validation::Failure(errors) => errors.iter().cloned().collect(),
        }
    }

    #[test]
    fn well_formed_definition_passes() {
        let mut tree = Tree::new();
        let a = tree.state_key("A");
        let a1 = tree.state_key("A1");
        let region = tree.add_region(a);
        tree.add_sub_state(region, a1).unwrap();
        tree.set_initial_state(region, a1).unwrap();

        assert!(DefinitionRules::new().validate(&tree).is_success());
    }

    #[test]
    fn empty_tree_passes() {
        assert!(DefinitionRules::new().validate(&Tree::new()).is_success());
    }

    #[test]
    fn validation_accumulates_all_violations() {
        let mut tree = Tree::new();
        let a = tree.state_key("A");
        tree.add_region(a);

        let b = tree.state_key("B");
        let b1 = tree.state_key("B1");
        let region = tree.add_region(b);
        tree.add_sub_state(region, b1).unwrap();

        let c = tree.state_key("C");
        tree.state_mut(c).history = HistoryType::Deep;
        tree.state_mut(c).history_declared = true;

        let errors = failures(&tree);

        assert_eq!(errors.len(), 3);
        assert!(errors
            .iter()
            .any(|e| matches!(e, DefinitionError::EmptyRegion { .. })));
        assert!(errors
            .iter()
            .any(|e| matches!(e, DefinitionError::RegionWithoutInitialState { .. })));
        assert!(errors
            .iter()
            .any(|e| matches!(e, DefinitionError::HistoryWithoutRegions { .. })));
    }

    #[test]
    fn transitions_behind_unguarded_ones_are_unreachable() {
        let mut tree = Tree::new();
        let a = tree.state_key("A");
        let first = transition(&mut tree, "A", false);
        let second = transition(&mut tree, "A", true);
        tree.state_mut(a)
            .transitions
            .insert(Event::Go, vec![first, second]);

        let errors = failures(&tree);

        assert_eq!(
            errors,
            vec![DefinitionError::UnreachableTransition {
                state: "\"A\"".to_string(),
                event: "Go".to_string(),
                index: 1,
            }]
        );
    }

    #[test]
    fn guarded_transitions_fall_through() {
        let mut tree = Tree::new();
        let a = tree.state_key("A");
        let first = transition(&mut tree, "A", true);
        let second = transition(&mut tree, "A", false);
        tree.state_mut(a)
            .transitions
            .insert(Event::Go, vec![first, second]);

        assert!(failures(&tree).is_empty());
    }

    #[test]
    fn completion_transitions_are_checked() {
        let mut tree = Tree::new();
        let a = tree.state_key("A");
        let first = transition(&mut tree, "A", false);
        let second = transition(&mut tree, "A", false);
        tree.state_mut(a).completion_transitions = vec![first, second];

        assert!(matches!(
            failures(&tree).as_slice(),
            [DefinitionError::UnreachableCompletionTransition { index: 1, .. }]
        ));
    }
}
