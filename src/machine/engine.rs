//! Job processing: initial entry, event dispatch, completions and do-action
//! faults.
//!
//! The engine is only ever touched by the thread holding the machine's core
//! lock, so it mutates the hierarchy's active and history pointers freely.

use super::dispatch;
use super::extension::ExtensionHost;
use super::queue::{EventQueue, Job};
use super::supervisor::{Launch, Supervisor};
use super::traversal;
use super::EventSender;
use crate::checkpoint::HistoryRecord;
use crate::core::{Action, ActionError, EventArgument, EventId, StateId, TransitionContext};
use crate::error::{FaultKind, StateMachineError};
use crate::hierarchy::{StateKey, StateTree, Transition};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, trace};

pub(crate) struct Engine<S: StateId, E: EventId> {
    name: String,
    tree: StateTree<S, E>,
    /// Active leaves in activation order.
    current: Vec<StateKey>,
    /// Copy of the active leaf ids readable without the core lock.
    published: Arc<RwLock<Vec<S>>>,
    supervisor: Supervisor,
    extensions: Arc<ExtensionHost<S, E>>,
    sender: EventSender<S, E>,
}

impl<S: StateId, E: EventId> Engine<S, E> {
    pub(crate) fn new(
        name: String,
        tree: StateTree<S, E>,
        extensions: Arc<ExtensionHost<S, E>>,
        published: Arc<RwLock<Vec<S>>>,
        sender: EventSender<S, E>,
    ) -> Self {
        Self {
            supervisor: Supervisor::new(name.clone()),
            name,
            tree,
            current: Vec::new(),
            published,
            extensions,
            sender,
        }
    }

    pub(crate) fn tree(&self) -> &StateTree<S, E> {
        &self.tree
    }

    /// Process queued jobs until the queue is empty or `keep_going` says stop.
    pub(crate) fn pump(
        &mut self,
        queue: &EventQueue<E>,
        keep_going: impl Fn() -> bool,
    ) -> Result<(), StateMachineError> {
        while keep_going() {
            let Some(job) = queue.next() else {
                break;
            };
            trace!(machine = %self.name, job = ?job, "Processing job");
            self.process(job)?;
        }
        Ok(())
    }

    fn process(&mut self, job: Job<E>) -> Result<(), StateMachineError> {
        match job {
            Job::EnterInitialState(state) => self.enter_initial_state(state),
            Job::Fire { event, argument } => self.fire(event, argument),
            Job::Completion { state, generation } => self.complete(state, generation),
            Job::DoActionFault { state, error } => {
                let context = self.context(Some(state), None, None);
                self.report(FaultKind::DoAction, &context, error)
            }
        }
    }

    fn enter_initial_state(&mut self, state: StateKey) -> Result<(), StateMachineError> {
        let id = self.tree.id(state).clone();
        debug!(machine = %self.name, state = ?id, "Entering initial state");
        self.extensions
            .for_each(|extension| extension.entering_initial_state(&self.name, &id));

        let context = self.context(None, None, None);
        let (mut exits, mut path) = (Vec::new(), Vec::new());
        traversal::state_changes(&self.tree, None, Some(state), state, &mut exits, &mut path);
        let entries = traversal::entry_sequence(&self.tree, &path);

        let mut exited = Vec::new();
        for entry in &entries {
            self.enter(*entry, &context, &mut exited)?;
        }
        let leaves = self.replace_leaves(&exited, &entries);

        self.extensions
            .for_each(|extension| extension.entered_initial_state(&self.name, &id, &context));
        for leaf in leaves {
            let new = self.tree.id(leaf);
            self.extensions
                .for_each(|extension| extension.switched_state(&self.name, None, new));
        }
        Ok(())
    }

    fn fire(&mut self, event: E, argument: Option<EventArgument>) -> Result<(), StateMachineError> {
        debug!(machine = %self.name, event = ?event, "Firing event");
        self.extensions
            .for_each(|extension| extension.firing_event(&self.name, &event, argument.as_ref()));

        let resolution = dispatch::resolve(&self.tree, &self.current, &event, |leaf| {
            self.context(Some(leaf), Some(event.clone()), argument.clone())
        });

        for failure in resolution.guard_failures {
            let context = self.context(Some(failure.leaf), Some(event.clone()), argument.clone());
            self.report(FaultKind::Guard, &context, failure.error)?;
        }

        if resolution.candidates.is_empty() {
            debug!(machine = %self.name, event = ?event, "Event declined");
            for leaf in self.current.clone() {
                let context = self.context(Some(leaf), Some(event.clone()), argument.clone());
                self.extensions
                    .for_each(|extension| extension.transition_declined(&self.name, &context));
            }
        }

        for candidate in resolution.candidates {
            let Some(transition) = self
                .tree
                .transitions(candidate.state, &event)
                .get(candidate.index)
                .cloned()
            else {
                continue;
            };
            let context = self.context(Some(candidate.leaf), Some(event.clone()), argument.clone());

            if !self.current.contains(&candidate.leaf) {
                debug!(machine = %self.name, event = ?event, "Skipping transition of an exited state");
                let (source, target) = self.endpoints(&transition);
                self.extensions.for_each(|extension| {
                    extension.skipped_transition(&self.name, &source, target.as_ref(), &context)
                });
                continue;
            }

            self.run_transition(&transition, candidate.leaf, &context)?;
        }

        self.extensions
            .for_each(|extension| extension.fired_event(&self.name, &event, argument.as_ref()));
        Ok(())
    }

    /// Fire the first completion transition of `state` whose guard passes.
    fn complete(&mut self, state: StateKey, generation: u64) -> Result<(), StateMachineError> {
        if !self.supervisor.is_current(state, generation) {
            trace!(machine = %self.name, generation, "Ignoring stale completion");
            return Ok(());
        }
        let Some(leaf) = self
            .current
            .iter()
            .copied()
            .find(|leaf| self.tree.is_within(*leaf, state))
        else {
            return Ok(());
        };

        debug!(machine = %self.name, state = ?self.tree.id(state), "State completed");
        let context = self.context(Some(leaf), None, None);
        let mut selected = None;
        for transition in self.tree.state(state).completion_transitions.clone() {
            match transition.will_fire(&context) {
                Ok(true) => {
                    selected = Some(transition);
                    break;
                }
                Ok(false) => {}
                Err(error) => self.report(FaultKind::Guard, &context, error)?,
            }
        }

        match selected {
            Some(transition) => self.run_transition(&transition, leaf, &context),
            None => Ok(()),
        }
    }

    fn run_transition(
        &mut self,
        transition: &Transition<S, E>,
        leaf: StateKey,
        context: &TransitionContext<S, E>,
    ) -> Result<(), StateMachineError> {
        let (source, target) = self.endpoints(transition);
        debug!(machine = %self.name, source = ?source, target = ?target, "Executing transition");
        self.extensions.for_each(|extension| {
            extension.executing_transition(&self.name, &source, target.as_ref(), context)
        });

        let leaves = self.execute_transition(transition, leaf, context)?;

        self.extensions.for_each(|extension| {
            extension.executed_transition(&self.name, &source, target.as_ref(), context)
        });
        let old = self.tree.id(leaf).clone();
        for new in leaves {
            let new = self.tree.id(new);
            self.extensions
                .for_each(|extension| extension.switched_state(&self.name, Some(&old), new));
        }
        Ok(())
    }

    /// Exit, run the transition's actions, then enter. Returns the new leaves.
    fn execute_transition(
        &mut self,
        transition: &Transition<S, E>,
        leaf: StateKey,
        context: &TransitionContext<S, E>,
    ) -> Result<Vec<StateKey>, StateMachineError> {
        let Some(target) = transition.target else {
            self.run_actions(&transition.actions, FaultKind::TransitionAction, context)?;
            return Ok(Vec::new());
        };

        let (mut exits, mut path) = (Vec::new(), Vec::new());
        traversal::state_changes(&self.tree, Some(leaf), Some(target), target, &mut exits, &mut path);
        let exits = traversal::with_active_descendants(&self.tree, &exits);

        let mut exited = Vec::with_capacity(exits.len());
        for state in exits {
            self.exit(state, context)?;
            exited.push(state);
        }

        self.run_actions(&transition.actions, FaultKind::TransitionAction, context)?;

        let entries = traversal::entry_sequence(&self.tree, &path);
        for state in &entries {
            self.enter(*state, context, &mut exited)?;
        }

        Ok(self.replace_leaves(&exited, &entries))
    }

    fn exit(&mut self, state: StateKey, context: &TransitionContext<S, E>) -> Result<(), StateMachineError> {
        trace!(machine = %self.name, state = ?self.tree.id(state), "Exiting state");
        self.run_actions(&self.tree.state(state).exit_actions, FaultKind::ExitAction, context)?;
        self.supervisor.cancel(state);

        if let Some(region) = self.tree.state(state).region {
            let region = self.tree.region_mut(region);
            region.last_active = Some(state);
            if region.active == Some(state) {
                region.active = None;
            }
        }
        Ok(())
    }

    fn enter(
        &mut self,
        state: StateKey,
        context: &TransitionContext<S, E>,
        exited: &mut Vec<StateKey>,
    ) -> Result<(), StateMachineError> {
        if let Some(region) = self.tree.state(state).region {
            let occupant = self.tree.region(region).active.filter(|o| *o != state);
            if let Some(occupant) = occupant {
                for displaced in traversal::with_active_descendants(&self.tree, &[occupant]) {
                    self.exit(displaced, context)?;
                    exited.push(displaced);
                }
            }
            self.tree.region_mut(region).active = Some(state);
        }

        trace!(machine = %self.name, state = ?self.tree.id(state), "Entering state");
        self.run_actions(&self.tree.state(state).entry_actions, FaultKind::EntryAction, context)?;

        let node = self.tree.state(state);
        self.supervisor.start(
            Launch {
                state,
                id: &node.id,
                actions: &node.do_actions,
                completes: !node.completion_transitions.is_empty(),
            },
            &self.sender,
        );
        Ok(())
    }

    fn run_actions(
        &self,
        actions: &[Action<S, E>],
        kind: FaultKind,
        context: &TransitionContext<S, E>,
    ) -> Result<(), StateMachineError> {
        for action in actions {
            if let Err(error) = action.execute(context) {
                self.report(kind, context, error)?;
            }
        }
        Ok(())
    }

    /// Swap exited leaves for the leaves among `entered`, keeping the
    /// position of the first replaced leaf. Returns the new leaves.
    fn replace_leaves(&mut self, exited: &[StateKey], entered: &[StateKey]) -> Vec<StateKey> {
        let position = self.current.iter().position(|leaf| exited.contains(leaf));
        self.current.retain(|leaf| !exited.contains(leaf));

        let mut leaves: Vec<StateKey> = Vec::new();
        for state in entered {
            let is_new_leaf = self.tree.is_marked_active(*state)
                && self.tree.is_leaf(*state)
                && !self.current.contains(state)
                && !leaves.contains(state);
            if is_new_leaf {
                leaves.push(*state);
            }
        }

        let at = position.unwrap_or(self.current.len()).min(self.current.len());
        self.current.splice(at..at, leaves.iter().copied());
        self.publish();
        leaves
    }

    fn publish(&self) {
        let ids = self.current_state_ids();
        trace!(machine = %self.name, current = ?ids, "Active states changed");
        *self.published.write() = ids;
    }

    pub(crate) fn current_state_ids(&self) -> Vec<S> {
        self.current
            .iter()
            .map(|leaf| self.tree.id(*leaf).clone())
            .collect()
    }

    /// One record per region that remembers a last active state.
    pub(crate) fn history_records(&self) -> Vec<HistoryRecord<S>> {
        self.tree
            .region_keys()
            .filter_map(|key| {
                let region = self.tree.region(key);
                region.last_active.map(|last| HistoryRecord {
                    super_state: self.tree.id(region.owner).clone(),
                    last_active_state: self.tree.id(last).clone(),
                })
            })
            .collect()
    }

    /// Restore active leaves and history pointers without running any action.
    ///
    /// Everything is validated before the hierarchy is touched. Returns
    /// whether any active state was restored.
    pub(crate) fn load(
        &mut self,
        current: &[S],
        history: &[HistoryRecord<S>],
    ) -> Result<bool, StateMachineError> {
        let leaves = current
            .iter()
            .map(|id| self.known(id))
            .collect::<Result<Vec<_>, _>>()?;

        let mut remembered = Vec::with_capacity(history.len());
        for record in history {
            let super_state = self.known(&record.super_state)?;
            let state = self.known(&record.last_active_state)?;
            match self.tree.state(state).region {
                Some(region) if self.tree.state(state).super_state == Some(super_state) => {
                    remembered.push((region, state));
                }
                _ => {
                    return Err(StateMachineError::HistoryStateNotASubState {
                        super_state: self.tree.label(super_state),
                        state: self.tree.label(state),
                    })
                }
            }
        }

        for (region, state) in remembered {
            self.tree.region_mut(region).last_active = Some(state);
        }
        for leaf in &leaves {
            let mut state = *leaf;
            while let Some(region) = self.tree.state(state).region {
                self.tree.region_mut(region).active = Some(state);
                let Some(parent) = self.tree.state(state).super_state else {
                    break;
                };
                state = parent;
            }
        }

        debug!(machine = %self.name, current = ?current, "Loaded state machine");
        self.current = leaves;
        self.publish();
        Ok(!self.current.is_empty())
    }

    fn known(&self, id: &S) -> Result<StateKey, StateMachineError> {
        self.tree
            .find(id)
            .ok_or_else(|| StateMachineError::UnknownState {
                state: format!("{id:?}"),
            })
    }

    fn endpoints(&self, transition: &Transition<S, E>) -> (S, Option<S>) {
        (
            self.tree.id(transition.source).clone(),
            transition.target.map(|target| self.tree.id(target).clone()),
        )
    }

    fn context(
        &self,
        source: Option<StateKey>,
        event: Option<E>,
        argument: Option<EventArgument>,
    ) -> TransitionContext<S, E> {
        TransitionContext::new(
            source.map(|key| self.tree.id(key).clone()),
            event,
            argument,
            self.sender.clone(),
        )
    }

    fn report(
        &self,
        kind: FaultKind,
        context: &TransitionContext<S, E>,
        error: ActionError,
    ) -> Result<(), StateMachineError> {
        self.extensions.report(&self.name, kind, context, error)
    }
}
