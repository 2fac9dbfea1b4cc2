use crate::entity::{
    Entity, EntityBox, EntityCollectionData, EntityData, Node, declare_child_lockables,
};
use crate::lifecycle::{Context, Progress, StageProcess};
use crate::locking::LockSet;
use crate::types::{EntityKind, ProcessError, Stage, StepId};

// =============================================================================
// TRANSITION
// =============================================================================

/// Exit of a step: a set of conditions run in parallel and the step to
/// continue with once all of them are met. No target ends the chapter.
pub struct TransitionData {
    name: String,
    target: Option<StepId>,
    conditions: Vec<Option<EntityBox>>,
}

impl TransitionData {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        target: Option<StepId>,
        conditions: Vec<Option<EntityBox>>,
    ) -> Self {
        Self {
            name: name.into(),
            target,
            conditions,
        }
    }

    #[must_use]
    pub fn target(&self) -> Option<&StepId> {
        self.target.as_ref()
    }

    /// Resources declared by the conditions of this transition.
    #[must_use]
    pub fn lockables(&self) -> LockSet {
        let mut out = LockSet::new();
        self.declare_lockables(&mut out);
        out
    }

    /// True when every condition is met. Conditions never started (skipped)
    /// count as met.
    #[must_use]
    pub fn conditions_met(&self) -> bool {
        self.conditions
            .iter()
            .flatten()
            .all(|condition| condition.is_completed() || !condition.stage().is_running())
    }
}

impl EntityData for TransitionData {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> EntityKind {
        EntityKind::TRANSITION
    }

    fn declare_lockables(&self, out: &mut LockSet) {
        declare_child_lockables(self, out);
    }
}

impl EntityCollectionData for TransitionData {
    fn child_count(&self) -> usize {
        self.conditions.len()
    }

    fn child(&self, index: usize) -> Option<&dyn Entity> {
        match self.conditions.get(index) {
            Some(Some(condition)) => Some(condition.as_ref()),
            _ => None,
        }
    }

    fn child_mut(&mut self, index: usize) -> Option<&mut dyn Entity> {
        match self.conditions.get_mut(index) {
            Some(Some(condition)) => Some(condition.as_mut()),
            _ => None,
        }
    }
}

/// Active stage of a transition: ticks the conditions until all are met.
#[derive(Debug, Default)]
pub struct TransitionActiveProcess;

impl StageProcess<TransitionData> for TransitionActiveProcess {
    fn update(
        &mut self,
        data: &mut TransitionData,
        ctx: &mut Context<'_>,
    ) -> Result<Progress, ProcessError> {
        for condition in data.conditions.iter_mut().flatten() {
            if condition.stage().is_running() {
                condition.update(ctx)?;
            }
        }
        Ok(if data.conditions_met() {
            Progress::Complete
        } else {
            Progress::Pending
        })
    }

    fn fast_forward(
        &mut self,
        data: &mut TransitionData,
        ctx: &mut Context<'_>,
    ) -> Result<(), ProcessError> {
        for condition in data.conditions.iter_mut().flatten() {
            if matches!(condition.stage(), Stage::Activating | Stage::Active) {
                condition.mark_to_fast_forward(ctx)?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// TRANSITION COLLECTION
// =============================================================================

/// The transitions of one step, run in parallel.
pub struct TransitionCollectionData {
    name: String,
    transitions: Vec<Option<Node<TransitionData>>>,
}

impl TransitionCollectionData {
    #[must_use]
    pub fn new(name: impl Into<String>, transitions: Vec<Option<Node<TransitionData>>>) -> Self {
        Self {
            name: name.into(),
            transitions,
        }
    }

    #[must_use]
    pub fn transition(&self, index: usize) -> Option<&TransitionData> {
        self.transitions
            .get(index)
            .and_then(Option::as_ref)
            .map(Node::data)
    }

    pub fn transitions(&self) -> impl Iterator<Item = (usize, &Node<TransitionData>)> {
        self.transitions
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|transition| (index, transition)))
    }

    /// Index of the first transition whose Active work is complete.
    #[must_use]
    pub fn first_completed(&self) -> Option<usize> {
        self.transitions()
            .find(|(_, transition)| transition.is_completed())
            .map(|(index, _)| index)
    }
}

impl EntityData for TransitionCollectionData {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> EntityKind {
        EntityKind::TRANSITION_COLLECTION
    }

    fn declare_lockables(&self, out: &mut LockSet) {
        declare_child_lockables(self, out);
    }
}

impl EntityCollectionData for TransitionCollectionData {
    fn child_count(&self) -> usize {
        self.transitions.len()
    }

    fn child(&self, index: usize) -> Option<&dyn Entity> {
        match self.transitions.get(index) {
            Some(Some(transition)) => Some(transition as &dyn Entity),
            _ => None,
        }
    }

    fn child_mut(&mut self, index: usize) -> Option<&mut dyn Entity> {
        match self.transitions.get_mut(index) {
            Some(Some(transition)) => Some(transition as &mut dyn Entity),
            _ => None,
        }
    }
}
