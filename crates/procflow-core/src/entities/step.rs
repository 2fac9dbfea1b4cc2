use super::{CollectionData, TransitionCollectionData, TransitionData};
use crate::composition::FoldedActivatingProcess;
use crate::entity::{Entity, EntityCollectionData, EntityData, Node};
use crate::lifecycle::{Context, ProcessEvent, Progress, StageProcess};
use crate::locking::{LockSet, ResourceId};
use crate::types::{EntityKind, ProcessError, StepId};
use std::collections::BTreeSet;

const BEHAVIORS: usize = 0;
const TRANSITIONS: usize = 1;

/// A step: behaviors that run while it is current and transitions that
/// decide when and where it is left.
///
/// Children are the behavior collection followed by the transition
/// collection, so activation starts behaviors first and teardown stops
/// transitions first.
pub struct StepData {
    id: StepId,
    behaviors: Node<CollectionData>,
    transitions: Node<TransitionCollectionData>,
    lockables: LockSet,
    to_unlock: BTreeSet<ResourceId>,
    tags_to_unlock: BTreeSet<String>,
    completed_transition: Option<usize>,
}

impl StepData {
    #[must_use]
    pub fn new(
        id: StepId,
        behaviors: Node<CollectionData>,
        transitions: Node<TransitionCollectionData>,
    ) -> Self {
        Self {
            id,
            behaviors,
            transitions,
            lockables: LockSet::new(),
            to_unlock: BTreeSet::new(),
            tags_to_unlock: BTreeSet::new(),
            completed_transition: None,
        }
    }

    /// Resources this step references directly, outside its content.
    #[must_use]
    pub fn with_lockables(mut self, lockables: LockSet) -> Self {
        self.lockables = lockables;
        self
    }

    /// Resources to keep unlocked while this step runs.
    #[must_use]
    pub fn with_unlocks(
        mut self,
        to_unlock: BTreeSet<ResourceId>,
        tags_to_unlock: BTreeSet<String>,
    ) -> Self {
        self.to_unlock = to_unlock;
        self.tags_to_unlock = tags_to_unlock;
        self
    }

    #[must_use]
    pub fn id(&self) -> &StepId {
        &self.id
    }

    #[must_use]
    pub fn to_unlock(&self) -> &BTreeSet<ResourceId> {
        &self.to_unlock
    }

    #[must_use]
    pub fn tags_to_unlock(&self) -> &BTreeSet<String> {
        &self.tags_to_unlock
    }

    /// Every lockable resource referenced by the step and its content.
    #[must_use]
    pub fn lockables(&self) -> LockSet {
        let mut out = LockSet::new();
        self.declare_lockables(&mut out);
        out
    }

    #[must_use]
    pub fn behaviors(&self) -> &Node<CollectionData> {
        &self.behaviors
    }

    #[must_use]
    pub fn transitions(&self) -> &TransitionCollectionData {
        self.transitions.data()
    }

    #[must_use]
    pub fn transition(&self, index: usize) -> Option<&TransitionData> {
        self.transitions.data().transition(index)
    }

    /// Index of the transition that completed the last run of this step.
    #[must_use]
    pub fn completed_transition(&self) -> Option<usize> {
        self.completed_transition
    }

    /// Step the completed transition leads to, if it names one.
    #[must_use]
    pub fn next_target(&self) -> Option<&StepId> {
        self.completed_transition
            .and_then(|index| self.transition(index))
            .and_then(TransitionData::target)
    }

    fn record_completion(&mut self, index: usize, ctx: &mut Context<'_>) {
        self.completed_transition = Some(index);
        tracing::debug!(step = %self.id, transition = index, "step completed");
        ctx.emit(ProcessEvent::StepCompleted {
            step: self.id.clone(),
            transition: index,
        });
    }
}

impl EntityData for StepData {
    fn name(&self) -> &str {
        self.id.as_str()
    }

    fn kind(&self) -> EntityKind {
        EntityKind::STEP
    }

    fn declare_lockables(&self, out: &mut LockSet) {
        out.union_with(&self.lockables);
        self.behaviors.declare_lockables(out);
        self.transitions.declare_lockables(out);
    }
}

impl EntityCollectionData for StepData {
    fn child_count(&self) -> usize {
        2
    }

    fn child(&self, index: usize) -> Option<&dyn Entity> {
        match index {
            BEHAVIORS => Some(&self.behaviors as &dyn Entity),
            TRANSITIONS => Some(&self.transitions as &dyn Entity),
            _ => None,
        }
    }

    fn child_mut(&mut self, index: usize) -> Option<&mut dyn Entity> {
        match index {
            BEHAVIORS => Some(&mut self.behaviors as &mut dyn Entity),
            TRANSITIONS => Some(&mut self.transitions as &mut dyn Entity),
            _ => None,
        }
    }
}

// =============================================================================
// STAGE PROCESSES
// =============================================================================

/// Starts behaviors, then transitions, forgetting the previous outcome.
#[derive(Debug, Default)]
pub struct StepActivatingProcess {
    walk: FoldedActivatingProcess,
}

impl StageProcess<StepData> for StepActivatingProcess {
    fn start(&mut self, data: &mut StepData, ctx: &mut Context<'_>) -> Result<(), ProcessError> {
        data.completed_transition = None;
        self.walk.start(data, ctx)
    }

    fn update(&mut self, data: &mut StepData, ctx: &mut Context<'_>) -> Result<Progress, ProcessError> {
        self.walk.update(data, ctx)
    }

    fn fast_forward(&mut self, data: &mut StepData, ctx: &mut Context<'_>) -> Result<(), ProcessError> {
        self.walk.fast_forward(data, ctx)
    }
}

/// Runs behaviors and transitions until a transition completes.
#[derive(Debug, Default)]
pub struct StepActiveProcess;

impl StageProcess<StepData> for StepActiveProcess {
    fn update(&mut self, data: &mut StepData, ctx: &mut Context<'_>) -> Result<Progress, ProcessError> {
        data.behaviors.update(ctx)?;
        data.transitions.update(ctx)?;
        match data.transitions.data().first_completed() {
            Some(index) => {
                data.record_completion(index, ctx);
                Ok(Progress::Complete)
            }
            None => Ok(Progress::Pending),
        }
    }

    fn fast_forward(&mut self, data: &mut StepData, ctx: &mut Context<'_>) -> Result<(), ProcessError> {
        // Prefer a transition that already finished, otherwise take the first.
        let chosen = data
            .transitions
            .data()
            .first_completed()
            .or_else(|| data.transitions.data().transitions().next().map(|(index, _)| index));
        let Some(index) = chosen else {
            tracing::warn!(step = %data.id, "fast-forwarded step has no transition");
            return Ok(());
        };
        if let Some(transition) = data.transitions.data_mut().child_mut(index) {
            transition.mark_to_fast_forward(ctx)?;
        }
        data.record_completion(index, ctx);
        Ok(())
    }
}
