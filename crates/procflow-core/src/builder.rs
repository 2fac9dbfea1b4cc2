//! # Graph Builder
//!
//! Explicit factory that assembles entities with their stage processes and
//! configurators. Graphs are validated on assembly: step ids are unique
//! within a process and every transition target names a step of its chapter.

use crate::composition::{
    CollectionConfigurator, EntityIteratingProcess, FoldedActivatingProcess, FoldedActiveProcess,
    FoldedDeactivatingProcess, ParallelActiveProcess, ParallelActivatingProcess,
    ParallelConfigurator, ParallelDeactivatingProcess, SequenceConfigurator,
};
use crate::entities::{
    Chapter, ChapterData, ChapterPolicy, CollectionData, Process, ProcessData, Step,
    StepActivatingProcess, StepActiveProcess, StepData, Transition, TransitionActiveProcess,
    TransitionCollectionData, TransitionData,
};
use crate::entity::{EntityBox, Node};
use crate::lifecycle::{EmptyProcess, StageProcesses};
use crate::locking::{LockSet, LockablePropertyData, ResourceId};
use crate::primitives::PARALLEL_ACTIVE_TICK_CAP;
use crate::types::{EntityKind, ProcessError, StepId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Tunables applied to every entity the factory builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryOptions {
    /// Upper bound on the idle ticks of a parallel composite's Active stage.
    pub parallel_active_tick_cap: u64,
}

impl Default for FactoryOptions {
    fn default() -> Self {
        Self {
            parallel_active_tick_cap: PARALLEL_ACTIVE_TICK_CAP,
        }
    }
}

// =============================================================================
// BUILDERS
// =============================================================================

/// Fluent description of a transition.
#[derive(Default)]
pub struct TransitionBuilder {
    target: Option<StepId>,
    conditions: Vec<Option<EntityBox>>,
}

impl TransitionBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue with `target` once the conditions are met.
    #[must_use]
    pub fn to(mut self, target: impl Into<String>) -> Self {
        self.target = Some(StepId::new(target));
        self
    }

    #[must_use]
    pub fn condition(mut self, condition: EntityBox) -> Self {
        self.conditions.push(Some(condition));
        self
    }

    /// Empty condition slot.
    #[must_use]
    pub fn placeholder(mut self) -> Self {
        self.conditions.push(None);
        self
    }
}

/// Fluent description of a step.
pub struct StepBuilder {
    id: StepId,
    behaviors: Vec<Option<EntityBox>>,
    transitions: Vec<TransitionBuilder>,
    lockables: LockSet,
    to_unlock: BTreeSet<ResourceId>,
    tags_to_unlock: BTreeSet<String>,
}

impl StepBuilder {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: StepId::new(id),
            behaviors: Vec::new(),
            transitions: Vec::new(),
            lockables: LockSet::new(),
            to_unlock: BTreeSet::new(),
            tags_to_unlock: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn behavior(mut self, behavior: EntityBox) -> Self {
        self.behaviors.push(Some(behavior));
        self
    }

    /// Empty behavior slot.
    #[must_use]
    pub fn placeholder(mut self) -> Self {
        self.behaviors.push(None);
        self
    }

    #[must_use]
    pub fn transition(mut self, transition: TransitionBuilder) -> Self {
        self.transitions.push(transition);
        self
    }

    /// Resource referenced by the step itself.
    #[must_use]
    pub fn lockable(mut self, property: LockablePropertyData) -> Self {
        self.lockables.declare(&property);
        self
    }

    /// Keep `resource` unlocked while the step runs.
    #[must_use]
    pub fn unlock(mut self, resource: impl Into<ResourceId>) -> Self {
        self.to_unlock.insert(resource.into());
        self
    }

    /// Keep every registry resource tagged `tag` unlocked while the step runs.
    #[must_use]
    pub fn unlock_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags_to_unlock.insert(tag.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> &StepId {
        &self.id
    }
}

// =============================================================================
// FACTORY
// =============================================================================

/// Builds entities wired with the stage processes of their composition.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityFactory {
    options: FactoryOptions,
}

impl EntityFactory {
    #[must_use]
    pub fn new(options: FactoryOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> FactoryOptions {
        self.options
    }

    /// Children run one at a time, in list order, during Active.
    #[must_use]
    pub fn sequence(&self, data: CollectionData) -> Node<CollectionData> {
        Node::new(
            data,
            StageProcesses::new(
                EmptyProcess,
                EntityIteratingProcess::linear(),
                FoldedDeactivatingProcess::new(),
            ),
        )
        .with_configurator(SequenceConfigurator)
    }

    /// Children start one after the other and stop in reverse order.
    #[must_use]
    pub fn folded(&self, data: CollectionData) -> Node<CollectionData> {
        Node::new(
            data,
            StageProcesses::new(
                FoldedActivatingProcess::new(),
                FoldedActiveProcess::new(),
                FoldedDeactivatingProcess::new(),
            ),
        )
        .with_configurator(CollectionConfigurator)
    }

    /// Children start and stop all at once.
    #[must_use]
    pub fn parallel(&self, data: CollectionData) -> Node<CollectionData> {
        Node::new(
            data,
            StageProcesses::new(
                ParallelActivatingProcess::new(),
                ParallelActiveProcess::new(self.options.parallel_active_tick_cap),
                ParallelDeactivatingProcess::new(),
            ),
        )
        .with_configurator(ParallelConfigurator::new())
    }

    fn transition(&self, step: &StepId, index: usize, builder: TransitionBuilder) -> Transition {
        let name = match &builder.target {
            Some(target) => format!("{step}#{index}->{target}"),
            None => format!("{step}#{index}->end"),
        };
        Node::new(
            TransitionData::new(name, builder.target, builder.conditions),
            StageProcesses::new(
                ParallelActivatingProcess::new(),
                TransitionActiveProcess,
                ParallelDeactivatingProcess::new(),
            ),
        )
        .with_configurator(ParallelConfigurator::new())
    }

    /// Build a step. A step without transitions gets one unconditional
    /// transition that ends its chapter.
    #[must_use]
    pub fn step(&self, builder: StepBuilder) -> Step {
        let StepBuilder {
            id,
            behaviors,
            mut transitions,
            lockables,
            to_unlock,
            tags_to_unlock,
        } = builder;

        if transitions.is_empty() {
            transitions.push(TransitionBuilder::new());
        }

        let behaviors = self.folded(CollectionData::new(
            format!("{id}/behaviors"),
            EntityKind::BEHAVIOR_COLLECTION,
            behaviors,
        ));
        let transitions = transitions
            .into_iter()
            .enumerate()
            .map(|(index, transition)| Some(self.transition(&id, index, transition)))
            .collect();
        let transitions = Node::new(
            TransitionCollectionData::new(format!("{id}/transitions"), transitions),
            StageProcesses::new(
                ParallelActivatingProcess::new(),
                ParallelActiveProcess::new(self.options.parallel_active_tick_cap),
                ParallelDeactivatingProcess::new(),
            ),
        )
        .with_configurator(ParallelConfigurator::new());

        Node::new(
            StepData::new(id, behaviors, transitions)
                .with_lockables(lockables)
                .with_unlocks(to_unlock, tags_to_unlock),
            StageProcesses::new(
                StepActivatingProcess::default(),
                StepActiveProcess,
                FoldedDeactivatingProcess::new(),
            ),
        )
        .with_configurator(CollectionConfigurator)
    }

    /// Build a chapter entered at `first_step`, or at its first step.
    pub fn chapter(
        &self,
        name: impl Into<String>,
        first_step: Option<StepId>,
        steps: Vec<Step>,
    ) -> Result<Chapter, ProcessError> {
        let mut ids = BTreeSet::new();
        for step in &steps {
            if !ids.insert(step.data().id().clone()) {
                return Err(ProcessError::DuplicateStep(step.data().id().clone()));
            }
        }
        if let Some(first) = &first_step {
            if !ids.contains(first) {
                return Err(ProcessError::UnknownStep(first.clone()));
            }
        }
        for step in &steps {
            for (_, transition) in step.data().transitions().transitions() {
                if let Some(target) = transition.data().target() {
                    if !ids.contains(target) {
                        return Err(ProcessError::UnknownStep(target.clone()));
                    }
                }
            }
        }

        let steps = steps.into_iter().map(Some).collect();
        Ok(Node::new(
            ChapterData::new(name, steps, first_step),
            StageProcesses::new(
                EmptyProcess,
                EntityIteratingProcess::new(ChapterPolicy),
                FoldedDeactivatingProcess::new(),
            ),
        )
        .with_configurator(SequenceConfigurator))
    }

    /// Build a process running `chapters` in order.
    pub fn process(
        &self,
        name: impl Into<String>,
        chapters: Vec<Chapter>,
    ) -> Result<Process, ProcessError> {
        let mut ids = BTreeSet::new();
        for step in chapters.iter().flat_map(|chapter| chapter.data().steps()) {
            if !ids.insert(step.id().clone()) {
                return Err(ProcessError::DuplicateStep(step.id().clone()));
            }
        }

        let chapters = chapters.into_iter().map(Some).collect();
        Ok(Node::new(
            ProcessData::new(name, chapters),
            StageProcesses::new(
                EmptyProcess,
                EntityIteratingProcess::linear(),
                FoldedDeactivatingProcess::new(),
            ),
        )
        .with_configurator(SequenceConfigurator))
    }
}

// =============================================================================
// TESTS
// =============================================================================
