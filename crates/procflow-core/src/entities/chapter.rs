use super::StepData;
use crate::composition::IterationPolicy;
use crate::entity::{
    Entity, EntityCollectionData, EntityData, EntitySequenceData, Node, declare_child_lockables,
};
use crate::locking::LockSet;
use crate::types::{EntityKind, StepId};

/// A chapter: a graph of steps entered at `first_step` and walked by
/// following the transitions the steps complete with.
pub struct ChapterData {
    name: String,
    steps: Vec<Option<Node<StepData>>>,
    first_step: Option<StepId>,
    current: Option<usize>,
}

impl ChapterData {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        steps: Vec<Option<Node<StepData>>>,
        first_step: Option<StepId>,
    ) -> Self {
        Self {
            name: name.into(),
            steps,
            first_step,
            current: None,
        }
    }

    pub fn steps(&self) -> impl Iterator<Item = &StepData> {
        self.steps.iter().flatten().map(Node::data)
    }

    #[must_use]
    pub fn step_index(&self, id: &StepId) -> Option<usize> {
        self.steps
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|step| step.data().id() == id))
    }

    #[must_use]
    pub fn step(&self, id: &StepId) -> Option<&StepData> {
        self.step_index(id)
            .and_then(|index| self.steps.get(index))
            .and_then(Option::as_ref)
            .map(Node::data)
    }

    /// Index of the step the chapter starts with.
    #[must_use]
    pub fn entry_index(&self) -> Option<usize> {
        match &self.first_step {
            Some(id) => self.step_index(id),
            None => self.steps.iter().position(Option::is_some),
        }
    }

    #[must_use]
    pub fn entry_step(&self) -> Option<&StepData> {
        self.entry_index()
            .and_then(|index| self.steps.get(index))
            .and_then(Option::as_ref)
            .map(Node::data)
    }

    /// The step currently running, if any.
    #[must_use]
    pub fn current_step(&self) -> Option<&StepData> {
        self.current
            .and_then(|index| self.steps.get(index))
            .and_then(Option::as_ref)
            .map(Node::data)
    }
}

impl EntityData for ChapterData {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> EntityKind {
        EntityKind::CHAPTER
    }

    fn declare_lockables(&self, out: &mut LockSet) {
        declare_child_lockables(self, out);
    }
}

impl EntityCollectionData for ChapterData {
    fn child_count(&self) -> usize {
        self.steps.len()
    }

    fn child(&self, index: usize) -> Option<&dyn Entity> {
        match self.steps.get(index) {
            Some(Some(step)) => Some(step as &dyn Entity),
            _ => None,
        }
    }

    fn child_mut(&mut self, index: usize) -> Option<&mut dyn Entity> {
        match self.steps.get_mut(index) {
            Some(Some(step)) => Some(step as &mut dyn Entity),
            _ => None,
        }
    }
}

impl EntitySequenceData for ChapterData {
    fn current(&self) -> Option<usize> {
        self.current
    }

    fn set_current(&mut self, current: Option<usize>) {
        self.current = current;
    }
}

/// Walks a chapter: entry step first, then the target of each completed
/// transition. A transition without target ends the chapter.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChapterPolicy;

impl IterationPolicy<ChapterData> for ChapterPolicy {
    fn try_next(&mut self, data: &ChapterData) -> Option<usize> {
        let Some(step) = data.current_step() else {
            return data.entry_index();
        };
        let target = step.next_target()?;
        let next = data.step_index(target);
        if next.is_none() {
            tracing::warn!(chapter = data.name(), %target, "transition target is not in this chapter");
        }
        next
    }
}
