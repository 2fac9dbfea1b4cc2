use super::{ChapterData, StepData};
use crate::entity::{
    Entity, EntityCollectionData, EntityData, EntitySequenceData, Node, declare_child_lockables,
};
use crate::locking::LockSet;
use crate::types::{EntityKind, StepId};

/// Root of a process graph: chapters run one after the other.
pub struct ProcessData {
    name: String,
    chapters: Vec<Option<Node<ChapterData>>>,
    current: Option<usize>,
}

impl ProcessData {
    #[must_use]
    pub fn new(name: impl Into<String>, chapters: Vec<Option<Node<ChapterData>>>) -> Self {
        Self {
            name: name.into(),
            chapters,
            current: None,
        }
    }

    pub fn chapters(&self) -> impl Iterator<Item = &Node<ChapterData>> {
        self.chapters.iter().flatten()
    }

    pub fn steps(&self) -> impl Iterator<Item = &StepData> {
        self.chapters().flat_map(|chapter| chapter.data().steps())
    }

    #[must_use]
    pub fn find_step(&self, id: &StepId) -> Option<&StepData> {
        self.chapters().find_map(|chapter| chapter.data().step(id))
    }

    /// Entry step of the first chapter after the one holding `id` that has
    /// any step.
    #[must_use]
    pub fn entry_step_after(&self, id: &StepId) -> Option<&StepData> {
        let mut chapters = self.chapters();
        chapters.find(|chapter| chapter.data().step_index(id).is_some())?;
        chapters.find_map(|chapter| chapter.data().entry_step())
    }

    /// The chapter currently running, if any.
    #[must_use]
    pub fn current_chapter(&self) -> Option<&ChapterData> {
        self.current
            .and_then(|index| self.chapters.get(index))
            .and_then(Option::as_ref)
            .map(Node::data)
    }
}

impl EntityData for ProcessData {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> EntityKind {
        EntityKind::PROCESS
    }

    fn declare_lockables(&self, out: &mut LockSet) {
        declare_child_lockables(self, out);
    }
}

impl EntityCollectionData for ProcessData {
    fn child_count(&self) -> usize {
        self.chapters.len()
    }

    fn child(&self, index: usize) -> Option<&dyn Entity> {
        match self.chapters.get(index) {
            Some(Some(chapter)) => Some(chapter as &dyn Entity),
            _ => None,
        }
    }

    fn child_mut(&mut self, index: usize) -> Option<&mut dyn Entity> {
        match self.chapters.get_mut(index) {
            Some(Some(chapter)) => Some(chapter as &mut dyn Entity),
            _ => None,
        }
    }
}

impl EntitySequenceData for ProcessData {
    fn current(&self) -> Option<usize> {
        self.current
    }

    fn set_current(&mut self, current: Option<usize>) {
        self.current = current;
    }
}
