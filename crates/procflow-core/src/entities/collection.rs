use crate::entity::{
    Entity, EntityBox, EntityCollectionData, EntityData, EntitySequenceData,
    declare_child_lockables,
};
use crate::locking::LockSet;
use crate::types::EntityKind;

/// Ordered list of type-erased children.
///
/// Serves behavior collections and free-standing groups. Composition is
/// chosen by the stage processes the node is built with, not by the data.
pub struct CollectionData {
    name: String,
    kind: EntityKind,
    optional: bool,
    blocking: bool,
    children: Vec<Option<EntityBox>>,
    current: Option<usize>,
}

impl CollectionData {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: EntityKind, children: Vec<Option<EntityBox>>) -> Self {
        Self {
            name: name.into(),
            kind,
            optional: false,
            blocking: true,
            children,
            current: None,
        }
    }

    #[must_use]
    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    #[must_use]
    pub fn blocking(mut self, blocking: bool) -> Self {
        self.blocking = blocking;
        self
    }

    /// Replace the child at `index`, returning the previous occupant.
    ///
    /// Only legal while every child is Inactive.
    pub fn replace(&mut self, index: usize, child: Option<EntityBox>) -> Option<EntityBox> {
        match self.children.get_mut(index) {
            Some(slot) => std::mem::replace(slot, child),
            None => {
                self.children.resize_with(index + 1, || None);
                self.children[index] = child;
                None
            }
        }
    }
}

impl EntityData for CollectionData {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> EntityKind {
        self.kind.clone()
    }

    fn is_optional(&self) -> bool {
        self.optional
    }

    fn is_blocking(&self) -> bool {
        self.blocking
    }

    fn declare_lockables(&self, out: &mut LockSet) {
        declare_child_lockables(self, out);
    }
}

impl EntityCollectionData for CollectionData {
    fn child_count(&self) -> usize {
        self.children.len()
    }

    fn child(&self, index: usize) -> Option<&dyn Entity> {
        match self.children.get(index) {
            Some(Some(child)) => Some(child.as_ref()),
            _ => None,
        }
    }

    fn child_mut(&mut self, index: usize) -> Option<&mut dyn Entity> {
        match self.children.get_mut(index) {
            Some(Some(child)) => Some(child.as_mut()),
            _ => None,
        }
    }
}

impl EntitySequenceData for CollectionData {
    fn current(&self) -> Option<usize> {
        self.current
    }

    fn set_current(&mut self, current: Option<usize>) {
        self.current = current;
    }
}
