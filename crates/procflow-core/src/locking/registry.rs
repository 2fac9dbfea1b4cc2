use super::ResourceId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// External store of lockable resources.
///
/// The engine only computes intended lock states; the registry applies them.
pub trait ResourceRegistry {
    fn set_locked(&mut self, resource: &ResourceId, locked: bool);

    /// `None` when the resource is unknown.
    fn is_locked(&self, resource: &ResourceId) -> Option<bool>;

    fn resources_with_tag(&self, tag: &str) -> BTreeSet<ResourceId>;
}

/// One applied lock state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockChange {
    pub resource: ResourceId,
    pub locked: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceState {
    pub tags: BTreeSet<String>,
    pub locked: bool,
}

/// Registry kept in memory, recording every effective change.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    resources: BTreeMap<ResourceId, ResourceState>,
    changes: Vec<LockChange>,
}

impl InMemoryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<I, T>(&mut self, resource: ResourceId, tags: I, locked: bool)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.resources.insert(
            resource,
            ResourceState {
                tags: tags.into_iter().map(Into::into).collect(),
                locked,
            },
        );
    }

    /// Builder form of [`InMemoryRegistry::register`].
    #[must_use]
    pub fn with_resource<I, T>(mut self, resource: impl Into<ResourceId>, tags: I, locked: bool) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.register(resource.into(), tags, locked);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ResourceId, &ResourceState)> {
        self.resources.iter()
    }

    /// Every change applied so far, in order.
    #[must_use]
    pub fn changes(&self) -> &[LockChange] {
        &self.changes
    }

    pub fn take_changes(&mut self) -> Vec<LockChange> {
        std::mem::take(&mut self.changes)
    }

    #[must_use]
    pub fn locked_resources(&self) -> BTreeSet<ResourceId> {
        self.resources
            .iter()
            .filter(|(_, state)| state.locked)
            .map(|(id, _)| id.clone())
            .collect()
    }
}

impl ResourceRegistry for InMemoryRegistry {
    fn set_locked(&mut self, resource: &ResourceId, locked: bool) {
        let state = self.resources.entry(resource.clone()).or_insert_with(|| {
            tracing::debug!(%resource, "registering undeclared resource");
            ResourceState {
                tags: BTreeSet::new(),
                locked: !locked,
            }
        });
        if state.locked != locked {
            state.locked = locked;
            self.changes.push(LockChange {
                resource: resource.clone(),
                locked,
            });
        }
    }

    fn is_locked(&self, resource: &ResourceId) -> Option<bool> {
        self.resources.get(resource).map(|state| state.locked)
    }

    fn resources_with_tag(&self, tag: &str) -> BTreeSet<ResourceId> {
        self.resources
            .iter()
            .filter(|(_, state)| state.tags.contains(tag))
            .map(|(id, _)| id.clone())
            .collect()
    }
}
