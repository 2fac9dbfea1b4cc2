use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Handle of an external lockable resource.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub String);

impl ResourceId {
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A resource reference declared by entity data.
///
/// `end_step_locked` asks for the resource to be locked when the step that
/// declared it ends.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LockablePropertyData {
    pub resource: ResourceId,
    #[serde(default = "default_end_step_locked")]
    pub end_step_locked: bool,
}

fn default_end_step_locked() -> bool {
    true
}

impl LockablePropertyData {
    #[must_use]
    pub fn new(resource: impl Into<ResourceId>, end_step_locked: bool) -> Self {
        Self {
            resource: resource.into(),
            end_step_locked,
        }
    }
}

impl From<String> for ResourceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Set of `(resource, end_step_locked)` pairs, ordered by resource.
///
/// A resource appears once. Declaring it again keeps it end-step locked if
/// any declaration asked for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockSet {
    entries: BTreeMap<ResourceId, bool>,
}

impl LockSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, resource: ResourceId, end_step_locked: bool) {
        let flag = self.entries.entry(resource).or_insert(false);
        *flag |= end_step_locked;
    }

    pub fn declare(&mut self, property: &LockablePropertyData) {
        self.insert(property.resource.clone(), property.end_step_locked);
    }

    #[must_use]
    pub fn contains(&self, resource: &ResourceId) -> bool {
        self.entries.contains_key(resource)
    }

    /// The merged `end_step_locked` flag of `resource`, if present.
    #[must_use]
    pub fn end_step_locked(&self, resource: &ResourceId) -> Option<bool> {
        self.entries.get(resource).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn resources(&self) -> impl Iterator<Item = &ResourceId> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = LockablePropertyData> + '_ {
        self.entries
            .iter()
            .map(|(resource, &end_step_locked)| LockablePropertyData {
                resource: resource.clone(),
                end_step_locked,
            })
    }

    /// Add every entry of `other`.
    pub fn union_with(&mut self, other: &LockSet) {
        for (resource, &flag) in &other.entries {
            self.insert(resource.clone(), flag);
        }
    }

    /// Remove every resource present in `other`, whatever its flag.
    pub fn subtract(&mut self, other: &LockSet) {
        self.entries.retain(|resource, _| !other.contains(resource));
    }
}

impl FromIterator<LockablePropertyData> for LockSet {
    fn from_iter<I: IntoIterator<Item = LockablePropertyData>>(iter: I) -> Self {
        let mut set = LockSet::new();
        set.extend(iter);
        set
    }
}

impl Extend<LockablePropertyData> for LockSet {
    fn extend<I: IntoIterator<Item = LockablePropertyData>>(&mut self, iter: I) {
        for property in iter {
            self.insert(property.resource, property.end_step_locked);
        }
    }
}

impl FromIterator<ResourceId> for LockSet {
    /// Resources collected this way are not end-step locked.
    fn from_iter<I: IntoIterator<Item = ResourceId>>(iter: I) -> Self {
        iter.into_iter()
            .map(|resource| LockablePropertyData::new(resource, false))
            .collect()
    }
}
