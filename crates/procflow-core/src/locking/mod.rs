//! # Resource Locking
//!
//! Lockable resources are external objects whose interactivity follows the
//! running process. Entity data declares the resources it references as a
//! [`LockSet`]; a [`StepLockHandlingStrategy`] turns step boundaries into
//! lock and unlock calls on a [`ResourceRegistry`].

mod lockable;
mod registry;
mod strategy;

pub use lockable::{LockSet, LockablePropertyData, ResourceId};
pub use registry::{InMemoryRegistry, LockChange, ResourceRegistry, ResourceState};
pub use strategy::{
    DefaultStepLockHandling, LockPlan, NoLockHandling, StepLockHandlingStrategy, manual_unlocks,
};

use crate::types::ProcessError;

/// Name of the default strategy in configuration files.
pub const DEFAULT_STRATEGY: &str = "default";

/// Name of the no-op strategy in configuration files.
pub const NO_STRATEGY: &str = "none";

/// Resolve a strategy by its configuration name.
pub fn strategy_by_name(name: &str) -> Result<Box<dyn StepLockHandlingStrategy>, ProcessError> {
    match name {
        DEFAULT_STRATEGY => Ok(Box::new(DefaultStepLockHandling::new())),
        NO_STRATEGY => Ok(Box::new(NoLockHandling)),
        other => Err(ProcessError::Configuration(format!(
            "unknown lock strategy '{other}' (expected '{DEFAULT_STRATEGY}' or '{NO_STRATEGY}')"
        ))),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn set(entries: &[(&str, bool)]) -> LockSet {
        entries
            .iter()
            .map(|&(id, flag)| LockablePropertyData::new(id, flag))
            .collect()
    }

    #[test]
    fn declaring_twice_keeps_end_step_lock() {
        let mut locks = set(&[("door", false)]);
        locks.insert(ResourceId::from("door"), true);
        locks.insert(ResourceId::from("door"), false);
        assert_eq!(locks.len(), 1);
        assert_eq!(locks.end_step_locked(&ResourceId::from("door")), Some(true));
    }

    #[test]
    fn subtract_ignores_flags() {
        let mut locks = set(&[("door", true), ("lever", false), ("lamp", true)]);
        locks.subtract(&set(&[("door", false), ("lamp", false)]));
        let left: Vec<&str> = locks.resources().map(ResourceId::as_str).collect();
        assert_eq!(left, vec!["lever"]);
    }

    #[test]
    fn union_merges_both_sides() {
        let mut locks = set(&[("a", false)]);
        locks.union_with(&set(&[("a", true), ("b", false)]));
        assert_eq!(locks.len(), 2);
        assert_eq!(locks.end_step_locked(&ResourceId::from("a")), Some(true));
    }

    #[test]
    fn registry_records_only_effective_changes() {
        let mut registry = InMemoryRegistry::new().with_resource("door", ["doors"], false);
        let door = ResourceId::from("door");
        registry.set_locked(&door, false);
        registry.set_locked(&door, true);
        registry.set_locked(&door, true);
        assert_eq!(
            registry.changes(),
            &[LockChange {
                resource: door.clone(),
                locked: true
            }]
        );
        assert_eq!(registry.is_locked(&door), Some(true));
        assert_eq!(registry.resources_with_tag("doors").len(), 1);
    }

    #[test]
    fn undeclared_resource_is_registered_on_first_use() {
        let mut registry = InMemoryRegistry::new();
        let lamp = ResourceId::from("lamp");
        assert_eq!(registry.is_locked(&lamp), None);
        registry.set_locked(&lamp, true);
        assert_eq!(registry.is_locked(&lamp), Some(true));
        assert_eq!(registry.changes().len(), 1);
    }

    #[test]
    fn strategies_resolve_by_name() {
        assert!(strategy_by_name(DEFAULT_STRATEGY).is_ok());
        assert!(strategy_by_name(NO_STRATEGY).is_ok());
        assert!(matches!(
            strategy_by_name("sometimes"),
            Err(ProcessError::Configuration(_))
        ));
    }
}
