use super::{LockSet, ResourceId, ResourceRegistry};
use crate::entities::{ProcessData, StepData};
use crate::entity::EntityData;
use crate::mode::Mode;
use crate::primitives::{LOCK_ON_PROCESS_FINISHED, LOCK_ON_PROCESS_START};
use crate::types::StepId;
use serde::Serialize;
use std::collections::BTreeSet;

/// Policy deciding which resources are interactable around step boundaries.
pub trait StepLockHandlingStrategy {
    /// The step is starting: release everything it uses.
    fn unlock(
        &mut self,
        step: &StepData,
        manually_unlocked: &LockSet,
        registry: &mut dyn ResourceRegistry,
    );

    /// The step completed through its recorded transition: lock what the
    /// next step does not need.
    fn lock(
        &mut self,
        step: &StepData,
        manually_unlocked: &LockSet,
        process: Option<&ProcessData>,
        registry: &mut dyn ResourceRegistry,
    );

    fn configure(&mut self, mode: &dyn Mode);

    fn on_process_started(&mut self, process: &ProcessData, registry: &mut dyn ResourceRegistry);

    fn on_process_finished(&mut self, process: &ProcessData, registry: &mut dyn ResourceRegistry);
}

/// Resources a step unlocks explicitly: its `to_unlock` list plus every
/// registry resource carrying one of its `tags_to_unlock`.
#[must_use]
pub fn manual_unlocks(step: &StepData, registry: &dyn ResourceRegistry) -> LockSet {
    let mut resources: BTreeSet<ResourceId> = step.to_unlock().clone();
    for tag in step.tags_to_unlock() {
        resources.extend(registry.resources_with_tag(tag));
    }
    resources.into_iter().collect()
}

// =============================================================================
// NO-OP STRATEGY
// =============================================================================

/// Leaves every resource alone.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLockHandling;

impl StepLockHandlingStrategy for NoLockHandling {
    fn unlock(&mut self, _: &StepData, _: &LockSet, _: &mut dyn ResourceRegistry) {}

    fn lock(&mut self, _: &StepData, _: &LockSet, _: Option<&ProcessData>, _: &mut dyn ResourceRegistry) {}

    fn configure(&mut self, _: &dyn Mode) {}

    fn on_process_started(&mut self, _: &ProcessData, _: &mut dyn ResourceRegistry) {}

    fn on_process_finished(&mut self, _: &ProcessData, _: &mut dyn ResourceRegistry) {}
}

// =============================================================================
// DEFAULT STRATEGY
// =============================================================================

/// Outcome of the lock computation for one completed step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LockPlan {
    /// Step the completed transition leads to, if it could be resolved.
    pub next_step: Option<StepId>,
    /// Left unlocked because the next step needs them.
    pub reserved: BTreeSet<ResourceId>,
    /// Locked because the completed transition declares them end-step locked.
    pub end_step_locked: BTreeSet<ResourceId>,
    /// Remaining candidates, locked unconditionally.
    pub locked: BTreeSet<ResourceId>,
}

/// Unlocks a step's resources when it starts and locks them when it ends,
/// keeping whatever the next step needs unlocked across the boundary.
#[derive(Debug, Clone, Copy)]
pub struct DefaultStepLockHandling {
    lock_on_process_start: bool,
    lock_on_process_finished: bool,
}

impl Default for DefaultStepLockHandling {
    fn default() -> Self {
        Self {
            lock_on_process_start: true,
            lock_on_process_finished: true,
        }
    }
}

impl DefaultStepLockHandling {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn lock_on_process_start(&self) -> bool {
        self.lock_on_process_start
    }

    #[must_use]
    pub fn lock_on_process_finished(&self) -> bool {
        self.lock_on_process_finished
    }

    /// Compute what [`StepLockHandlingStrategy::lock`] does, without side
    /// effects.
    #[must_use]
    pub fn plan_lock(
        &self,
        step: &StepData,
        manually_unlocked: &LockSet,
        process: Option<&ProcessData>,
        registry: &dyn ResourceRegistry,
    ) -> LockPlan {
        let mut candidates = step.lockables();
        candidates.union_with(manually_unlocked);

        let next = next_step(step, process);
        let mut plan = LockPlan {
            next_step: next.map(|next| next.id().clone()),
            ..LockPlan::default()
        };

        if let Some(next) = next {
            let mut needed = next.lockables();
            needed.union_with(&manual_unlocks(next, registry));
            plan.reserved = candidates
                .resources()
                .filter(|resource| needed.contains(resource))
                .cloned()
                .collect();
            candidates.subtract(&needed);
        }

        let transition_declared = step
            .completed_transition()
            .and_then(|index| step.transition(index))
            .map(|transition| transition.lockables())
            .unwrap_or_default();

        for resource in candidates.resources() {
            if transition_declared.end_step_locked(resource) == Some(true) {
                plan.end_step_locked.insert(resource.clone());
            } else {
                plan.locked.insert(resource.clone());
            }
        }
        plan
    }
}

/// The step reached through `step`'s completed transition: its explicit
/// target, or the entry step of the next chapter when it has none.
fn next_step<'p>(step: &StepData, process: Option<&'p ProcessData>) -> Option<&'p StepData> {
    let process = process?;
    let index = step.completed_transition()?;
    let transition = step.transition(index)?;
    match transition.target() {
        Some(target) => {
            let found = process.find_step(target);
            if found.is_none() {
                tracing::warn!(step = %step.id(), %target, "lock target step not found");
            }
            found
        }
        None => process.entry_step_after(step.id()),
    }
}

fn lock_all(process: &ProcessData, registry: &mut dyn ResourceRegistry) {
    let mut all = LockSet::new();
    process.declare_lockables(&mut all);
    for resource in all.resources() {
        registry.set_locked(resource, true);
    }
}

impl StepLockHandlingStrategy for DefaultStepLockHandling {
    fn unlock(
        &mut self,
        step: &StepData,
        manually_unlocked: &LockSet,
        registry: &mut dyn ResourceRegistry,
    ) {
        let mut unlock = step.lockables();
        unlock.union_with(manually_unlocked);
        tracing::debug!(step = %step.id(), count = unlock.len(), "unlocking step resources");
        for resource in unlock.resources() {
            registry.set_locked(resource, false);
        }
    }

    fn lock(
        &mut self,
        step: &StepData,
        manually_unlocked: &LockSet,
        process: Option<&ProcessData>,
        registry: &mut dyn ResourceRegistry,
    ) {
        let plan = self.plan_lock(step, manually_unlocked, process, &*registry);
        tracing::debug!(
            step = %step.id(),
            reserved = plan.reserved.len(),
            locked = plan.locked.len() + plan.end_step_locked.len(),
            "locking step resources"
        );
        for resource in plan.end_step_locked.iter().chain(&plan.locked) {
            registry.set_locked(resource, true);
        }
    }

    fn configure(&mut self, mode: &dyn Mode) {
        if let Some(value) = mode.bool_parameter(LOCK_ON_PROCESS_START) {
            self.lock_on_process_start = value;
        }
        if let Some(value) = mode.bool_parameter(LOCK_ON_PROCESS_FINISHED) {
            self.lock_on_process_finished = value;
        }
    }

    fn on_process_started(&mut self, process: &ProcessData, registry: &mut dyn ResourceRegistry) {
        if self.lock_on_process_start {
            tracing::debug!(process = process.name(), "locking all resources on start");
            lock_all(process, registry);
        }
    }

    fn on_process_finished(&mut self, process: &ProcessData, registry: &mut dyn ResourceRegistry) {
        if self.lock_on_process_finished {
            tracing::debug!(process = process.name(), "locking all resources on finish");
            lock_all(process, registry);
        }
    }
}
