//! # Reference Content
//!
//! Minimal conditions and behaviors that plug into transitions and behavior
//! collections. Real content implements [`EntityData`] plus its own stage
//! processes the same way.

use crate::entity::{EntityBox, EntityData, Node};
use crate::lifecycle::{Context, EmptyProcess, Progress, StageProcess, StageProcesses};
use crate::locking::{LockSet, LockablePropertyData};
use crate::types::{EntityKind, ProcessError};

/// Kind of [`TickCondition`] unless overridden.
pub const TICK_CONDITION_KIND: EntityKind = EntityKind::from_static("ticks");

/// Kind of [`DelayBehavior`] unless overridden.
pub const DELAY_BEHAVIOR_KIND: EntityKind = EntityKind::from_static("delay");

/// Stays pending for a fixed number of updates, then completes.
#[derive(Debug, Clone, Copy)]
pub struct TickProcess {
    ticks: u32,
    remaining: u32,
}

impl TickProcess {
    #[must_use]
    pub fn new(ticks: u32) -> Self {
        Self {
            ticks,
            remaining: ticks,
        }
    }
}

impl<D> StageProcess<D> for TickProcess {
    fn start(&mut self, _data: &mut D, _ctx: &mut Context<'_>) -> Result<(), ProcessError> {
        self.remaining = self.ticks;
        Ok(())
    }

    fn update(&mut self, _data: &mut D, _ctx: &mut Context<'_>) -> Result<Progress, ProcessError> {
        if self.remaining == 0 {
            return Ok(Progress::Complete);
        }
        self.remaining -= 1;
        Ok(Progress::Pending)
    }

    fn fast_forward(&mut self, _data: &mut D, _ctx: &mut Context<'_>) -> Result<(), ProcessError> {
        self.remaining = 0;
        Ok(())
    }
}

// =============================================================================
// CONDITION
// =============================================================================

/// Condition met after `ticks` Active updates. Zero ticks is met on the
/// first update.
#[derive(Debug, Clone)]
pub struct TickCondition {
    name: String,
    kind: EntityKind,
    ticks: u32,
    optional: bool,
    lockables: LockSet,
}

impl TickCondition {
    #[must_use]
    pub fn new(name: impl Into<String>, ticks: u32) -> Self {
        Self {
            name: name.into(),
            kind: TICK_CONDITION_KIND,
            ticks,
            optional: false,
            lockables: LockSet::new(),
        }
    }

    #[must_use]
    pub fn with_kind(mut self, kind: EntityKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    #[must_use]
    pub fn lockable(mut self, property: LockablePropertyData) -> Self {
        self.lockables.declare(&property);
        self
    }

    #[must_use]
    pub fn into_entity(self) -> EntityBox {
        let ticks = self.ticks;
        Node::new(
            self,
            StageProcesses::new(EmptyProcess, TickProcess::new(ticks), EmptyProcess),
        )
        .boxed()
    }
}

impl EntityData for TickCondition {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> EntityKind {
        self.kind.clone()
    }

    fn is_optional(&self) -> bool {
        self.optional
    }

    fn declare_lockables(&self, out: &mut LockSet) {
        out.union_with(&self.lockables);
    }
}

// =============================================================================
// BEHAVIOR
// =============================================================================

/// Behavior whose activation takes `ticks` updates.
///
/// A non-blocking delay runs in the background: parallel composites do not
/// wait for it.
#[derive(Debug, Clone)]
pub struct DelayBehavior {
    name: String,
    kind: EntityKind,
    ticks: u32,
    optional: bool,
    blocking: bool,
    lockables: LockSet,
}

impl DelayBehavior {
    #[must_use]
    pub fn new(name: impl Into<String>, ticks: u32) -> Self {
        Self {
            name: name.into(),
            kind: DELAY_BEHAVIOR_KIND,
            ticks,
            optional: false,
            blocking: true,
            lockables: LockSet::new(),
        }
    }

    #[must_use]
    pub fn with_kind(mut self, kind: EntityKind) -> Self {
        self.kind = kind;
        self
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

    #[must_use]
    pub fn lockable(mut self, property: LockablePropertyData) -> Self {
        self.lockables.declare(&property);
        self
    }

    #[must_use]
    pub fn into_entity(self) -> EntityBox {
        let ticks = self.ticks;
        Node::new(
            self,
            StageProcesses::new(TickProcess::new(ticks), EmptyProcess, EmptyProcess),
        )
        .boxed()
    }
}

impl EntityData for DelayBehavior {
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
        out.union_with(&self.lockables);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::RunMode;
    use crate::types::Stage;

    #[test]
    fn zero_tick_condition_completes_on_first_update() {
        let mode = RunMode::default();
        let mut events = Vec::new();
        let mut ctx = Context::new(&mode, &mut events);
        let mut condition = TickCondition::new("now", 0).into_entity();

        condition.activate(&mut ctx).expect("activate");
        condition.update(&mut ctx).expect("update");
        assert_eq!(condition.stage(), Stage::Active);
        condition.update(&mut ctx).expect("update");
        assert!(condition.is_completed());
    }

    #[test]
    fn delay_holds_activation() {
        let mode = RunMode::default();
        let mut events = Vec::new();
        let mut ctx = Context::new(&mode, &mut events);
        let mut delay = DelayBehavior::new("wait", 2).into_entity();

        delay.activate(&mut ctx).expect("activate");
        for _ in 0..2 {
            delay.update(&mut ctx).expect("update");
            assert_eq!(delay.stage(), Stage::Activating);
        }
        delay.update(&mut ctx).expect("update");
        assert_eq!(delay.stage(), Stage::Active);
    }

    #[test]
    fn content_declares_its_resources() {
        let delay = DelayBehavior::new("wait", 1)
            .lockable(LockablePropertyData::new("lever", true))
            .into_entity();
        let mut out = LockSet::new();
        delay.declare_lockables(&mut out);
        assert_eq!(out.len(), 1);
    }
}
