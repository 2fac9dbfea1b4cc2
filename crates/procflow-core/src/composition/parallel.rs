//! Simultaneous composition: every child runs at once, and only blocking
//! children gate the composite's stage transitions.

use crate::entity::{Entity, EntityCollectionData, fast_forward_to_inactive};
use crate::lifecycle::{Context, Progress, StageProcess};
use crate::primitives::PARALLEL_ACTIVE_TICK_CAP;
use crate::types::{ProcessError, Stage};

fn tick_running<D: EntityCollectionData>(
    data: &mut D,
    ctx: &mut Context<'_>,
) -> Result<(), ProcessError> {
    for index in 0..data.child_count() {
        if let Some(child) = data.child_mut(index) {
            if child.stage().is_running() {
                child.update(ctx)?;
            }
        }
    }
    Ok(())
}

fn any_blocking<D: EntityCollectionData>(data: &D, pred: impl Fn(&dyn Entity) -> bool) -> bool {
    (0..data.child_count())
        .filter_map(|index| data.child(index))
        .any(|child| child.is_blocking() && pred(child))
}

// =============================================================================
// ACTIVATING
// =============================================================================

/// Activates every non-skipped child at once and completes when no blocking
/// child is still Activating.
#[derive(Debug, Default)]
pub struct ParallelActivatingProcess;

impl ParallelActivatingProcess {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl<D: EntityCollectionData> StageProcess<D> for ParallelActivatingProcess {
    fn start(&mut self, data: &mut D, ctx: &mut Context<'_>) -> Result<(), ProcessError> {
        for index in 0..data.child_count() {
            if let Some(child) = data.child_mut(index) {
                if child.stage() == Stage::Inactive && !ctx.is_skipped(&*child) {
                    child.activate(ctx)?;
                }
            }
        }
        Ok(())
    }

    fn update(&mut self, data: &mut D, ctx: &mut Context<'_>) -> Result<Progress, ProcessError> {
        tick_running(data, ctx)?;
        if any_blocking(data, |child| child.stage() == Stage::Activating) {
            Ok(Progress::Pending)
        } else {
            Ok(Progress::Complete)
        }
    }

    fn fast_forward(&mut self, data: &mut D, ctx: &mut Context<'_>) -> Result<(), ProcessError> {
        for index in 0..data.child_count() {
            if let Some(child) = data.child_mut(index) {
                if child.stage() == Stage::Activating {
                    child.mark_to_fast_forward_stage(Stage::Activating, ctx)?;
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// ACTIVE
// =============================================================================

/// Holding pattern of an Active parallel composite.
///
/// Ticks every running child. Completion is normally observed by the owner
/// through the children; the process itself gives up after `cap` ticks.
#[derive(Debug)]
pub struct ParallelActiveProcess {
    cap: u64,
    ticks: u64,
}

impl ParallelActiveProcess {
    #[must_use]
    pub fn new(cap: u64) -> Self {
        Self { cap, ticks: 0 }
    }
}

impl Default for ParallelActiveProcess {
    fn default() -> Self {
        Self::new(PARALLEL_ACTIVE_TICK_CAP)
    }
}

impl<D: EntityCollectionData> StageProcess<D> for ParallelActiveProcess {
    fn start(&mut self, _data: &mut D, _ctx: &mut Context<'_>) -> Result<(), ProcessError> {
        self.ticks = 0;
        Ok(())
    }

    fn update(&mut self, data: &mut D, ctx: &mut Context<'_>) -> Result<Progress, ProcessError> {
        tick_running(data, ctx)?;
        self.ticks = self.ticks.saturating_add(1);
        if self.ticks >= self.cap {
            tracing::debug!(entity = data.name(), cap = self.cap, "parallel active tick cap reached");
            Ok(Progress::Complete)
        } else {
            Ok(Progress::Pending)
        }
    }

    fn fast_forward(&mut self, data: &mut D, ctx: &mut Context<'_>) -> Result<(), ProcessError> {
        for index in 0..data.child_count() {
            if let Some(child) = data.child_mut(index) {
                if matches!(child.stage(), Stage::Activating | Stage::Active) {
                    child.mark_to_fast_forward(ctx)?;
                }
            }
        }
        self.ticks = self.cap;
        Ok(())
    }
}

// =============================================================================
// DEACTIVATING
// =============================================================================

/// Deactivates every child at once and completes when no blocking child is
/// still running. Non-blocking children still running at that point are
/// fast-forwarded to Inactive when the stage ends.
#[derive(Debug, Default)]
pub struct ParallelDeactivatingProcess;

impl ParallelDeactivatingProcess {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl<D: EntityCollectionData> StageProcess<D> for ParallelDeactivatingProcess {
    fn start(&mut self, data: &mut D, ctx: &mut Context<'_>) -> Result<(), ProcessError> {
        for index in 0..data.child_count() {
            if let Some(child) = data.child_mut(index) {
                if child.stage().can_deactivate() {
                    child.deactivate(ctx)?;
                }
            }
        }
        Ok(())
    }

    fn update(&mut self, data: &mut D, ctx: &mut Context<'_>) -> Result<Progress, ProcessError> {
        tick_running(data, ctx)?;
        if any_blocking(data, |child| child.stage().is_running()) {
            Ok(Progress::Pending)
        } else {
            Ok(Progress::Complete)
        }
    }

    fn end(&mut self, data: &mut D, ctx: &mut Context<'_>) -> Result<(), ProcessError> {
        for index in 0..data.child_count() {
            if let Some(child) = data.child_mut(index) {
                if child.stage().is_running() {
                    tracing::debug!(entity = child.name(), "fast-forwarding lagging child");
                    fast_forward_to_inactive(child, ctx)?;
                }
            }
        }
        Ok(())
    }

    fn fast_forward(&mut self, data: &mut D, ctx: &mut Context<'_>) -> Result<(), ProcessError> {
        for index in 0..data.child_count() {
            if let Some(child) = data.child_mut(index) {
                fast_forward_to_inactive(child, ctx)?;
            }
        }
        Ok(())
    }
}
