//! One-pass walks over every child of a collection.
//!
//! Activation walks forward, teardown walks in reverse, so children stop in
//! the reverse of the order they started in.

use crate::entity::{Entity, EntityCollectionData, fast_forward_to_inactive};
use crate::lifecycle::{Context, Progress, StageProcess};
use crate::types::{ProcessError, Stage};

/// Position of a folded walk.
#[derive(Debug, Clone, Copy, Default)]
struct Cursor {
    /// Index of the child being waited on, when `engaged`.
    index: usize,
    engaged: bool,
}

// =============================================================================
// ACTIVATING
// =============================================================================

/// Activates the children in list order, one after the other.
#[derive(Debug, Default)]
pub struct FoldedActivatingProcess {
    cursor: Cursor,
}

impl FoldedActivatingProcess {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<D: EntityCollectionData> StageProcess<D> for FoldedActivatingProcess {
    fn start(&mut self, _data: &mut D, _ctx: &mut Context<'_>) -> Result<(), ProcessError> {
        self.cursor = Cursor::default();
        Ok(())
    }

    fn update(&mut self, data: &mut D, ctx: &mut Context<'_>) -> Result<Progress, ProcessError> {
        while self.cursor.index < data.child_count() {
            let Some(child) = data.child_mut(self.cursor.index) else {
                self.cursor.index += 1;
                continue;
            };
            if !self.cursor.engaged {
                if child.stage() == Stage::Inactive {
                    child.activate(ctx)?;
                    if ctx.is_skipped(&*child) {
                        child.mark_to_fast_forward(ctx)?;
                    }
                }
                self.cursor.engaged = true;
            }
            if child.stage() == Stage::Activating {
                child.update(ctx)?;
                if child.stage() == Stage::Activating {
                    return Ok(Progress::Pending);
                }
            }
            self.cursor = Cursor {
                index: self.cursor.index + 1,
                engaged: false,
            };
        }
        Ok(Progress::Complete)
    }

    fn fast_forward(&mut self, data: &mut D, ctx: &mut Context<'_>) -> Result<(), ProcessError> {
        while self.cursor.index < data.child_count() {
            if let Some(child) = data.child_mut(self.cursor.index) {
                if !self.cursor.engaged && child.stage() == Stage::Inactive {
                    child.activate(ctx)?;
                }
                child.mark_to_fast_forward_stage(Stage::Activating, ctx)?;
                if ctx.is_skipped(&*child) {
                    child.mark_to_fast_forward(ctx)?;
                }
            }
            self.cursor = Cursor {
                index: self.cursor.index + 1,
                engaged: false,
            };
        }
        Ok(())
    }
}

// =============================================================================
// ACTIVE
// =============================================================================

/// Keeps the children of an Active collection ticking.
///
/// Every scan re-queries the mode and fast-forwards Active children whose
/// kind became skipped. Only their Active stage is resolved: they stay
/// Active until the reverse teardown walk deactivates them. Completes once
/// every child is completed or idle.
#[derive(Debug, Default)]
pub struct FoldedActiveProcess;

impl FoldedActiveProcess {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn is_settled(child: &dyn Entity) -> bool {
    child.is_completed() || !child.stage().is_running()
}

impl<D: EntityCollectionData> StageProcess<D> for FoldedActiveProcess {
    fn update(&mut self, data: &mut D, ctx: &mut Context<'_>) -> Result<Progress, ProcessError> {
        let mut settled = true;
        for index in 0..data.child_count() {
            let Some(child) = data.child_mut(index) else {
                continue;
            };
            if child.stage() == Stage::Active && !child.is_completed() && ctx.is_skipped(&*child)
            {
                child.mark_to_fast_forward_stage(Stage::Active, ctx)?;
            } else {
                child.update(ctx)?;
            }
            settled &= is_settled(&*child);
        }
        Ok(if settled {
            Progress::Complete
        } else {
            Progress::Pending
        })
    }

    fn fast_forward(&mut self, data: &mut D, ctx: &mut Context<'_>) -> Result<(), ProcessError> {
        for index in 0..data.child_count() {
            if let Some(child) = data.child_mut(index) {
                match child.stage() {
                    Stage::Activating | Stage::Active => child.mark_to_fast_forward(ctx)?,
                    Stage::Inactive | Stage::Deactivating => {}
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// DEACTIVATING
// =============================================================================

/// Deactivates the children in reverse list order, one after the other.
///
/// Returns [`ProcessError::InvariantViolation`] if the child being torn down
/// disappears from the collection mid-walk.
#[derive(Debug, Default)]
pub struct FoldedDeactivatingProcess {
    /// Walks from the back; `index` counts the children not yet visited.
    cursor: Cursor,
}

impl FoldedDeactivatingProcess {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Engage the next occupied child below the cursor. Returns false when
    /// the walk is finished.
    fn engage_next<D: EntityCollectionData>(&mut self, data: &D) -> bool {
        while self.cursor.index > 0 {
            self.cursor.index -= 1;
            if data.child(self.cursor.index).is_some() {
                self.cursor.engaged = true;
                return true;
            }
        }
        false
    }

    fn engaged_child<'d, D: EntityCollectionData>(
        &self,
        data: &'d mut D,
    ) -> Result<&'d mut dyn Entity, ProcessError> {
        let index = self.cursor.index;
        if data.child(index).is_none() {
            return Err(ProcessError::invariant(
                data.name(),
                format!("child {index} vanished during teardown"),
            ));
        }
        data.child_mut(index).ok_or_else(|| {
            ProcessError::invariant("teardown", format!("child {index} is not mutable"))
        })
    }
}

impl<D: EntityCollectionData> StageProcess<D> for FoldedDeactivatingProcess {
    fn start(&mut self, data: &mut D, _ctx: &mut Context<'_>) -> Result<(), ProcessError> {
        self.cursor = Cursor {
            index: data.child_count(),
            engaged: false,
        };
        Ok(())
    }

    fn update(&mut self, data: &mut D, ctx: &mut Context<'_>) -> Result<Progress, ProcessError> {
        loop {
            if !self.cursor.engaged {
                if !self.engage_next(data) {
                    return Ok(Progress::Complete);
                }
                let child = self.engaged_child(data)?;
                if child.stage().can_deactivate() {
                    child.deactivate(ctx)?;
                    if ctx.is_skipped(&*child) {
                        child.mark_to_fast_forward(ctx)?;
                    }
                }
            }
            let child = self.engaged_child(data)?;
            if child.stage() != Stage::Inactive {
                child.update(ctx)?;
                if child.stage() != Stage::Inactive {
                    return Ok(Progress::Pending);
                }
            }
            self.cursor.engaged = false;
        }
    }

    fn fast_forward(&mut self, data: &mut D, ctx: &mut Context<'_>) -> Result<(), ProcessError> {
        loop {
            if !self.cursor.engaged && !self.engage_next(data) {
                return Ok(());
            }
            let child = self.engaged_child(data)?;
            fast_forward_to_inactive(child, ctx)?;
            self.cursor.engaged = false;
        }
    }
}
