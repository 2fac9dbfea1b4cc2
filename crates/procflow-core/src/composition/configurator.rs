//! Mode-change reactions of the composition strategies.

use crate::entity::{Configurator, EntityCollectionData, EntitySequenceData, fast_forward_to_inactive};
use crate::lifecycle::Context;
use crate::types::{ProcessError, Stage};

fn configure_children<D: EntityCollectionData>(
    data: &mut D,
    ctx: &mut Context<'_>,
) -> Result<(), ProcessError> {
    for index in 0..data.child_count() {
        if let Some(child) = data.child_mut(index) {
            child.configure(ctx)?;
        }
    }
    Ok(())
}

/// Forwards the mode to every child. Running children that became skipped
/// are picked up by the collection's own stage processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct CollectionConfigurator;

impl<D: EntityCollectionData> Configurator<D> for CollectionConfigurator {
    fn configure(
        &mut self,
        data: &mut D,
        _stage: Stage,
        ctx: &mut Context<'_>,
    ) -> Result<(), ProcessError> {
        configure_children(data, ctx)
    }
}

/// Forwards the mode to every child and fast-forwards the current child of
/// the sequence when its kind became skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct SequenceConfigurator;

impl<D: EntitySequenceData> Configurator<D> for SequenceConfigurator {
    fn configure(
        &mut self,
        data: &mut D,
        _stage: Stage,
        ctx: &mut Context<'_>,
    ) -> Result<(), ProcessError> {
        configure_children(data, ctx)?;
        let Some(index) = data.current() else {
            return Ok(());
        };
        if let Some(child) = data.child_mut(index) {
            if child.stage().is_running() && !child.is_completed() && ctx.is_skipped(&*child) {
                tracing::debug!(entity = child.name(), "current child skipped by mode change");
                child.mark_to_fast_forward(ctx)?;
            }
        }
        Ok(())
    }
}

/// Adapts a running parallel composite to mode changes in place.
///
/// Remembers the skip status each child had at the previous configuration.
/// A child that becomes skipped is fast-forwarded to Inactive; a child that
/// stops being skipped is activated and caught up with the composite's stage.
#[derive(Debug, Default, Clone)]
pub struct ParallelConfigurator {
    was_skipped: Vec<bool>,
}

impl ParallelConfigurator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<D: EntityCollectionData> Configurator<D> for ParallelConfigurator {
    fn configure(
        &mut self,
        data: &mut D,
        stage: Stage,
        ctx: &mut Context<'_>,
    ) -> Result<(), ProcessError> {
        configure_children(data, ctx)?;
        self.was_skipped.resize(data.child_count(), false);

        for index in 0..data.child_count() {
            let Some(child) = data.child_mut(index) else {
                continue;
            };
            let is_skipped = ctx.is_skipped(&*child);
            let was_skipped = self.was_skipped[index];
            self.was_skipped[index] = is_skipped;

            if is_skipped == was_skipped {
                continue;
            }
            match (is_skipped, stage) {
                (true, _) if child.stage().is_running() => {
                    tracing::debug!(entity = child.name(), "child became skipped");
                    fast_forward_to_inactive(child, ctx)?;
                }
                (false, Stage::Activating) if child.stage() == Stage::Inactive => {
                    tracing::debug!(entity = child.name(), "child no longer skipped");
                    child.activate(ctx)?;
                }
                (false, Stage::Active) if child.stage() == Stage::Inactive => {
                    tracing::debug!(entity = child.name(), "child no longer skipped");
                    child.activate(ctx)?;
                    child.mark_to_fast_forward_stage(Stage::Activating, ctx)?;
                }
                _ => {}
            }
        }
        Ok(())
    }
}
