use super::{Context, ProcessEvent, Progress, StageProcess, StageProcesses};
use crate::entity::EntityData;
use crate::types::{ProcessError, Stage, StageRequest};

/// Per-entity stage machine.
///
/// Owns the entity's stage processes and advances them:
/// - `activate()`: Inactive → Activating; Activating auto-advances to Active
///   once its process completes.
/// - `deactivate()`: Activating/Active → Deactivating; Deactivating
///   auto-advances to Inactive.
/// - Active never auto-advances. Completion of the Active work is recorded
///   and exposed through [`LifeCycle::is_completed`].
///
/// Fast-forward marks are per stage and are cleared when the entity returns
/// to Inactive.
pub struct LifeCycle<D> {
    stage: Stage,
    processes: StageProcesses<D>,
    fast_forward: [bool; 4],
    stage_complete: bool,
}

impl<D: EntityData> LifeCycle<D> {
    #[must_use]
    pub fn new(processes: StageProcesses<D>) -> Self {
        Self {
            stage: Stage::Inactive,
            processes,
            fast_forward: [false; 4],
            stage_complete: false,
        }
    }

    /// Current stage.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// True once the Active stage's work has finished.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.stage == Stage::Active && self.stage_complete
    }

    /// Whether `stage` is marked to fast-forward in the current cycle.
    #[must_use]
    pub fn is_marked_to_fast_forward(&self, stage: Stage) -> bool {
        self.fast_forward[stage.index()]
    }

    // =========================================================================
    // TRANSITIONS
    // =========================================================================

    /// Start the activation of an Inactive entity.
    pub fn activate(&mut self, data: &mut D, ctx: &mut Context<'_>) -> Result<(), ProcessError> {
        if self.stage != Stage::Inactive {
            return Err(self.rejected(data, StageRequest::Activate));
        }
        self.enter(Stage::Activating, data, ctx)
    }

    /// Start the teardown of an Activating or Active entity.
    ///
    /// Deactivating while still Activating ends the Activating stage and
    /// passes through Active before teardown starts.
    pub fn deactivate(&mut self, data: &mut D, ctx: &mut Context<'_>) -> Result<(), ProcessError> {
        match self.stage {
            Stage::Inactive | Stage::Deactivating => {
                return Err(self.rejected(data, StageRequest::Deactivate));
            }
            Stage::Activating => {
                self.processes.activating.end(data, ctx)?;
                self.enter(Stage::Active, data, ctx)?;
            }
            Stage::Active => {}
        }
        self.processes.active.end(data, ctx)?;
        self.enter(Stage::Deactivating, data, ctx)
    }

    /// Advance the current stage's process by one suspension point.
    pub fn update(&mut self, data: &mut D, ctx: &mut Context<'_>) -> Result<(), ProcessError> {
        if self.stage == Stage::Inactive || self.stage_complete {
            return Ok(());
        }
        let stage = self.stage;
        match self.process_mut(stage).update(data, ctx)? {
            Progress::Pending => Ok(()),
            Progress::Complete => self.complete_stage(data, ctx),
        }
    }

    // =========================================================================
    // FAST-FORWARD
    // =========================================================================

    /// Request that `stage` completes without suspending.
    ///
    /// If `stage` is current its remaining work runs now; otherwise it runs as
    /// soon as the stage is entered. Marking twice has the effect of once.
    pub fn mark_to_fast_forward_stage(
        &mut self,
        stage: Stage,
        data: &mut D,
        ctx: &mut Context<'_>,
    ) -> Result<(), ProcessError> {
        if stage == Stage::Inactive {
            return Ok(());
        }
        if !self.fast_forward[stage.index()] {
            tracing::trace!(entity = data.name(), %stage, "marked to fast-forward");
            self.fast_forward[stage.index()] = true;
        }
        if self.stage == stage {
            self.fast_forward_current(data, ctx)?;
        }
        Ok(())
    }

    /// Fast-forward the current stage and every later stage of this cycle.
    ///
    /// No-op for an Inactive entity.
    pub fn mark_to_fast_forward(
        &mut self,
        data: &mut D,
        ctx: &mut Context<'_>,
    ) -> Result<(), ProcessError> {
        if self.stage == Stage::Inactive {
            return Ok(());
        }
        for index in self.stage.index()..self.fast_forward.len() {
            self.fast_forward[index] = true;
        }
        tracing::trace!(entity = data.name(), stage = %self.stage, "marked to fast-forward");
        self.fast_forward_current(data, ctx)
    }

    fn fast_forward_current(
        &mut self,
        data: &mut D,
        ctx: &mut Context<'_>,
    ) -> Result<(), ProcessError> {
        if self.stage == Stage::Inactive || self.stage_complete {
            return Ok(());
        }
        let stage = self.stage;
        self.process_mut(stage).fast_forward(data, ctx)?;
        self.complete_stage(data, ctx)
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn complete_stage(&mut self, data: &mut D, ctx: &mut Context<'_>) -> Result<(), ProcessError> {
        match self.stage {
            Stage::Inactive => Ok(()),
            Stage::Activating => {
                self.processes.activating.end(data, ctx)?;
                self.enter(Stage::Active, data, ctx)
            }
            Stage::Active => {
                self.stage_complete = true;
                tracing::debug!(entity = data.name(), kind = %data.kind(), "active work completed");
                Ok(())
            }
            Stage::Deactivating => {
                self.processes.deactivating.end(data, ctx)?;
                self.enter(Stage::Inactive, data, ctx)
            }
        }
    }

    fn enter(
        &mut self,
        stage: Stage,
        data: &mut D,
        ctx: &mut Context<'_>,
    ) -> Result<(), ProcessError> {
        self.stage = stage;
        self.stage_complete = false;
        tracing::debug!(entity = data.name(), kind = %data.kind(), %stage, "stage entered");
        ctx.emit(ProcessEvent::StageChanged {
            entity: data.name().to_string(),
            kind: data.kind(),
            stage,
        });

        if stage == Stage::Inactive {
            self.fast_forward = [false; 4];
            return Ok(());
        }

        self.process_mut(stage).start(data, ctx)?;
        if self.fast_forward[stage.index()] {
            self.fast_forward_current(data, ctx)?;
        }
        Ok(())
    }

    fn process_mut(&mut self, stage: Stage) -> &mut (dyn StageProcess<D> + 'static) {
        match stage {
            Stage::Activating => self.processes.activating.as_mut(),
            Stage::Deactivating => self.processes.deactivating.as_mut(),
            Stage::Inactive | Stage::Active => self.processes.active.as_mut(),
        }
    }

    fn rejected(&self, data: &D, request: StageRequest) -> ProcessError {
        tracing::warn!(entity = data.name(), stage = %self.stage, %request, "stage request rejected");
        ProcessError::InvalidStageTransition {
            entity: data.name().to_string(),
            stage: self.stage,
            request,
        }
    }
}
