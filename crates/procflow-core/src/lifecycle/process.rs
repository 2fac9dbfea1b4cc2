use super::Context;
use crate::types::ProcessError;

/// Outcome of one `update` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Suspended; call `update` again on the next tick.
    Pending,
    /// The stage's work is done.
    Complete,
}

impl Progress {
    #[must_use]
    pub fn is_complete(self) -> bool {
        matches!(self, Progress::Complete)
    }
}

/// Behavior bound to one (entity, stage) pair.
///
/// `update` is an explicit resumable cursor: every call resumes at the
/// suspension point the previous call stopped at. `start` must reset that
/// cursor, since the same instance serves every cycle of the entity.
pub trait StageProcess<D> {
    /// Setup, runs once when the stage is entered.
    fn start(&mut self, _data: &mut D, _ctx: &mut Context<'_>) -> Result<(), ProcessError> {
        Ok(())
    }

    /// Advance to the next suspension point.
    fn update(&mut self, data: &mut D, ctx: &mut Context<'_>) -> Result<Progress, ProcessError>;

    /// Cleanup, runs once when the stage is left.
    fn end(&mut self, _data: &mut D, _ctx: &mut Context<'_>) -> Result<(), ProcessError> {
        Ok(())
    }

    /// Perform all remaining work of `update` without suspending.
    fn fast_forward(&mut self, data: &mut D, ctx: &mut Context<'_>) -> Result<(), ProcessError>;
}

/// Stage process with no work: completes on its first update.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyProcess;

impl<D> StageProcess<D> for EmptyProcess {
    fn update(&mut self, _data: &mut D, _ctx: &mut Context<'_>) -> Result<Progress, ProcessError> {
        Ok(Progress::Complete)
    }

    fn fast_forward(&mut self, _data: &mut D, _ctx: &mut Context<'_>) -> Result<(), ProcessError> {
        Ok(())
    }
}

/// The three working stage processes of an entity. Inactive has no work.
pub struct StageProcesses<D> {
    pub activating: Box<dyn StageProcess<D>>,
    pub active: Box<dyn StageProcess<D>>,
    pub deactivating: Box<dyn StageProcess<D>>,
}

impl<D> StageProcesses<D> {
    pub fn new(
        activating: impl StageProcess<D> + 'static,
        active: impl StageProcess<D> + 'static,
        deactivating: impl StageProcess<D> + 'static,
    ) -> Self {
        Self {
            activating: Box::new(activating),
            active: Box::new(active),
            deactivating: Box::new(deactivating),
        }
    }

    /// Every stage completes immediately.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(EmptyProcess, EmptyProcess, EmptyProcess)
    }
}
