use crate::entity::{Entity, EntitySequenceData};
use crate::lifecycle::{Context, Progress, StageProcess};
use crate::types::{ProcessError, Stage};

/// Chooses the children a sequence iterates and gates its progress.
pub trait IterationPolicy<D: EntitySequenceData> {
    /// Index of the child after `data.current()`, or `None` when the
    /// sequence is exhausted. Empty slots may be returned; they are skipped.
    fn try_next(&mut self, data: &D) -> Option<usize>;

    /// Gate in front of the activation of the child at `index`.
    fn should_activate_current(&self, _data: &D, _index: usize, _ctx: &Context<'_>) -> bool {
        true
    }

    /// Gate in front of the deactivation of the child at `index`.
    fn should_deactivate_current(&self, data: &D, index: usize, _ctx: &Context<'_>) -> bool {
        data.child(index)
            .is_none_or(|child| child.is_completed() || !child.stage().is_running())
    }
}

/// Walks the children in list order.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinearPolicy;

impl<D: EntitySequenceData> IterationPolicy<D> for LinearPolicy {
    fn try_next(&mut self, data: &D) -> Option<usize> {
        let next = data.current().map_or(0, |i| i + 1);
        (next < data.child_count()).then_some(next)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Advance,
    AwaitActivationGate,
    AwaitActivated,
    AwaitDeactivationGate,
    AwaitInactive,
    Done,
}

/// Runs the children of a sequence one at a time.
///
/// Per child: wait for the activation gate, activate (fast-forwarding a
/// skipped child), wait until it leaves Activating, wait for the deactivation
/// gate, deactivate and wait until Inactive. At most one child is outside
/// Inactive at any time.
pub struct EntityIteratingProcess<P> {
    policy: P,
    phase: Phase,
}

impl<P> EntityIteratingProcess<P> {
    #[must_use]
    pub fn new(policy: P) -> Self {
        Self {
            policy,
            phase: Phase::Advance,
        }
    }
}

impl EntityIteratingProcess<LinearPolicy> {
    #[must_use]
    pub fn linear() -> Self {
        Self::new(LinearPolicy)
    }
}

fn current_child<D: EntitySequenceData>(data: &mut D) -> Result<&mut dyn Entity, ProcessError> {
    let Some(index) = data.current().filter(|&i| data.child(i).is_some()) else {
        return Err(ProcessError::invariant(
            data.name(),
            "sequence lost its current child",
        ));
    };
    data.child_mut(index).ok_or_else(|| {
        ProcessError::invariant("sequence", format!("child {index} is not mutable"))
    })
}

impl<P> EntityIteratingProcess<P> {
    /// Move `current` to the next occupied slot. Returns false when done.
    fn advance<D>(&mut self, data: &mut D) -> bool
    where
        D: EntitySequenceData,
        P: IterationPolicy<D>,
    {
        loop {
            match self.policy.try_next(data) {
                None => {
                    data.set_current(None);
                    self.phase = Phase::Done;
                    return false;
                }
                Some(index) => {
                    data.set_current(Some(index));
                    if data.child(index).is_some() {
                        self.phase = Phase::AwaitActivationGate;
                        return true;
                    }
                }
            }
        }
    }
}

impl<D, P> StageProcess<D> for EntityIteratingProcess<P>
where
    D: EntitySequenceData,
    P: IterationPolicy<D>,
{
    fn start(&mut self, data: &mut D, _ctx: &mut Context<'_>) -> Result<(), ProcessError> {
        data.set_current(None);
        self.phase = Phase::Advance;
        Ok(())
    }

    fn update(&mut self, data: &mut D, ctx: &mut Context<'_>) -> Result<Progress, ProcessError> {
        // Children that complete instantly could otherwise cycle forever
        // through a looping sequence inside one tick.
        let mut budget = data.child_count().saturating_add(1);

        loop {
            match self.phase {
                Phase::Done => return Ok(Progress::Complete),
                Phase::Advance => {
                    if budget == 0 {
                        return Ok(Progress::Pending);
                    }
                    budget -= 1;
                    if !self.advance(data) {
                        return Ok(Progress::Complete);
                    }
                }
                Phase::AwaitActivationGate => {
                    let index = data.current().unwrap_or_default();
                    if !self.policy.should_activate_current(data, index, ctx) {
                        return Ok(Progress::Pending);
                    }
                    let child = current_child(data)?;
                    if child.stage() == Stage::Inactive {
                        child.activate(ctx)?;
                        if ctx.is_skipped(&*child) {
                            child.mark_to_fast_forward(ctx)?;
                        }
                    }
                    self.phase = Phase::AwaitActivated;
                }
                Phase::AwaitActivated => {
                    let child = current_child(data)?;
                    if child.stage() == Stage::Activating {
                        child.update(ctx)?;
                        if child.stage() == Stage::Activating {
                            return Ok(Progress::Pending);
                        }
                    }
                    self.phase = Phase::AwaitDeactivationGate;
                }
                Phase::AwaitDeactivationGate => {
                    let index = data.current().unwrap_or_default();
                    if !self.policy.should_deactivate_current(data, index, ctx) {
                        current_child(data)?.update(ctx)?;
                        if !self.policy.should_deactivate_current(data, index, ctx) {
                            return Ok(Progress::Pending);
                        }
                    }
                    let child = current_child(data)?;
                    if child.stage().can_deactivate() {
                        child.deactivate(ctx)?;
                    }
                    self.phase = Phase::AwaitInactive;
                }
                Phase::AwaitInactive => {
                    let child = current_child(data)?;
                    if child.stage() != Stage::Inactive {
                        child.update(ctx)?;
                        if child.stage() != Stage::Inactive {
                            return Ok(Progress::Pending);
                        }
                    }
                    self.phase = Phase::Advance;
                }
            }
        }
    }

    fn end(&mut self, data: &mut D, _ctx: &mut Context<'_>) -> Result<(), ProcessError> {
        data.set_current(None);
        Ok(())
    }

    fn fast_forward(&mut self, data: &mut D, ctx: &mut Context<'_>) -> Result<(), ProcessError> {
        // Each child is visited at most once so a looping sequence terminates.
        let mut visited = vec![false; data.child_count()];

        loop {
            let activate = match self.phase {
                Phase::Done => return Ok(()),
                Phase::Advance => {
                    if !self.advance(data) {
                        return Ok(());
                    }
                    true
                }
                Phase::AwaitActivationGate => true,
                Phase::AwaitActivated | Phase::AwaitDeactivationGate | Phase::AwaitInactive => {
                    false
                }
            };

            let index = data.current().unwrap_or_default();
            if visited.get(index).copied().unwrap_or(true) {
                tracing::debug!(entity = data.name(), index, "fast-forward stopped at revisited child");
                data.set_current(None);
                self.phase = Phase::Done;
                return Ok(());
            }
            if let Some(seen) = visited.get_mut(index) {
                *seen = true;
            }

            let child = current_child(data)?;
            if activate && child.stage() == Stage::Inactive {
                child.activate(ctx)?;
            }
            crate::entity::fast_forward_to_inactive(child, ctx)?;
            self.phase = Phase::Advance;
        }
    }
}
