//! # Lifecycle
//!
//! The per-entity stage machine and the stage process contract.
//!
//! A [`LifeCycle`] owns one [`StageProcess`] per working stage and advances
//! them when the driver ticks. Every call receives a [`Context`] carrying the
//! mode in effect and the [`ProcessEvent`] sink.

mod context;
mod events;
mod life_cycle;
mod process;

pub use context::Context;
pub use events::ProcessEvent;
pub use life_cycle::LifeCycle;
pub use process::{EmptyProcess, Progress, StageProcess, StageProcesses};

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityData;
    use crate::mode::RunMode;
    use crate::types::{EntityKind, ProcessError, Stage};

    struct Probe;

    impl EntityData for Probe {
        fn name(&self) -> &str {
            "probe"
        }

        fn kind(&self) -> EntityKind {
            EntityKind::from_static("probe")
        }
    }

    /// Completes after `ticks` updates.
    struct Countdown {
        ticks: u32,
        remaining: u32,
    }

    impl Countdown {
        fn new(ticks: u32) -> Self {
            Self {
                ticks,
                remaining: ticks,
            }
        }
    }

    impl StageProcess<Probe> for Countdown {
        fn start(&mut self, _: &mut Probe, _: &mut Context<'_>) -> Result<(), ProcessError> {
            self.remaining = self.ticks;
            Ok(())
        }

        fn update(&mut self, _: &mut Probe, _: &mut Context<'_>) -> Result<Progress, ProcessError> {
            if self.remaining == 0 {
                return Ok(Progress::Complete);
            }
            self.remaining -= 1;
            Ok(Progress::Pending)
        }

        fn fast_forward(&mut self, _: &mut Probe, _: &mut Context<'_>) -> Result<(), ProcessError> {
            self.remaining = 0;
            Ok(())
        }
    }

    fn stages(events: &[ProcessEvent]) -> Vec<Stage> {
        events
            .iter()
            .filter_map(|e| e.stage_change().map(|(_, s)| s))
            .collect()
    }

    #[test]
    fn empty_cycle_walks_every_stage() {
        let mode = RunMode::default();
        let mut events = Vec::new();
        let mut data = Probe;
        let mut lc = LifeCycle::new(StageProcesses::empty());

        {
            let mut ctx = Context::new(&mode, &mut events);
            lc.activate(&mut data, &mut ctx).expect("activate");
            assert_eq!(lc.stage(), Stage::Activating);
            lc.update(&mut data, &mut ctx).expect("update");
            assert_eq!(lc.stage(), Stage::Active);
            assert!(!lc.is_completed());
            lc.update(&mut data, &mut ctx).expect("update");
            assert!(lc.is_completed());
            assert_eq!(lc.stage(), Stage::Active);
            lc.deactivate(&mut data, &mut ctx).expect("deactivate");
            lc.update(&mut data, &mut ctx).expect("update");
        }

        assert_eq!(lc.stage(), Stage::Inactive);
        assert_eq!(
            stages(&events),
            vec![
                Stage::Activating,
                Stage::Active,
                Stage::Deactivating,
                Stage::Inactive
            ]
        );
    }

    #[test]
    fn activate_outside_inactive_is_rejected() {
        let mode = RunMode::default();
        let mut events = Vec::new();
        let mut ctx = Context::new(&mode, &mut events);
        let mut data = Probe;
        let mut lc = LifeCycle::new(StageProcesses::empty());

        lc.activate(&mut data, &mut ctx).expect("activate");
        let err = lc.activate(&mut data, &mut ctx);
        assert!(matches!(
            err,
            Err(ProcessError::InvalidStageTransition {
                stage: Stage::Activating,
                ..
            })
        ));
        assert!(lc.deactivate(&mut data, &mut ctx).is_ok());
        assert!(lc.deactivate(&mut data, &mut ctx).is_err());
    }

    #[test]
    fn deactivate_while_activating_passes_through_active() {
        let mode = RunMode::default();
        let mut events = Vec::new();
        let mut data = Probe;
        let mut lc = LifeCycle::new(StageProcesses::new(
            Countdown::new(5),
            EmptyProcess,
            EmptyProcess,
        ));
        {
            let mut ctx = Context::new(&mode, &mut events);
            lc.activate(&mut data, &mut ctx).expect("activate");
            lc.update(&mut data, &mut ctx).expect("update");
            lc.deactivate(&mut data, &mut ctx).expect("deactivate");
        }
        assert_eq!(lc.stage(), Stage::Deactivating);
        assert_eq!(
            stages(&events),
            vec![Stage::Activating, Stage::Active, Stage::Deactivating]
        );
    }

    #[test]
    fn fast_forward_completes_current_and_later_stages() {
        let mode = RunMode::default();
        let mut events = Vec::new();
        let mut data = Probe;
        let mut lc = LifeCycle::new(StageProcesses::new(
            Countdown::new(10),
            Countdown::new(10),
            Countdown::new(10),
        ));
        let mut ctx = Context::new(&mode, &mut events);

        lc.activate(&mut data, &mut ctx).expect("activate");
        lc.mark_to_fast_forward(&mut data, &mut ctx).expect("ff");
        assert!(lc.is_completed());

        lc.deactivate(&mut data, &mut ctx).expect("deactivate");
        assert_eq!(lc.stage(), Stage::Inactive);
        assert!(!lc.is_marked_to_fast_forward(Stage::Active));
    }

    #[test]
    fn fast_forward_on_inactive_is_noop() {
        let mode = RunMode::default();
        let mut events = Vec::new();
        let mut data = Probe;
        let mut lc = LifeCycle::new(StageProcesses::new(
            Countdown::new(3),
            EmptyProcess,
            EmptyProcess,
        ));
        {
            let mut ctx = Context::new(&mode, &mut events);
            lc.mark_to_fast_forward(&mut data, &mut ctx).expect("ff");
        }
        assert_eq!(lc.stage(), Stage::Inactive);
        assert!(!lc.is_marked_to_fast_forward(Stage::Activating));
        assert!(events.is_empty());
    }

    #[test]
    fn marked_stage_fast_forwards_on_entry() {
        let mode = RunMode::default();
        let mut events = Vec::new();
        let mut data = Probe;
        let mut lc = LifeCycle::new(StageProcesses::new(
            Countdown::new(3),
            Countdown::new(3),
            EmptyProcess,
        ));
        let mut ctx = Context::new(&mode, &mut events);

        lc.activate(&mut data, &mut ctx).expect("activate");
        lc.mark_to_fast_forward_stage(Stage::Active, &mut data, &mut ctx)
            .expect("mark");
        assert_eq!(lc.stage(), Stage::Activating);
        lc.mark_to_fast_forward_stage(Stage::Activating, &mut data, &mut ctx)
            .expect("mark");
        assert!(lc.is_completed());
    }

    #[test]
    fn marking_twice_equals_marking_once() {
        let mode = RunMode::default();
        let mut once_events = Vec::new();
        let mut twice_events = Vec::new();
        let mut data = Probe;

        let mut once = LifeCycle::new(StageProcesses::new(
            Countdown::new(4),
            Countdown::new(4),
            EmptyProcess,
        ));
        let mut twice = LifeCycle::new(StageProcesses::new(
            Countdown::new(4),
            Countdown::new(4),
            EmptyProcess,
        ));

        {
            let mut ctx = Context::new(&mode, &mut once_events);
            once.activate(&mut data, &mut ctx).expect("activate");
            once.mark_to_fast_forward_stage(Stage::Activating, &mut data, &mut ctx)
                .expect("mark");
        }
        {
            let mut ctx = Context::new(&mode, &mut twice_events);
            twice.activate(&mut data, &mut ctx).expect("activate");
            twice
                .mark_to_fast_forward_stage(Stage::Activating, &mut data, &mut ctx)
                .expect("mark");
            twice
                .mark_to_fast_forward_stage(Stage::Activating, &mut data, &mut ctx)
                .expect("mark");
        }

        assert_eq!(once.stage(), twice.stage());
        assert_eq!(once_events, twice_events);
    }
}
