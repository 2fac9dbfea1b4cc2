//! # Process Runner
//!
//! Tick driver of a process graph. Owns the root process, the mode in
//! effect, the lock strategy and the resource registry, and turns the
//! events of each tick into lock and unlock calls.
//!
//! ## Tick Contract
//!
//! One [`ProcessRunner::tick`] updates the root once, deactivates it as soon
//! as its Active work is finished, then consumes the tick's events in order:
//! a step entering Activating is unlocked, a completed step is locked.

use crate::entities::{Process, ProcessData, StepData};
use crate::entity::Entity;
use crate::lifecycle::{Context, ProcessEvent};
use crate::locking::{
    DefaultStepLockHandling, InMemoryRegistry, ResourceRegistry, StepLockHandlingStrategy,
    manual_unlocks,
};
use crate::mode::{Mode, RunMode};
use crate::types::{EntityKind, ProcessError, Stage, StepId};
use serde::Serialize;

/// Where the runner is in the life of its process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Running,
    Finished,
}

/// Result of [`ProcessRunner::run`].
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub finished: bool,
    pub events: Vec<ProcessEvent>,
}

pub struct ProcessRunner<R: ResourceRegistry = InMemoryRegistry> {
    process: Process,
    mode: Box<dyn Mode>,
    strategy: Box<dyn StepLockHandlingStrategy>,
    registry: R,
    ticks: u64,
    state: RunState,
}

impl<R: ResourceRegistry> ProcessRunner<R> {
    /// Runner with the default mode and the default lock strategy.
    #[must_use]
    pub fn new(process: Process, registry: R) -> Self {
        Self {
            process,
            mode: Box::new(RunMode::default()),
            strategy: Box::new(DefaultStepLockHandling::new()),
            registry,
            ticks: 0,
            state: RunState::Idle,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: Box<dyn Mode>) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: Box<dyn StepLockHandlingStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub fn process(&self) -> &Process {
        &self.process
    }

    #[must_use]
    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut R {
        &mut self.registry
    }

    #[must_use]
    pub fn mode(&self) -> &dyn Mode {
        self.mode.as_ref()
    }

    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    #[must_use]
    pub fn state(&self) -> RunState {
        self.state
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state == RunState::Finished
    }

    // =========================================================================
    // DRIVING
    // =========================================================================

    /// Configure the graph and the lock strategy, then activate the root.
    pub fn start(&mut self) -> Result<Vec<ProcessEvent>, ProcessError> {
        if self.state != RunState::Idle {
            return Err(ProcessError::InvalidStageTransition {
                entity: self.process.name().to_string(),
                stage: self.process.stage(),
                request: crate::types::StageRequest::Activate,
            });
        }
        tracing::info!(process = self.process.name(), mode = self.mode.name(), "process starting");

        let mut events = Vec::new();
        {
            let mut ctx = Context::new(self.mode.as_ref(), &mut events);
            self.process.configure(&mut ctx)?;
        }
        self.strategy.configure(self.mode.as_ref());
        self.strategy
            .on_process_started(self.process.data(), &mut self.registry);
        self.state = RunState::Running;

        let mut more = self.drive(|process, ctx| process.activate(ctx))?;
        events.append(&mut more);
        Ok(events)
    }

    /// One scheduling tick. Returns the events it produced.
    pub fn tick(&mut self) -> Result<Vec<ProcessEvent>, ProcessError> {
        if self.state != RunState::Running {
            return Ok(Vec::new());
        }
        self.ticks += 1;
        self.drive(|process, ctx| process.update(ctx))
    }

    /// Switch modes. Every configurator of the graph reacts before this
    /// returns, so skipped entities are fast-forwarded within the call.
    pub fn set_mode(&mut self, mode: Box<dyn Mode>) -> Result<Vec<ProcessEvent>, ProcessError> {
        tracing::info!(from = self.mode.name(), to = mode.name(), "mode changed");
        self.mode = mode;
        self.strategy.configure(self.mode.as_ref());
        let name = self.mode.name().to_string();
        self.drive(|process, ctx| {
            ctx.emit(ProcessEvent::ModeChanged { mode: name });
            process.configure(ctx)
        })
    }

    /// Complete the whole process without suspending.
    pub fn fast_forward(&mut self) -> Result<Vec<ProcessEvent>, ProcessError> {
        if self.state != RunState::Running {
            return Ok(Vec::new());
        }
        tracing::info!(process = self.process.name(), "fast-forwarding process");
        self.drive(|process, ctx| process.mark_to_fast_forward(ctx))
    }

    /// Start if needed, then tick until the process finishes or `max_ticks`
    /// ticks have run.
    pub fn run(&mut self, max_ticks: u64) -> Result<RunSummary, ProcessError> {
        let mut events = Vec::new();
        if self.state == RunState::Idle {
            events.extend(self.start()?);
        }
        while self.state == RunState::Running && self.ticks < max_ticks {
            events.extend(self.tick()?);
        }
        if !self.is_finished() {
            tracing::warn!(process = self.process.name(), max_ticks, "tick budget exhausted");
        }
        Ok(RunSummary {
            ticks: self.ticks,
            finished: self.is_finished(),
            events,
        })
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn drive(
        &mut self,
        op: impl FnOnce(&mut Process, &mut Context<'_>) -> Result<(), ProcessError>,
    ) -> Result<Vec<ProcessEvent>, ProcessError> {
        let mut events = Vec::new();
        {
            let mut ctx = Context::new(self.mode.as_ref(), &mut events);
            op(&mut self.process, &mut ctx)?;
            if self.process.is_completed() {
                self.process.deactivate(&mut ctx)?;
            }
        }
        self.apply_locks(&events);

        if self.state == RunState::Running && self.process.stage() == Stage::Inactive {
            self.state = RunState::Finished;
            self.strategy
                .on_process_finished(self.process.data(), &mut self.registry);
            tracing::info!(process = self.process.name(), ticks = self.ticks, "process finished");
        }
        Ok(events)
    }

    fn apply_locks(&mut self, events: &[ProcessEvent]) {
        let process = self.process.data();
        for event in events {
            match event {
                ProcessEvent::StageChanged {
                    entity,
                    kind,
                    stage: Stage::Activating,
                } if *kind == EntityKind::STEP => {
                    let Some(step) = find_step(process, entity) else {
                        continue;
                    };
                    let manual = manual_unlocks(step, &self.registry);
                    self.strategy.unlock(step, &manual, &mut self.registry);
                }
                ProcessEvent::StepCompleted { step, .. } => {
                    let Some(step) = find_step(process, step.as_str()) else {
                        continue;
                    };
                    let manual = manual_unlocks(step, &self.registry);
                    self.strategy
                        .lock(step, &manual, Some(process), &mut self.registry);
                }
                _ => {}
            }
        }
    }
}

fn find_step<'p>(process: &'p ProcessData, id: &str) -> Option<&'p StepData> {
    let found = process.find_step(&StepId::new(id));
    if found.is_none() {
        tracing::warn!(step = id, "event names an unknown step");
    }
    found
}
