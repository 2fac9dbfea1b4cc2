//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use super::ModeSwitch;
use crate::config::Config;
use crate::definition::{ContentFactory, load_definition};
use procflow_core::locking::manual_unlocks;
use procflow_core::{
    EntityData, EntityFactory, EntityKind, Process, ProcessError, ProcessEvent, ProcessRunner,
    RunMode, RunState, RunSummary,
};
use std::path::{Path, PathBuf};
use std::time::Duration;

// =============================================================================
// SHARED HELPERS
// =============================================================================

/// Load a definition and build its graph with the configured factory options.
pub fn load_process(config: &Config, file: &Path) -> Result<Process, ProcessError> {
    let definition = load_definition(file)?;
    let factory = EntityFactory::new(config.factory_options());
    definition.build(&factory, &ContentFactory::default())
}

/// Runner over `file` with the configured registry and lock strategy, in
/// `mode` (or the configured default mode).
pub fn build_runner(
    config: &Config,
    file: &Path,
    mode: Option<&str>,
) -> Result<ProcessRunner, ProcessError> {
    let process = load_process(config, file)?;
    let mode = config.mode(mode)?;
    Ok(ProcessRunner::new(process, config.registry())
        .with_mode(Box::new(mode))
        .with_strategy(config.strategy()?))
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

/// One line of the text trace.
pub fn format_event(event: &ProcessEvent) -> String {
    match event {
        ProcessEvent::StageChanged {
            entity,
            kind,
            stage,
        } => format!("{entity} [{kind}] -> {stage}"),
        ProcessEvent::StepCompleted { step, transition } => {
            format!("step '{step}' completed via transition {transition}")
        }
        ProcessEvent::ModeChanged { mode } => format!("mode changed to '{mode}'"),
    }
}

/// Whether an event is shown without `--verbose`.
fn is_notable(event: &ProcessEvent) -> bool {
    match event {
        ProcessEvent::StageChanged { kind, .. } => {
            *kind == EntityKind::STEP || *kind == EntityKind::CHAPTER || *kind == EntityKind::PROCESS
        }
        ProcessEvent::StepCompleted { .. } | ProcessEvent::ModeChanged { .. } => true,
    }
}

// =============================================================================
// RUN COMMAND
// =============================================================================

/// Raw `procflow run` arguments.
#[derive(Debug, Clone)]
pub struct RunArgs {
    pub file: PathBuf,
    pub mode: Option<String>,
    pub max_ticks: Option<u64>,
    pub tick_ms: Option<u64>,
    pub switches: Vec<ModeSwitch>,
    pub fast_forward_at: Option<u64>,
}

/// Run parameters after merging arguments over the configuration.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub max_ticks: u64,
    pub tick_interval: Duration,
    /// Mode changes ordered by tick.
    pub switches: Vec<(u64, RunMode)>,
    pub fast_forward_at: Option<u64>,
}

impl RunPlan {
    pub fn resolve(config: &Config, args: &RunArgs) -> Result<Self, ProcessError> {
        let mut switches = Vec::with_capacity(args.switches.len());
        for switch in &args.switches {
            switches.push((switch.tick, config.mode(Some(&switch.mode))?));
        }
        switches.sort_by_key(|(tick, _)| *tick);

        Ok(Self {
            max_ticks: args.max_ticks.unwrap_or(config.runner.max_ticks),
            tick_interval: Duration::from_millis(
                args.tick_ms.unwrap_or(config.runner.tick_interval_ms),
            ),
            switches,
            fast_forward_at: args.fast_forward_at,
        })
    }
}

/// Drive `runner` according to `plan`, reporting every batch of events with
/// the tick that produced it (0 for the start).
pub async fn drive(
    runner: &mut ProcessRunner,
    plan: &RunPlan,
    mut on_events: impl FnMut(u64, &[ProcessEvent]),
) -> Result<RunSummary, ProcessError> {
    let mut events = Vec::new();
    if runner.state() == RunState::Idle {
        let batch = runner.start()?;
        on_events(0, &batch);
        events.extend(batch);
    }

    let mut switches = plan.switches.iter().peekable();
    let mut fast_forward_at = plan.fast_forward_at;
    while runner.state() == RunState::Running && runner.ticks() < plan.max_ticks {
        let next = runner.ticks() + 1;

        while let Some((tick, mode)) = switches.peek() {
            if *tick > next {
                break;
            }
            let batch = runner.set_mode(Box::new(mode.clone()))?;
            on_events(runner.ticks(), &batch);
            events.extend(batch);
            switches.next();
        }

        if fast_forward_at == Some(next) {
            fast_forward_at = None;
            let batch = runner.fast_forward()?;
            on_events(runner.ticks(), &batch);
            events.extend(batch);
            continue;
        }

        let batch = runner.tick()?;
        on_events(runner.ticks(), &batch);
        events.extend(batch);

        if !plan.tick_interval.is_zero() {
            tokio::time::sleep(plan.tick_interval).await;
        }
    }

    if !runner.is_finished() {
        tracing::warn!(
            process = runner.process().data().name(),
            max_ticks = plan.max_ticks,
            "tick budget exhausted"
        );
    }
    Ok(RunSummary {
        ticks: runner.ticks(),
        finished: runner.is_finished(),
        events,
    })
}

/// Run a process definition.
pub async fn cmd_run(
    config_path: &Path,
    json_mode: bool,
    verbose: bool,
    args: RunArgs,
) -> Result<(), ProcessError> {
    let config = Config::load(config_path)?;
    let plan = RunPlan::resolve(&config, &args)?;
    let mut runner = build_runner(&config, &args.file, args.mode.as_deref())?;
    let start_mode = runner.mode().name().to_string();

    if !json_mode {
        println!(
            "Running '{}' in mode '{}'",
            runner.process().data().name(),
            start_mode
        );
        println!();
    }

    let summary = drive(&mut runner, &plan, |tick, batch| {
        if json_mode {
            return;
        }
        for event in batch.iter().filter(|event| verbose || is_notable(event)) {
            println!("[{:>6}] {}", tick, format_event(event));
        }
    })
    .await?;

    let locked: Vec<String> = runner
        .registry()
        .locked_resources()
        .iter()
        .map(|resource| resource.to_string())
        .collect();

    if json_mode {
        print_json(&serde_json::json!({
            "process": runner.process().data().name(),
            "start_mode": start_mode,
            "mode": runner.mode().name(),
            "ticks": summary.ticks,
            "finished": summary.finished,
            "locked": locked,
            "events": summary.events,
        }));
        return Ok(());
    }

    println!();
    if summary.finished {
        println!("Finished after {} ticks", summary.ticks);
    } else {
        println!("Stopped after {} ticks (not finished)", summary.ticks);
    }
    println!("Locked resources: {}", locked.len());
    for resource in &locked {
        println!("  {}", resource);
    }
    Ok(())
}

// =============================================================================
// VALIDATE COMMAND
// =============================================================================

/// Build a definition and report its shape.
pub fn cmd_validate(config_path: &Path, json_mode: bool, file: &Path) -> Result<(), ProcessError> {
    let config = Config::load(config_path)?;
    let definition = load_definition(file)?;
    let factory = EntityFactory::new(config.factory_options());
    let process = definition.build(&factory, &ContentFactory::default())?;
    let steps = process.data().steps().count();

    if json_mode {
        print_json(&serde_json::json!({
            "valid": true,
            "process": definition.name,
            "chapters": definition.chapters.len(),
            "steps": steps,
        }));
        return Ok(());
    }

    println!("Definition is valid");
    println!("Process:  {}", definition.name);
    println!("Chapters: {}", definition.chapters.len());
    println!("Steps:    {}", steps);
    Ok(())
}

// =============================================================================
// LOCKS COMMAND
// =============================================================================

/// Show what every step unlocks when it starts.
pub fn cmd_locks(config_path: &Path, json_mode: bool, file: &Path) -> Result<(), ProcessError> {
    let config = Config::load(config_path)?;
    let process = load_process(&config, file)?;
    let registry = config.registry();

    let mut rows = Vec::new();
    for step in process.data().steps() {
        let lockables: Vec<_> = step.lockables().iter().collect();
        let manual = manual_unlocks(step, &registry);
        rows.push((step.id().to_string(), lockables, manual));
    }

    if json_mode {
        let steps: Vec<serde_json::Value> = rows
            .iter()
            .map(|(id, lockables, manual)| {
                serde_json::json!({
                    "step": id,
                    "lockables": lockables,
                    "manual_unlocks": manual.resources().collect::<Vec<_>>(),
                })
            })
            .collect();
        print_json(&serde_json::json!({ "steps": steps }));
        return Ok(());
    }

    println!("Step Locks");
    println!("==========");
    for (id, lockables, manual) in &rows {
        println!();
        println!("{}", id);
        if lockables.is_empty() && manual.is_empty() {
            println!("  (no resources)");
            continue;
        }
        for property in lockables {
            let marker = if property.end_step_locked {
                " (end-step locked)"
            } else {
                ""
            };
            println!("  uses    {}{}", property.resource, marker);
        }
        for resource in manual.resources() {
            println!("  unlocks {}", resource);
        }
    }
    Ok(())
}

// =============================================================================
// MODES COMMAND
// =============================================================================

/// List the modes selectable with `--mode`.
pub fn cmd_modes(config_path: &Path, json_mode: bool) -> Result<(), ProcessError> {
    let config = Config::load(config_path)?;
    let modes = config.available_modes();
    let default = config.mode(None)?.name;

    if json_mode {
        print_json(&serde_json::json!({
            "default": default,
            "modes": modes,
        }));
        return Ok(());
    }

    println!("Modes");
    println!("=====");
    for mode in &modes {
        let marker = if mode.name == default { " (default)" } else { "" };
        println!();
        println!("{}{}", mode.name, marker);
        if mode.skip.is_empty() {
            println!("  skips:  nothing");
        } else {
            let kinds: Vec<&str> = mode.skip.iter().map(EntityKind::as_str).collect();
            println!("  skips:  {}", kinds.join(", "));
        }
        for (name, value) in &mode.parameters {
            println!("  {} = {}", name, serde_json::to_string(value).unwrap_or_default());
        }
    }
    Ok(())
}
