//! # Property-Based Tests
//!
//! Invariants of the lifecycle engine checked with proptest over randomly
//! shaped collections and processes.

use procflow_core::{
    ALL_STAGES, CollectionData, Context, DelayBehavior, Entity, EntityBox, EntityCollectionData,
    EntityFactory, EntityKind, InMemoryRegistry, LockablePropertyData, Node, ProcessError,
    ProcessEvent, ProcessRunner, ResourceId, ResourceRegistry, RunMode, Stage, StepBuilder,
    TickCondition, TransitionBuilder,
};
use proptest::collection::vec;
use proptest::prelude::*;

const HINT: EntityKind = EntityKind::from_static("hint");

// =============================================================================
// HELPERS
// =============================================================================

fn call(
    mode: &RunMode,
    f: impl FnOnce(&mut Context<'_>) -> Result<(), ProcessError>,
) -> Vec<ProcessEvent> {
    let mut events = Vec::new();
    {
        let mut ctx = Context::new(mode, &mut events);
        f(&mut ctx).expect("lifecycle call");
    }
    events
}

fn delays(ticks: &[u32], skippable: &[bool]) -> Vec<Option<EntityBox>> {
    ticks
        .iter()
        .enumerate()
        .map(|(i, &t)| {
            let optional = skippable.get(i).copied().unwrap_or(false);
            let behavior = DelayBehavior::new(format!("c{i}"), t).optional(optional);
            let behavior = if optional { behavior.with_kind(HINT) } else { behavior };
            Some(behavior.into_entity())
        })
        .collect()
}

fn collection(ticks: &[u32], skippable: &[bool]) -> CollectionData {
    CollectionData::new(
        "G",
        EntityKind::from_static("group"),
        delays(ticks, skippable),
    )
}

fn build(shape: u8, data: CollectionData) -> Node<CollectionData> {
    let factory = EntityFactory::default();
    match shape % 3 {
        0 => factory.sequence(data),
        1 => factory.folded(data),
        _ => factory.parallel(data),
    }
}

fn running_children(group: &Node<CollectionData>) -> usize {
    (0..group.data().child_count())
        .filter(|&i| {
            group
                .data()
                .child(i)
                .is_some_and(|child| child.stage().is_running())
        })
        .count()
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// A sequence never has more than one running child, skipped or not.
    #[test]
    fn sequence_runs_one_child_at_a_time(
        ticks in vec(0u32..4, 1..8),
        skippable in vec(any::<bool>(), 8),
    ) {
        let mode = RunMode::new("Skip").skipping(HINT);
        let mut seq = build(0, collection(&ticks, &skippable));
        call(&mode, |ctx| seq.activate(ctx));

        for _ in 0..200 {
            if seq.is_completed() {
                break;
            }
            call(&mode, |ctx| seq.update(ctx));
            prop_assert!(running_children(&seq) <= 1);
        }
        prop_assert!(seq.is_completed());
    }

    /// Folded teardown stops children in reverse activation order.
    #[test]
    fn folded_teardown_reverses_activation(ticks in vec(0u32..4, 1..8)) {
        let mode = RunMode::default();
        let mut folded = build(1, collection(&ticks, &[]));
        let mut log = call(&mode, |ctx| folded.activate(ctx));
        for _ in 0..100 {
            if folded.stage() == Stage::Active {
                break;
            }
            log.extend(call(&mode, |ctx| folded.update(ctx)));
        }
        log.extend(call(&mode, |ctx| folded.deactivate(ctx)));
        for _ in 0..100 {
            if folded.stage() == Stage::Inactive {
                break;
            }
            log.extend(call(&mode, |ctx| folded.update(ctx)));
        }

        let order = |stage: Stage| -> Vec<String> {
            log.iter()
                .filter_map(ProcessEvent::stage_change)
                .filter(|&(name, s)| s == stage && name != "G")
                .map(|(name, _)| name.to_string())
                .collect()
        };
        let started = order(Stage::Activating);
        let mut stopped = order(Stage::Inactive);
        stopped.reverse();
        prop_assert_eq!(started.len(), ticks.len());
        prop_assert_eq!(stopped, started);
    }

    /// Fast-forwarding a composite whose subtree is all Inactive changes
    /// nothing.
    #[test]
    fn fast_forward_of_inactive_composite_is_noop(
        shape in 0u8..3,
        ticks in vec(0u32..4, 0..6),
    ) {
        let mode = RunMode::default();
        let mut group = build(shape, collection(&ticks, &[]));
        let events = call(&mode, |ctx| group.mark_to_fast_forward(ctx));

        prop_assert!(events.is_empty());
        prop_assert_eq!(group.stage(), Stage::Inactive);
        prop_assert!(
            !ALL_STAGES
                .iter()
                .any(|&stage| group.life_cycle().is_marked_to_fast_forward(stage))
        );
        prop_assert_eq!(running_children(&group), 0);
    }

    /// Marking a stage twice behaves exactly like marking it once.
    #[test]
    fn marking_is_idempotent(
        shape in 0u8..3,
        ticks in vec(0u32..4, 1..6),
        warmup in 0usize..8,
        stage_index in 0usize..4,
    ) {
        let mode = RunMode::default();
        let stage = ALL_STAGES[stage_index];
        let mut once = build(shape, collection(&ticks, &[]));
        let mut twice = build(shape, collection(&ticks, &[]));

        let mut log_once = call(&mode, |ctx| once.activate(ctx));
        let mut log_twice = call(&mode, |ctx| twice.activate(ctx));
        for _ in 0..warmup {
            log_once.extend(call(&mode, |ctx| once.update(ctx)));
            log_twice.extend(call(&mode, |ctx| twice.update(ctx)));
        }

        log_once.extend(call(&mode, |ctx| once.mark_to_fast_forward_stage(stage, ctx)));
        log_twice.extend(call(&mode, |ctx| twice.mark_to_fast_forward_stage(stage, ctx)));
        log_twice.extend(call(&mode, |ctx| twice.mark_to_fast_forward_stage(stage, ctx)));
        prop_assert_eq!(once.stage(), twice.stage());

        for _ in 0..20 {
            if once.is_completed() {
                log_once.extend(call(&mode, |ctx| once.deactivate(ctx)));
            }
            if twice.is_completed() {
                log_twice.extend(call(&mode, |ctx| twice.deactivate(ctx)));
            }
            log_once.extend(call(&mode, |ctx| once.update(ctx)));
            log_twice.extend(call(&mode, |ctx| twice.update(ctx)));
        }
        prop_assert_eq!(log_once, log_twice);
    }

    /// Across a step boundary, exactly the resources the next step unlocks
    /// stay interactable.
    #[test]
    fn lock_then_unlock_keeps_only_needed_resources(
        flags in vec(any::<bool>(), 1..8),
        needed in vec(any::<bool>(), 8),
    ) {
        let resources: Vec<ResourceId> = (0..flags.len())
            .map(|i| ResourceId::new(format!("r{i}")))
            .collect();

        let factory = EntityFactory::default();
        let mut s1 = StepBuilder::new("S1").transition(
            TransitionBuilder::new()
                .to("S2")
                .condition(TickCondition::new("go", 0).into_entity()),
        );
        for (resource, &flag) in resources.iter().zip(&flags) {
            s1 = s1.lockable(LockablePropertyData::new(resource.clone(), flag));
        }
        let mut s2 = StepBuilder::new("S2").transition(
            TransitionBuilder::new().condition(TickCondition::new("hold", 10).into_entity()),
        );
        for (resource, _) in resources.iter().zip(&needed).filter(|(_, n)| **n) {
            s2 = s2.unlock(resource.clone());
        }
        let chapter = factory
            .chapter("C", None, vec![factory.step(s1), factory.step(s2)])
            .expect("chapter");
        let process = factory.process("P", vec![chapter]).expect("process");

        let mut runner = ProcessRunner::new(process, InMemoryRegistry::new());
        runner.start().expect("start");
        let mut reached = false;
        for _ in 0..50 {
            let events = runner.tick().expect("tick");
            let entered_s2 = events
                .iter()
                .filter_map(ProcessEvent::stage_change)
                .any(|change| change == ("S2", Stage::Activating));
            if entered_s2 {
                reached = true;
                break;
            }
        }
        prop_assert!(reached);

        for (i, resource) in resources.iter().enumerate() {
            let expect_locked = !needed[i];
            prop_assert_eq!(runner.registry().is_locked(resource), Some(expect_locked));
        }
    }
}
