//! # procflow-core
//!
//! The process lifecycle engine - THE LOGIC.
//!
//! A process is a tree of entities (process, chapters, steps, transitions,
//! conditions, behaviors). Every entity runs the same stage machine
//! (`Inactive → Activating → Active → Deactivating → Inactive`) and the
//! composition strategies (sequence, folded, parallel) decide when children
//! run. A swappable mode skips optional entities by fast-forwarding them, and
//! a lock strategy keeps external resources interactable only while the steps
//! using them run.
//!
//! ## Architectural Constraints
//!
//! - Single-threaded and tick driven: nothing runs between two calls
//! - Deterministic: children are walked in list order, sets are ordered
//! - NO async, NO I/O (pure Rust)
//! - Errors raised by content propagate unchanged to the driver

// =============================================================================
// MODULES
// =============================================================================

pub mod builder;
pub mod composition;
pub mod content;
pub mod entities;
pub mod entity;
pub mod lifecycle;
pub mod locking;
pub mod mode;
pub mod primitives;
pub mod runner;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{ALL_STAGES, EntityKind, ProcessError, Stage, StageRequest, StepId};

// =============================================================================
// RE-EXPORTS: Lifecycle
// =============================================================================

pub use entity::{
    Configurator, Entity, EntityBox, EntityCollectionData, EntityData, EntitySequenceData, Node,
    fast_forward_to_inactive,
};
pub use lifecycle::{
    Context, EmptyProcess, LifeCycle, ProcessEvent, Progress, StageProcess, StageProcesses,
};
pub use mode::{Mode, ParameterValue, RunMode};

// =============================================================================
// RE-EXPORTS: Composition
// =============================================================================

pub use composition::{
    CollectionConfigurator, EntityIteratingProcess, FoldedActivatingProcess, FoldedActiveProcess,
    FoldedDeactivatingProcess, IterationPolicy, LinearPolicy, ParallelActiveProcess,
    ParallelActivatingProcess, ParallelConfigurator, ParallelDeactivatingProcess,
    SequenceConfigurator,
};

// =============================================================================
// RE-EXPORTS: Graph
// =============================================================================

pub use builder::{EntityFactory, FactoryOptions, StepBuilder, TransitionBuilder};
pub use content::{DelayBehavior, TickCondition};
pub use entities::{
    Chapter, ChapterData, CollectionData, Process, ProcessData, Step, StepData, Transition,
    TransitionData,
};

// =============================================================================
// RE-EXPORTS: Locking & Driver
// =============================================================================

pub use locking::{
    DefaultStepLockHandling, InMemoryRegistry, LockPlan, LockSet, LockablePropertyData,
    NoLockHandling, ResourceId, ResourceRegistry, StepLockHandlingStrategy,
};
pub use runner::{ProcessRunner, RunState, RunSummary};
