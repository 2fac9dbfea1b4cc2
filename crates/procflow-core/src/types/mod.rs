//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the lifecycle engine:
//! - The lifecycle stage (`Stage`)
//! - Stable entity kind tags used by skip policies (`EntityKind`)
//! - Step identifiers (`StepId`)
//! - Error types (`ProcessError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module implement `Ord` so they can live in
//! `BTreeMap`/`BTreeSet` and iterate in a stable order.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use thiserror::Error;

// =============================================================================
// STAGE
// =============================================================================

/// Lifecycle stage of an entity.
///
/// The cycle is `Inactive → Activating → Active → Deactivating → Inactive`.
/// Exactly one stage is current per entity at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    Inactive,
    Activating,
    Active,
    Deactivating,
}

impl Stage {
    /// Stable, human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Stage::Inactive => "Inactive",
            Stage::Activating => "Activating",
            Stage::Active => "Active",
            Stage::Deactivating => "Deactivating",
        }
    }

    /// The stage entered when this stage's work completes.
    #[must_use]
    pub const fn next(self) -> Stage {
        match self {
            Stage::Inactive => Stage::Activating,
            Stage::Activating => Stage::Active,
            Stage::Active => Stage::Deactivating,
            Stage::Deactivating => Stage::Inactive,
        }
    }

    /// True while the entity is between `Activate()` and the end of its teardown.
    #[must_use]
    pub const fn is_running(self) -> bool {
        !matches!(self, Stage::Inactive)
    }

    /// True for the two stages `Deactivate()` accepts.
    #[must_use]
    pub const fn can_deactivate(self) -> bool {
        matches!(self, Stage::Activating | Stage::Active)
    }

    /// Dense index for per-stage tables.
    pub(crate) const fn index(self) -> usize {
        match self {
            Stage::Inactive => 0,
            Stage::Activating => 1,
            Stage::Active => 2,
            Stage::Deactivating => 3,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Canonical list of all stages in cycle order.
pub const ALL_STAGES: [Stage; 4] = [
    Stage::Inactive,
    Stage::Activating,
    Stage::Active,
    Stage::Deactivating,
];

// =============================================================================
// ENTITY KIND
// =============================================================================

/// Stable kind tag of an entity.
///
/// Skip policies are keyed by kind rather than by concrete Rust type, so a mode
/// loaded from a configuration file can name the entities it skips.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityKind(Cow<'static, str>);

impl EntityKind {
    pub const PROCESS: EntityKind = EntityKind::from_static("process");
    pub const CHAPTER: EntityKind = EntityKind::from_static("chapter");
    pub const STEP: EntityKind = EntityKind::from_static("step");
    pub const TRANSITION: EntityKind = EntityKind::from_static("transition");
    pub const BEHAVIOR_COLLECTION: EntityKind = EntityKind::from_static("behaviors");
    pub const TRANSITION_COLLECTION: EntityKind = EntityKind::from_static("transitions");

    /// Create a kind from a static string without allocating.
    #[must_use]
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Create a kind from any string.
    #[must_use]
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Get the kind as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// STEP IDENTIFIER
// =============================================================================

/// Identifier of a step, unique within a process.
///
/// Transitions name their target by `StepId`, never by reference.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(pub String);

impl StepId {
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Requested lifecycle operation, carried by transition errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageRequest {
    Activate,
    Deactivate,
}

impl std::fmt::Display for StageRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageRequest::Activate => f.write_str("activate"),
            StageRequest::Deactivate => f.write_str("deactivate"),
        }
    }
}

/// Errors that can occur in the lifecycle engine.
///
/// - No silent failures
/// - Errors raised by content (conditions, behaviors) propagate unchanged to
///   the driver, which owns the abort policy
#[derive(Debug, Error)]
pub enum ProcessError {
    /// `Activate()`/`Deactivate()` was requested from a stage that does not allow it.
    #[error("Cannot {request} '{entity}' while {stage}")]
    InvalidStageTransition {
        entity: String,
        stage: Stage,
        request: StageRequest,
    },

    /// A composition walk found its own bookkeeping inconsistent.
    /// This is a programming error and is never retried.
    #[error("Invariant violation in '{entity}': {detail}")]
    InvariantViolation { entity: String, detail: String },

    /// A step id was referenced but is not part of the graph.
    #[error("Unknown step: {0}")]
    UnknownStep(StepId),

    /// Two steps share the same id.
    #[error("Duplicate step id: {0}")]
    DuplicateStep(StepId),

    /// A process definition could not be turned into entities.
    #[error("Invalid definition: {0}")]
    InvalidDefinition(String),

    /// Runner or mode configuration is unusable.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),

    /// Error raised by content code (conditions, behaviors).
    #[error("Content error in '{entity}': {message}")]
    Content { entity: String, message: String },
}

impl ProcessError {
    pub(crate) fn invariant(entity: &str, detail: impl Into<String>) -> Self {
        let error = Self::InvariantViolation {
            entity: entity.to_string(),
            detail: detail.into(),
        };
        tracing::error!(entity, error = %error, "composition invariant violated");
        error
    }
}

// =============================================================================
// TESTS
// =============================================================================
