//! # Entities
//!
//! Every node of a process graph (process, chapter, step, transition,
//! condition, behavior) is an [`Entity`]: a [`LifeCycle`] plus a data payload.
//! Ownership is strictly tree-shaped; children are owned by their parent's
//! data and addressed by index.

use crate::lifecycle::{Context, LifeCycle, StageProcesses};
use crate::locking::LockSet;
use crate::types::{EntityKind, ProcessError, Stage};

/// Owned, type-erased entity.
pub type EntityBox = Box<dyn Entity>;

// =============================================================================
// ENTITY TRAIT
// =============================================================================

/// Uniform interface of every node in the process graph.
pub trait Entity {
    fn name(&self) -> &str;

    /// Stable kind tag consulted by skip policies.
    fn kind(&self) -> EntityKind;

    fn stage(&self) -> Stage;

    /// Optional entities may be fast-forwarded when the mode skips their kind.
    fn is_optional(&self) -> bool;

    /// Non-blocking (background) entities do not gate their parent's parallel
    /// stage transitions.
    fn is_blocking(&self) -> bool;

    /// True once the entity is Active and its Active work has finished.
    fn is_completed(&self) -> bool;

    fn activate(&mut self, ctx: &mut Context<'_>) -> Result<(), ProcessError>;

    fn deactivate(&mut self, ctx: &mut Context<'_>) -> Result<(), ProcessError>;

    /// One tick of the current stage.
    fn update(&mut self, ctx: &mut Context<'_>) -> Result<(), ProcessError>;

    fn mark_to_fast_forward(&mut self, ctx: &mut Context<'_>) -> Result<(), ProcessError>;

    fn mark_to_fast_forward_stage(
        &mut self,
        stage: Stage,
        ctx: &mut Context<'_>,
    ) -> Result<(), ProcessError>;

    /// React to the mode carried by `ctx`.
    fn configure(&mut self, ctx: &mut Context<'_>) -> Result<(), ProcessError>;

    /// Add every lockable resource this entity (and its subtree) references.
    fn declare_lockables(&self, out: &mut LockSet);
}

/// Drive an Activating or Active entity all the way to Inactive without
/// suspending.
pub fn fast_forward_to_inactive(
    entity: &mut dyn Entity,
    ctx: &mut Context<'_>,
) -> Result<(), ProcessError> {
    if entity.stage() == Stage::Inactive {
        return Ok(());
    }
    // Marks every later stage too, so Deactivating completes on entry.
    entity.mark_to_fast_forward(ctx)?;
    if entity.stage().can_deactivate() {
        entity.deactivate(ctx)?;
    }
    Ok(())
}

// =============================================================================
// DATA TRAITS
// =============================================================================

/// Payload of an entity.
pub trait EntityData: 'static {
    fn name(&self) -> &str;

    fn kind(&self) -> EntityKind;

    fn is_optional(&self) -> bool {
        false
    }

    fn is_blocking(&self) -> bool {
        true
    }

    fn declare_lockables(&self, _out: &mut LockSet) {}
}

/// Payload of an entity that owns an ordered collection of children.
///
/// Slots may be empty: placeholder children are legal and are no-ops.
pub trait EntityCollectionData: EntityData {
    fn child_count(&self) -> usize;

    fn child(&self, index: usize) -> Option<&dyn Entity>;

    fn child_mut(&mut self, index: usize) -> Option<&mut dyn Entity>;
}

/// Collection payload iterated one child at a time.
///
/// `current` identifies the child presently iterating. It never owns the
/// child and is cleared whenever the owning stage ends.
pub trait EntitySequenceData: EntityCollectionData {
    fn current(&self) -> Option<usize>;

    fn set_current(&mut self, current: Option<usize>);
}

/// Declare the lockables of every child of a collection.
pub fn declare_child_lockables<D: EntityCollectionData + ?Sized>(data: &D, out: &mut LockSet) {
    for index in 0..data.child_count() {
        if let Some(child) = data.child(index) {
            child.declare_lockables(out);
        }
    }
}

// =============================================================================
// CONFIGURATOR
// =============================================================================

/// Per-entity policy reacting to mode changes.
pub trait Configurator<D> {
    fn configure(
        &mut self,
        data: &mut D,
        stage: Stage,
        ctx: &mut Context<'_>,
    ) -> Result<(), ProcessError>;
}

// =============================================================================
// NODE
// =============================================================================

/// Generic entity: a data payload driven by a [`LifeCycle`].
pub struct Node<D: EntityData> {
    data: D,
    life_cycle: LifeCycle<D>,
    configurator: Option<Box<dyn Configurator<D>>>,
}

impl<D: EntityData> Node<D> {
    #[must_use]
    pub fn new(data: D, processes: StageProcesses<D>) -> Self {
        Self {
            data,
            life_cycle: LifeCycle::new(processes),
            configurator: None,
        }
    }

    #[must_use]
    pub fn with_configurator(mut self, configurator: impl Configurator<D> + 'static) -> Self {
        self.configurator = Some(Box::new(configurator));
        self
    }

    #[must_use]
    pub fn data(&self) -> &D {
        &self.data
    }

    /// Mutable payload access. Changing the children of a running collection
    /// is a programming error that composition walks report as an invariant
    /// violation.
    pub fn data_mut(&mut self) -> &mut D {
        &mut self.data
    }

    #[must_use]
    pub fn life_cycle(&self) -> &LifeCycle<D> {
        &self.life_cycle
    }

    /// Box this node as a type-erased entity.
    #[must_use]
    pub fn boxed(self) -> EntityBox {
        Box::new(self)
    }
}

impl<D: EntityData> Entity for Node<D> {
    fn name(&self) -> &str {
        self.data.name()
    }

    fn kind(&self) -> EntityKind {
        self.data.kind()
    }

    fn stage(&self) -> Stage {
        self.life_cycle.stage()
    }

    fn is_optional(&self) -> bool {
        self.data.is_optional()
    }

    fn is_blocking(&self) -> bool {
        self.data.is_blocking()
    }

    fn is_completed(&self) -> bool {
        self.life_cycle.is_completed()
    }

    fn activate(&mut self, ctx: &mut Context<'_>) -> Result<(), ProcessError> {
        self.life_cycle.activate(&mut self.data, ctx)
    }

    fn deactivate(&mut self, ctx: &mut Context<'_>) -> Result<(), ProcessError> {
        self.life_cycle.deactivate(&mut self.data, ctx)
    }

    fn update(&mut self, ctx: &mut Context<'_>) -> Result<(), ProcessError> {
        self.life_cycle.update(&mut self.data, ctx)
    }

    fn mark_to_fast_forward(&mut self, ctx: &mut Context<'_>) -> Result<(), ProcessError> {
        self.life_cycle.mark_to_fast_forward(&mut self.data, ctx)
    }

    fn mark_to_fast_forward_stage(
        &mut self,
        stage: Stage,
        ctx: &mut Context<'_>,
    ) -> Result<(), ProcessError> {
        self.life_cycle
            .mark_to_fast_forward_stage(stage, &mut self.data, ctx)
    }

    fn configure(&mut self, ctx: &mut Context<'_>) -> Result<(), ProcessError> {
        match &mut self.configurator {
            Some(configurator) => {
                configurator.configure(&mut self.data, self.life_cycle.stage(), ctx)
            }
            None => Ok(()),
        }
    }

    fn declare_lockables(&self, out: &mut LockSet) {
        self.data.declare_lockables(out);
    }
}
