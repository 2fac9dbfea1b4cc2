//! # Composition
//!
//! Stage processes that coordinate the children of a collection for one
//! stage, and the configurators that adapt running collections to mode
//! changes.
//!
//! | Strategy | Activating | Active | Deactivating |
//! |----------|------------|--------|--------------|
//! | Sequence | - | [`EntityIteratingProcess`] | - |
//! | Folded | [`FoldedActivatingProcess`] | [`FoldedActiveProcess`] | [`FoldedDeactivatingProcess`] |
//! | Parallel | [`ParallelActivatingProcess`] | [`ParallelActiveProcess`] | [`ParallelDeactivatingProcess`] |

mod configurator;
mod folded;
mod parallel;
mod sequence;

pub use configurator::{CollectionConfigurator, ParallelConfigurator, SequenceConfigurator};
pub use folded::{FoldedActivatingProcess, FoldedActiveProcess, FoldedDeactivatingProcess};
pub use parallel::{ParallelActiveProcess, ParallelActivatingProcess, ParallelDeactivatingProcess};
pub use sequence::{EntityIteratingProcess, IterationPolicy, LinearPolicy};
