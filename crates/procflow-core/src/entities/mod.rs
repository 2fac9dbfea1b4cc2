//! # Process Graph Entities
//!
//! The domain graph the lifecycle engine runs:
//!
//! | Entity | Activating | Active | Deactivating |
//! |--------|------------|--------|--------------|
//! | Process | nothing | chapters in sequence | reverse walk |
//! | Chapter | nothing | steps, following transitions | reverse walk |
//! | Step | behaviors, then transitions | until a transition completes | reverse walk |
//! | Transitions | all at once | holding pattern | all at once |
//! | Transition | conditions at once | until all conditions are met | all at once |
//!
//! Nodes are assembled with their stage processes by
//! [`crate::builder::EntityFactory`].

mod chapter;
mod collection;
mod process;
mod step;
mod transition;

pub use chapter::{ChapterData, ChapterPolicy};
pub use collection::CollectionData;
pub use process::ProcessData;
pub use step::{StepActivatingProcess, StepActiveProcess, StepData};
pub use transition::{TransitionActiveProcess, TransitionCollectionData, TransitionData};

use crate::entity::Node;

pub type Process = Node<ProcessData>;
pub type Chapter = Node<ChapterData>;
pub type Step = Node<StepData>;
pub type Transition = Node<TransitionData>;
