use crate::types::{EntityKind, Stage, StepId};
use serde::{Deserialize, Serialize};

/// Observable trace of a running process.
///
/// Events are appended in the order things happen inside a tick; the runner
/// drains them after every tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProcessEvent {
    /// An entity entered `stage`.
    StageChanged {
        entity: String,
        kind: EntityKind,
        stage: Stage,
    },
    /// The transition at index `transition` of step `step` completed.
    StepCompleted { step: StepId, transition: usize },
    /// The runner switched to another mode.
    ModeChanged { mode: String },
}

impl ProcessEvent {
    /// Entity name and stage for `StageChanged` events.
    #[must_use]
    pub fn stage_change(&self) -> Option<(&str, Stage)> {
        match self {
            ProcessEvent::StageChanged { entity, stage, .. } => Some((entity.as_str(), *stage)),
            _ => None,
        }
    }
}
