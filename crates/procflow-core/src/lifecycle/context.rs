//! Per-call context threaded through every lifecycle operation.

use super::ProcessEvent;
use crate::entity::Entity;
use crate::mode::Mode;

/// Mode and event sink for one call tree.
///
/// The mode is borrowed for the duration of the call only; processes must
/// re-query it instead of caching skip decisions.
pub struct Context<'a> {
    mode: &'a dyn Mode,
    events: &'a mut Vec<ProcessEvent>,
}

impl<'a> Context<'a> {
    pub fn new(mode: &'a dyn Mode, events: &'a mut Vec<ProcessEvent>) -> Self {
        Self { mode, events }
    }

    /// The mode in effect for this call.
    #[must_use]
    pub fn mode(&self) -> &'a dyn Mode {
        self.mode
    }

    pub fn emit(&mut self, event: ProcessEvent) {
        self.events.push(event);
    }

    /// An entity is skipped when it is optional and the mode skips its kind.
    #[must_use]
    pub fn is_skipped(&self, entity: &dyn Entity) -> bool {
        entity.is_optional() && self.mode.check_if_skipped(&entity.kind())
    }
}
