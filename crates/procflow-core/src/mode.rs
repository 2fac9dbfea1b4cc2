//! # Run Modes
//!
//! A mode is the swappable skip policy consulted by every composition process.
//! Modes may change between any two stage transitions, so nothing in the
//! engine caches a skip decision across calls.

use crate::primitives::DEFAULT_MODE_NAME;
use crate::types::EntityKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// PARAMETERS
// =============================================================================

/// Typed mode parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl ParameterValue {
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParameterValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParameterValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParameterValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

// =============================================================================
// MODE TRAIT
// =============================================================================

/// Runtime policy deciding which entity kinds are skipped.
pub trait Mode {
    /// Display name of the mode.
    fn name(&self) -> &str;

    /// Whether entities of `kind` are skipped under this mode.
    ///
    /// Only entities that are optional are ever fast-forwarded because of this.
    fn check_if_skipped(&self, kind: &EntityKind) -> bool;

    /// Raw parameter lookup.
    fn parameter(&self, name: &str) -> Option<&ParameterValue>;

    fn contains_parameter(&self, name: &str) -> bool {
        self.parameter(name).is_some()
    }

    /// Boolean parameter lookup. `None` when absent or not a boolean.
    fn bool_parameter(&self, name: &str) -> Option<bool> {
        self.parameter(name).and_then(ParameterValue::as_bool)
    }

    fn int_parameter(&self, name: &str) -> Option<i64> {
        self.parameter(name).and_then(ParameterValue::as_int)
    }

    fn text_parameter(&self, name: &str) -> Option<&str> {
        self.parameter(name).and_then(ParameterValue::as_text)
    }
}

// =============================================================================
// RUN MODE
// =============================================================================

/// Data-driven mode: a named skip list plus parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMode {
    pub name: String,
    #[serde(default)]
    pub skip: BTreeSet<EntityKind>,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterValue>,
}

impl Default for RunMode {
    fn default() -> Self {
        Self::new(DEFAULT_MODE_NAME)
    }
}

impl RunMode {
    /// Create a mode that skips nothing.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            skip: BTreeSet::new(),
            parameters: BTreeMap::new(),
        }
    }

    /// Add a skipped kind.
    #[must_use]
    pub fn skipping(mut self, kind: EntityKind) -> Self {
        self.skip.insert(kind);
        self
    }

    /// Add or replace a parameter.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: ParameterValue) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }
}

impl Mode for RunMode {
    fn name(&self) -> &str {
        &self.name
    }

    fn check_if_skipped(&self, kind: &EntityKind) -> bool {
        self.skip.contains(kind)
    }

    fn parameter(&self, name: &str) -> Option<&ParameterValue> {
        self.parameters.get(name)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mode_skips_nothing() {
        let mode = RunMode::default();
        assert_eq!(mode.name(), DEFAULT_MODE_NAME);
        assert!(!mode.check_if_skipped(&EntityKind::STEP));
    }

    #[test]
    fn skip_list_is_keyed_by_kind() {
        let mode = RunMode::new("Fast").skipping(EntityKind::from_static("delay"));
        assert!(mode.check_if_skipped(&EntityKind::new("delay".to_string())));
        assert!(!mode.check_if_skipped(&EntityKind::from_static("ticks")));
    }

    #[test]
    fn typed_parameter_lookup() {
        let mode = RunMode::new("Strict")
            .with_parameter("LockOnProcessStart", ParameterValue::Bool(true))
            .with_parameter("Retries", ParameterValue::Int(3));

        assert!(mode.contains_parameter("LockOnProcessStart"));
        assert_eq!(mode.bool_parameter("LockOnProcessStart"), Some(true));
        assert_eq!(mode.bool_parameter("Retries"), None);
        assert_eq!(mode.int_parameter("Retries"), Some(3));
        assert!(!mode.contains_parameter("Missing"));
    }
}
