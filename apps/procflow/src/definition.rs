//! # Process Definitions
//!
//! Serde description of a process graph, read from TOML or JSON (chosen by
//! file extension), and the [`ContentFactory`] that turns content entries into
//! conditions and behaviors.
//!
//! ```toml
//! name = "Door training"
//!
//! [[chapters]]
//! name = "Intro"
//!
//! [[chapters.steps]]
//! id = "Open door"
//! lockables = [{ resource = "doorHandle", end_step_locked = true }]
//! behaviors = [{ type = "delay", ticks = 2 }]
//! transitions = [{ to = "Walk in", conditions = [{ type = "ticks", ticks = 3 }] }]
//! ```

use procflow_core::content::{DelayBehavior, TickCondition};
use procflow_core::{
    EntityBox, EntityFactory, EntityKind, LockablePropertyData, Process, ProcessError, ResourceId,
    StepBuilder, StepId, TransitionBuilder,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Maximum definition file size (10 MB).
const MAX_DEFINITION_FILE_SIZE: u64 = 10 * 1024 * 1024;

// =============================================================================
// DEFINITION TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProcessDefinition {
    pub name: String,
    #[serde(default)]
    pub chapters: Vec<ChapterDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChapterDefinition {
    pub name: String,
    /// Entry step; the first listed step when absent.
    #[serde(default)]
    pub first_step: Option<String>,
    #[serde(default)]
    pub steps: Vec<StepDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepDefinition {
    pub id: String,
    #[serde(default)]
    pub behaviors: Vec<ContentDefinition>,
    /// No transitions means the step ends its chapter unconditionally.
    #[serde(default)]
    pub transitions: Vec<TransitionDefinition>,
    #[serde(default)]
    pub lockables: Vec<LockablePropertyData>,
    #[serde(default)]
    pub unlock: Vec<ResourceId>,
    #[serde(default)]
    pub unlock_tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransitionDefinition {
    /// Target step in the same chapter; absent ends the chapter.
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub conditions: Vec<ContentDefinition>,
}

/// A condition or behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContentDefinition {
    /// Constructor name in the [`ContentFactory`].
    #[serde(rename = "type")]
    pub content_type: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Entity kind matched against mode skip lists.
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub ticks: u32,
    #[serde(default)]
    pub optional: bool,
    #[serde(default = "default_blocking")]
    pub blocking: bool,
    #[serde(default)]
    pub lockables: Vec<LockablePropertyData>,
}

fn default_blocking() -> bool {
    true
}

// =============================================================================
// CONTENT FACTORY
// =============================================================================

/// Builds one content entity from its definition and resolved name.
pub type ContentConstructor = fn(&ContentDefinition, String) -> Result<EntityBox, ProcessError>;

/// Content kind name for [`TickCondition`] entries.
pub const TICKS_CONTENT: &str = "ticks";
/// Content kind name for conditions met on their first update.
pub const ALWAYS_CONTENT: &str = "always";
/// Content kind name for [`DelayBehavior`] entries.
pub const DELAY_CONTENT: &str = "delay";

/// Registry of content constructors, keyed by `type` name.
pub struct ContentFactory {
    constructors: BTreeMap<String, ContentConstructor>,
}

impl Default for ContentFactory {
    fn default() -> Self {
        let mut factory = Self::empty();
        factory.register(TICKS_CONTENT, build_ticks);
        factory.register(ALWAYS_CONTENT, build_always);
        factory.register(DELAY_CONTENT, build_delay);
        factory
    }
}

impl ContentFactory {
    /// Factory without any constructor.
    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Add or replace the constructor for `content_type`.
    pub fn register(&mut self, content_type: impl Into<String>, constructor: ContentConstructor) {
        self.constructors.insert(content_type.into(), constructor);
    }

    pub fn content_types(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    pub fn build(
        &self,
        definition: &ContentDefinition,
        default_name: String,
    ) -> Result<EntityBox, ProcessError> {
        let constructor = self
            .constructors
            .get(&definition.content_type)
            .ok_or_else(|| {
                ProcessError::InvalidDefinition(format!(
                    "unknown content type '{}'",
                    definition.content_type
                ))
            })?;
        let name = definition.name.clone().unwrap_or(default_name);
        constructor(definition, name)
    }
}

fn tick_condition(definition: &ContentDefinition, name: String, ticks: u32) -> TickCondition {
    let mut condition = TickCondition::new(name, ticks).optional(definition.optional);
    if let Some(kind) = &definition.kind {
        condition = condition.with_kind(EntityKind::new(kind.clone()));
    }
    for property in &definition.lockables {
        condition = condition.lockable(property.clone());
    }
    condition
}

fn build_ticks(definition: &ContentDefinition, name: String) -> Result<EntityBox, ProcessError> {
    Ok(tick_condition(definition, name, definition.ticks).into_entity())
}

fn build_always(definition: &ContentDefinition, name: String) -> Result<EntityBox, ProcessError> {
    if definition.ticks != 0 {
        return Err(ProcessError::Content {
            entity: name,
            message: format!(
                "'{ALWAYS_CONTENT}' conditions cannot wait {} ticks",
                definition.ticks
            ),
        });
    }
    let mut condition = tick_condition(definition, name, 0);
    if definition.kind.is_none() {
        condition = condition.with_kind(EntityKind::from_static(ALWAYS_CONTENT));
    }
    Ok(condition.into_entity())
}

fn build_delay(definition: &ContentDefinition, name: String) -> Result<EntityBox, ProcessError> {
    let mut behavior = DelayBehavior::new(name, definition.ticks)
        .optional(definition.optional)
        .blocking(definition.blocking);
    if let Some(kind) = &definition.kind {
        behavior = behavior.with_kind(EntityKind::new(kind.clone()));
    }
    for property in &definition.lockables {
        behavior = behavior.lockable(property.clone());
    }
    Ok(behavior.into_entity())
}

// =============================================================================
// LOADING
// =============================================================================

/// Canonicalize `path` and check it is a readable regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, ProcessError> {
    let canonical = path.canonicalize().map_err(|e| {
        ProcessError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;
    if !canonical.is_file() {
        return Err(ProcessError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    let metadata = std::fs::metadata(&canonical)
        .map_err(|e| ProcessError::Io(format!("Cannot read file metadata: {}", e)))?;
    if metadata.len() > MAX_DEFINITION_FILE_SIZE {
        return Err(ProcessError::Serialization(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_DEFINITION_FILE_SIZE
        )));
    }
    Ok(canonical)
}

/// Read a definition, parsing by extension (`.toml` or `.json`).
pub fn load_definition(path: &Path) -> Result<ProcessDefinition, ProcessError> {
    let path = validate_file_path(path)?;
    let text = std::fs::read_to_string(&path)
        .map_err(|e| ProcessError::Io(format!("Cannot read '{}': {}", path.display(), e)))?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    let definition = match extension.as_deref() {
        Some("toml") => toml::from_str(&text)
            .map_err(|e| ProcessError::Serialization(format!("Invalid TOML definition: {}", e)))?,
        Some("json") => serde_json::from_str(&text)
            .map_err(|e| ProcessError::Serialization(format!("Invalid JSON definition: {}", e)))?,
        _ => {
            return Err(ProcessError::InvalidDefinition(format!(
                "'{}' must have a .toml or .json extension",
                path.display()
            )));
        }
    };
    tracing::debug!(path = %path.display(), "definition loaded");
    Ok(definition)
}

// =============================================================================
// GRAPH CONSTRUCTION
// =============================================================================

impl ProcessDefinition {
    /// Build the entity graph.
    pub fn build(
        &self,
        factory: &EntityFactory,
        content: &ContentFactory,
    ) -> Result<Process, ProcessError> {
        let mut chapters = Vec::with_capacity(self.chapters.len());
        for chapter in &self.chapters {
            let mut steps = Vec::with_capacity(chapter.steps.len());
            for step in &chapter.steps {
                steps.push(factory.step(step.builder(content)?));
            }
            let first_step = chapter.first_step.as_deref().map(StepId::new);
            chapters.push(factory.chapter(chapter.name.clone(), first_step, steps)?);
        }
        let process = factory.process(self.name.clone(), chapters)?;
        tracing::debug!(process = %self.name, chapters = self.chapters.len(), "process built");
        Ok(process)
    }

    pub fn step_count(&self) -> usize {
        self.chapters.iter().map(|chapter| chapter.steps.len()).sum()
    }
}

impl StepDefinition {
    fn builder(&self, content: &ContentFactory) -> Result<StepBuilder, ProcessError> {
        let mut builder = StepBuilder::new(self.id.clone());
        for (index, behavior) in self.behaviors.iter().enumerate() {
            let default_name = format!("{}/behavior{index}", self.id);
            builder = builder.behavior(content.build(behavior, default_name)?);
        }
        for (index, transition) in self.transitions.iter().enumerate() {
            let mut built = TransitionBuilder::new();
            if let Some(target) = &transition.to {
                built = built.to(target.clone());
            }
            for (position, condition) in transition.conditions.iter().enumerate() {
                let default_name = format!("{}/t{index}c{position}", self.id);
                built = built.condition(content.build(condition, default_name)?);
            }
            builder = builder.transition(built);
        }
        for property in &self.lockables {
            builder = builder.lockable(property.clone());
        }
        for resource in &self.unlock {
            builder = builder.unlock(resource.clone());
        }
        for tag in &self.unlock_tags {
            builder = builder.unlock_tag(tag.clone());
        }
        Ok(builder)
    }
}

// =============================================================================
// TESTS
// =============================================================================
