//! # Runner Configuration
//!
//! TOML configuration of the driver:
//!
//! ```toml
//! [runner]
//! max_ticks = 5000
//! tick_interval_ms = 0
//! parallel_active_tick_cap = 1000000
//! lock_strategy = "default"
//! default_mode = "Training"
//!
//! [[modes]]
//! name = "Training"
//! skip = ["hint"]
//! parameters = { LockOnProcessStart = false }
//!
//! [[resources]]
//! id = "doorHandle"
//! tags = ["doors"]
//! locked = false
//! ```
//!
//! Every section is optional. A missing file yields the defaults.

use procflow_core::locking::{DEFAULT_STRATEGY, strategy_by_name};
use procflow_core::primitives::{DEFAULT_MAX_TICKS, DEFAULT_MODE_NAME, PARALLEL_ACTIVE_TICK_CAP};
use procflow_core::{
    FactoryOptions, InMemoryRegistry, ProcessError, ResourceId, RunMode, StepLockHandlingStrategy,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Maximum configuration file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

// =============================================================================
// SECTIONS
// =============================================================================

/// `[runner]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerSettings {
    /// Tick budget of `procflow run`.
    pub max_ticks: u64,
    /// Pause between two ticks. Zero runs as fast as possible.
    pub tick_interval_ms: u64,
    pub parallel_active_tick_cap: u64,
    /// `"default"` or `"none"`.
    pub lock_strategy: String,
    /// Mode used when `--mode` is not given.
    pub default_mode: Option<String>,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            max_ticks: DEFAULT_MAX_TICKS,
            tick_interval_ms: 0,
            parallel_active_tick_cap: PARALLEL_ACTIVE_TICK_CAP,
            lock_strategy: DEFAULT_STRATEGY.to_string(),
            default_mode: None,
        }
    }
}

/// `[[resources]]` entry: a lockable object known before the process starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceConfig {
    pub id: ResourceId,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub locked: bool,
}

/// The whole configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub runner: RunnerSettings,
    pub modes: Vec<RunMode>,
    pub resources: Vec<ResourceConfig>,
}

// =============================================================================
// LOADING
// =============================================================================

impl Config {
    /// Load the configuration at `path`, or the defaults if there is no file.
    pub fn load(path: &Path) -> Result<Self, ProcessError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no configuration file, using defaults");
            return Ok(Self::default());
        }

        let metadata = std::fs::metadata(path)
            .map_err(|e| ProcessError::Io(format!("Cannot read file metadata: {}", e)))?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ProcessError::Configuration(format!(
                "Configuration file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }

        let text = std::fs::read_to_string(path).map_err(|e| {
            ProcessError::Io(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!(
            path = %path.display(),
            modes = config.modes.len(),
            resources = config.resources.len(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Parse and validate a configuration document.
    pub fn from_toml_str(text: &str) -> Result<Self, ProcessError> {
        let config: Self = toml::from_str(text)
            .map_err(|e| ProcessError::Configuration(format!("Invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ProcessError> {
        strategy_by_name(&self.runner.lock_strategy)?;

        let mut names = std::collections::BTreeSet::new();
        for mode in &self.modes {
            if !names.insert(mode.name.as_str()) {
                return Err(ProcessError::Configuration(format!(
                    "mode '{}' is defined twice",
                    mode.name
                )));
            }
        }
        if let Some(default) = &self.runner.default_mode {
            self.mode(Some(default))?;
        }
        Ok(())
    }

    // =========================================================================
    // RESOLUTION
    // =========================================================================

    /// Resolve a mode by name; `None` picks the configured default mode.
    ///
    /// The built-in default mode, which skips nothing, is always available
    /// unless a configured mode of the same name replaces it.
    pub fn mode(&self, name: Option<&str>) -> Result<RunMode, ProcessError> {
        let name = name
            .or(self.runner.default_mode.as_deref())
            .unwrap_or(DEFAULT_MODE_NAME);
        if let Some(mode) = self.modes.iter().find(|mode| mode.name == name) {
            return Ok(mode.clone());
        }
        if name == DEFAULT_MODE_NAME {
            return Ok(RunMode::default());
        }
        Err(ProcessError::Configuration(format!("unknown mode '{name}'")))
    }

    /// Every mode selectable on the command line, the built-in default first
    /// unless it is overridden.
    pub fn available_modes(&self) -> Vec<RunMode> {
        let mut modes = Vec::with_capacity(self.modes.len() + 1);
        if !self.modes.iter().any(|mode| mode.name == DEFAULT_MODE_NAME) {
            modes.push(RunMode::default());
        }
        modes.extend(self.modes.iter().cloned());
        modes
    }

    pub fn strategy(&self) -> Result<Box<dyn StepLockHandlingStrategy>, ProcessError> {
        strategy_by_name(&self.runner.lock_strategy)
    }

    /// Fresh registry holding the configured resources.
    pub fn registry(&self) -> InMemoryRegistry {
        let mut registry = InMemoryRegistry::new();
        for resource in &self.resources {
            registry.register(
                resource.id.clone(),
                resource.tags.iter().cloned(),
                resource.locked,
            );
        }
        registry
    }

    pub fn factory_options(&self) -> FactoryOptions {
        FactoryOptions {
            parallel_active_tick_cap: self.runner.parallel_active_tick_cap,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
