//! # Engine Primitives
//!
//! Hardcoded runtime constants for the procflow engine.

/// Default upper bound on the idle ticks of a parallel composite's Active stage.
///
/// Completion of a parallel composite is normally driven by its children and
/// observed by the owner. The bound only keeps the holding pattern finite; it
/// is configurable through [`crate::builder::FactoryOptions`].
pub const PARALLEL_ACTIVE_TICK_CAP: u64 = 1_000_000;

/// Mode parameter: lock every discoverable resource when the process starts.
pub const LOCK_ON_PROCESS_START: &str = "LockOnProcessStart";

/// Mode parameter: lock every discoverable resource when the process finishes.
pub const LOCK_ON_PROCESS_FINISHED: &str = "LockOnProcessFinished";

/// Default tick budget of [`crate::runner::ProcessRunner::run`] callers.
pub const DEFAULT_MAX_TICKS: u64 = 100_000;

/// Name of the mode used when no mode is configured.
pub const DEFAULT_MODE_NAME: &str = "Default";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parallel_cap_is_one_million() {
        assert_eq!(PARALLEL_ACTIVE_TICK_CAP, 1_000_000);
    }

    #[test]
    fn lock_parameter_names_are_stable() {
        assert_eq!(LOCK_ON_PROCESS_START, "LockOnProcessStart");
        assert_eq!(LOCK_ON_PROCESS_FINISHED, "LockOnProcessFinished");
    }
}
