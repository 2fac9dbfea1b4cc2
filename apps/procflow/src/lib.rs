//! # procflow
//!
//! Command-line driver for the procflow lifecycle engine.
//!
//! - [`config`]: runner settings, modes and resources from a TOML file
//! - [`definition`]: process definition files and the content factory
//! - [`cli`]: the `run`, `validate`, `locks` and `modes` commands

pub mod cli;
pub mod config;
pub mod definition;
