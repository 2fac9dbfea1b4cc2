//! # procflow CLI Module
//!
//! This module implements the CLI interface for procflow.
//!
//! ## Available Commands
//!
//! - `run` - Drive a process definition tick by tick
//! - `validate` - Build a definition and report its shape
//! - `locks` - Show the resources each step locks and unlocks
//! - `modes` - List the configured modes

mod commands;

use clap::{Parser, Subcommand};
use procflow_core::ProcessError;
use std::path::PathBuf;
use std::str::FromStr;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// procflow - process lifecycle runner
///
/// Runs chapter/step/transition processes through the lifecycle engine,
/// with mode-driven skipping and resource locking.
#[derive(Parser, Debug)]
#[command(name = "procflow")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the runner configuration
    #[arg(short = 'c', long, global = true, default_value = "procflow.toml")]
    pub config: PathBuf,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a process definition to completion
    Run {
        /// Process definition (.toml or .json)
        #[arg(short, long)]
        file: PathBuf,

        /// Mode to start in (defaults to the configured default mode)
        #[arg(short, long)]
        mode: Option<String>,

        /// Tick budget (overrides the configuration)
        #[arg(long)]
        max_ticks: Option<u64>,

        /// Pause between ticks in milliseconds (overrides the configuration)
        #[arg(long)]
        tick_ms: Option<u64>,

        /// Switch to mode NAME before tick TICK (repeatable)
        #[arg(long = "switch-mode", value_name = "NAME@TICK")]
        switch_mode: Vec<ModeSwitch>,

        /// Fast-forward the whole process before tick TICK
        #[arg(long, value_name = "TICK")]
        fast_forward_at: Option<u64>,
    },

    /// Validate a process definition
    Validate {
        /// Process definition (.toml or .json)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Show the lockable resources and manual unlocks of every step
    Locks {
        /// Process definition (.toml or .json)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// List the configured modes
    Modes,
}

/// A scheduled mode change: `NAME@TICK`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeSwitch {
    pub mode: String,
    pub tick: u64,
}

impl FromStr for ModeSwitch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (mode, tick) = s
            .rsplit_once('@')
            .ok_or_else(|| format!("expected NAME@TICK, got '{s}'"))?;
        if mode.is_empty() {
            return Err(format!("missing mode name in '{s}'"));
        }
        let tick = tick
            .parse()
            .map_err(|e| format!("invalid tick in '{s}': {e}"))?;
        Ok(Self {
            mode: mode.to_string(),
            tick,
        })
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), ProcessError> {
    let json_mode = cli.json_mode;

    match cli.command {
        Commands::Run {
            file,
            mode,
            max_ticks,
            tick_ms,
            switch_mode,
            fast_forward_at,
        } => {
            let args = RunArgs {
                file,
                mode,
                max_ticks,
                tick_ms,
                switches: switch_mode,
                fast_forward_at,
            };
            cmd_run(&cli.config, json_mode, cli.verbose, args).await
        }
        Commands::Validate { file } => cmd_validate(&cli.config, json_mode, &file),
        Commands::Locks { file } => cmd_locks(&cli.config, json_mode, &file),
        Commands::Modes => cmd_modes(&cli.config, json_mode),
    }
}
