//! # procflow - Process Runner
//!
//! The main binary for the procflow lifecycle engine.
//!
//! This application provides:
//! - Process definition loading (TOML or JSON)
//! - Tick-driven execution with mode switches and fast-forward
//! - Lock inspection and mode listing
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │               apps/procflow (THE BINARY)             │
//! │                                                      │
//! │  ┌─────────────┐   ┌─────────────┐   ┌────────────┐  │
//! │  │    CLI      │   │   Config    │   │ Definition │  │
//! │  │   (clap)    │   │   (toml)    │   │ (toml/json)│  │
//! │  └──────┬──────┘   └──────┬──────┘   └─────┬──────┘  │
//! │         └─────────────────┼────────────────┘         │
//! │                           ▼                          │
//! │                  ┌─────────────────┐                 │
//! │                  │  procflow-core  │                 │
//! │                  │   (THE LOGIC)   │                 │
//! │                  └─────────────────┘                 │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! procflow run -f training.toml --mode Fast --switch-mode Default@40
//! procflow validate -f training.json
//! procflow locks -f training.toml --json-mode
//! procflow modes -c procflow.toml
//! ```

use clap::Parser;
use procflow::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // PROCFLOW_LOG_FORMAT=json switches to machine-parseable output.
    let log_format = std::env::var("PROCFLOW_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "procflow=info,procflow_core=info".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Display startup banner
    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the procflow startup banner.
fn print_banner() {
    println!(
        r#"
  procflow v{}
  Inactive → Activating → Active → Deactivating
"#,
        env!("CARGO_PKG_VERSION")
    );
}
