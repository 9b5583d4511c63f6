//! cli
//!
//! Command-line interface for Trailhead.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Resolve configuration (file, environment, then flags)
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. Content commands build an
//! [`Orchestrator`](crate::publish::Orchestrator) over the configured store and
//! run the same workflows the HTTP API exposes.

pub mod args;
pub mod commands;

pub use args::{Cli, Command, Shell};

use anyhow::Result;

/// Run a parsed command line.
///
/// This is the main entry point called from `main.rs`.
pub fn run(cli: Cli) -> Result<()> {
    let ctx = commands::Context::from_cli(&cli);
    commands::dispatch(cli.command, &ctx)
}
