//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Async Commands
//!
//! Commands that talk to the content store are async. Each one builds its
//! own tokio runtime and blocks on it, so dispatch itself stays synchronous.

mod completion;
mod content;
mod paths;
mod serve;

pub use completion::completion;
pub use content::{games, load, publish, save};
pub use paths::paths;
pub use serve::serve;

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use super::args::{Cli, Command};
use crate::core::config::{Config, Overrides};
use crate::publish::Orchestrator;
use crate::store::create_store;

/// Settings shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Explicit config file, bypassing the default search
    pub config_file: Option<PathBuf>,
    /// Flag values layered over file and environment
    pub overrides: Overrides,
    /// Print JSON instead of human-readable output
    pub json: bool,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            config_file: cli.config_file.clone(),
            overrides: Overrides {
                owner: cli.owner.clone(),
                repo: cli.repo.clone(),
                branch: cli.branch.clone(),
                bind: None,
            },
            json: cli.json,
        }
    }

    /// Load configuration with this context's overrides applied.
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config_file {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };
        config.apply(self.overrides.clone())?;
        Ok(config)
    }

    /// Build an orchestrator over the configured store.
    pub fn orchestrator(&self) -> Result<Orchestrator> {
        let settings = self
            .load_config()?
            .store_settings()
            .context("content store is not configured")?;
        Ok(Orchestrator::new(create_store(&settings)))
    }
}

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Serve { bind } => serve::serve(ctx, bind),
        Command::Save {
            slug,
            config,
            missions,
            channel,
        } => content::save(ctx, &slug, config.as_deref(), missions.as_deref(), channel),
        Command::Publish { slug } => content::publish(ctx, &slug),
        Command::Load { slug, channel } => content::load(ctx, &slug, channel),
        Command::Games => content::games(ctx),
        Command::Paths { slug } => paths::paths(ctx, &slug),
        Command::Completion { shell } => completion::completion(shell),
    }
}
