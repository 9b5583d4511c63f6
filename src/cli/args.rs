//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config-file <path>`: Use this config file instead of the default search
//! - `--owner`, `--repo`, `--branch`: Override the content store location
//! - `--debug`: Enable debug logging
//! - `--json`: Print results as JSON

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::types::Channel;

/// Trailhead - publish game content to a GitHub-backed content store
#[derive(Parser, Debug)]
#[command(name = "trailhead")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to load instead of the default search
    #[arg(long, global = true, value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    /// Repository owner (overrides GITHUB_OWNER)
    #[arg(long, global = true)]
    pub owner: Option<String>,

    /// Repository name (overrides GITHUB_REPO)
    #[arg(long, global = true)]
    pub repo: Option<String>,

    /// Content branch (overrides GITHUB_BRANCH)
    #[arg(long, global = true)]
    pub branch: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API
    #[command(
        after_help = "\
ENDPOINTS:
    GET  /health
    POST /api/save       {slug, config?, missions?, channel?}
    POST /api/publish    {slug}
    GET  /api/load       ?slug=<slug>&channel=<draft|published>
    GET  /api/games
    GET  /api/status"
    )]
    Serve {
        /// Listen address (overrides TRAILHEAD_BIND)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Write config and/or missions documents for a game
    #[command(
        long_about = "Write config and/or missions documents for a game.\n\n\
            Each supplied document is written as its own commit. A document that \
            is not supplied is left untouched in the store.",
        after_help = "\
EXAMPLES:
    # Save a draft config
    trailhead save pirate-cove --config config.json

    # Save both documents straight to the published channel
    trailhead save pirate-cove --config config.json --missions missions.json --channel published

    # Save the legacy root game's draft missions
    trailhead save root --missions missions.json"
    )]
    Save {
        /// Game slug (`root` or `legacy-root` for the legacy game)
        slug: String,

        /// JSON file holding the config document
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// JSON file holding the missions document
        #[arg(long, value_name = "FILE")]
        missions: Option<PathBuf>,

        /// Channel to write
        #[arg(long, default_value = "draft")]
        channel: Channel,
    },

    /// Publish a game's most specific content in one commit
    #[command(
        long_about = "Publish a game's most specific content in one commit.\n\n\
            Content is read from the first location that has any, in order: \
            the game's draft, the game's published copy, the global draft, and \
            the global published copy. It is then written to the game's \
            published location and its player-site mirror as a single commit."
    )]
    Publish {
        /// Game slug (`root` or `legacy-root` for the legacy game)
        slug: String,
    },

    /// Print a game's documents for a channel
    Load {
        /// Game slug (`root` or `legacy-root` for the legacy game)
        slug: String,

        /// Channel to read
        #[arg(long, default_value = "draft")]
        channel: Channel,
    },

    /// List games stored in the content repository
    Games,

    /// Show the storage paths used for a game (no network access)
    Paths {
        /// Game slug (`root` or `legacy-root` for the legacy game)
        slug: String,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn save_defaults_to_draft() {
        let cli = Cli::try_parse_from(["trailhead", "save", "foo", "--config", "c.json"]).unwrap();
        match cli.command {
            Command::Save {
                slug,
                config,
                missions,
                channel,
            } => {
                assert_eq!(slug, "foo");
                assert_eq!(config, Some(PathBuf::from("c.json")));
                assert!(missions.is_none());
                assert_eq!(channel, Channel::Draft);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn channel_is_parsed() {
        let cli =
            Cli::try_parse_from(["trailhead", "load", "foo", "--channel", "published"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Load {
                channel: Channel::Published,
                ..
            }
        ));

        assert!(Cli::try_parse_from(["trailhead", "load", "foo", "--channel", "live"]).is_err());
    }

    #[test]
    fn global_overrides_after_subcommand() {
        let cli = Cli::try_parse_from([
            "trailhead", "games", "--owner", "acme", "--repo", "content", "--json",
        ])
        .unwrap();
        assert_eq!(cli.owner.as_deref(), Some("acme"));
        assert_eq!(cli.repo.as_deref(), Some("content"));
        assert!(cli.json);
    }
}
