//! cli::commands::content
//!
//! Save, publish, load, and list games against the configured store.
//!
//! # Example
//!
//! ```bash
//! # Save a draft config
//! trailhead save pirate-cove --config config.json
//!
//! # Publish it (config, missions, and player-site mirrors in one commit)
//! trailhead publish pirate-cove
//!
//! # Read back what was published
//! trailhead load pirate-cove --channel published --json
//! ```

use std::fs;
use std::path::Path;

use anyhow::{bail, Context as _, Result};
use serde_json::{json, Map, Value};

use super::Context;
use crate::core::types::{Channel, Slug};
use crate::publish::{PublishRequest, SaveRequest};

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("failed to start async runtime")
}

fn read_json(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Write the supplied documents for a game.
pub fn save(
    ctx: &Context,
    slug: &str,
    config: Option<&Path>,
    missions: Option<&Path>,
    channel: Channel,
) -> Result<()> {
    let mut body = Map::new();
    body.insert("slug".into(), Value::String(slug.to_string()));
    body.insert("channel".into(), Value::String(channel.as_str().into()));
    if let Some(path) = config {
        body.insert("config".into(), read_json(path)?);
    }
    if let Some(path) = missions {
        body.insert("missions".into(), read_json(path)?);
    }
    let request = SaveRequest::from_json(Value::Object(body))?;

    let orchestrator = ctx.orchestrator()?;
    let outcome = runtime()?.block_on(orchestrator.save(request))?;

    if ctx.json {
        print_json(&outcome.to_json())?;
    } else {
        for result in &outcome.results {
            match &result.result {
                Ok(commit) => println!("✓ {} -> {} ({})", result.document, result.path, commit.url),
                Err(e) => println!("✗ {} -> {}: {}", result.document, result.path, e),
            }
        }
    }

    if let Some(err) = outcome.first_error() {
        bail!("save incomplete: {}", err);
    }
    Ok(())
}

/// Publish a game's most specific content.
pub fn publish(ctx: &Context, slug: &str) -> Result<()> {
    let request = PublishRequest::from_json(json!({ "slug": slug }))?;
    let orchestrator = ctx.orchestrator()?;
    let outcome = runtime()?.block_on(orchestrator.publish(request))?;

    if ctx.json {
        return print_json(&outcome.to_json());
    }

    println!("Published from {}", outcome.used_base);
    for path in &outcome.wrote {
        println!("  {}", path);
    }
    println!("Commit: {}", outcome.commit_url);
    Ok(())
}

/// Print a game's documents for a channel.
pub fn load(ctx: &Context, slug: &str, channel: Channel) -> Result<()> {
    let slug = Slug::new(slug)?;
    let orchestrator = ctx.orchestrator()?;
    let outcome = runtime()?.block_on(orchestrator.load(&slug, channel))?;

    if ctx.json {
        return print_json(&serde_json::to_value(&outcome)?);
    }

    println!("{} ({}) at {}", slug.label(), channel, outcome.base);
    for (name, document) in [("config", &outcome.config), ("missions", &outcome.missions)] {
        match document {
            Some(value) => println!("{}:\n{}", name, serde_json::to_string_pretty(value)?),
            None => println!("{}: (none)", name),
        }
    }
    Ok(())
}

/// List games under `public/games`.
pub fn games(ctx: &Context) -> Result<()> {
    let orchestrator = ctx.orchestrator()?;
    let games = runtime()?.block_on(orchestrator.list_games())?;

    if ctx.json {
        return print_json(&json!({ "games": games }));
    }

    if games.is_empty() {
        println!("No games found.");
    }
    for game in games {
        println!("{}", game);
    }
    Ok(())
}
