//! cli::commands::paths
//!
//! Show where a game's content is read from and written to.

use anyhow::Result;
use serde_json::json;

use super::Context;
use crate::core::paths::{candidate_paths, destination_base, document_path, mirror_path};
use crate::core::types::{Channel, Document, Slug};

/// Print probe order, destinations, and mirrors for a slug.
pub fn paths(ctx: &Context, slug: &str) -> Result<()> {
    let slug = Slug::new(slug)?;
    let candidates = candidate_paths(&slug);
    let draft = destination_base(&slug, Channel::Draft);
    let published = destination_base(&slug, Channel::Published);
    let mirrors: Vec<String> = Document::ALL
        .iter()
        .filter_map(|doc| mirror_path(&document_path(&published, *doc), &slug))
        .collect();

    if ctx.json {
        let body = json!({
            "slug": slug.as_str(),
            "legacy": slug.is_legacy(),
            "candidates": candidates,
            "draft": draft,
            "published": published,
            "mirrors": mirrors,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!("Game: {}", slug.label());
    println!("Publish reads from (first match wins):");
    for (i, base) in candidates.iter().enumerate() {
        println!("  {}. {}", i + 1, base);
    }
    println!("Draft:     {}", draft);
    println!("Published: {}", published);
    if mirrors.is_empty() {
        println!("Mirrors:   (none)");
    } else {
        println!("Mirrors:");
        for mirror in &mirrors {
            println!("  {}", mirror);
        }
    }
    Ok(())
}
