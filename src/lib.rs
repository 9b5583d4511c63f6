//! Trailhead - content publishing for a geolocation scavenger-hunt console
//!
//! Game content (a `config` and a `missions` JSON document per game) lives in
//! a GitHub repository. Trailhead saves draft or published documents, and
//! publishes a game by copying its most specific existing content to the
//! published location and the player-site mirror in a single commit.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface (parses args, delegates to the orchestrator)
//! - [`server`] - HTTP API over the same workflows
//! - [`publish`] - Save/Publish orchestration, request validation, errors
//! - [`core`] - Domain types, path resolution, configuration
//! - [`store`] - Abstraction over the content store (GitHub, in-memory mock)
//!
//! # Guarantees
//!
//! 1. Requests are validated before any network call
//! 2. Publish writes all of its files in one commit or none of them
//! 3. Store failures are surfaced with context, never retried or swallowed
//! 4. Published JSON is serialized deterministically

pub mod cli;
pub mod core;
pub mod publish;
pub mod server;
pub mod store;
