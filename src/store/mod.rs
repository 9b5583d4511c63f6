//! store
//!
//! Abstraction for the remote, branch-versioned content store.
//!
//! # Architecture
//!
//! The `ContentStore` trait defines authenticated read, write, delete, and
//! multi-file commit against a single branch of a repository. The publish
//! orchestrator only ever talks to `dyn ContentStore`; the concrete store is
//! chosen once at startup with [`create_store`].
//!
//! # Modules
//!
//! - `traits`: Core `ContentStore` trait and request/response types
//! - [`github`]: GitHub implementation using the Contents and Git Data APIs
//! - [`mock`]: In-memory implementation for deterministic testing
//! - [`branch_cache`]: Explicit, time-boxed cache of a resolved branch head

pub mod branch_cache;
pub mod github;
pub mod mock;
mod traits;

pub use traits::*;

use std::sync::Arc;

use crate::core::config::StoreSettings;

/// Create the content store for the given settings.
pub fn create_store(settings: &StoreSettings) -> Arc<dyn ContentStore> {
    Arc::new(github::GitHubStore::from_settings(settings))
}
