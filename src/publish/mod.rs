//! publish
//!
//! The content publishing workflow.
//!
//! # Modules
//!
//! - [`request`]: Typed Save/Publish requests, validated before any I/O
//! - [`orchestrator`]: Save, Publish, Load, and game listing over a store
//! - [`errors`]: Error taxonomy with status categories
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::json;
//! use trailhead::publish::{ContentRequest, Orchestrator, Outcome};
//! use trailhead::store::mock::MockStore;
//!
//! # tokio_test::block_on(async {
//! let store = Arc::new(MockStore::with_files([
//!     ("public/games/foo/draft/config.json", r#"{"title":"Foo"}"#),
//! ]));
//! let orchestrator = Orchestrator::new(store.clone());
//!
//! let request = ContentRequest::from_tagged(json!({"action": "publish", "slug": "foo"})).unwrap();
//! let Outcome::Published(outcome) = orchestrator.execute(request).await.unwrap() else {
//!     unreachable!()
//! };
//! assert_eq!(outcome.used_base, "public/games/foo/draft");
//! assert!(store.file_content("game/public/games/foo/missions.json").is_some());
//! # });
//! ```

pub mod errors;
pub mod orchestrator;
pub mod request;

pub use errors::{ErrorContext, Operation, PublishError};
pub use orchestrator::{
    DocumentResult, LoadOutcome, Orchestrator, Outcome, PublishOutcome, SaveOutcome,
};
pub use request::{Action, ContentRequest, PublishRequest, SaveRequest};
