//! publish::errors
//!
//! Error taxonomy for the save/publish workflows.
//!
//! # Design
//!
//! Store failures are never swallowed. They are wrapped with the operation
//! context (slug, document, channel, path) and classified:
//!
//! | Variant | Meaning | Status |
//! |---|---|---|
//! | `Validation` | malformed or missing input | 400 |
//! | `NotFound` | nothing at any candidate path | 404 |
//! | `Conflict` | stale version on a single-file write | 409 |
//! | `Commit` | multi-file commit failed as a whole | 500 |
//! | `Store` | transport, auth, or API failure | 500 (503 when rate limited) |
//!
//! # Example
//!
//! ```
//! use trailhead::publish::{ErrorContext, Operation, PublishError};
//! use trailhead::store::StoreError;
//!
//! let err = PublishError::from_store(
//!     ErrorContext::new(Operation::Save, "foo"),
//!     StoreError::Conflict { path: "p".into(), message: "stale".into() },
//! );
//! assert_eq!(err.kind(), "ConflictError");
//! assert_eq!(err.status_code(), 409);
//! ```

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::core::types::{Channel, Document};
use crate::store::StoreError;

/// Workflow an error occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Save,
    Publish,
    Load,
    List,
    Status,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Operation::Save => "save",
            Operation::Publish => "publish",
            Operation::Load => "load",
            Operation::List => "list",
            Operation::Status => "status",
        };
        write!(f, "{}", s)
    }
}

/// Where in a workflow a failure happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorContext {
    pub operation: Operation,
    /// Slug label (`legacy root` for the unslugged game)
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<Document>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ErrorContext {
    pub fn new(operation: Operation, slug: impl Into<String>) -> Self {
        Self {
            operation,
            slug: slug.into(),
            document: None,
            channel: None,
            path: None,
        }
    }

    pub fn document(mut self, document: Document) -> Self {
        self.document = Some(document);
        self
    }

    pub fn channel(mut self, channel: Channel) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl std::fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} '{}'", self.operation, self.slug)?;
        if let Some(document) = self.document {
            write!(f, " {}", document)?;
        }
        if let Some(channel) = self.channel {
            write!(f, " ({})", channel)?;
        }
        if let Some(path) = &self.path {
            write!(f, " at {}", path)?;
        }
        Ok(())
    }
}

/// Errors from the save/publish workflows.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Malformed or missing input, rejected before any I/O.
    #[error("invalid request: {0}")]
    Validation(String),

    /// No content exists at any candidate path.
    #[error("nothing to publish for '{slug}' (tried {})", tried.join(", "))]
    NotFound {
        /// Slug label
        slug: String,
        /// Candidate base paths probed, in order
        tried: Vec<String>,
    },

    /// A single-file write carried a stale version identifier.
    #[error("{context}: {source}")]
    Conflict {
        context: ErrorContext,
        source: StoreError,
    },

    /// The atomic multi-file commit failed; nothing was applied.
    #[error("{context}: commit failed: {source}")]
    Commit {
        context: ErrorContext,
        source: StoreError,
    },

    /// Any other content store failure.
    #[error("{context}: {source}")]
    Store {
        context: ErrorContext,
        source: StoreError,
    },
}

impl PublishError {
    /// Wrap a store failure from a read or single-file write.
    pub fn from_store(context: ErrorContext, source: StoreError) -> Self {
        match source {
            StoreError::Conflict { .. } => PublishError::Conflict { context, source },
            StoreError::CommitRejected(_) => PublishError::Commit { context, source },
            _ => PublishError::Store { context, source },
        }
    }

    /// Wrap a failure of the atomic multi-file commit.
    pub fn commit(context: ErrorContext, source: StoreError) -> Self {
        PublishError::Commit { context, source }
    }

    /// Taxonomy name reported to callers.
    pub fn kind(&self) -> &'static str {
        match self {
            PublishError::Validation(_) => "ValidationError",
            PublishError::NotFound { .. } => "NotFoundError",
            PublishError::Conflict { .. } => "ConflictError",
            PublishError::Commit { .. } => "CommitError",
            PublishError::Store { .. } => "StoreError",
        }
    }

    /// HTTP status category.
    pub fn status_code(&self) -> u16 {
        match self {
            PublishError::Validation(_) => 400,
            PublishError::NotFound { .. } => 404,
            PublishError::Conflict { .. } => 409,
            PublishError::Store {
                source: StoreError::RateLimited,
                ..
            } => 503,
            PublishError::Commit { .. } | PublishError::Store { .. } => 500,
        }
    }

    /// Whether the caller (rather than the store) is at fault.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    /// Structured `{ok: false, error, message, ...context}` body.
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "ok": false,
            "error": self.kind(),
            "message": self.to_string(),
        });

        let extra = match self {
            PublishError::Validation(_) => None,
            PublishError::NotFound { slug, tried } => Some(json!({
                "slug": slug,
                "tried": tried,
            })),
            PublishError::Conflict { context, .. }
            | PublishError::Commit { context, .. }
            | PublishError::Store { context, .. } => Some(json!({ "context": context })),
        };

        if let (Some(Value::Object(extra)), Value::Object(map)) = (extra, &mut body) {
            map.extend(extra);
        }
        body
    }
}
