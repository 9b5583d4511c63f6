//! store::traits
//!
//! Content store trait definition for a remote, branch-versioned file store.
//!
//! # Design
//!
//! The `ContentStore` trait is async because every operation is a network
//! call. Nothing is cached across calls: each request resolves fresh state.
//!
//! A missing file is not an error for reads. [`ContentStore::get_file`]
//! returns `Ok(None)` so callers can probe several candidate paths cheaply.
//!
//! # Example
//!
//! ```ignore
//! use trailhead::store::{ContentStore, PutFileRequest};
//!
//! async fn touch(store: &dyn ContentStore) -> Result<(), StoreError> {
//!     let branch = store.resolve_branch().await?;
//!     store.put_file(PutFileRequest {
//!         path: "public/games/foo/draft/config.json".into(),
//!         content: "{}\n".into(),
//!         message: "save(foo): config (draft)".into(),
//!         branch: branch.name,
//!         prior_sha: None,
//!     }).await?;
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Errors from content store operations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Authentication is required but not available.
    #[error("authentication required")]
    AuthRequired,

    /// Authentication failed (invalid token, expired, insufficient permissions).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The configured branch does not exist.
    #[error("branch '{0}' could not be resolved")]
    BranchNotFound(String),

    /// The prior version identifier was stale at write time.
    #[error("version conflict on '{path}': {message}")]
    Conflict {
        /// Path that was being written
        path: String,
        /// Message from the store
        message: String,
    },

    /// A multi-file commit was rejected as a whole.
    #[error("commit rejected: {0}")]
    CommitRejected(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),

    /// Stored content could not be decoded.
    #[error("invalid content at '{path}': {message}")]
    InvalidContent {
        /// Path of the offending file
        path: String,
        /// What was wrong with it
        message: String,
    },
}

/// A resolved branch reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchRef {
    /// Branch name (e.g., "main")
    pub name: String,
    /// Commit SHA the branch points at
    pub sha: String,
}

/// A file read from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Path of the file
    pub path: String,
    /// Decoded UTF-8 content
    pub content: String,
    /// Current version identifier (blob SHA)
    pub sha: String,
}

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    Other,
}

/// An entry in a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirEntry {
    /// Entry name (last path segment)
    pub name: String,
    /// Full path
    pub path: String,
    /// File or directory
    pub kind: EntryKind,
}

/// Request to create or update a single file.
#[derive(Debug, Clone)]
pub struct PutFileRequest {
    /// Path to write
    pub path: String,
    /// UTF-8 content
    pub content: String,
    /// Commit message
    pub message: String,
    /// Branch to commit to
    pub branch: String,
    /// Version identifier the caller last saw. When `None` the store reads
    /// the current identifier immediately before writing.
    pub prior_sha: Option<String>,
}

/// One file in a multi-file commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitFile {
    /// Path to write
    pub path: String,
    /// UTF-8 content
    pub content: String,
}

/// Request to write several files as a single commit.
#[derive(Debug, Clone)]
pub struct CommitFilesRequest {
    /// Branch to commit to
    pub branch: String,
    /// Commit the files were read at; becomes the parent of the new commit
    pub base_sha: String,
    /// Files to write (all or nothing)
    pub files: Vec<CommitFile>,
    /// Commit message
    pub message: String,
}

/// A commit produced by a write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitInfo {
    /// Commit SHA
    pub sha: String,
    /// Web URL for viewing the commit
    pub url: String,
}

/// The ContentStore trait for a remote, branch-versioned file store.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow use across async tasks.
///
/// # Error Handling
///
/// Failures are returned unchanged to callers; implementations never retry.
/// - `BranchNotFound`: the configured branch does not exist
/// - `Conflict`: a single-file write lost a version race
/// - `CommitRejected`: a multi-file commit could not be applied
/// - everything else: transport, auth, or API failure
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Get the store name (e.g., "github", "mock").
    fn name(&self) -> &'static str;

    /// Resolve the configured branch to its current commit.
    ///
    /// # Errors
    ///
    /// - `BranchNotFound` if the branch does not exist
    async fn resolve_branch(&self) -> Result<BranchRef, StoreError>;

    /// Fetch a file and its version identifier at a ref.
    ///
    /// # Returns
    ///
    /// `None` if the path does not exist (or is a directory).
    async fn get_file(&self, path: &str, git_ref: &str) -> Result<Option<StoredFile>, StoreError>;

    /// Create or update a single file.
    ///
    /// # Errors
    ///
    /// - `Conflict` if the prior version identifier is stale at write time
    async fn put_file(&self, request: PutFileRequest) -> Result<CommitInfo, StoreError>;

    /// Delete a single file.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the file does not exist
    /// - `Conflict` if the file changed between read and delete
    async fn delete_file(
        &self,
        path: &str,
        message: &str,
        branch: &str,
    ) -> Result<CommitInfo, StoreError>;

    /// Write several files as one commit on a branch.
    ///
    /// The new commit's parent is `request.base_sha`. Either every file lands
    /// in the new commit or the branch is left untouched.
    ///
    /// # Errors
    ///
    /// - `CommitRejected` if the branch head is no longer `base_sha` or the
    ///   commit was refused
    async fn commit_files(&self, request: CommitFilesRequest) -> Result<CommitInfo, StoreError>;

    /// List a directory at a ref.
    ///
    /// # Returns
    ///
    /// An empty list if the directory does not exist.
    async fn list_dir(&self, path: &str, git_ref: &str) -> Result<Vec<DirEntry>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_display() {
        assert_eq!(
            format!("{}", StoreError::AuthRequired),
            "authentication required"
        );
        assert_eq!(
            format!("{}", StoreError::BranchNotFound("main".into())),
            "branch 'main' could not be resolved"
        );
        assert_eq!(
            format!(
                "{}",
                StoreError::Conflict {
                    path: "public/config.json".into(),
                    message: "sha mismatch".into()
                }
            ),
            "version conflict on 'public/config.json': sha mismatch"
        );
        assert_eq!(
            format!("{}", StoreError::CommitRejected("not a fast forward".into())),
            "commit rejected: not a fast forward"
        );
        assert_eq!(
            format!(
                "{}",
                StoreError::ApiError {
                    status: 500,
                    message: "boom".into()
                }
            ),
            "API error: 500 - boom"
        );
        assert_eq!(format!("{}", StoreError::RateLimited), "rate limited");
    }

    #[test]
    fn entry_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&EntryKind::Dir).unwrap(), "\"dir\"");
    }
}
