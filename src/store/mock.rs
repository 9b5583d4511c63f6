//! store::mock
//!
//! Mock content store for deterministic testing.
//!
//! # Design
//!
//! The mock store keeps a single branch of files in memory, assigns
//! deterministic version identifiers, records every call, and can be
//! configured to fail specific operations.
//!
//! Version checks behave like the real store: a `put_file` with a stale
//! `prior_sha` fails with `Conflict`, a `commit_files` whose `base_sha` is no
//! longer the head fails with `CommitRejected`, and a failed `commit_files`
//! leaves every file untouched.
//!
//! # Example
//!
//! ```
//! use trailhead::store::mock::MockStore;
//! use trailhead::store::ContentStore;
//!
//! # tokio_test::block_on(async {
//! let store = MockStore::with_files([("public/config.json", "{}\n")]);
//!
//! let file = store.get_file("public/config.json", "main").await.unwrap();
//! assert_eq!(file.unwrap().content, "{}\n");
//! assert!(store.get_file("public/missions.json", "main").await.unwrap().is_none());
//! # });
//! ```

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

use super::traits::{
    BranchRef, CommitFilesRequest, CommitInfo, ContentStore, DirEntry, EntryKind, PutFileRequest,
    StoreError, StoredFile,
};

/// Branch name used by [`MockStore::new`].
pub const MOCK_BRANCH: &str = "main";

/// Mock content store for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone)]
pub struct MockStore {
    /// Internal state shared across clones.
    inner: Arc<Mutex<MockStoreInner>>,
}

/// Internal mutable state.
#[derive(Debug)]
struct MockStoreInner {
    /// Branch name served by this store.
    branch: String,
    /// Files by path.
    files: BTreeMap<String, MockFile>,
    /// Current head commit.
    head: String,
    /// Counter for blob and commit identifiers.
    next_id: u64,
    /// Write landed by another session right after the first read.
    concurrent_write: Option<(String, String)>,
    /// Operations configured to fail.
    fail_on: Vec<FailOn>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

#[derive(Debug, Clone)]
struct MockFile {
    content: String,
    sha: String,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail resolve_branch with the given error.
    ResolveBranch(StoreError),
    /// Fail get_file for a path (or every path when `None`).
    GetFile {
        path: Option<String>,
        error: StoreError,
    },
    /// Fail put_file for a path (or every path when `None`).
    PutFile {
        path: Option<String>,
        error: StoreError,
    },
    /// Fail delete_file with the given error.
    DeleteFile(StoreError),
    /// Fail commit_files with the given error.
    CommitFiles(StoreError),
    /// Fail list_dir with the given error.
    ListDir(StoreError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    ResolveBranch,
    GetFile {
        path: String,
        git_ref: String,
    },
    PutFile {
        path: String,
        message: String,
        branch: String,
    },
    DeleteFile {
        path: String,
        message: String,
    },
    CommitFiles {
        branch: String,
        paths: Vec<String>,
        message: String,
    },
    ListDir {
        path: String,
    },
}

impl MockOperation {
    /// Whether this operation writes to the store.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            MockOperation::PutFile { .. }
                | MockOperation::DeleteFile { .. }
                | MockOperation::CommitFiles { .. }
        )
    }
}

impl MockStore {
    /// Create a new empty mock store on branch `main`.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockStoreInner {
                branch: MOCK_BRANCH.to_string(),
                files: BTreeMap::new(),
                head: "commit-0".to_string(),
                next_id: 1,
                concurrent_write: None,
                fail_on: Vec::new(),
                operations: Vec::new(),
            })),
        }
    }

    /// Create a mock store with pre-existing files.
    pub fn with_files<P, C>(files: impl IntoIterator<Item = (P, C)>) -> Self
    where
        P: Into<String>,
        C: Into<String>,
    {
        let store = Self::new();
        for (path, content) in files {
            store.insert_file(path, content);
        }
        store
    }

    /// Serve a different branch name.
    pub fn with_branch(self, branch: impl Into<String>) -> Self {
        self.state().branch = branch.into();
        self
    }

    /// Land a commit writing `path` right after the first `get_file`, as if
    /// another operator saved while this one was reading.
    pub fn with_concurrent_write(
        self,
        path: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        self.state().concurrent_write = Some((path.into(), content.into()));
        self
    }

    /// Configure the mock to fail on a specific operation.
    ///
    /// May be called several times; the first matching rule wins.
    ///
    /// # Example
    ///
    /// ```
    /// use trailhead::store::mock::{MockStore, FailOn};
    /// use trailhead::store::StoreError;
    ///
    /// let store = MockStore::new()
    ///     .fail_on(FailOn::CommitFiles(StoreError::RateLimited));
    /// ```
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.state().fail_on.push(fail_on);
        self
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        self.state().fail_on.clear();
    }

    /// Write a file directly, bypassing operation recording.
    pub fn insert_file(&self, path: impl Into<String>, content: impl Into<String>) {
        let mut inner = self.state();
        let sha = inner.next_sha("blob");
        inner.files.insert(
            path.into(),
            MockFile {
                content: content.into(),
                sha,
            },
        );
    }

    /// Content of a file (for test verification).
    pub fn file_content(&self, path: &str) -> Option<String> {
        self.state().files.get(path).map(|f| f.content.clone())
    }

    /// Current version identifier of a file (for test verification).
    pub fn file_sha(&self, path: &str) -> Option<String> {
        self.state().files.get(path).map(|f| f.sha.clone())
    }

    /// All stored paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.state().files.keys().cloned().collect()
    }

    /// Current head commit.
    pub fn head(&self) -> String {
        self.state().head.clone()
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.state().operations.clone()
    }

    /// Recorded operations that wrote to the store.
    pub fn writes(&self) -> Vec<MockOperation> {
        self.operations()
            .into_iter()
            .filter(MockOperation::is_write)
            .collect()
    }

    /// Clear recorded operations.
    pub fn clear_operations(&self) {
        self.state().operations.clear();
    }

    fn state(&self) -> MutexGuard<'_, MockStoreInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record an operation.
    fn record(&self, op: MockOperation) {
        self.state().operations.push(op);
    }

    /// Find a configured failure for an operation.
    fn check_fail(&self, matches: impl Fn(&FailOn) -> Option<StoreError>) -> Result<(), StoreError> {
        match self.state().fail_on.iter().find_map(matches) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn check_branch(inner: &MockStoreInner, branch: &str) -> Result<(), StoreError> {
        if inner.branch == branch {
            Ok(())
        } else {
            Err(StoreError::BranchNotFound(branch.to_string()))
        }
    }
}

impl MockStoreInner {
    fn next_sha(&mut self, kind: &str) -> String {
        let id = self.next_id;
        self.next_id += 1;
        format!("{}-{}", kind, id)
    }

    fn new_commit(&mut self) -> CommitInfo {
        let sha = self.next_sha("commit");
        self.head = sha.clone();
        CommitInfo {
            url: format!("https://github.com/mock/content/commit/{}", sha),
            sha,
        }
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

fn path_matches(filter: &Option<String>, path: &str) -> bool {
    filter.as_deref().map_or(true, |p| p == path)
}

#[async_trait]
impl ContentStore for MockStore {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn resolve_branch(&self) -> Result<BranchRef, StoreError> {
        self.record(MockOperation::ResolveBranch);
        self.check_fail(|f| match f {
            FailOn::ResolveBranch(e) => Some(e.clone()),
            _ => None,
        })?;

        let inner = self.state();
        Ok(BranchRef {
            name: inner.branch.clone(),
            sha: inner.head.clone(),
        })
    }

    async fn get_file(&self, path: &str, git_ref: &str) -> Result<Option<StoredFile>, StoreError> {
        self.record(MockOperation::GetFile {
            path: path.to_string(),
            git_ref: git_ref.to_string(),
        });
        self.check_fail(|f| match f {
            FailOn::GetFile { path: p, error } if path_matches(p, path) => Some(error.clone()),
            _ => None,
        })?;

        let mut inner = self.state();
        let found = inner.files.get(path).map(|f| StoredFile {
            path: path.to_string(),
            content: f.content.clone(),
            sha: f.sha.clone(),
        });
        if let Some((other_path, content)) = inner.concurrent_write.take() {
            let sha = inner.next_sha("blob");
            inner.files.insert(other_path, MockFile { content, sha });
            inner.new_commit();
        }
        Ok(found)
    }

    async fn put_file(&self, request: PutFileRequest) -> Result<CommitInfo, StoreError> {
        self.record(MockOperation::PutFile {
            path: request.path.clone(),
            message: request.message.clone(),
            branch: request.branch.clone(),
        });
        self.check_fail(|f| match f {
            FailOn::PutFile { path, error } if path_matches(path, &request.path) => {
                Some(error.clone())
            }
            _ => None,
        })?;

        let mut inner = self.state();
        Self::check_branch(&inner, &request.branch)?;

        let current = inner.files.get(&request.path).map(|f| f.sha.clone());
        if let Some(prior) = &request.prior_sha {
            if current.as_deref() != Some(prior.as_str()) {
                return Err(StoreError::Conflict {
                    path: request.path,
                    message: format!(
                        "expected {} but found {}",
                        prior,
                        current.as_deref().unwrap_or("nothing")
                    ),
                });
            }
        }

        let sha = inner.next_sha("blob");
        inner.files.insert(
            request.path,
            MockFile {
                content: request.content,
                sha,
            },
        );
        Ok(inner.new_commit())
    }

    async fn delete_file(
        &self,
        path: &str,
        message: &str,
        branch: &str,
    ) -> Result<CommitInfo, StoreError> {
        self.record(MockOperation::DeleteFile {
            path: path.to_string(),
            message: message.to_string(),
        });
        self.check_fail(|f| match f {
            FailOn::DeleteFile(e) => Some(e.clone()),
            _ => None,
        })?;

        let mut inner = self.state();
        Self::check_branch(&inner, branch)?;
        if inner.files.remove(path).is_none() {
            return Err(StoreError::NotFound(path.to_string()));
        }
        Ok(inner.new_commit())
    }

    async fn commit_files(&self, request: CommitFilesRequest) -> Result<CommitInfo, StoreError> {
        self.record(MockOperation::CommitFiles {
            branch: request.branch.clone(),
            paths: request.files.iter().map(|f| f.path.clone()).collect(),
            message: request.message.clone(),
        });
        self.check_fail(|f| match f {
            FailOn::CommitFiles(e) => Some(e.clone()),
            _ => None,
        })?;

        let mut inner = self.state();
        Self::check_branch(&inner, &request.branch)?;
        if request.files.is_empty() {
            return Err(StoreError::CommitRejected("no files to commit".into()));
        }
        if request.base_sha != inner.head {
            return Err(StoreError::CommitRejected(format!(
                "branch moved: expected {} but head is {}",
                request.base_sha, inner.head
            )));
        }

        for file in request.files {
            let sha = inner.next_sha("blob");
            inner.files.insert(
                file.path,
                MockFile {
                    content: file.content,
                    sha,
                },
            );
        }
        Ok(inner.new_commit())
    }

    async fn list_dir(&self, path: &str, _git_ref: &str) -> Result<Vec<DirEntry>, StoreError> {
        self.record(MockOperation::ListDir {
            path: path.to_string(),
        });
        self.check_fail(|f| match f {
            FailOn::ListDir(e) => Some(e.clone()),
            _ => None,
        })?;

        let prefix = format!("{}/", path.trim_end_matches('/'));
        let inner = self.state();
        let mut dirs = BTreeSet::new();
        let mut entries = Vec::new();

        for file_path in inner.files.keys() {
            let Some(rest) = file_path.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((dir, _)) => {
                    dirs.insert(dir.to_string());
                }
                None => entries.push(DirEntry {
                    name: rest.to_string(),
                    path: file_path.clone(),
                    kind: EntryKind::File,
                }),
            }
        }

        entries.extend(dirs.into_iter().map(|name| DirEntry {
            path: format!("{}{}", prefix, name),
            name,
            kind: EntryKind::Dir,
        }));
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::traits::CommitFile;

    fn commit_request(base_sha: &str) -> CommitFilesRequest {
        CommitFilesRequest {
            branch: MOCK_BRANCH.into(),
            base_sha: base_sha.into(),
            files: vec![CommitFile {
                path: "a.json".into(),
                content: "{}".into(),
            }],
            message: "publish".into(),
        }
    }

    fn put(path: &str, content: &str, prior_sha: Option<String>) -> PutFileRequest {
        PutFileRequest {
            path: path.into(),
            content: content.into(),
            message: "write".into(),
            branch: MOCK_BRANCH.into(),
            prior_sha,
        }
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let store = MockStore::new();
        store.put_file(put("a.json", "{}", None)).await.unwrap();

        let file = store.get_file("a.json", MOCK_BRANCH).await.unwrap().unwrap();
        assert_eq!(file.content, "{}");
        assert_eq!(Some(file.sha), store.file_sha("a.json"));
    }

    #[tokio::test]
    async fn stale_prior_sha_conflicts() {
        let store = MockStore::with_files([("a.json", "1")]);
        let result = store
            .put_file(put("a.json", "2", Some("blob-999".into())))
            .await;

        assert!(matches!(result, Err(StoreError::Conflict { .. })));
        assert_eq!(store.file_content("a.json").as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn matching_prior_sha_updates() {
        let store = MockStore::with_files([("a.json", "1")]);
        let sha = store.file_sha("a.json");
        store.put_file(put("a.json", "2", sha)).await.unwrap();
        assert_eq!(store.file_content("a.json").as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn each_write_moves_head() {
        let store = MockStore::new();
        let before = store.head();
        let commit = store.put_file(put("a.json", "{}", None)).await.unwrap();
        assert_ne!(before, commit.sha);
        assert_eq!(store.head(), commit.sha);
    }

    #[tokio::test]
    async fn failed_commit_applies_nothing() {
        let store = MockStore::new()
            .fail_on(FailOn::CommitFiles(StoreError::CommitRejected("moved".into())));

        let result = store
            .commit_files(commit_request(&store.head()))
            .await;

        assert!(matches!(result, Err(StoreError::CommitRejected(_))));
        assert!(store.paths().is_empty());
    }

    #[tokio::test]
    async fn commit_on_stale_base_is_rejected() {
        let store = MockStore::new();
        let base = store.head();
        store.put_file(put("b.json", "{}", None)).await.unwrap();

        let result = store.commit_files(commit_request(&base)).await;

        assert!(matches!(result, Err(StoreError::CommitRejected(msg)) if msg.contains(&base)));
        assert_eq!(store.file_content("a.json"), None);
    }

    #[tokio::test]
    async fn concurrent_write_lands_after_first_read() {
        let store = MockStore::new().with_concurrent_write("b.json", "{}");
        let before = store.head();

        assert!(store.get_file("a.json", &before).await.unwrap().is_none());
        assert_ne!(store.head(), before);
        assert_eq!(store.file_content("b.json").as_deref(), Some("{}"));

        let head = store.head();
        store.get_file("a.json", &head).await.unwrap();
        assert_eq!(store.head(), head);
    }

    #[tokio::test]
    async fn put_fail_filter_by_path() {
        let store = MockStore::new().fail_on(FailOn::PutFile {
            path: Some("b.json".into()),
            error: StoreError::RateLimited,
        });

        assert!(store.put_file(put("a.json", "{}", None)).await.is_ok());
        assert!(store.put_file(put("b.json", "{}", None)).await.is_err());
    }

    #[tokio::test]
    async fn wrong_branch_is_rejected() {
        let store = MockStore::new().with_branch("live");
        let result = store.put_file(put("a.json", "{}", None)).await;
        assert!(matches!(result, Err(StoreError::BranchNotFound(_))));
    }

    #[tokio::test]
    async fn delete_removes_file() {
        let store = MockStore::with_files([("a.json", "{}")]);
        store.delete_file("a.json", "rm", MOCK_BRANCH).await.unwrap();
        assert!(store.file_content("a.json").is_none());

        let again = store.delete_file("a.json", "rm", MOCK_BRANCH).await;
        assert!(matches!(again, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn list_dir_returns_direct_children() {
        let store = MockStore::with_files([
            ("public/games/foo/config.json", "{}"),
            ("public/games/foo/draft/config.json", "{}"),
            ("public/games/bar/missions.json", "{}"),
            ("public/games/readme.txt", "hi"),
        ]);

        let entries = store.list_dir("public/games", MOCK_BRANCH).await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| (e.name.as_str(), e.kind)).collect();
        assert_eq!(
            names,
            vec![
                ("bar", EntryKind::Dir),
                ("foo", EntryKind::Dir),
                ("readme.txt", EntryKind::File),
            ]
        );
        assert_eq!(entries[1].path, "public/games/foo");
    }

    #[tokio::test]
    async fn operations_are_recorded() {
        let store = MockStore::new();
        store.resolve_branch().await.unwrap();
        let _ = store.get_file("x", MOCK_BRANCH).await;

        assert_eq!(
            store.operations(),
            vec![
                MockOperation::ResolveBranch,
                MockOperation::GetFile {
                    path: "x".into(),
                    git_ref: MOCK_BRANCH.into()
                },
            ]
        );
        assert!(store.writes().is_empty());
    }
}
