//! store::github
//!
//! GitHub content store using the Contents and Git Data REST APIs.
//!
//! # Design
//!
//! - Single-file reads and writes go through the Contents API
//!   (`/repos/{owner}/{repo}/contents/{path}`).
//! - Multi-file commits go through the Git Data API: create a tree on top of
//!   the caller's base commit, create a commit whose parent is that base, then
//!   move the branch with a non-forced ref update. If the branch moved past the
//!   base, the ref update is refused and nothing becomes visible.
//!
//! # Versioning
//!
//! The Contents API requires the current blob SHA to update a file. When the
//! caller does not supply one, [`GitHubStore::put_file`] reads it immediately
//! before writing. A stale SHA surfaces as `StoreError::Conflict`.
//!
//! # Rate Limiting
//!
//! Returns `StoreError::RateLimited` when limits are hit. No automatic retry.
//!
//! # Example
//!
//! ```ignore
//! use trailhead::store::github::GitHubStore;
//! use trailhead::store::ContentStore;
//!
//! let store = GitHubStore::new("ghp_xxx", "acme", "hunt-content", "main");
//! let branch = store.resolve_branch().await?;
//! let file = store.get_file("public/config.json", &branch.sha).await?;
//! ```

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::{
    BranchRef, CommitFilesRequest, CommitInfo, ContentStore, DirEntry, EntryKind, PutFileRequest,
    StoreError, StoredFile,
};
use crate::core::config::{StoreSettings, DEFAULT_API_BASE};

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "trailhead";

/// Mode for regular files in a git tree.
const FILE_MODE: &str = "100644";

/// GitHub content store.
pub struct GitHubStore {
    /// HTTP client for making requests
    client: Client,
    /// Access token
    token: String,
    /// Repository owner (user or organization)
    owner: String,
    /// Repository name
    repo: String,
    /// Branch holding the content
    branch: String,
    /// API base URL (configurable for GitHub Enterprise and tests)
    api_base: String,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for GitHubStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubStore")
            .field("has_token", &!self.token.is_empty())
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GitHubStore {
    /// Create a new GitHub store against the public API.
    ///
    /// # Arguments
    ///
    /// * `token` - Personal access token or GitHub App token
    /// * `owner` - Repository owner
    /// * `repo` - Repository name
    /// * `branch` - Branch holding the content
    pub fn new(
        token: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self::with_api_base(token, owner, repo, branch, DEFAULT_API_BASE)
    }

    /// Create a GitHub store with a custom API base URL.
    ///
    /// Use this for GitHub Enterprise (`https://github.example.com/api/v3`)
    /// or a local mock server.
    pub fn with_api_base(
        token: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        branch: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        let api_base: String = api_base.into();
        Self {
            client: Client::new(),
            token: token.into(),
            owner: owner.into(),
            repo: repo.into(),
            branch: branch.into(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Create a GitHub store from resolved settings.
    pub fn from_settings(settings: &StoreSettings) -> Self {
        Self::with_api_base(
            settings.token.clone(),
            settings.owner.clone(),
            settings.repo.clone(),
            settings.branch.clone(),
            settings.api_base.clone(),
        )
    }

    /// Get the repository owner.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Get the repository name.
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Get the configured branch.
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Build common headers for API requests.
    fn headers(&self) -> Result<HeaderMap, StoreError> {
        if self.token.is_empty() {
            return Err(StoreError::AuthRequired);
        }

        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|_| StoreError::AuthFailed("token contains invalid characters".into()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        Ok(headers)
    }

    /// Build URL for a repository endpoint.
    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, self.owner, self.repo, path
        )
    }

    /// Build URL for a Contents API path.
    fn contents_url(&self, path: &str) -> String {
        self.repo_url(&format!("contents/{}", path.trim_matches('/')))
    }

    /// Attach headers and send a request.
    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        request
            .headers(self.headers()?)
            .send()
            .await
            .map_err(|e| StoreError::NetworkError(e.to_string()))
    }

    /// Handle API response, mapping errors appropriately.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        response: Response,
    ) -> Result<T, StoreError> {
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| StoreError::ApiError {
                status: status.as_u16(),
                message: format!("Failed to parse response: {}", e),
            })
        } else {
            Err(Self::error_from_response(response).await)
        }
    }

    /// Extract the error message from a failed response body.
    async fn error_message(response: Response) -> String {
        match response.json::<GitHubErrorResponse>().await {
            Ok(err) => err.message,
            Err(_) => "Unknown error".to_string(),
        }
    }

    /// Map an error response from the API.
    async fn error_from_response(response: Response) -> StoreError {
        let status = response.status();

        // Extract headers before consuming the body.
        let headers = response.headers();
        let rate_limited = headers
            .get("X-RateLimit-Remaining")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == "0");
        let required_permissions = headers
            .get("X-Accepted-GitHub-Permissions")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let message = Self::error_message(response).await;

        match status {
            StatusCode::UNAUTHORIZED => StoreError::AuthFailed("Invalid or expired token".into()),
            StatusCode::FORBIDDEN if rate_limited => StoreError::RateLimited,
            StatusCode::FORBIDDEN => {
                let mut err_msg = format!("Permission denied: {}", message);
                if let Some(perms) = required_permissions.filter(|p| !p.is_empty()) {
                    err_msg.push_str(&format!(" [required: {}]", perms));
                }
                StoreError::AuthFailed(err_msg)
            }
            StatusCode::NOT_FOUND => StoreError::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => StoreError::RateLimited,
            _ if status.is_server_error() => StoreError::ApiError {
                status: status.as_u16(),
                message: format!("GitHub server error: {}", message),
            },
            _ => StoreError::ApiError {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Map a failed single-file write, turning version mismatches into
    /// `Conflict`.
    async fn write_error(response: Response, path: &str) -> StoreError {
        let status = response.status();
        match status {
            StatusCode::CONFLICT => StoreError::Conflict {
                path: path.to_string(),
                message: Self::error_message(response).await,
            },
            StatusCode::UNPROCESSABLE_ENTITY => {
                let message = Self::error_message(response).await;
                if message.contains("sha") {
                    StoreError::Conflict {
                        path: path.to_string(),
                        message,
                    }
                } else {
                    StoreError::ApiError {
                        status: status.as_u16(),
                        message,
                    }
                }
            }
            _ => Self::error_from_response(response).await,
        }
    }

    /// Resolve any branch by name.
    async fn resolve_named_branch(&self, branch: &str) -> Result<BranchRef, StoreError> {
        debug!(branch, "resolving branch");
        let url = self.repo_url(&format!("git/ref/heads/{}", branch));
        let response = self.send(self.client.get(&url)).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::BranchNotFound(branch.to_string()));
        }

        let git_ref: GitHubRef = Self::handle_response(response).await?;
        Ok(BranchRef {
            name: branch.to_string(),
            sha: git_ref.object.sha,
        })
    }

    /// Fetch a blob by SHA (used for files too large for the Contents API).
    async fn get_blob(&self, sha: &str, path: &str) -> Result<String, StoreError> {
        debug!(sha, path, "fetching blob");
        let url = self.repo_url(&format!("git/blobs/{}", sha));
        let response = self.send(self.client.get(&url)).await?;
        let blob: GitHubBlob = Self::handle_response(response).await?;

        if blob.encoding != "base64" {
            return Err(StoreError::InvalidContent {
                path: path.to_string(),
                message: format!("unsupported blob encoding '{}'", blob.encoding),
            });
        }
        decode_base64(&blob.content, path)
    }

    /// Fetch the raw Contents API response for a path.
    async fn get_contents(
        &self,
        path: &str,
        git_ref: &str,
    ) -> Result<Option<ContentsResponse>, StoreError> {
        let response = self
            .send(
                self.client
                    .get(self.contents_url(path))
                    .query(&[("ref", git_ref)]),
            )
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        Self::handle_response(response).await.map(Some)
    }
}

#[async_trait]
impl ContentStore for GitHubStore {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn resolve_branch(&self) -> Result<BranchRef, StoreError> {
        self.resolve_named_branch(&self.branch).await
    }

    async fn get_file(&self, path: &str, git_ref: &str) -> Result<Option<StoredFile>, StoreError> {
        debug!(path, git_ref, "fetching file");
        let item = match self.get_contents(path, git_ref).await? {
            Some(ContentsResponse::Item(item)) if item.kind == "file" => item,
            _ => return Ok(None),
        };

        let content = match (item.encoding.as_deref(), item.content.as_deref()) {
            (Some("base64"), Some(raw)) => decode_base64(raw, path)?,
            // Files over 1 MB come back with encoding "none" and no content.
            _ => self.get_blob(&item.sha, path).await?,
        };

        Ok(Some(StoredFile {
            path: item.path,
            content,
            sha: item.sha,
        }))
    }

    async fn put_file(&self, request: PutFileRequest) -> Result<CommitInfo, StoreError> {
        let prior_sha = match request.prior_sha {
            Some(sha) => Some(sha),
            None => self
                .get_file(&request.path, &request.branch)
                .await?
                .map(|f| f.sha),
        };

        debug!(
            path = %request.path,
            branch = %request.branch,
            update = prior_sha.is_some(),
            "writing file"
        );

        let body = PutContentsBody {
            message: &request.message,
            content: STANDARD.encode(request.content.as_bytes()),
            branch: &request.branch,
            sha: prior_sha.as_deref(),
        };

        let response = self
            .send(self.client.put(self.contents_url(&request.path)).json(&body))
            .await?;

        if !response.status().is_success() {
            return Err(Self::write_error(response, &request.path).await);
        }

        let written: ContentsWriteResponse = Self::handle_response(response).await?;
        Ok(written.commit.into())
    }

    async fn delete_file(
        &self,
        path: &str,
        message: &str,
        branch: &str,
    ) -> Result<CommitInfo, StoreError> {
        let current = self
            .get_file(path, branch)
            .await?
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;

        debug!(path, branch, "deleting file");

        let body = DeleteContentsBody {
            message,
            sha: &current.sha,
            branch,
        };

        let response = self
            .send(self.client.delete(self.contents_url(path)).json(&body))
            .await?;

        if !response.status().is_success() {
            return Err(Self::write_error(response, path).await);
        }

        let written: ContentsWriteResponse = Self::handle_response(response).await?;
        Ok(written.commit.into())
    }

    async fn commit_files(&self, request: CommitFilesRequest) -> Result<CommitInfo, StoreError> {
        if request.files.is_empty() {
            return Err(StoreError::CommitRejected("no files to commit".into()));
        }

        // 1. Tree of the base commit
        let url = self.repo_url(&format!("git/commits/{}", request.base_sha));
        let response = self.send(self.client.get(&url)).await?;
        let base_commit: GitHubGitCommit = Self::handle_response(response).await?;

        // 2. New tree layered over the base tree
        let tree_body = CreateTreeBody {
            base_tree: &base_commit.tree.sha,
            tree: request
                .files
                .iter()
                .map(|f| TreeEntryBody {
                    path: &f.path,
                    mode: FILE_MODE,
                    kind: "blob",
                    content: &f.content,
                })
                .collect(),
        };
        let response = self
            .send(self.client.post(self.repo_url("git/trees")).json(&tree_body))
            .await?;
        let tree: GitHubSha = Self::handle_response(response).await?;

        // 3. Commit pointing at the new tree
        let commit_body = CreateCommitBody {
            message: &request.message,
            tree: &tree.sha,
            parents: vec![&request.base_sha],
        };
        let response = self
            .send(
                self.client
                    .post(self.repo_url("git/commits"))
                    .json(&commit_body),
            )
            .await?;
        let commit: GitHubGitCommit = Self::handle_response(response).await?;

        // 4. Fast-forward the branch; refused unless its head is still the base
        debug!(
            branch = %request.branch,
            base = %request.base_sha,
            files = request.files.len(),
            commit = %commit.sha,
            "updating branch ref"
        );
        let url = self.repo_url(&format!("git/refs/heads/{}", request.branch));
        let response = self
            .send(self.client.patch(&url).json(&UpdateRefBody {
                sha: &commit.sha,
                force: false,
            }))
            .await?;

        let status = response.status();
        if status == StatusCode::UNPROCESSABLE_ENTITY || status == StatusCode::CONFLICT {
            return Err(StoreError::CommitRejected(
                Self::error_message(response).await,
            ));
        }
        let _: GitHubRef = Self::handle_response(response).await?;

        Ok(CommitInfo {
            sha: commit.sha,
            url: commit.html_url,
        })
    }

    async fn list_dir(&self, path: &str, git_ref: &str) -> Result<Vec<DirEntry>, StoreError> {
        debug!(path, git_ref, "listing directory");
        let items = match self.get_contents(path, git_ref).await? {
            Some(ContentsResponse::Dir(items)) => items,
            _ => return Ok(Vec::new()),
        };

        Ok(items
            .into_iter()
            .map(|item| DirEntry {
                kind: match item.kind.as_str() {
                    "file" => EntryKind::File,
                    "dir" => EntryKind::Dir,
                    _ => EntryKind::Other,
                },
                name: item.name,
                path: item.path,
            })
            .collect())
    }
}

/// Decode Contents API base64 (which wraps lines) into UTF-8 text.
fn decode_base64(raw: &str, path: &str) -> Result<String, StoreError> {
    let compact: String = raw.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| StoreError::InvalidContent {
            path: path.to_string(),
            message: format!("base64 decode failed: {}", e),
        })?;
    String::from_utf8(bytes).map_err(|_| StoreError::InvalidContent {
        path: path.to_string(),
        message: "content is not valid UTF-8".into(),
    })
}

// --------------------------------------------------------------------------
// API Types
// --------------------------------------------------------------------------

/// Request body for creating or updating a file.
#[derive(Serialize)]
struct PutContentsBody<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

/// Request body for deleting a file.
#[derive(Serialize)]
struct DeleteContentsBody<'a> {
    message: &'a str,
    sha: &'a str,
    branch: &'a str,
}

/// Request body for creating a tree.
#[derive(Serialize)]
struct CreateTreeBody<'a> {
    base_tree: &'a str,
    tree: Vec<TreeEntryBody<'a>>,
}

#[derive(Serialize)]
struct TreeEntryBody<'a> {
    path: &'a str,
    mode: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    content: &'a str,
}

/// Request body for creating a commit.
#[derive(Serialize)]
struct CreateCommitBody<'a> {
    message: &'a str,
    tree: &'a str,
    parents: Vec<&'a str>,
}

/// Request body for moving a branch.
#[derive(Serialize)]
struct UpdateRefBody<'a> {
    sha: &'a str,
    force: bool,
}

/// GitHub error response format.
#[derive(Deserialize)]
struct GitHubErrorResponse {
    message: String,
}

/// Contents API response: a directory listing or a single item.
#[derive(Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    Dir(Vec<GitHubContentItem>),
    Item(GitHubContentItem),
}

#[derive(Deserialize)]
struct GitHubContentItem {
    #[serde(rename = "type")]
    kind: String,
    name: String,
    path: String,
    sha: String,
    content: Option<String>,
    encoding: Option<String>,
}

/// Response from a Contents API write.
#[derive(Deserialize)]
struct ContentsWriteResponse {
    commit: GitHubCommitRef,
}

#[derive(Deserialize)]
struct GitHubCommitRef {
    sha: String,
    html_url: String,
}

impl From<GitHubCommitRef> for CommitInfo {
    fn from(commit: GitHubCommitRef) -> Self {
        CommitInfo {
            sha: commit.sha,
            url: commit.html_url,
        }
    }
}

/// Git ref response format.
#[derive(Deserialize)]
struct GitHubRef {
    object: GitHubSha,
}

#[derive(Deserialize)]
struct GitHubSha {
    sha: String,
}

/// Git Data commit response format.
#[derive(Deserialize)]
struct GitHubGitCommit {
    sha: String,
    html_url: String,
    tree: GitHubSha,
}

#[derive(Deserialize)]
struct GitHubBlob {
    content: String,
    encoding: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    mod github_store {
        use super::*;

        #[test]
        fn new_creates_store() {
            let store = GitHubStore::new("token", "owner", "repo", "main");
            assert_eq!(store.name(), "github");
            assert_eq!(store.owner(), "owner");
            assert_eq!(store.repo(), "repo");
            assert_eq!(store.branch(), "main");
            assert_eq!(store.api_base, DEFAULT_API_BASE);
        }

        #[test]
        fn with_api_base_trims_trailing_slash() {
            let store = GitHubStore::with_api_base(
                "token",
                "owner",
                "repo",
                "main",
                "https://github.example.com/api/v3/",
            );
            assert_eq!(store.api_base, "https://github.example.com/api/v3");
        }

        #[test]
        fn from_settings_copies_fields() {
            let settings = StoreSettings {
                owner: "acme".into(),
                repo: "content".into(),
                branch: "live".into(),
                api_base: "http://127.0.0.1:9999".into(),
                token: "t".into(),
            };
            let store = GitHubStore::from_settings(&settings);
            assert_eq!(store.owner(), "acme");
            assert_eq!(store.branch(), "live");
            assert_eq!(store.api_base, "http://127.0.0.1:9999");
        }

        #[test]
        fn url_format() {
            let store = GitHubStore::new("token", "acme", "content", "main");
            assert_eq!(
                store.repo_url("git/trees"),
                "https://api.github.com/repos/acme/content/git/trees"
            );
            assert_eq!(
                store.contents_url("/public/games/foo/config.json"),
                "https://api.github.com/repos/acme/content/contents/public/games/foo/config.json"
            );
        }

        #[test]
        fn debug_redacts_token() {
            let store = GitHubStore::new("secret_token_abc123", "owner", "repo", "main");
            let debug_output = format!("{:?}", store);
            assert!(!debug_output.contains("secret_token_abc123"));
            assert!(debug_output.contains("has_token"));
            assert!(debug_output.contains("owner"));
        }

        #[test]
        fn empty_token_requires_auth() {
            let store = GitHubStore::new("", "owner", "repo", "main");
            assert!(matches!(store.headers(), Err(StoreError::AuthRequired)));
        }

        #[test]
        fn headers_include_api_version() {
            let store = GitHubStore::new("token", "owner", "repo", "main");
            let headers = store.headers().unwrap();
            assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer token");
            assert_eq!(headers.get("X-GitHub-Api-Version").unwrap(), "2022-11-28");
        }
    }

    mod decode {
        use super::*;

        #[test]
        fn decodes_wrapped_base64() {
            // GitHub wraps base64 content at 60 columns.
            let encoded = "eyJtaXNz\naW9ucyI6\nW119\n";
            assert_eq!(
                decode_base64(encoded, "p").unwrap(),
                "{\"missions\":[]}"
            );
        }

        #[test]
        fn rejects_garbage() {
            assert!(matches!(
                decode_base64("!!!", "public/config.json"),
                Err(StoreError::InvalidContent { .. })
            ));
        }

        #[test]
        fn rejects_non_utf8() {
            let encoded = STANDARD.encode([0xff, 0xfe]);
            assert!(matches!(
                decode_base64(&encoded, "p"),
                Err(StoreError::InvalidContent { .. })
            ));
        }
    }
}
