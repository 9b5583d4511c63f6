//! publish::orchestrator
//!
//! Save, Publish, and read-side workflows over a [`ContentStore`].
//!
//! # Save
//!
//! Each supplied document is written on its own with a single-file write.
//! Documents are independent: a failed config write does not stop the
//! missions write, and the outcome reports one result per document.
//!
//! # Publish
//!
//! 1. Resolve the branch once and read everything at that commit
//! 2. Probe [`candidate_paths`] in order, stopping at the first base holding
//!    a config or missions document
//! 3. Synthesize `{"missions": []}` when only config was found
//! 4. Build the write set: published copies plus companion mirrors
//! 5. Submit the write set as one multi-file commit
//!
//! The read phase never writes, so any failure before step 5 leaves the
//! store untouched. Step 5 is all-or-nothing.
//!
//! Documents are re-serialized as two-space pretty JSON with a trailing
//! newline, so publishing unchanged content writes identical bytes.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::errors::{ErrorContext, Operation, PublishError};
use super::request::{ContentRequest, PublishRequest, SaveRequest};
use crate::core::paths::{candidate_paths, destination_base, document_path, mirror_path, GAMES_ROOT};
use crate::core::types::{Channel, Document, Slug};
use crate::store::{
    BranchRef, CommitFile, CommitFilesRequest, CommitInfo, ContentStore, EntryKind,
    PutFileRequest, StoreError,
};

/// Result of writing one document during a save.
#[derive(Debug)]
pub struct DocumentResult {
    pub document: Document,
    pub path: String,
    pub result: Result<CommitInfo, PublishError>,
}

impl DocumentResult {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn to_json(&self) -> Value {
        match &self.result {
            Ok(commit) => json!({
                "document": self.document,
                "path": self.path,
                "ok": true,
                "commitSha": commit.sha,
                "commitUrl": commit.url,
            }),
            Err(e) => json!({
                "document": self.document,
                "path": self.path,
                "ok": false,
                "error": e.kind(),
                "message": e.to_string(),
            }),
        }
    }
}

/// Outcome of a save: one entry per supplied document.
#[derive(Debug)]
pub struct SaveOutcome {
    pub slug: Slug,
    pub channel: Channel,
    pub results: Vec<DocumentResult>,
}

impl SaveOutcome {
    pub fn all_ok(&self) -> bool {
        self.results.iter().all(DocumentResult::is_ok)
    }

    /// The first failed write, if any.
    pub fn first_error(&self) -> Option<&PublishError> {
        self.results.iter().find_map(|r| r.result.as_ref().err())
    }

    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "ok": self.all_ok(),
            "slug": self.slug.as_str(),
            "channel": self.channel,
            "results": self.results.iter().map(DocumentResult::to_json).collect::<Vec<_>>(),
        });
        if let (Some(err), Value::Object(map)) = (self.first_error(), &mut body) {
            map.insert("error".into(), Value::String(err.kind().into()));
        }
        body
    }
}

/// Outcome of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishOutcome {
    pub slug: String,
    /// Candidate base the content was read from
    pub used_base: String,
    /// Every path written, admin copies first
    pub wrote: Vec<String>,
    pub commit_sha: String,
    pub commit_url: String,
}

impl PublishOutcome {
    pub fn to_json(&self) -> Value {
        let mut body = json!({ "ok": true });
        if let (Value::Object(map), Ok(Value::Object(fields))) =
            (&mut body, serde_json::to_value(self))
        {
            map.extend(fields);
        }
        body
    }
}

/// Content of one (slug, channel) location.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadOutcome {
    pub slug: String,
    pub channel: Channel,
    pub base: String,
    pub config: Option<Value>,
    pub missions: Option<Value>,
}

/// Outcome of [`Orchestrator::execute`].
#[derive(Debug)]
pub enum Outcome {
    Saved(SaveOutcome),
    Published(PublishOutcome),
}

/// Documents found at a candidate base.
#[derive(Debug, Clone, PartialEq)]
struct FoundContent {
    base: String,
    config: Option<Value>,
    missions: Option<Value>,
}

/// Runs content workflows against a store.
#[derive(Clone)]
pub struct Orchestrator {
    store: Arc<dyn ContentStore>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("store", &self.store.name())
            .finish()
    }
}

impl Orchestrator {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn ContentStore {
        self.store.as_ref()
    }

    /// Run a validated request.
    ///
    /// A save with failed documents is still `Ok`; inspect
    /// [`SaveOutcome::all_ok`].
    pub async fn execute(&self, request: ContentRequest) -> Result<Outcome, PublishError> {
        match request {
            ContentRequest::Save(r) => self.save(r).await.map(Outcome::Saved),
            ContentRequest::Publish(r) => self.publish(r).await.map(Outcome::Published),
        }
    }

    /// Write each supplied document to the channel's destination.
    ///
    /// # Errors
    ///
    /// Fails outright only when the branch cannot be resolved or a document
    /// cannot be serialized. Per-document store failures are reported in
    /// the outcome.
    pub async fn save(&self, request: SaveRequest) -> Result<SaveOutcome, PublishError> {
        let SaveRequest {
            slug,
            channel,
            config,
            missions,
        } = request;
        let context = ErrorContext::new(Operation::Save, slug.label()).channel(channel);

        let branch = self.resolve_branch(&context).await?;
        let base = destination_base(&slug, channel);

        let mut writes = Vec::new();
        for (document, value) in [(Document::Config, config), (Document::Missions, missions)] {
            if let Some(value) = value {
                let path = document_path(&base, document);
                let content = to_document_json(&value, &context)?;
                writes.push((document, path, content));
            }
        }

        let mut results = Vec::with_capacity(writes.len());
        for (document, path, content) in writes {
            let request = PutFileRequest {
                path: path.clone(),
                content,
                message: format!("save({}): {} ({})", slug.label(), document, channel),
                branch: branch.name.clone(),
                prior_sha: None,
            };

            let result = match self.store.put_file(request).await {
                Ok(commit) => {
                    info!(
                        slug = slug.label(),
                        %document,
                        %channel,
                        %path,
                        commit = %commit.sha,
                        "saved document"
                    );
                    Ok(commit)
                }
                Err(e) => {
                    warn!(slug = slug.label(), %document, %channel, %path, error = %e, "save failed");
                    Err(PublishError::from_store(
                        context.clone().document(document).path(path.clone()),
                        e,
                    ))
                }
            };
            results.push(DocumentResult {
                document,
                path,
                result,
            });
        }

        Ok(SaveOutcome {
            slug,
            channel,
            results,
        })
    }

    /// Copy the most specific existing content to the published channel
    /// and its companion mirror in one commit.
    ///
    /// # Errors
    ///
    /// - `NotFound` when no candidate base holds any document
    /// - `Store` for a failed branch resolution or read
    /// - `Commit` when the multi-file commit fails
    pub async fn publish(&self, request: PublishRequest) -> Result<PublishOutcome, PublishError> {
        let slug = request.slug;
        let context = ErrorContext::new(Operation::Publish, slug.label());

        let branch = self.resolve_branch(&context).await?;
        let candidates = candidate_paths(&slug);

        let Some(found) = self.probe(&candidates, &branch, &context).await? else {
            info!(slug = slug.label(), tried = ?candidates, "nothing to publish");
            return Err(PublishError::NotFound {
                slug: slug.label().to_string(),
                tried: candidates,
            });
        };
        debug!(slug = slug.label(), base = %found.base, "found content to publish");

        let files = build_write_set(&slug, found.config.as_ref(), found.missions.as_ref(), &context)?;
        let wrote: Vec<String> = files.iter().map(|f| f.path.clone()).collect();

        let request = CommitFilesRequest {
            branch: branch.name.clone(),
            base_sha: branch.sha.clone(),
            message: format!("publish({}): from {}", slug.label(), found.base),
            files,
        };
        let commit = self.store.commit_files(request).await.map_err(|e| {
            warn!(slug = slug.label(), error = %e, "publish commit failed");
            PublishError::commit(context.clone().channel(Channel::Published), e)
        })?;

        info!(
            slug = slug.label(),
            used_base = %found.base,
            files = wrote.len(),
            commit = %commit.sha,
            "published"
        );

        Ok(PublishOutcome {
            slug: slug.as_str().to_string(),
            used_base: found.base,
            wrote,
            commit_sha: commit.sha,
            commit_url: commit.url,
        })
    }

    /// Read both documents at a (slug, channel) destination.
    pub async fn load(&self, slug: &Slug, channel: Channel) -> Result<LoadOutcome, PublishError> {
        let context = ErrorContext::new(Operation::Load, slug.label()).channel(channel);
        let branch = self.resolve_branch(&context).await?;
        let base = destination_base(slug, channel);

        let config = self
            .read_document(&base, Document::Config, &branch, &context)
            .await?;
        let missions = self
            .read_document(&base, Document::Missions, &branch, &context)
            .await?;

        Ok(LoadOutcome {
            slug: slug.as_str().to_string(),
            channel,
            base,
            config,
            missions,
        })
    }

    /// Slugs of the games stored under `public/games`, sorted.
    ///
    /// Directory names that are not already in normalized slug form are
    /// skipped, since their paths could not be reached through a [`Slug`].
    pub async fn list_games(&self) -> Result<Vec<String>, PublishError> {
        let context = ErrorContext::new(Operation::List, "*").path(GAMES_ROOT);
        let branch = self.resolve_branch(&context).await?;

        let entries = self
            .store
            .list_dir(GAMES_ROOT, &branch.sha)
            .await
            .map_err(|e| PublishError::from_store(context.clone(), e))?;

        let mut games: Vec<String> = entries
            .into_iter()
            .filter(|e| e.kind == EntryKind::Dir)
            .filter_map(|e| match Slug::new(&e.name) {
                Ok(slug) if !slug.is_legacy() && slug.as_str() == e.name => Some(e.name),
                _ => {
                    debug!(name = %e.name, "skipping non-slug directory");
                    None
                }
            })
            .collect();
        games.sort();
        Ok(games)
    }

    async fn resolve_branch(&self, context: &ErrorContext) -> Result<BranchRef, PublishError> {
        let branch = self
            .store
            .resolve_branch()
            .await
            .map_err(|e| PublishError::from_store(context.clone(), e))?;
        debug!(branch = %branch.name, sha = %branch.sha, "resolved branch");
        Ok(branch)
    }

    /// Walk candidates in order, stopping at the first base with content.
    async fn probe(
        &self,
        candidates: &[String],
        branch: &BranchRef,
        context: &ErrorContext,
    ) -> Result<Option<FoundContent>, PublishError> {
        for base in candidates {
            let config = self
                .read_document(base, Document::Config, branch, context)
                .await?;
            let missions = self
                .read_document(base, Document::Missions, branch, context)
                .await?;

            if config.is_some() || missions.is_some() {
                return Ok(Some(FoundContent {
                    base: base.clone(),
                    config,
                    missions,
                }));
            }
            debug!(%base, "no content at candidate");
        }
        Ok(None)
    }

    async fn read_document(
        &self,
        base: &str,
        document: Document,
        branch: &BranchRef,
        context: &ErrorContext,
    ) -> Result<Option<Value>, PublishError> {
        let path = document_path(base, document);
        let located = || context.clone().document(document).path(path.clone());

        let Some(file) = self
            .store
            .get_file(&path, &branch.sha)
            .await
            .map_err(|e| PublishError::from_store(located(), e))?
        else {
            return Ok(None);
        };

        serde_json::from_str(&file.content).map(Some).map_err(|e| {
            PublishError::from_store(
                located(),
                StoreError::InvalidContent {
                    path: path.clone(),
                    message: format!("not valid JSON: {}", e),
                },
            )
        })
    }
}

/// Published and mirrored files for the documents found.
///
/// Only config found means empty missions; only missions found means
/// missions alone.
fn build_write_set(
    slug: &Slug,
    config: Option<&Value>,
    missions: Option<&Value>,
    context: &ErrorContext,
) -> Result<Vec<CommitFile>, PublishError> {
    let empty_missions = json!({ "missions": [] });
    let missions = match (config, missions) {
        (Some(_), None) => Some(&empty_missions),
        (_, missions) => missions,
    };

    let base = destination_base(slug, Channel::Published);
    let mut admin = Vec::new();
    let mut mirrors = Vec::new();

    for (document, value) in [(Document::Config, config), (Document::Missions, missions)] {
        let Some(value) = value else { continue };
        let content = to_document_json(value, context)?;
        let path = document_path(&base, document);

        if let Some(mirror) = mirror_path(&path, slug) {
            mirrors.push(CommitFile {
                path: mirror,
                content: content.clone(),
            });
        }
        admin.push(CommitFile { path, content });
    }

    admin.extend(mirrors);
    Ok(admin)
}

/// Pretty JSON with a trailing newline.
fn to_document_json(value: &Value, context: &ErrorContext) -> Result<String, PublishError> {
    serde_json::to_string_pretty(value)
        .map(|mut s| {
            s.push('\n');
            s
        })
        .map_err(|e| PublishError::Validation(format!("{}: cannot serialize: {}", context, e)))
}
