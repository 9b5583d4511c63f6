//! store::branch_cache
//!
//! Time-boxed cache of a resolved branch head.
//!
//! # Design
//!
//! The cache is a plain value owned by its caller. There is no process-wide
//! state: whoever needs a cached branch ref holds a `BranchCache`, and the
//! current time is passed in explicitly so the staleness window can be
//! tested without sleeping.
//!
//! Save and Publish never use this cache; they resolve the branch on every
//! request. Only read-only status reporting does.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use chrono::Utc;
//! use trailhead::store::branch_cache::BranchCache;
//! use trailhead::store::BranchRef;
//!
//! let mut cache = BranchCache::new(Duration::from_secs(30));
//! let now = Utc::now();
//! assert!(cache.get(now).is_none());
//!
//! cache.put(BranchRef { name: "main".into(), sha: "abc".into() }, now);
//! assert_eq!(cache.get(now).map(|b| b.sha.as_str()), Some("abc"));
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::traits::{BranchRef, ContentStore, StoreError};

/// A cached branch ref and when it was fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CachedBranch {
    /// The resolved branch
    pub branch: BranchRef,
    /// When it was resolved
    pub fetched_at: DateTime<Utc>,
}

impl CachedBranch {
    /// Whether this entry is still within `ttl` at `now`.
    ///
    /// Entries timestamped in the future are treated as expired.
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        match (now - self.fetched_at).to_std() {
            Ok(age) => age < ttl,
            Err(_) => false,
        }
    }
}

/// Result of [`BranchCache::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedBranch {
    /// The branch ref
    pub branch: BranchRef,
    /// When it was fetched from the store
    pub fetched_at: DateTime<Utc>,
    /// Whether it was served from the cache
    pub cached: bool,
}

/// Single-entry branch cache with an explicit TTL.
#[derive(Debug, Clone)]
pub struct BranchCache {
    ttl: Duration,
    entry: Option<CachedBranch>,
}

impl BranchCache {
    /// Create an empty cache. A zero TTL disables caching.
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    /// The configured TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get the cached branch if it is still fresh at `now`.
    pub fn get(&self, now: DateTime<Utc>) -> Option<&BranchRef> {
        self.entry
            .as_ref()
            .filter(|e| e.is_fresh(self.ttl, now))
            .map(|e| &e.branch)
    }

    /// Store a freshly resolved branch.
    pub fn put(&mut self, branch: BranchRef, now: DateTime<Utc>) {
        self.entry = Some(CachedBranch {
            branch,
            fetched_at: now,
        });
    }

    /// Drop the cached entry.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// The cached entry as a resolution result, if it is still fresh at `now`.
    pub fn lookup(&self, now: DateTime<Utc>) -> Option<ResolvedBranch> {
        self.entry
            .as_ref()
            .filter(|e| e.is_fresh(self.ttl, now))
            .map(|e| ResolvedBranch {
                branch: e.branch.clone(),
                fetched_at: e.fetched_at,
                cached: true,
            })
    }

    /// Record the outcome of a store resolution made at `now`.
    ///
    /// Success replaces the entry; failure invalidates it.
    pub fn settle(
        &mut self,
        result: Result<BranchRef, StoreError>,
        now: DateTime<Utc>,
    ) -> Result<ResolvedBranch, StoreError> {
        match result {
            Ok(branch) => {
                self.put(branch.clone(), now);
                Ok(ResolvedBranch {
                    branch,
                    fetched_at: now,
                    cached: false,
                })
            }
            Err(e) => {
                self.invalidate();
                Err(e)
            }
        }
    }

    /// Return the cached branch, resolving through the store when missing
    /// or stale.
    ///
    /// A failed resolution invalidates the cache.
    pub async fn resolve(
        &mut self,
        store: &dyn ContentStore,
        now: DateTime<Utc>,
    ) -> Result<ResolvedBranch, StoreError> {
        if let Some(hit) = self.lookup(now) {
            return Ok(hit);
        }
        let result = store.resolve_branch().await;
        self.settle(result, now)
    }
}
