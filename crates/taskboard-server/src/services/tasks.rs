//! Task coordinator: read-through caching and write invalidation
//!
//! The store is the source of truth. The cache only ever changes latency:
//!
//! - reads try the cache, fall back to the store on any cache failure, then
//!   populate the cache best-effort;
//! - writes hit the store first and invalidate the cache entry once the store
//!   answered, unless it answered that the task does not exist;
//! - cache failures never turn into request failures. They are logged and
//!   handed back next to the value as [`CacheFault`]s, never through the
//!   `Err` channel.
//!
//! Concurrent readers and writers can still race: a reader that fetched the
//! old row before a write may populate the cache after the writer invalidated
//! it. That stale entry lives until it expires, so staleness is bounded by
//! the cache TTL.

use crate::cache::TaskCache;
use crate::error::{CacheError, StoreError};
use crate::storage::TaskStore;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use taskboard_types::{Comment, NewTask, Task, TaskQuery};
use tracing::{debug, warn};

/// Default bound on a single cache call
pub const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_millis(200);

/// How the cache took part in serving a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Served from the cache
    Hit,
    /// Served from the store
    Miss,
    /// Write applied; the cache entry was removed or was already absent
    Invalidated,
    /// No cache configured
    Bypass,
    /// The cache misbehaved; the store answered instead
    Error,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
            CacheStatus::Invalidated => "INVALIDATED",
            CacheStatus::Bypass => "BYPASS",
            CacheStatus::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOp {
    Get,
    Set,
    Delete,
}

impl std::fmt::Display for CacheOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheOp::Get => write!(f, "get"),
            CacheOp::Set => write!(f, "set"),
            CacheOp::Delete => write!(f, "delete"),
        }
    }
}

/// A cache failure that was absorbed while serving a request
#[derive(Debug)]
pub struct CacheFault {
    pub op: CacheOp,
    pub task_id: i64,
    pub error: CacheError,
}

impl CacheFault {
    fn log(&self) {
        if self.error.is_benign() {
            debug!(task_id = self.task_id, op = %self.op, "Cache {}: {}", self.op, self.error);
        } else {
            warn!(
                task_id = self.task_id,
                op = %self.op,
                "Cache {} failed, continuing without cache: {}",
                self.op,
                self.error
            );
        }
    }
}

/// Value returned by the coordinator plus what happened on the cache side
#[derive(Debug)]
pub struct Served<T> {
    pub value: T,
    pub cache_status: CacheStatus,
    pub faults: Vec<CacheFault>,
}

impl<T> Served<T> {
    fn new(value: T, cache_status: CacheStatus, faults: Vec<CacheFault>) -> Self {
        Self {
            value,
            cache_status,
            faults,
        }
    }
}

pub struct TaskService {
    store: Arc<dyn TaskStore>,
    cache: Option<Arc<dyn TaskCache>>,
    cache_timeout: Duration,
}

impl TaskService {
    /// `cache: None` runs in store-only mode.
    pub fn new(
        store: Arc<dyn TaskStore>,
        cache: Option<Arc<dyn TaskCache>>,
        cache_timeout: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            cache_timeout,
        }
    }

    pub async fn add_task(&self, task: &NewTask) -> Result<Task, StoreError> {
        self.store.add_task(task).await
    }

    pub async fn get_task(&self, id: i64) -> Result<Served<Task>, StoreError> {
        let Some(cache) = &self.cache else {
            let task = self.store.get_task(id).await?;
            return Ok(Served::new(task, CacheStatus::Bypass, Vec::new()));
        };

        let mut faults = Vec::new();

        match self.bounded(CacheOp::Get, id, cache.get(id)).await {
            Ok(task) => {
                debug!(task_id = id, "Cache hit");
                return Ok(Served::new(task, CacheStatus::Hit, faults));
            }
            Err(fault) => {
                let corrupt = matches!(fault.error, CacheError::Corrupt(_));
                faults.push(fault);

                // drop the unreadable entry so the populate below can replace it
                if corrupt {
                    if let Err(fault) = self.bounded(CacheOp::Delete, id, cache.delete(id)).await {
                        faults.push(fault);
                    }
                }
            }
        }

        let task = self.store.get_task(id).await?;

        if let Err(fault) = self.bounded(CacheOp::Set, id, cache.set(&task)).await {
            faults.push(fault);
        }

        let status = Self::status_for(&faults, CacheStatus::Miss);
        Ok(Served::new(task, status, faults))
    }

    /// Listings always come from the store.
    pub async fn get_selected_tasks(&self, query: &TaskQuery) -> Result<Vec<Task>, StoreError> {
        self.store.get_selected_tasks(query).await
    }

    pub async fn update_task(&self, id: i64, task: &NewTask) -> Result<Served<Task>, StoreError> {
        match self.store.update_task(id, task).await {
            Ok(updated) => Ok(self.invalidate(id, updated).await),
            Err(e) => Err(self.invalidate_after_failure(id, e).await),
        }
    }

    pub async fn delete_task(&self, id: i64) -> Result<Served<()>, StoreError> {
        match self.store.delete_task(id).await {
            Ok(()) => Ok(self.invalidate(id, ()).await),
            Err(e) => Err(self.invalidate_after_failure(id, e).await),
        }
    }

    /// A cached aggregate would hide the new comment, so the owning task's
    /// entry is invalidated like any other write.
    pub async fn add_comment(
        &self,
        task_id: i64,
        author: i64,
        text: &str,
    ) -> Result<Served<Comment>, StoreError> {
        match self.store.add_comment(task_id, author, text).await {
            Ok(comment) => Ok(self.invalidate(task_id, comment).await),
            Err(e) => Err(self.invalidate_after_failure(task_id, e).await),
        }
    }

    /// Only a missing task proves the write did not happen. Any other store
    /// failure may have left it applied, so the entry is dropped as well.
    async fn invalidate_after_failure(&self, id: i64, error: StoreError) -> StoreError {
        if !matches!(error, StoreError::TaskNotFound(_)) {
            self.invalidate(id, ()).await;
        }
        error
    }

    async fn invalidate<T>(&self, id: i64, value: T) -> Served<T> {
        let Some(cache) = &self.cache else {
            return Served::new(value, CacheStatus::Bypass, Vec::new());
        };

        let mut faults = Vec::new();
        if let Err(fault) = self.bounded(CacheOp::Delete, id, cache.delete(id)).await {
            faults.push(fault);
        }

        let status = Self::status_for(&faults, CacheStatus::Invalidated);
        Served::new(value, status, faults)
    }

    /// Run one cache call under the timeout, logging whatever goes wrong.
    async fn bounded<T, F>(&self, op: CacheOp, task_id: i64, call: F) -> Result<T, CacheFault>
    where
        F: Future<Output = Result<T, CacheError>>,
    {
        let error = match tokio::time::timeout(self.cache_timeout, call).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => e,
            Err(_) => CacheError::Timeout(self.cache_timeout),
        };

        let fault = CacheFault {
            op,
            task_id,
            error,
        };
        fault.log();
        Err(fault)
    }

    fn status_for(faults: &[CacheFault], otherwise: CacheStatus) -> CacheStatus {
        if faults.iter().any(|f| !f.error.is_benign()) {
            CacheStatus::Error
        } else {
            otherwise
        }
    }
}
