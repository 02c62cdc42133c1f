//! Task cache
//!
//! A time-bounded copy of task reads. Never authoritative: losing an entry
//! only costs a store round trip. Entries are created by read-through
//! population and removed by write invalidation or expiry.

pub mod memory;
pub mod redis;

pub use self::memory::MemoryCache;
pub use self::redis::RedisCache;

use crate::error::CacheError;
use async_trait::async_trait;
use std::collections::HashMap;
use taskboard_types::{Comment, Task};

#[async_trait]
pub trait TaskCache: Send + Sync {
    /// Populate the entry for `task.id`.
    ///
    /// Fails with `AlreadyExists` if a live entry is present; entries are
    /// never overwritten in place.
    async fn set(&self, task: &Task) -> Result<(), CacheError>;

    /// `NotFound` when absent or expired.
    async fn get(&self, id: i64) -> Result<Task, CacheError>;

    /// `NotFound` when there was nothing to remove.
    async fn delete(&self, id: i64) -> Result<(), CacheError>;
}

/// Flat projection of a task as held by a cache backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedTask {
    pub name: String,
    pub description: String,
    /// JSON array of comments
    pub comments: String,
}

impl CachedTask {
    pub const FIELD_NAME: &'static str = "name";
    pub const FIELD_DESCRIPTION: &'static str = "description";
    pub const FIELD_COMMENTS: &'static str = "comments";

    pub fn from_task(task: &Task) -> Result<Self, CacheError> {
        Ok(Self {
            name: task.name.clone(),
            description: task.description.clone(),
            comments: serde_json::to_string(&task.comments)?,
        })
    }

    pub fn to_task(&self, id: i64) -> Result<Task, CacheError> {
        let comments: Vec<Comment> = serde_json::from_str(&self.comments)?;
        Ok(Task {
            id,
            name: self.name.clone(),
            description: self.description.clone(),
            comments,
        })
    }

    /// Rebuild from a field map such as a Redis hash.
    pub fn from_fields(mut fields: HashMap<String, String>) -> Result<Self, CacheError> {
        let mut take = |field: &str| {
            fields
                .remove(field)
                .ok_or_else(|| CacheError::Corrupt(format!("missing field '{}'", field)))
        };

        Ok(Self {
            name: take(Self::FIELD_NAME)?,
            description: take(Self::FIELD_DESCRIPTION)?,
            comments: take(Self::FIELD_COMMENTS)?,
        })
    }
}

pub fn task_key(id: i64) -> String {
    format!("task:{}", id)
}
