//! In-process task cache using DashMap

use super::{CachedTask, TaskCache};
use crate::error::CacheError;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use taskboard_types::Task;
use tokio::time::Instant;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Task cache with a fixed TTL per entry.
///
/// Expiry is enforced here: an expired entry is invisible to `get`, `set`
/// and `delete` even before the background sweep removes it.
pub struct MemoryCache {
    entries: Arc<DashMap<i64, Slot>>,
    ttl: Duration,
}

struct Slot {
    task: CachedTask,
    expires_at: Instant,
}

impl Slot {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

impl MemoryCache {
    /// Must be called inside a Tokio runtime (starts the sweep task).
    pub fn new(ttl: Duration) -> Self {
        let cache = Self {
            entries: Arc::new(DashMap::new()),
            ttl,
        };

        cache.start_sweep_task();

        cache
    }

    /// Number of stored entries, expired ones included until swept
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn start_sweep_task(&self) {
        let entries: Weak<DashMap<i64, Slot>> = Arc::downgrade(&self.entries);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                interval.tick().await;

                // cache dropped
                let Some(entries) = entries.upgrade() else {
                    break;
                };

                let now = Instant::now();
                entries.retain(|_, slot| slot.is_live(now));
            }
        });
    }
}

#[async_trait]
impl TaskCache for MemoryCache {
    async fn set(&self, task: &Task) -> Result<(), CacheError> {
        let cached = CachedTask::from_task(task)?;
        let now = Instant::now();
        let slot = Slot {
            task: cached,
            expires_at: now + self.ttl,
        };

        match self.entries.entry(task.id) {
            Entry::Occupied(occupied) if occupied.get().is_live(now) => {
                Err(CacheError::AlreadyExists(task.id))
            }
            Entry::Occupied(mut occupied) => {
                occupied.insert(slot);
                Ok(())
            }
            Entry::Vacant(vacant) => {
                vacant.insert(slot);
                Ok(())
            }
        }
    }

    async fn get(&self, id: i64) -> Result<Task, CacheError> {
        let now = Instant::now();

        let cached = match self.entries.get(&id) {
            Some(slot) if slot.is_live(now) => slot.task.clone(),
            Some(slot) => {
                drop(slot);
                self.entries.remove_if(&id, |_, slot| !slot.is_live(now));
                return Err(CacheError::NotFound(id));
            }
            None => return Err(CacheError::NotFound(id)),
        };

        cached.to_task(id)
    }

    async fn delete(&self, id: i64) -> Result<(), CacheError> {
        match self.entries.remove(&id) {
            Some((_, slot)) if slot.is_live(Instant::now()) => Ok(()),
            _ => Err(CacheError::NotFound(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_basic_operations() {
        let cache = MemoryCache::new(Duration::from_secs(60));
        let task = Task::new(1, "Alpha", "first");

        cache.set(&task).await.unwrap();
        assert_eq!(cache.get(1).await.unwrap(), task);

        assert!(matches!(cache.get(2).await, Err(CacheError::NotFound(2))));

        cache.delete(1).await.unwrap();
        assert!(matches!(cache.get(1).await, Err(CacheError::NotFound(1))));
        assert!(matches!(cache.delete(1).await, Err(CacheError::NotFound(1))));
    }

    #[tokio::test]
    async fn test_set_never_overwrites() {
        let cache = MemoryCache::new(Duration::from_secs(60));

        cache.set(&Task::new(1, "Alpha", "first")).await.unwrap();
        let second = cache.set(&Task::new(1, "Beta", "second")).await;

        assert!(matches!(second, Err(CacheError::AlreadyExists(1))));
        assert_eq!(cache.get(1).await.unwrap().name, "Alpha");
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl() {
        let cache = MemoryCache::new(Duration::from_secs(3600));
        cache.set(&Task::new(1, "Alpha", "first")).await.unwrap();

        tokio::time::advance(Duration::from_secs(3599)).await;
        assert!(cache.get(1).await.is_ok());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(matches!(cache.get(1).await, Err(CacheError::NotFound(1))));
        assert!(matches!(cache.delete(1).await, Err(CacheError::NotFound(1))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_can_be_repopulated() {
        let cache = MemoryCache::new(Duration::from_secs(10));
        cache.set(&Task::new(1, "Alpha", "first")).await.unwrap();

        tokio::time::advance(Duration::from_secs(11)).await;

        cache.set(&Task::new(1, "Beta", "second")).await.unwrap();
        assert_eq!(cache.get(1).await.unwrap().name, "Beta");
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_removes_expired() {
        let cache = MemoryCache::new(Duration::from_secs(5));
        cache.set(&Task::new(1, "Alpha", "first")).await.unwrap();
        cache.set(&Task::new(2, "Beta", "second")).await.unwrap();
        assert_eq!(cache.len(), 2);

        tokio::time::sleep(SWEEP_INTERVAL + Duration::from_secs(1)).await;

        assert!(cache.is_empty());
    }
}
