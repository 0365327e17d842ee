use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// One cached snapshot with a TTL and explicit invalidation.
///
/// Injected where needed, one instance per resource. Mutation paths call
/// `invalidate`, so the TTL only bounds staleness for writers that bypass
/// this process. The cache is advisory: a poisoned lock reads as a miss.
#[derive(Debug)]
pub struct SnapshotCache<T> {
    entry: Mutex<Option<CachedEntry<T>>>,
    ttl: Duration,
}

#[derive(Debug)]
struct CachedEntry<T> {
    value: Arc<T>,
    stored_at: Instant,
}

impl<T> SnapshotCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entry: Mutex::new(None),
            ttl,
        }
    }

    /// The cached snapshot, unless absent or older than the TTL.
    pub fn get(&self) -> Option<Arc<T>> {
        let guard = self
            .entry
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let entry = guard.as_ref()?;
        if entry.stored_at.elapsed() >= self.ttl {
            return None;
        }
        Some(Arc::clone(&entry.value))
    }

    /// Store a fresh snapshot, returning the shared handle.
    pub fn put(&self, value: T) -> Arc<T> {
        let value = Arc::new(value);
        let mut guard = self
            .entry
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Some(CachedEntry {
            value: Arc::clone(&value),
            stored_at: Instant::now(),
        });
        value
    }

    pub fn invalidate(&self) {
        let mut guard = self
            .entry
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }
}
