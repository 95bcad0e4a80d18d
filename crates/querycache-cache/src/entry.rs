//! Cache entry model and the events emitted around it.

use crate::fingerprint::Fingerprint;
use querycache_core::ResilienceEvent;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// An immutable, cheaply-clonable snapshot of a [`CacheEntry`] returned to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySnapshot {
    pub fingerprint: Fingerprint,
    pub content: Arc<[u8]>,
    pub token_count: usize,
    pub version: String,
    pub size_bytes: usize,
    pub created_at: Instant,
    pub access_count: u64,
}

/// A single cached value.
///
/// `content` and `token_count` are immutable after construction; `access`
/// touches `last_accessed`/`access_count` only. Both fields use atomics so
/// that concurrent readers on the same entry never observe a torn update.
#[derive(Debug)]
pub struct CacheEntry {
    pub fingerprint: Fingerprint,
    pub content: Arc<[u8]>,
    pub token_count: usize,
    pub version: String,
    pub size_bytes: usize,
    pub created_at: Instant,
    last_accessed_nanos: AtomicU64,
    access_count: AtomicU64,
    created_instant: Instant,
}

impl CacheEntry {
    pub fn new(
        fingerprint: Fingerprint,
        content: Arc<[u8]>,
        token_count: usize,
        version: String,
        now: Instant,
    ) -> Self {
        let size_bytes = content.len();
        Self {
            fingerprint,
            content,
            token_count,
            version,
            size_bytes,
            created_at: now,
            last_accessed_nanos: AtomicU64::new(0),
            access_count: AtomicU64::new(0),
            created_instant: now,
        }
    }

    pub fn snapshot(&self) -> EntrySnapshot {
        EntrySnapshot {
            fingerprint: self.fingerprint.clone(),
            content: Arc::clone(&self.content),
            token_count: self.token_count,
            version: self.version.clone(),
            size_bytes: self.size_bytes,
            created_at: self.created_at,
            access_count: self.access_count(),
        }
    }

    pub fn age(&self, now: Instant) -> std::time::Duration {
        now.saturating_duration_since(self.created_instant)
    }

    /// Elapsed time since `last_accessed`, or since creation if never accessed.
    pub fn idle_for(&self, now: Instant) -> std::time::Duration {
        let since_creation = now.saturating_duration_since(self.created_instant);
        let last = self.last_accessed_nanos.load(Ordering::Acquire);
        if last == 0 {
            since_creation
        } else {
            let elapsed_since_access_nanos =
                (since_creation.as_nanos() as u64).saturating_sub(last);
            std::time::Duration::from_nanos(elapsed_since_access_nanos)
        }
    }

    pub fn access_count(&self) -> u64 {
        self.access_count.load(Ordering::Acquire)
    }

    /// Records an access: bumps `access_count` and moves `last_accessed` to `now`.
    pub(crate) fn touch(&self, now: Instant) {
        let nanos_since_creation = now.saturating_duration_since(self.created_instant).as_nanos() as u64;
        self.last_accessed_nanos.store(nanos_since_creation, Ordering::Release);
        self.access_count.fetch_add(1, Ordering::AcqRel);
    }
}

/// The eviction stage responsible for removing an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionStage {
    ExpirySweep,
    Intelligent,
    Emergency,
    Explicit,
}

/// Events emitted by [`crate::store::CacheStore`].
#[derive(Debug)]
pub enum CacheEvent {
    Hit { name: String, timestamp: Instant, fingerprint: Fingerprint },
    Miss { name: String, timestamp: Instant, fingerprint: Fingerprint },
    Store { name: String, timestamp: Instant, fingerprint: Fingerprint, size_bytes: usize },
    Eviction { name: String, timestamp: Instant, fingerprint: Fingerprint, stage: EvictionStage },
    Expiration { name: String, timestamp: Instant, fingerprint: Fingerprint },
}

impl ResilienceEvent for CacheEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::Hit { .. } => "cache_hit",
            Self::Miss { .. } => "cache_miss",
            Self::Store { .. } => "cache_store",
            Self::Eviction { .. } => "cache_eviction",
            Self::Expiration { .. } => "cache_expiration",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            Self::Hit { timestamp, .. }
            | Self::Miss { timestamp, .. }
            | Self::Store { timestamp, .. }
            | Self::Eviction { timestamp, .. }
            | Self::Expiration { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            Self::Hit { name, .. }
            | Self::Miss { name, .. }
            | Self::Store { name, .. }
            | Self::Eviction { name, .. }
            | Self::Expiration { name, .. } => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touch_increments_access_count() {
        let now = Instant::now();
        let entry = CacheEntry::new(Fingerprint::from_raw("a"), Arc::from(vec![1, 2, 3]), 10, "v1".into(), now);
        assert_eq!(entry.access_count(), 0);
        entry.touch(Instant::now());
        entry.touch(Instant::now());
        assert_eq!(entry.access_count(), 2);
    }
}
