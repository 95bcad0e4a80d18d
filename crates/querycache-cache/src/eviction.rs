//! The three-stage eviction policy (§4.1).
//!
//! Stages run in order and stop as soon as enough space has been freed:
//! expiry sweep, intelligent score-based eviction, emergency LRU.

use crate::config::EvictionWeights;
use crate::entry::CacheEntry;
use crate::fingerprint::Fingerprint;
use dashmap::DashMap;
use std::cmp::Ordering;
use std::time::{Duration, Instant};

/// A candidate for removal, carrying just enough to sort and account for it.
struct Candidate {
    fingerprint: Fingerprint,
    size_bytes: usize,
    created_at: Instant,
    score: f64,
}

/// Removes every entry whose age exceeds `ttl`. Always runs to completion;
/// there is no "enough freed" early exit for lazily-expired entries.
pub(crate) fn expiry_sweep(
    map: &DashMap<Fingerprint, CacheEntry>,
    ttl: Duration,
    now: Instant,
) -> Vec<(Fingerprint, usize)> {
    let expired: Vec<Fingerprint> = map
        .iter()
        .filter(|entry| entry.value().age(now) > ttl)
        .map(|entry| entry.key().clone())
        .collect();

    let mut removed = Vec::with_capacity(expired.len());
    for fp in expired {
        if let Some((_, entry)) = map.remove(&fp) {
            removed.push((fp, entry.size_bytes));
        }
    }
    removed
}

/// Scores each remaining entry by `alpha * idle_ratio - beta * ln(1 + access_count)`
/// and removes the highest-scoring entries until `bytes_to_free` is reached.
/// Ties: larger `size_bytes` first, then older `created_at`.
pub(crate) fn intelligent_evict(
    map: &DashMap<Fingerprint, CacheEntry>,
    weights: EvictionWeights,
    ttl: Duration,
    now: Instant,
    bytes_to_free: usize,
) -> Vec<(Fingerprint, usize)> {
    if bytes_to_free == 0 {
        return Vec::new();
    }

    let ttl_secs = ttl.as_secs_f64().max(f64::EPSILON);
    let mut candidates: Vec<Candidate> = map
        .iter()
        .map(|entry| {
            let value = entry.value();
            let idle_ratio = value.idle_for(now).as_secs_f64() / ttl_secs;
            let score = weights.alpha * idle_ratio - weights.beta * (1.0 + value.access_count() as f64).ln();
            Candidate {
                fingerprint: entry.key().clone(),
                size_bytes: value.size_bytes,
                created_at: value.created_at,
                score,
            }
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.size_bytes.cmp(&a.size_bytes))
            .then_with(|| a.created_at.cmp(&b.created_at))
    });

    let mut freed = 0usize;
    let mut removed = Vec::new();
    for candidate in candidates {
        if freed >= bytes_to_free {
            break;
        }
        if let Some((_, entry)) = map.remove(&candidate.fingerprint) {
            freed += entry.size_bytes;
            removed.push((candidate.fingerprint, entry.size_bytes));
        }
    }
    removed
}

/// Pure LRU by `last_accessed`, removing entries until total size is at or
/// below `target_bytes`. The stage of last resort under sustained pressure.
pub(crate) fn emergency_evict(
    map: &DashMap<Fingerprint, CacheEntry>,
    now: Instant,
    current_total: usize,
    target_bytes: usize,
) -> Vec<(Fingerprint, usize)> {
    if current_total <= target_bytes {
        return Vec::new();
    }

    let mut candidates: Vec<Candidate> = map
        .iter()
        .map(|entry| {
            let value = entry.value();
            Candidate {
                fingerprint: entry.key().clone(),
                size_bytes: value.size_bytes,
                created_at: value.created_at,
                score: value.idle_for(now).as_secs_f64(),
            }
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.size_bytes.cmp(&a.size_bytes))
            .then_with(|| a.created_at.cmp(&b.created_at))
    });

    let mut total = current_total;
    let mut removed = Vec::new();
    for candidate in candidates {
        if total <= target_bytes {
            break;
        }
        if let Some((_, entry)) = map.remove(&candidate.fingerprint) {
            total = total.saturating_sub(entry.size_bytes);
            removed.push((candidate.fingerprint, entry.size_bytes));
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert(map: &DashMap<Fingerprint, CacheEntry>, key: &str, size: usize, now: Instant) {
        let fp = Fingerprint::from_raw(key);
        let content: std::sync::Arc<[u8]> = vec![0u8; size].into();
        map.insert(fp.clone(), CacheEntry::new(fp, content, size, "v1".into(), now));
    }

    #[test]
    fn expiry_sweep_removes_only_aged_entries() {
        let map = DashMap::new();
        let now = Instant::now();
        insert(&map, "fresh", 100, now);
        insert(&map, "stale", 100, now - Duration::from_secs(100));

        let removed = expiry_sweep(&map, Duration::from_secs(50), now);
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].0, Fingerprint::from_raw("stale"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn intelligent_evict_prefers_idle_low_access_entries() {
        let map = DashMap::new();
        let now = Instant::now();
        insert(&map, "old_unused", 500, now - Duration::from_secs(3000));
        insert(&map, "new_popular", 500, now - Duration::from_secs(10));
        if let Some(entry) = map.get(&Fingerprint::from_raw("new_popular")) {
            for _ in 0..20 {
                entry.touch(now);
            }
        }

        let removed = intelligent_evict(&map, EvictionWeights::default(), Duration::from_secs(3600), now, 500);
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].0, Fingerprint::from_raw("old_unused"));
    }

    #[test]
    fn emergency_evict_stops_at_target() {
        let map = DashMap::new();
        let now = Instant::now();
        insert(&map, "a", 400, now - Duration::from_secs(5));
        insert(&map, "b", 400, now - Duration::from_secs(1));

        let removed = emergency_evict(&map, now, 800, 500);
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].0, Fingerprint::from_raw("a"));
    }

    #[test]
    fn emergency_evict_noop_under_target() {
        let map = DashMap::new();
        let removed = emergency_evict(&map, Instant::now(), 100, 500);
        assert!(removed.is_empty());
    }
}
