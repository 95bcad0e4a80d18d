//! Monotonic counters and the derived metrics snapshot (§4.1).

use crate::entry::EvictionStage;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug, Default)]
pub(crate) struct CacheCounters {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub stores: AtomicU64,
    pub evictions_expiry: AtomicU64,
    pub evictions_intelligent: AtomicU64,
    pub evictions_emergency: AtomicU64,
    pub evictions_explicit: AtomicU64,
    pub expirations: AtomicU64,
    pub hit_latency_nanos_total: AtomicU64,
    pub miss_latency_nanos_total: AtomicU64,
    pub miss_tokens_total: AtomicU64,
}

impl CacheCounters {
    pub fn record_hit(&self, latency: Duration) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        self.hit_latency_nanos_total
            .fetch_add(latency.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn record_miss(&self, latency: Duration) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        self.miss_latency_nanos_total
            .fetch_add(latency.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn record_store(&self) {
        self.stores.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self, stage: EvictionStage, count: u64) {
        let counter = match stage {
            EvictionStage::ExpirySweep => &self.evictions_expiry,
            EvictionStage::Intelligent => &self.evictions_intelligent,
            EvictionStage::Emergency => &self.evictions_emergency,
            EvictionStage::Explicit => &self.evictions_explicit,
        };
        counter.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_expiration(&self, count: u64) {
        self.expirations.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_miss_tokens(&self, tokens: u64) {
        self.miss_tokens_total.fetch_add(tokens, Ordering::Relaxed);
    }
}

/// A point-in-time metrics snapshot.
///
/// Each counter is read atomically; the snapshot as a whole is not a single
/// atomic transaction across counters (§5 ordering guarantees).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheMetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub stores: u64,
    pub evictions_expiry: u64,
    pub evictions_intelligent: u64,
    pub evictions_emergency: u64,
    pub evictions_explicit: u64,
    pub expirations: u64,
    pub current_entries: usize,
    pub total_size_bytes: usize,
    pub max_size_bytes: usize,
    pub avg_hit_latency: Duration,
    pub avg_miss_latency: Duration,
    pub estimated_cost_savings: f64,
}

impl CacheMetricsSnapshot {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn miss_rate(&self) -> f64 {
        1.0 - self.hit_rate()
    }

    pub fn eviction_rate(&self) -> f64 {
        let evictions = self.evictions_expiry + self.evictions_intelligent + self.evictions_emergency;
        if self.stores == 0 {
            0.0
        } else {
            evictions as f64 / self.stores as f64
        }
    }

    pub fn memory_pressure(&self) -> f64 {
        if self.max_size_bytes == 0 {
            0.0
        } else {
            self.total_size_bytes as f64 / self.max_size_bytes as f64
        }
    }
}

/// Implements the cost-savings model from §4.1.
pub(crate) fn cost_savings(
    hits: u64,
    misses: u64,
    baseline_tokens: usize,
    token_cost: f64,
    avg_tokens_miss: f64,
) -> f64 {
    let baseline_tokens = baseline_tokens as f64;
    hits as f64 * 0.95 * baseline_tokens * token_cost + misses as f64 * 0.30 * avg_tokens_miss * token_cost
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_rate_with_no_traffic_is_zero() {
        let snapshot = CacheMetricsSnapshot {
            hits: 0,
            misses: 0,
            stores: 0,
            evictions_expiry: 0,
            evictions_intelligent: 0,
            evictions_emergency: 0,
            evictions_explicit: 0,
            expirations: 0,
            current_entries: 0,
            total_size_bytes: 0,
            max_size_bytes: 100,
            avg_hit_latency: Duration::ZERO,
            avg_miss_latency: Duration::ZERO,
            estimated_cost_savings: 0.0,
        };
        assert_eq!(snapshot.hit_rate(), 0.0);
        assert_eq!(snapshot.memory_pressure(), 0.0);
    }

    #[test]
    fn cost_savings_formula_matches_specification() {
        let savings = cost_savings(10, 5, 1500, 0.01, 800.0);
        let expected = 10.0 * 0.95 * 1500.0 * 0.01 + 5.0 * 0.30 * 800.0 * 0.01;
        assert!((savings - expected).abs() < f64::EPSILON);
    }

    #[test]
    fn counters_are_monotonic() {
        let counters = CacheCounters::default();
        counters.record_hit(Duration::from_millis(1));
        counters.record_hit(Duration::from_millis(1));
        assert_eq!(counters.hits.load(Ordering::Relaxed), 2);
    }
}
