//! Configuration for [`crate::store::CacheStore`].

use crate::entry::CacheEvent;
use querycache_core::{EventListeners, FnListener};
use std::time::Duration;

/// Relative weighting of recency vs. access-frequency in the intelligent
/// eviction stage's score: `score = alpha * idle_ratio - beta * ln(1 + access_count)`.
///
/// The source left this weighting unpinned (see DESIGN.md); exposing it as
/// configuration rather than hardcoding it is the chosen resolution.
#[derive(Debug, Clone, Copy)]
pub struct EvictionWeights {
    pub alpha: f64,
    pub beta: f64,
}

impl Default for EvictionWeights {
    fn default() -> Self {
        Self { alpha: 1.0, beta: 0.5 }
    }
}

/// Configuration for a [`crate::store::CacheStore`].
pub struct CacheConfig {
    pub(crate) version: String,
    pub(crate) min_tokens: usize,
    pub(crate) max_size_bytes: usize,
    pub(crate) ttl: Duration,
    pub(crate) pressure_threshold: f64,
    pub(crate) emergency_target: f64,
    pub(crate) hit_latency_target: Duration,
    pub(crate) miss_latency_target: Duration,
    pub(crate) baseline_tokens: usize,
    pub(crate) token_cost: f64,
    pub(crate) eviction_weights: EvictionWeights,
    pub(crate) event_listeners: EventListeners<CacheEvent>,
    pub(crate) name: String,
}

impl CacheConfig {
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::new()
    }
}

/// Builder for [`CacheConfig`]. Defaults mirror §6 of the specification.
pub struct CacheConfigBuilder {
    version: String,
    min_tokens: usize,
    max_size_bytes: usize,
    ttl: Duration,
    pressure_threshold: f64,
    emergency_target: f64,
    hit_latency_target: Duration,
    miss_latency_target: Duration,
    baseline_tokens: usize,
    token_cost: f64,
    eviction_weights: EvictionWeights,
    event_listeners: EventListeners<CacheEvent>,
    name: String,
}

impl CacheConfigBuilder {
    pub fn new() -> Self {
        Self {
            version: "v1".to_string(),
            min_tokens: 500,
            max_size_bytes: 10 * 1024 * 1024,
            ttl: Duration::from_secs(3600),
            pressure_threshold: 0.80,
            emergency_target: 0.70,
            hit_latency_target: Duration::from_millis(48),
            miss_latency_target: Duration::from_millis(140),
            baseline_tokens: 1500,
            token_cost: 0.0,
            eviction_weights: EvictionWeights::default(),
            event_listeners: EventListeners::new(),
            name: String::from("<unnamed>"),
        }
    }

    /// Cache namespace prefix. Entries stored under a different version are invisible.
    ///
    /// Default: `"v1"`
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Minimum tokens an entry must have to be cached.
    ///
    /// Default: 500
    pub fn min_tokens(mut self, min_tokens: usize) -> Self {
        self.min_tokens = min_tokens;
        self
    }

    /// Maximum total bytes held across all entries before eviction runs.
    ///
    /// Default: 10 MiB
    pub fn max_size_bytes(mut self, max_size_bytes: usize) -> Self {
        self.max_size_bytes = max_size_bytes;
        self
    }

    /// Entry time-to-live.
    ///
    /// Default: 3600s
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Fraction of `max_size_bytes` at which preemptive eviction runs.
    ///
    /// Default: 0.80
    pub fn pressure_threshold(mut self, threshold: f64) -> Self {
        self.pressure_threshold = threshold;
        self
    }

    /// Fraction of `max_size_bytes` the emergency LRU stage drives size down to.
    ///
    /// Default: 0.70
    pub fn emergency_target(mut self, target: f64) -> Self {
        self.emergency_target = target;
        self
    }

    pub fn hit_latency_target(mut self, target: Duration) -> Self {
        self.hit_latency_target = target;
        self
    }

    pub fn miss_latency_target(mut self, target: Duration) -> Self {
        self.miss_latency_target = target;
        self
    }

    /// Baseline token cost used by the (informational) cost-savings model.
    ///
    /// Default: 1500
    pub fn baseline_tokens(mut self, tokens: usize) -> Self {
        self.baseline_tokens = tokens;
        self
    }

    /// Per-token dollar cost used by the (informational) cost-savings model.
    pub fn token_cost(mut self, cost: f64) -> Self {
        self.token_cost = cost;
        self
    }

    /// Weighting of recency vs. frequency in the intelligent eviction stage.
    ///
    /// Default: `alpha=1.0, beta=0.5`
    pub fn eviction_weights(mut self, weights: EvictionWeights) -> Self {
        self.eviction_weights = weights;
        self
    }

    /// Human-readable name for observability.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn on_hit<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &CacheEvent| {
            if matches!(event, CacheEvent::Hit { .. }) {
                f();
            }
        }));
        self
    }

    pub fn on_miss<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &CacheEvent| {
            if matches!(event, CacheEvent::Miss { .. }) {
                f();
            }
        }));
        self
    }

    pub fn on_eviction<F>(mut self, f: F) -> Self
    where
        F: Fn(crate::entry::EvictionStage) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &CacheEvent| {
            if let CacheEvent::Eviction { stage, .. } = event {
                f(*stage);
            }
        }));
        self
    }

    pub fn build(self) -> CacheConfig {
        CacheConfig {
            version: self.version,
            min_tokens: self.min_tokens,
            max_size_bytes: self.max_size_bytes,
            ttl: self.ttl,
            pressure_threshold: self.pressure_threshold,
            emergency_target: self.emergency_target,
            hit_latency_target: self.hit_latency_target,
            miss_latency_target: self.miss_latency_target,
            baseline_tokens: self.baseline_tokens,
            token_cost: self.token_cost,
            eviction_weights: self.eviction_weights,
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }
}

impl Default for CacheConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_specification() {
        let config = CacheConfig::builder().build();
        assert_eq!(config.version, "v1");
        assert_eq!(config.min_tokens, 500);
        assert_eq!(config.max_size_bytes, 10 * 1024 * 1024);
        assert_eq!(config.ttl, Duration::from_secs(3600));
        assert_eq!(config.pressure_threshold, 0.80);
        assert_eq!(config.emergency_target, 0.70);
    }

    #[test]
    fn builder_overrides_apply() {
        let config = CacheConfig::builder().min_tokens(10).max_size_bytes(1000).build();
        assert_eq!(config.min_tokens, 10);
        assert_eq!(config.max_size_bytes, 1000);
    }
}
