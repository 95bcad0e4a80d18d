//! Configuration for [`crate::warmer::Warmer`] (§6 warmer-adjacent keys, §4.8).

use crate::events::WarmerEvent;
use querycache_core::{EventListeners, FnListener};

pub struct WarmerConfig {
    pub(crate) max_queries: usize,
    pub(crate) concurrency: usize,
    pub(crate) adaptive: bool,
    pub(crate) target_hit_rate: f64,
    pub(crate) event_listeners: EventListeners<WarmerEvent>,
    pub(crate) name: String,
}

impl WarmerConfig {
    pub fn builder() -> WarmerConfigBuilder {
        WarmerConfigBuilder::new()
    }
}

/// Builder for [`WarmerConfig`].
pub struct WarmerConfigBuilder {
    max_queries: usize,
    concurrency: usize,
    adaptive: bool,
    target_hit_rate: f64,
    event_listeners: EventListeners<WarmerEvent>,
    name: String,
}

impl Default for WarmerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WarmerConfigBuilder {
    pub fn new() -> Self {
        Self {
            max_queries: 50,
            concurrency: 4,
            adaptive: true,
            target_hit_rate: 0.80,
            event_listeners: EventListeners::new(),
            name: String::from("<unnamed>"),
        }
    }

    /// Upper bound on seed queries warmed in one run (subject to the
    /// adaptive rule in §4.8). Default: 50.
    pub fn max_queries(mut self, n: usize) -> Self {
        self.max_queries = n;
        self
    }

    /// Bounded in-flight fetch concurrency (§5 backpressure). Default: 4.
    pub fn concurrency(mut self, n: usize) -> Self {
        self.concurrency = n;
        self
    }

    /// Whether `max_queries` is adjusted by current hit rate and memory
    /// pressure. Default: true.
    pub fn adaptive(mut self, adaptive: bool) -> Self {
        self.adaptive = adaptive;
        self
    }

    /// Hit-rate target the adaptive rule compares against. Default: 0.80.
    pub fn target_hit_rate(mut self, target: f64) -> Self {
        self.target_hit_rate = target;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn on_query_warmed<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &WarmerEvent| {
            if let WarmerEvent::QueryWarmed { query, tokens_added, .. } = event {
                f(query, *tokens_added);
            }
        }));
        self
    }

    pub fn on_query_failed<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &WarmerEvent| {
            if let WarmerEvent::QueryFailed { query, reason, .. } = event {
                f(query, reason);
            }
        }));
        self
    }

    pub fn build(self) -> WarmerConfig {
        WarmerConfig {
            max_queries: self.max_queries,
            concurrency: self.concurrency,
            adaptive: self.adaptive,
            target_hit_rate: self.target_hit_rate,
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_specification() {
        let config = WarmerConfig::builder().build();
        assert_eq!(config.max_queries, 50);
        assert_eq!(config.concurrency, 4);
        assert!(config.adaptive);
        assert_eq!(config.target_hit_rate, 0.80);
    }
}
