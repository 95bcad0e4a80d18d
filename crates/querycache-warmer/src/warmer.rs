//! Pattern-driven cache pre-population (§4.8 Warmer).
//!
//! A run fetches each seed query through a caller-supplied [`WarmSource`],
//! pads under-sized content automatically, and stores the result through a
//! [`ResilientCache`] so warming observes the same breaker/eviction rules as
//! any other write. In-flight concurrency is capped the same way the
//! executor caps tool calls: a `tokio::sync::Semaphore` sized to `concurrency`.

use crate::config::WarmerConfig;
use crate::events::WarmerEvent;
use crate::padder::{ContentType, Padder};
use futures::future::BoxFuture;
use querycache_cache::{ContentHasher, TokenEstimator};
use querycache_resilient::{ResilientCache, StoreOutcome};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// One query to pre-populate, with the content-type hint used if padding is
/// needed.
#[derive(Debug, Clone)]
pub struct SeedQuery {
    pub text: String,
    pub content_type: ContentType,
}

impl SeedQuery {
    pub fn new(text: impl Into<String>, content_type: ContentType) -> Self {
        Self { text: text.into(), content_type }
    }
}

/// Produces content for a seed query. An explicit trait per source, never
/// runtime introspection, mirroring the executor's `ToolHandler` seam.
pub trait WarmSource: Send + Sync {
    fn fetch(&self, query: &str) -> BoxFuture<'static, Result<String, String>>;
}

impl<F> WarmSource for F
where
    F: Fn(&str) -> BoxFuture<'static, Result<String, String>> + Send + Sync,
{
    fn fetch(&self, query: &str) -> BoxFuture<'static, Result<String, String>> {
        (self)(query)
    }
}

/// Outcome counters for one warming run (§4.8).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarmerReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub entries_added: usize,
    pub tokens_added: usize,
    pub elapsed: Duration,
}

pub struct Warmer {
    cache: Arc<ResilientCache>,
    source: Arc<dyn WarmSource>,
    hasher: ContentHasher,
    estimator: TokenEstimator,
    padder: Padder,
    config: WarmerConfig,
}

impl Warmer {
    pub fn new(cache: Arc<ResilientCache>, source: impl WarmSource + 'static, config: WarmerConfig) -> Self {
        Self {
            cache,
            source: Arc::new(source),
            hasher: ContentHasher::new(),
            estimator: TokenEstimator::new(),
            padder: Padder::new(),
            config,
        }
    }

    fn emit(&self, event: WarmerEvent) {
        self.config.event_listeners.emit(&event);
    }

    /// Applies the adaptive rule from §4.8 to `seeds.len()`, yielding the
    /// number of seeds this run will actually attempt.
    fn effective_max_queries(&self) -> usize {
        if !self.config.adaptive {
            return self.config.max_queries;
        }

        let snapshot = self.cache.store_ref().metrics();
        let utilization = if snapshot.max_size_bytes == 0 {
            0.0
        } else {
            snapshot.total_size_bytes as f64 / snapshot.max_size_bytes as f64
        };
        let total_lookups = snapshot.hits + snapshot.misses;
        let hit_rate = if total_lookups == 0 {
            1.0
        } else {
            snapshot.hits as f64 / total_lookups as f64
        };

        if hit_rate < self.config.target_hit_rate && utilization < 0.8 {
            self.config.max_queries * 2
        } else if utilization > 0.8 {
            self.config.max_queries.min(10)
        } else {
            self.config.max_queries
        }
    }

    /// Runs the warmer against `seeds`, bounded by the adaptive cap and
    /// `concurrency` in-flight fetches at a time.
    pub async fn run(&self, seeds: &[SeedQuery]) -> WarmerReport {
        let start = Instant::now();
        let limit = self.effective_max_queries();
        let planned: Vec<&SeedQuery> = seeds.iter().take(limit).collect();

        self.emit(WarmerEvent::RunStarted {
            pattern_name: self.config.name.clone(),
            timestamp: Instant::now(),
            planned: planned.len(),
        });

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let futures = planned.into_iter().map(|seed| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                let _permit = semaphore.acquire().await.expect("semaphore never closed");
                self.warm_one(seed).await
            }
        });
        let results = futures::future::join_all(futures).await;

        let attempted = results.len();
        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        let failed = attempted - succeeded;
        let entries_added = succeeded;
        let tokens_added = results.iter().filter_map(|r| r.as_ref().ok()).sum();
        let elapsed = start.elapsed();

        self.emit(WarmerEvent::RunFinished {
            pattern_name: self.config.name.clone(),
            timestamp: Instant::now(),
            attempted,
            succeeded,
            elapsed,
        });

        WarmerReport { attempted, succeeded, failed, entries_added, tokens_added, elapsed }
    }

    /// Fetches, pads if necessary, and stores one seed. Returns the number
    /// of tokens the stored entry carries on success.
    async fn warm_one(&self, seed: &SeedQuery) -> Result<usize, String> {
        let content = self.source.fetch(&seed.text).await.map_err(|reason| {
            self.emit(WarmerEvent::QueryFailed {
                pattern_name: self.config.name.clone(),
                timestamp: Instant::now(),
                query: seed.text.clone(),
                reason: reason.clone(),
            });
            reason
        })?;

        let min_tokens = self.cache.store_ref().min_tokens();
        let tokens = self.estimator.estimate(content.as_bytes());
        let body = if tokens < min_tokens {
            self.padder.pad(&content, seed.content_type, min_tokens)
        } else {
            content
        };
        let token_count = self.estimator.estimate(body.as_bytes());

        let fingerprint = self.hasher.fingerprint(&seed.text);
        let bytes: Arc<[u8]> = Arc::from(body.into_bytes());
        match self.cache.store(fingerprint, bytes, &self.version()).await {
            Ok(StoreOutcome::Stored(_)) => {
                self.emit(WarmerEvent::QueryWarmed {
                    pattern_name: self.config.name.clone(),
                    timestamp: Instant::now(),
                    query: seed.text.clone(),
                    tokens_added: token_count,
                });
                Ok(token_count)
            }
            Ok(StoreOutcome::Skipped) => {
                let reason = "breaker open, store skipped".to_string();
                self.emit(WarmerEvent::QueryFailed {
                    pattern_name: self.config.name.clone(),
                    timestamp: Instant::now(),
                    query: seed.text.clone(),
                    reason: reason.clone(),
                });
                Err(reason)
            }
            Err(err) => {
                let reason = err.to_string();
                self.emit(WarmerEvent::QueryFailed {
                    pattern_name: self.config.name.clone(),
                    timestamp: Instant::now(),
                    query: seed.text.clone(),
                    reason: reason.clone(),
                });
                Err(reason)
            }
        }
    }

    fn version(&self) -> String {
        self.cache.store_ref().version().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use querycache_cache::{CacheConfig, CacheStore};
    use querycache_circuitbreaker::{CircuitBreaker, CircuitBreakerConfig};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cache(min_tokens: usize) -> Arc<ResilientCache> {
        let store = Arc::new(CacheStore::new(CacheConfig::builder().min_tokens(min_tokens).build()));
        let breaker = Arc::new(CircuitBreaker::new(CircuitBreakerConfig::builder().build()));
        Arc::new(ResilientCache::new(store, breaker))
    }

    fn constant_source(body: &'static str) -> impl WarmSource {
        move |_: &str| -> BoxFuture<'static, Result<String, String>> { Box::pin(async move { Ok(body.to_string()) }) }
    }

    #[tokio::test]
    async fn warms_seeds_and_reports_counts() {
        let warmer = Warmer::new(cache(1), constant_source("hello"), WarmerConfig::builder().adaptive(false).build());
        let seeds = vec![SeedQuery::new("q1", ContentType::Generic), SeedQuery::new("q2", ContentType::Generic)];
        let report = warmer.run(&seeds).await;
        assert_eq!(report.attempted, 2);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(report.entries_added, 2);
        assert!(report.tokens_added > 0);
    }

    #[tokio::test]
    async fn under_threshold_content_is_padded_before_storing() {
        let warmer =
            Warmer::new(cache(500), constant_source("too short"), WarmerConfig::builder().adaptive(false).build());
        let report = warmer.run(&[SeedQuery::new("q1", ContentType::Sql)]).await;
        assert_eq!(report.succeeded, 1);
    }

    #[tokio::test]
    async fn fetch_failure_counts_as_failed_not_succeeded() {
        let failing = |_: &str| -> BoxFuture<'static, Result<String, String>> {
            Box::pin(async move { Err("upstream unavailable".to_string()) })
        };
        let warmer = Warmer::new(cache(1), failing, WarmerConfig::builder().adaptive(false).build());
        let report = warmer.run(&[SeedQuery::new("q1", ContentType::Generic)]).await;
        assert_eq!(report.attempted, 1);
        assert_eq!(report.succeeded, 0);
        assert_eq!(report.failed, 1);
    }

    #[tokio::test]
    async fn concurrency_cap_limits_in_flight_fetches() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_observed = Arc::new(AtomicUsize::new(0));
        let in_flight_clone = Arc::clone(&in_flight);
        let max_observed_clone = Arc::clone(&max_observed);
        let source = move |_: &str| -> BoxFuture<'static, Result<String, String>> {
            let in_flight = Arc::clone(&in_flight_clone);
            let max_observed = Arc::clone(&max_observed_clone);
            Box::pin(async move {
                let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_observed.fetch_max(current, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok("content".to_string())
            })
        };

        let warmer =
            Warmer::new(cache(1), source, WarmerConfig::builder().adaptive(false).concurrency(2).build());
        let seeds: Vec<SeedQuery> = (0..6).map(|i| SeedQuery::new(format!("q{i}"), ContentType::Generic)).collect();
        warmer.run(&seeds).await;
        assert!(max_observed.load(Ordering::SeqCst) <= 2);
    }
}
