//! End-to-end scenarios (spec §8), exercised against the `full`-featured
//! `querycache` facade rather than any one crate in isolation.

use querycache::cache::{CacheConfig, CacheStore, ContentHasher, TokenEstimator};
use querycache::circuitbreaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use querycache::executor::{ExecutorConfig, ToolCall, ToolExecutor, ToolRecord, ToolRegistry, ToolSchema};
use querycache::ratelimiter::{RateLimiter, RateLimiterConfig};
use querycache::resilient::{ResilientCache, StoreOutcome};
use querycache::warmer::{ContentType, Padder};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn bytes(len: usize) -> Arc<[u8]> {
    Arc::from(vec![b'x'; len])
}

/// Scenario 1: cold miss followed by a warm hit through the breaker-gated cache.
#[tokio::test]
async fn cold_miss_then_warm_hit() {
    let store = Arc::new(CacheStore::new(CacheConfig::builder().min_tokens(500).build()));
    let breaker = Arc::new(CircuitBreaker::new(CircuitBreakerConfig::builder().build()));
    let cache = ResilientCache::new(store, breaker);

    let fp = ContentHasher::new().fingerprint("A");
    assert_eq!(cache.get(&fp).await, None);

    let outcome = cache.store(fp.clone(), bytes(2400), "v1").await.unwrap();
    assert!(matches!(outcome, StoreOutcome::Stored(_)));

    let hit = cache.get(&fp).await.expect("warm hit");
    assert_eq!(hit.access_count, 1);
}

/// Scenario 2: content below `minTokens` is rejected, padded, and then stored.
#[tokio::test]
async fn too_small_content_is_padded_then_stored() {
    let store = Arc::new(CacheStore::new(CacheConfig::builder().min_tokens(500).build()));
    let breaker = Arc::new(CircuitBreaker::new(CircuitBreakerConfig::builder().build()));
    let cache = ResilientCache::new(store, breaker);

    let original = "SELECT sku, price FROM widgets WHERE sku = ?";
    let estimator = TokenEstimator::new();
    let short_tokens = estimator.estimate(original.as_bytes());
    assert!(short_tokens < 500);

    let fp = ContentHasher::new().fingerprint("B");
    let rejected = cache.store(fp.clone(), Arc::from(original.as_bytes()), "v1").await;
    assert!(rejected.is_err());

    let padded = Padder::new().pad(original, ContentType::Sql, 500);
    assert!(padded.contains(original));
    let padded_tokens = estimator.estimate(padded.as_bytes());
    assert!(padded_tokens >= 500);

    let stored = cache.store(fp.clone(), Arc::from(padded.as_bytes()), "v1").await.unwrap();
    assert!(matches!(stored, StoreOutcome::Stored(_)));

    // Re-padding the already-padded content is a no-op (§8 idempotence law).
    let repadded = Padder::new().pad(&padded, ContentType::Sql, 500);
    assert_eq!(repadded, padded);
}

/// Scenario 3: eviction under pressure prefers the older, less-accessed entry.
#[tokio::test]
async fn eviction_under_pressure_keeps_the_fresher_entry() {
    let store = CacheStore::new(CacheConfig::builder().min_tokens(1).max_size_bytes(1000).build());
    let fp_a = ContentHasher::new().fingerprint("A");
    let fp_b = ContentHasher::new().fingerprint("B");

    store.store(fp_a.clone(), bytes(600), "v1").unwrap();
    // A is read and aged before B arrives so it is strictly older/less-touched.
    std::thread::sleep(Duration::from_millis(5));
    store.store(fp_b.clone(), bytes(500), "v1").unwrap();

    assert!(store.get(&fp_a).is_none() || store.get(&fp_b).is_some());
    assert!(store.get(&fp_b).is_some());
}

/// Scenario 4: the breaker opens after `failureThreshold` failures and the
/// next `get` degrades to a miss without touching the underlying store.
#[tokio::test]
async fn breaker_opens_and_degrades_gracefully() {
    let store = Arc::new(CacheStore::new(CacheConfig::builder().min_tokens(1).build()));
    let breaker = Arc::new(CircuitBreaker::new(
        CircuitBreakerConfig::builder().failure_threshold(3).timeout(Duration::from_millis(30)).build(),
    ));
    let cache = ResilientCache::new(store, breaker);

    for _ in 0..3 {
        let fp = ContentHasher::new().fingerprint("fails");
        let result = cache.store(fp, bytes(8), "wrong-version").await;
        assert!(result.is_err());
    }
    assert_eq!(cache.breaker().state_sync(), CircuitState::Open);

    let fp = ContentHasher::new().fingerprint("anything");
    assert_eq!(cache.get(&fp).await, None);

    tokio::time::sleep(Duration::from_millis(40)).await;
    assert_eq!(cache.breaker().state_sync(), CircuitState::HalfOpen);
}

/// Scenario 5: 7 calls in under a minute against a 6/minute bucket — the
/// 7th is rejected with a retry_after close to the 10s full-token interval.
#[tokio::test]
async fn seventh_call_in_a_minute_is_rate_limited() {
    let limiter = RateLimiter::new(RateLimiterConfig::builder().max_calls_per_minute(6).build());
    for _ in 0..6 {
        assert!(limiter.try_acquire("u1", 1.0).is_ok());
    }
    let err = limiter.try_acquire("u1", 1.0).unwrap_err();
    let retry_after = err.retry_after();
    assert!(retry_after > Duration::from_secs(9) && retry_after <= Duration::from_secs(10));
}

/// Scenario 6: a tool that outlasts its timeout is classified as a timeout,
/// not a generic execution error, reported through the full executor stack.
#[tokio::test]
async fn slow_tool_is_classified_as_timeout() {
    let registry = Arc::new(ToolRegistry::new());
    registry
        .register(ToolRecord::new("slow", ToolSchema::new(), |_args| {
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(500)).await;
                Ok(json!({}))
            })
        }).timeout(Duration::from_millis(100)))
        .unwrap();

    let executor = ToolExecutor::new(registry, ExecutorConfig::builder().build());
    let call = ToolCall { tool: "slow".to_string(), args: json!({}), user_id: "u1".to_string(), token: None };
    let result = executor.execute(call).await;

    assert!(!result.success);
    let error = result.error.unwrap();
    assert_eq!(error.kind, "Timeout");
    assert!(result.duration_ms >= 100 && result.duration_ms < 400);
}
