//! Cold miss followed by a warm hit through the breaker-gated cache (§8
//! scenario 1).

use querycache::cache::{CacheConfig, CacheStore, ContentHasher};
use querycache::circuitbreaker::{CircuitBreaker, CircuitBreakerConfig};
use querycache::resilient::{ResilientCache, StoreOutcome};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    let store = Arc::new(CacheStore::new(CacheConfig::builder().min_tokens(500).build()));
    let breaker_config = CircuitBreakerConfig::builder()
        .failure_threshold(3)
        .timeout(Duration::from_secs(5))
        .build();
    let breaker = Arc::new(CircuitBreaker::new(breaker_config));
    let cache = ResilientCache::new(store, breaker);

    let fingerprint = ContentHasher::new().fingerprint("SELECT * FROM widgets WHERE sku = ?");
    let content: Arc<[u8]> = Arc::from(vec![b'x'; 2400]);

    println!("cold miss: {:?}", cache.get(&fingerprint).await);

    match cache.store(fingerprint.clone(), content, "v1").await {
        Ok(StoreOutcome::Stored(entry)) => println!("stored {} bytes", entry.size_bytes),
        Ok(StoreOutcome::Skipped) => println!("breaker open, store skipped"),
        Err(err) => println!("store failed: {err}"),
    }

    let warm = cache.get(&fingerprint).await;
    println!("warm hit: access_count={:?}", warm.map(|entry| entry.access_count));
}
