//! The cache store gated by a circuit breaker, with graceful degradation on
//! trip (§4.3).
//!
//! Every call is routed through [`querycache_circuitbreaker::CircuitBreaker`].
//! A genuine store exception propagates to the caller and counts as a
//! breaker failure; a denial (circuit `Open` or `HALF_OPEN` throttling)
//! never reaches the store and is absorbed into the fallback below, which
//! counts as neither a success nor a failure:
//!
//! | Op | Fallback |
//! |---|---|
//! | `get` | miss |
//! | `store` | [`StoreOutcome::Skipped`] |
//! | `invalidate` | `0` |

use querycache_cache::{CacheError, CacheStore, EntrySnapshot, Fingerprint};
use querycache_circuitbreaker::{CircuitBreaker, CircuitBreakerError};
use std::convert::Infallible;
use std::sync::Arc;

/// Outcome of a gated `store` call: either the entry landed, or the breaker
/// denied the call and the no-op fallback ran instead.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOutcome {
    Stored(EntrySnapshot),
    Skipped,
}

/// Glues a [`CacheStore`] to a [`CircuitBreaker`]: every operation is an
/// admitted call, and a tripped breaker degrades to the op's fallback
/// instead of touching the store.
pub struct ResilientCache {
    store: Arc<CacheStore>,
    breaker: Arc<CircuitBreaker>,
}

impl ResilientCache {
    pub fn new(store: Arc<CacheStore>, breaker: Arc<CircuitBreaker>) -> Self {
        Self { store, breaker }
    }

    /// Gated `get`. A breaker denial degrades to a miss (§4.3).
    pub async fn get(&self, fingerprint: &Fingerprint) -> Option<EntrySnapshot> {
        let store = Arc::clone(&self.store);
        let fingerprint = fingerprint.clone();
        let result: Result<Option<EntrySnapshot>, CircuitBreakerError<Infallible>> =
            self.breaker.call(|| async move { Ok(store.get(&fingerprint)) }).await;

        result.unwrap_or(None)
    }

    /// Gated `store`. A breaker denial degrades to [`StoreOutcome::Skipped`];
    /// a genuine [`CacheError`] propagates (§4.3, §7).
    pub async fn store(
        &self,
        fingerprint: Fingerprint,
        content: std::sync::Arc<[u8]>,
        version: &str,
    ) -> Result<StoreOutcome, CacheError> {
        let store = Arc::clone(&self.store);
        let version = version.to_string();
        let result = self
            .breaker
            .call(move || async move { store.store(fingerprint, content, &version) })
            .await;

        match result {
            Ok(entry) => Ok(StoreOutcome::Stored(entry)),
            Err(CircuitBreakerError::Inner(cache_err)) => Err(cache_err),
            Err(CircuitBreakerError::Open) | Err(CircuitBreakerError::Throttled) => Ok(StoreOutcome::Skipped),
        }
    }

    /// Gated `invalidate`. A breaker denial degrades to `0` (§4.3).
    pub async fn invalidate(&self, prefix: Option<&str>) -> usize {
        let store = Arc::clone(&self.store);
        let prefix = prefix.map(str::to_string);
        let result: Result<usize, CircuitBreakerError<Infallible>> = self
            .breaker
            .call(|| async move { Ok(store.invalidate(prefix.as_deref())) })
            .await;

        result.unwrap_or(0)
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn store_ref(&self) -> &CacheStore {
        &self.store
    }
}
