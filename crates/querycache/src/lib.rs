//! Resilient caching and tool-dispatch engine.
//!
//! `querycache` composes a token-threshold-gated content cache, a circuit
//! breaker, a per-user/global rate limiter, a schema-validated tool
//! executor, and a cache warmer/padder into one system: a query enters the
//! breaker-gated cache; on a hit the cached content returns; on a miss (or
//! an open breaker) the caller's own upstream path runs, and a successful
//! response is padded if too small and stored. Tool calls emitted along the
//! way are validated, rate-limited, authorized, invoked with a deadline, and
//! classified.
//!
//! Each piece is an independent crate, re-exported here behind a Cargo
//! feature so a caller who only needs rate limiting doesn't pull in the
//! cache, and vice versa.
//!
//! # Quick Start
//!
//! ```toml
//! [dependencies]
//! querycache = { version = "0.1", features = ["resilient", "executor"] }
//! ```
//!
//! # Components
//!
//! - **[Cache]** — TTL-and-size-bounded content cache with three-stage
//!   eviction and a cost-savings estimate.
//! - **[Circuit Breaker]** — CLOSED/HALF_OPEN/OPEN gate protecting a
//!   dependency from cascading failures.
//! - **[Resilient Cache]** — the cache wrapped by the breaker, with
//!   graceful degradation on trip.
//! - **[Rate Limiter]** — continuous-refill token buckets, per-user and
//!   optionally global, plus caller authorization.
//! - **[Tool Executor]** — schema validation, rate limiting, authorization,
//!   per-call timeout and panic isolation, bounded concurrency.
//! - **[Warmer]** — pattern-driven cache pre-population and sub-threshold
//!   content padding.
//!
//! [Cache]: #cache
//! [Circuit Breaker]: #circuit-breaker
//! [Resilient Cache]: #resilient-cache
//! [Rate Limiter]: #rate-limiter
//! [Tool Executor]: #tool-executor
//! [Warmer]: #warmer
//!
//! ## Cache
//!
//! Stores content keyed by a normalized-query fingerprint. Content below
//! `minTokens` is rejected rather than cached; storing past `maxSizeBytes`
//! triggers expiry sweep → intelligent eviction → emergency LRU, in order,
//! stopping as soon as enough space is freed.
//!
//! ```rust,no_run
//! # #[cfg(feature = "cache")]
//! # {
//! use querycache::cache::{CacheConfig, CacheStore, ContentHasher};
//! use std::sync::Arc;
//!
//! let store = CacheStore::new(CacheConfig::builder().min_tokens(500).build());
//! let fingerprint = ContentHasher::new().fingerprint("SELECT * FROM widgets");
//! let content: Arc<[u8]> = Arc::from(vec![0u8; 2000]);
//! store.store(fingerprint.clone(), content, "v1").unwrap();
//! assert!(store.get(&fingerprint).is_some());
//! # }
//! ```
//!
//! ## Circuit Breaker
//!
//! Opens after `failureThreshold` consecutive failures (or a windowed
//! failure rate ≥ `rateThreshold`); half-opens after `timeoutSeconds` and
//! admits a `recoveryFactor` fraction of probes; closes after
//! `successThreshold` consecutive probe successes.
//!
//! ```rust,no_run
//! # #[cfg(feature = "circuitbreaker")]
//! # {
//! use querycache::circuitbreaker::{CircuitBreaker, CircuitBreakerConfig};
//! use std::time::Duration;
//!
//! let breaker = CircuitBreaker::new(
//!     CircuitBreakerConfig::builder()
//!         .failure_threshold(5)
//!         .timeout(Duration::from_secs(60))
//!         .build(),
//! );
//! # let _ = breaker;
//! # }
//! ```
//!
//! ## Resilient Cache
//!
//! See [`composition`] for the full wiring and the fallback table (`get` →
//! miss, `store` → no-op, `invalidate` → `0`) applied when the breaker
//! denies a call.
//!
//! ## Rate Limiter
//!
//! Per-user token buckets refill continuously at `maxCallsPerMinute / 60`
//! tokens/sec; an optional global bucket is checked first and short-circuits
//! before the per-user bucket is even looked up.
//!
//! ```rust,no_run
//! # #[cfg(feature = "ratelimiter")]
//! # {
//! use querycache::ratelimiter::{RateLimiter, RateLimiterConfig};
//!
//! let limiter = RateLimiter::new(RateLimiterConfig::builder().max_calls_per_minute(60).build());
//! assert!(limiter.try_acquire("user-1", 1.0).is_ok());
//! # }
//! ```
//!
//! ## Tool Executor
//!
//! Dispatches validated, rate-limited, authorized calls against an explicit
//! [`ToolRegistry`](executor::ToolRegistry) (never runtime introspection),
//! each on its own spawned task so a handler panic can't affect other
//! in-flight calls, bounded by `maxConcurrency`.
//!
//! ## Warmer
//!
//! See [`composition`] for the fetch → pad → store sequence the warmer runs
//! proactively against a seed list.

pub mod composition;

// Re-export core (always available)
pub use querycache_core as core;

// Re-export patterns based on features
#[cfg(feature = "cache")]
pub use querycache_cache as cache;

#[cfg(feature = "circuitbreaker")]
pub use querycache_circuitbreaker as circuitbreaker;

#[cfg(feature = "executor")]
pub use querycache_executor as executor;

#[cfg(feature = "ratelimiter")]
pub use querycache_ratelimiter as ratelimiter;

#[cfg(feature = "resilient")]
pub use querycache_resilient as resilient;

#[cfg(feature = "warmer")]
pub use querycache_warmer as warmer;
