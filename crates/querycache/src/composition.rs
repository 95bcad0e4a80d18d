//! # Composition Guide
//!
//! How the pieces fit into the control flow described in §2: a query enters
//! the resilient cache; on a hit the cached content returns immediately; on
//! a miss or an open breaker, the caller runs its own upstream/tool path and,
//! on success, pads and stores the result.
//!
//! ```text
//! ┌─────────────┐
//! │    Query     │
//! └──────┬───────┘
//!        ▼
//! ┌──────────────────┐
//! │  ResilientCache   │ ── hit ──▶ return content
//! │  (breaker-gated)  │
//! └──────┬────────────┘
//!        │ miss / breaker open
//!        ▼
//! ┌──────────────────┐
//! │   ToolExecutor    │ ── validates, rate-limits, authorizes, invokes
//! │ (rate limiter +   │    with a per-call timeout
//! │  authorizer)      │
//! └──────┬────────────┘
//!        │ success
//!        ▼
//! ┌──────────────────┐
//! │      Padder       │ ── only if below minTokens
//! └──────┬────────────┘
//!        ▼
//! ┌──────────────────┐
//! │  ResilientCache   │ ── store
//! └──────────────────┘
//! ```
//!
//! The [`Warmer`](crate::warmer::Warmer) runs the same fetch → pad → store
//! sequence proactively, ahead of caller traffic, against a seed list rather
//! than live queries.
//!
//! ## Wiring a pipeline
//!
//! ```rust,no_run
//! # #[cfg(all(feature = "cache", feature = "circuitbreaker", feature = "resilient"))]
//! # {
//! use querycache::cache::{CacheConfig, CacheStore};
//! use querycache::circuitbreaker::{CircuitBreaker, CircuitBreakerConfig};
//! use querycache::resilient::ResilientCache;
//! use std::sync::Arc;
//!
//! let store = Arc::new(CacheStore::new(CacheConfig::builder().build()));
//! let breaker = Arc::new(CircuitBreaker::new(CircuitBreakerConfig::builder().build()));
//! let cache = ResilientCache::new(store, breaker);
//! # let _ = cache;
//! # }
//! ```
//!
//! ## Tool dispatch
//!
//! ```rust,no_run
//! # #[cfg(all(feature = "executor", feature = "ratelimiter"))]
//! # {
//! use querycache::executor::{ExecutorConfig, ToolExecutor, ToolRegistry};
//! use querycache::ratelimiter::{RateLimiter, RateLimiterConfig};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(ToolRegistry::new());
//! let limiter = Arc::new(RateLimiter::new(RateLimiterConfig::builder().build()));
//! let executor = ToolExecutor::new(registry, ExecutorConfig::builder().build())
//!     .with_rate_limiter(limiter);
//! # let _ = executor;
//! # }
//! ```
