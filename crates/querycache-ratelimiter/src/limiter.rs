//! Per-user rate limiting with an optional global gate checked first (§4.5).

use crate::bucket::TokenBucket;
use crate::config::RateLimiterConfig;
use crate::error::RateLimiterError;
use crate::events::RateLimiterEvent;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Instant;

/// Per-user token-bucket rate limiter, with an optional global bucket
/// checked before the per-user bucket (§4.5, §9 decision).
pub struct RateLimiter {
    buckets: DashMap<String, Arc<TokenBucket>>,
    global: Option<Arc<TokenBucket>>,
    config: RateLimiterConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        let global = config
            .global_max_calls_per_minute
            .map(|capacity| Arc::new(TokenBucket::new(capacity as f64, capacity as f64 / 60.0)));

        Self { buckets: DashMap::new(), global, config }
    }

    fn emit(&self, event: RateLimiterEvent) {
        self.config.event_listeners.emit(&event);
    }

    fn bucket_for(&self, user_id: &str) -> Arc<TokenBucket> {
        if let Some(bucket) = self.buckets.get(user_id) {
            return Arc::clone(&bucket);
        }
        let capacity = self.config.max_calls_per_minute as f64;
        let bucket = Arc::new(TokenBucket::new(capacity, capacity / 60.0));
        self.buckets
            .entry(user_id.to_string())
            .or_insert_with(|| bucket);
        Arc::clone(self.buckets.get(user_id).unwrap().value())
    }

    /// Attempts to take `cost` tokens for `user_id`. Checks the optional
    /// global bucket first, then the per-user bucket; either denial short-
    /// circuits the other (§4.5 "applied before per-user limiter").
    pub fn try_acquire(&self, user_id: &str, cost: f64) -> Result<(), RateLimiterError> {
        if !self.config.enabled {
            return Ok(());
        }

        if let Some(global) = &self.global {
            if let Err(retry_after) = global.try_acquire(cost) {
                self.emit(RateLimiterEvent::PermitRejected {
                    pattern_name: self.config.name.clone(),
                    timestamp: Instant::now(),
                    user_id: user_id.to_string(),
                    retry_after,
                });
                return Err(RateLimiterError::RateLimited { retry_after });
            }
        }

        let bucket = self.bucket_for(user_id);
        match bucket.try_acquire(cost) {
            Ok(remaining) => {
                self.emit(RateLimiterEvent::PermitAcquired {
                    pattern_name: self.config.name.clone(),
                    timestamp: Instant::now(),
                    user_id: user_id.to_string(),
                    tokens_remaining: remaining,
                });
                Ok(())
            }
            Err(retry_after) => {
                self.emit(RateLimiterEvent::PermitRejected {
                    pattern_name: self.config.name.clone(),
                    timestamp: Instant::now(),
                    user_id: user_id.to_string(),
                    retry_after,
                });
                Err(RateLimiterError::RateLimited { retry_after })
            }
        }
    }

    /// Removes per-user buckets idle longer than `idle_reap_after` (§3
    /// "reaped after inactivity longer than one refill window").
    pub fn reap_inactive(&self) -> usize {
        let now = Instant::now();
        let stale: Vec<String> = self
            .buckets
            .iter()
            .filter(|entry| entry.value().idle_for(now) > self.config.idle_reap_after)
            .map(|entry| entry.key().clone())
            .collect();

        for user_id in &stale {
            self.buckets.remove(user_id);
            self.emit(RateLimiterEvent::BucketReaped {
                pattern_name: self.config.name.clone(),
                timestamp: now,
                user_id: user_id.clone(),
            });
        }
        stale.len()
    }

    pub fn active_users(&self) -> usize {
        self.buckets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config() -> RateLimiterConfig {
        RateLimiterConfig::builder().max_calls_per_minute(6).build()
    }

    #[test]
    fn allows_calls_within_per_minute_capacity() {
        let limiter = RateLimiter::new(config());
        for _ in 0..6 {
            assert!(limiter.try_acquire("u1", 1.0).is_ok());
        }
        let err = limiter.try_acquire("u1", 1.0).unwrap_err();
        assert!(err.retry_after() > Duration::ZERO);
    }

    #[test]
    fn users_are_isolated() {
        let limiter = RateLimiter::new(config());
        for _ in 0..6 {
            assert!(limiter.try_acquire("u1", 1.0).is_ok());
        }
        assert!(limiter.try_acquire("u2", 1.0).is_ok());
    }

    #[test]
    fn disabled_limiter_always_admits() {
        let limiter = RateLimiter::new(RateLimiterConfig::builder().max_calls_per_minute(1).enabled(false).build());
        for _ in 0..10 {
            assert!(limiter.try_acquire("u1", 1.0).is_ok());
        }
    }

    #[test]
    fn global_bucket_gates_before_per_user_bucket() {
        let limiter = RateLimiter::new(
            RateLimiterConfig::builder()
                .max_calls_per_minute(60)
                .global_max_calls_per_minute(1)
                .build(),
        );
        assert!(limiter.try_acquire("u1", 1.0).is_ok());
        assert!(limiter.try_acquire("u2", 1.0).is_err());
    }

    #[test]
    fn reap_inactive_removes_idle_buckets() {
        let limiter = RateLimiter::new(
            RateLimiterConfig::builder().idle_reap_after(Duration::from_millis(10)).build(),
        );
        limiter.try_acquire("u1", 1.0).unwrap();
        assert_eq!(limiter.active_users(), 1);
        std::thread::sleep(Duration::from_millis(15));
        assert_eq!(limiter.reap_inactive(), 1);
        assert_eq!(limiter.active_users(), 0);
    }
}
