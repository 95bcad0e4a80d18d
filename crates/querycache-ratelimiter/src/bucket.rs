//! Per-user token bucket with continuous refill (§3 "Rate Limit Bucket", §4.5).

use parking_lot::Mutex;
use std::time::{Duration, Instant};

struct BucketState {
    tokens: f64,
    last_refill: Instant,
    last_seen: Instant,
}

/// A single token bucket. `capacity` tokens refill continuously at
/// `refill_per_sec` tokens/second, capped at `capacity`.
pub(crate) struct TokenBucket {
    capacity: f64,
    refill_per_sec: f64,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    pub(crate) fn new(capacity: f64, refill_per_sec: f64) -> Self {
        let now = Instant::now();
        Self {
            capacity,
            refill_per_sec,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: now,
                last_seen: now,
            }),
        }
    }

    /// Attempts to take `cost` tokens. Returns the tokens remaining on
    /// success, or the wait duration until `cost` tokens would be available.
    pub(crate) fn try_acquire(&self, cost: f64) -> Result<f64, Duration> {
        let now = Instant::now();
        let mut state = self.state.lock();
        let elapsed = now.saturating_duration_since(state.last_refill);
        state.tokens = (state.tokens + elapsed.as_secs_f64() * self.refill_per_sec).min(self.capacity);
        state.last_refill = now;
        state.last_seen = now;

        if state.tokens >= cost {
            state.tokens -= cost;
            Ok(state.tokens)
        } else {
            let deficit = cost - state.tokens;
            Err(Duration::from_secs_f64(deficit / self.refill_per_sec))
        }
    }

    pub(crate) fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.state.lock().last_seen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquires_up_to_capacity() {
        let bucket = TokenBucket::new(3.0, 1.0);
        assert!(bucket.try_acquire(1.0).is_ok());
        assert!(bucket.try_acquire(1.0).is_ok());
        assert!(bucket.try_acquire(1.0).is_ok());
        assert!(bucket.try_acquire(1.0).is_err());
    }

    #[test]
    fn denial_reports_retry_after() {
        let bucket = TokenBucket::new(1.0, 2.0);
        bucket.try_acquire(1.0).unwrap();
        let err = bucket.try_acquire(1.0).unwrap_err();
        assert!(err <= Duration::from_millis(600));
        assert!(err > Duration::ZERO);
    }

    #[test]
    fn refills_over_time() {
        let bucket = TokenBucket::new(1.0, 100.0);
        bucket.try_acquire(1.0).unwrap();
        std::thread::sleep(Duration::from_millis(20));
        assert!(bucket.try_acquire(1.0).is_ok());
    }
}
