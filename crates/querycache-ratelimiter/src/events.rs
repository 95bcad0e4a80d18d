//! Events emitted by the rate limiter (§4.5).

use querycache_core::ResilienceEvent;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub enum RateLimiterEvent {
    PermitAcquired {
        pattern_name: String,
        timestamp: Instant,
        user_id: String,
        tokens_remaining: f64,
    },
    PermitRejected {
        pattern_name: String,
        timestamp: Instant,
        user_id: String,
        retry_after: Duration,
    },
    BucketReaped {
        pattern_name: String,
        timestamp: Instant,
        user_id: String,
    },
}

impl ResilienceEvent for RateLimiterEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::PermitAcquired { .. } => "permit_acquired",
            Self::PermitRejected { .. } => "permit_rejected",
            Self::BucketReaped { .. } => "bucket_reaped",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            Self::PermitAcquired { timestamp, .. } => *timestamp,
            Self::PermitRejected { timestamp, .. } => *timestamp,
            Self::BucketReaped { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            Self::PermitAcquired { pattern_name, .. } => pattern_name,
            Self::PermitRejected { pattern_name, .. } => pattern_name,
            Self::BucketReaped { pattern_name, .. } => pattern_name,
        }
    }
}
