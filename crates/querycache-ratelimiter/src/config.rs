//! Configuration for [`crate::RateLimiter`] (§6 `rateLimit.*` keys).

use crate::events::RateLimiterEvent;
use querycache_core::{EventListeners, FnListener};
use std::time::Duration;

pub struct RateLimiterConfig {
    pub(crate) max_calls_per_minute: u32,
    pub(crate) global_max_calls_per_minute: Option<u32>,
    pub(crate) enabled: bool,
    pub(crate) idle_reap_after: Duration,
    pub(crate) event_listeners: EventListeners<RateLimiterEvent>,
    pub(crate) name: String,
}

impl RateLimiterConfig {
    pub fn builder() -> RateLimiterConfigBuilder {
        RateLimiterConfigBuilder::new()
    }
}

/// Builder for [`RateLimiterConfig`]. Defaults mirror §6.
pub struct RateLimiterConfigBuilder {
    max_calls_per_minute: u32,
    global_max_calls_per_minute: Option<u32>,
    enabled: bool,
    idle_reap_after: Duration,
    event_listeners: EventListeners<RateLimiterEvent>,
    name: String,
}

impl Default for RateLimiterConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiterConfigBuilder {
    pub fn new() -> Self {
        Self {
            max_calls_per_minute: 60,
            global_max_calls_per_minute: None,
            enabled: true,
            idle_reap_after: Duration::from_secs(120),
            event_listeners: EventListeners::new(),
            name: String::from("<unnamed>"),
        }
    }

    /// Per-user bucket capacity and refill target. Default: 60/min.
    pub fn max_calls_per_minute(mut self, n: u32) -> Self {
        self.max_calls_per_minute = n;
        self
    }

    /// Optional global bucket, checked before the per-user bucket (§4.5).
    pub fn global_max_calls_per_minute(mut self, n: u32) -> Self {
        self.global_max_calls_per_minute = Some(n);
        self
    }

    /// Global toggle. When disabled, `try_acquire` always succeeds. Default: true.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Idle duration after which an unused per-user bucket may be reaped.
    pub fn idle_reap_after(mut self, duration: Duration) -> Self {
        self.idle_reap_after = duration;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn on_permit_acquired<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, f64) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &RateLimiterEvent| {
            if let RateLimiterEvent::PermitAcquired { user_id, tokens_remaining, .. } = event {
                f(user_id, *tokens_remaining);
            }
        }));
        self
    }

    pub fn on_permit_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &RateLimiterEvent| {
            if let RateLimiterEvent::PermitRejected { user_id, retry_after, .. } = event {
                f(user_id, *retry_after);
            }
        }));
        self
    }

    pub fn build(self) -> RateLimiterConfig {
        RateLimiterConfig {
            max_calls_per_minute: self.max_calls_per_minute,
            global_max_calls_per_minute: self.global_max_calls_per_minute,
            enabled: self.enabled,
            idle_reap_after: self.idle_reap_after,
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
        let config = RateLimiterConfig::builder().build();
        assert_eq!(config.max_calls_per_minute, 60);
        assert!(config.global_max_calls_per_minute.is_none());
        assert!(config.enabled);
    }
}
