//! Configuration for [`crate::CircuitBreaker`] (§6 `breaker.*` keys).

use crate::events::CircuitBreakerEvent;
use querycache_core::{EventListeners, FnListener};
use std::time::Duration;

pub struct CircuitBreakerConfig {
    pub(crate) failure_threshold: u32,
    pub(crate) success_threshold: u32,
    pub(crate) timeout: Duration,
    pub(crate) rolling_window: Duration,
    pub(crate) recovery_factor: f64,
    /// Windowed failure-rate threshold feeding the CLOSED→OPEN rule alongside
    /// `failure_threshold`. Not enumerated in the source config table; added
    /// here since §4.2's transition rule names it explicitly (see DESIGN.md).
    pub(crate) rate_threshold: f64,
    pub(crate) event_listeners: EventListeners<CircuitBreakerEvent>,
    pub(crate) name: String,
}

impl CircuitBreakerConfig {
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::new()
    }
}

/// Builder for [`CircuitBreakerConfig`]. Defaults mirror §6.
pub struct CircuitBreakerConfigBuilder {
    failure_threshold: u32,
    success_threshold: u32,
    timeout: Duration,
    rolling_window: Duration,
    recovery_factor: f64,
    rate_threshold: f64,
    event_listeners: EventListeners<CircuitBreakerEvent>,
    name: String,
}

impl CircuitBreakerConfigBuilder {
    pub fn new() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 3,
            timeout: Duration::from_secs(60),
            rolling_window: Duration::from_secs(300),
            recovery_factor: 0.5,
            rate_threshold: 0.5,
            event_listeners: EventListeners::new(),
            name: String::from("<unnamed>"),
        }
    }

    /// Consecutive failures that trip CLOSED→OPEN. Default: 5.
    pub fn failure_threshold(mut self, n: u32) -> Self {
        self.failure_threshold = n;
        self
    }

    /// Consecutive HALF_OPEN successes required to close. Default: 3.
    pub fn success_threshold(mut self, n: u32) -> Self {
        self.success_threshold = n;
        self
    }

    /// Time spent OPEN before probing HALF_OPEN. Default: 60s.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Window over which the windowed failure rate is computed. Default: 300s.
    pub fn rolling_window(mut self, window: Duration) -> Self {
        self.rolling_window = window;
        self
    }

    /// Fraction of HALF_OPEN calls admitted. Default: 0.5.
    pub fn recovery_factor(mut self, factor: f64) -> Self {
        self.recovery_factor = factor;
        self
    }

    /// Windowed failure rate that trips CLOSED→OPEN independent of
    /// `failure_threshold`. Default: 0.5.
    pub fn rate_threshold(mut self, rate: f64) -> Self {
        self.rate_threshold = rate;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn on_state_transition<F>(mut self, f: F) -> Self
    where
        F: Fn(crate::CircuitState, crate::CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &CircuitBreakerEvent| {
            if let CircuitBreakerEvent::StateTransition { from_state, to_state, .. } = event {
                f(*from_state, *to_state);
            }
        }));
        self
    }

    pub fn on_call_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &CircuitBreakerEvent| {
            if matches!(event, CircuitBreakerEvent::CallRejected { .. }) {
                f();
            }
        }));
        self
    }

    pub fn build(self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            success_threshold: self.success_threshold,
            timeout: self.timeout,
            rolling_window: self.rolling_window,
            recovery_factor: self.recovery_factor,
            rate_threshold: self.rate_threshold,
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }
}

impl Default for CircuitBreakerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_specification() {
        let config = CircuitBreakerConfig::builder().build();
        assert_eq!(config.failure_threshold, 5);
        assert_eq!(config.success_threshold, 3);
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.rolling_window, Duration::from_secs(300));
        assert_eq!(config.recovery_factor, 0.5);
    }
}
