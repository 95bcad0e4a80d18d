//! The CLOSED / OPEN / HALF_OPEN state machine (§4.2).

use crate::config::CircuitBreakerConfig;
use crate::events::CircuitBreakerEvent;
#[cfg(feature = "metrics")]
use metrics::{counter, gauge};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Circuit breaker state (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CircuitState {
    Closed = 0,
    Open = 1,
    HalfOpen = 2,
}

impl CircuitState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => CircuitState::Closed,
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Closed,
        }
    }

    fn label(self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

/// Point-in-time observability snapshot (§4.2 "Observability").
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitMetrics {
    pub state: CircuitState,
    pub failure_rate: f64,
    pub time_in_current_state: Duration,
    pub state_changes: u64,
    /// Timestamps of the most recent failures, bounded to the last 50 (§4.2).
    pub recent_failures: Vec<Instant>,
}

/// A recorded outcome within `rollingWindowSeconds` (§3 `recent_outcomes`).
struct Outcome {
    timestamp: Instant,
    is_failure: bool,
}

const MAX_RECENT_FAILURES: usize = 50;

pub(crate) struct Circuit {
    state: CircuitState,
    state_atomic: Arc<AtomicU8>,
    last_state_change: Instant,
    state_changes: u64,
    consecutive_failures: u32,
    consecutive_successes: u32,
    recent_outcomes: VecDeque<Outcome>,
    recent_failures: VecDeque<Instant>,
    opened_at: Option<Instant>,
    half_open_probes_in_flight: u32,
    /// Deterministic accumulator implementing `recoveryFactor` admission:
    /// each admission check adds `recoveryFactor`; a call is admitted when
    /// the accumulator crosses 1.0, which then resets by subtracting 1.0.
    half_open_credit: f64,
}

impl Circuit {
    pub(crate) fn new_with_atomic(state_atomic: Arc<AtomicU8>) -> Self {
        Self {
            state: CircuitState::Closed,
            state_atomic,
            last_state_change: Instant::now(),
            state_changes: 0,
            consecutive_failures: 0,
            consecutive_successes: 0,
            recent_outcomes: VecDeque::new(),
            recent_failures: VecDeque::new(),
            opened_at: None,
            half_open_probes_in_flight: 0,
            half_open_credit: 0.0,
        }
    }

    #[cfg(test)]
    pub(crate) fn new() -> Self {
        Self::new_with_atomic(Arc::new(AtomicU8::new(CircuitState::Closed as u8)))
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    fn prune_window(&mut self, window: Duration, now: Instant) {
        while let Some(front) = self.recent_outcomes.front() {
            if now.duration_since(front.timestamp) > window {
                self.recent_outcomes.pop_front();
            } else {
                break;
            }
        }
    }

    fn windowed_failure_rate(&self) -> f64 {
        if self.recent_outcomes.is_empty() {
            return 0.0;
        }
        let failures = self.recent_outcomes.iter().filter(|o| o.is_failure).count();
        failures as f64 / self.recent_outcomes.len() as f64
    }

    pub fn metrics(&mut self, config: &CircuitBreakerConfig) -> CircuitMetrics {
        self.prune_window(config.rolling_window, Instant::now());
        CircuitMetrics {
            state: self.state,
            failure_rate: self.windowed_failure_rate(),
            time_in_current_state: self.last_state_change.elapsed(),
            state_changes: self.state_changes,
            recent_failures: self.recent_failures.iter().copied().collect(),
        }
    }

    /// Admission check (§4.2 "Admission policy"). Performs the OPEN→HALF_OPEN
    /// time-tick transition inline when the timeout has elapsed.
    pub fn try_acquire(&mut self, config: &CircuitBreakerConfig) -> bool {
        match self.state {
            CircuitState::Closed => {
                self.emit_permitted(config);
                true
            }
            CircuitState::Open => {
                let opened_at = self.opened_at.unwrap_or(self.last_state_change);
                if opened_at.elapsed() >= config.timeout {
                    self.transition_to(CircuitState::HalfOpen, config);
                    self.try_acquire_half_open(config)
                } else {
                    self.emit_rejected(config);
                    false
                }
            }
            CircuitState::HalfOpen => self.try_acquire_half_open(config),
        }
    }

    fn try_acquire_half_open(&mut self, config: &CircuitBreakerConfig) -> bool {
        if self.half_open_probes_in_flight >= config.success_threshold {
            self.emit_rejected(config);
            return false;
        }

        self.half_open_credit += config.recovery_factor;
        if self.half_open_credit >= 1.0 {
            self.half_open_credit -= 1.0;
            self.half_open_probes_in_flight += 1;
            self.emit_permitted(config);
            true
        } else {
            self.emit_rejected(config);
            false
        }
    }

    pub fn record_success(&mut self, config: &CircuitBreakerConfig) {
        let now = Instant::now();
        self.prune_window(config.rolling_window, now);
        self.recent_outcomes.push_back(Outcome { timestamp: now, is_failure: false });

        config.event_listeners.emit(&CircuitBreakerEvent::SuccessRecorded {
            pattern_name: config.name.clone(),
            timestamp: now,
            state: self.state,
        });
        #[cfg(feature = "metrics")]
        counter!("circuitbreaker_calls_total", "circuitbreaker" => config.name.clone(), "outcome" => "success").increment(1);

        match self.state {
            CircuitState::HalfOpen => {
                self.half_open_probes_in_flight = self.half_open_probes_in_flight.saturating_sub(1);
                self.consecutive_successes += 1;
                self.consecutive_failures = 0;
                if self.consecutive_successes >= config.success_threshold {
                    self.transition_to(CircuitState::Closed, config);
                }
            }
            CircuitState::Closed => {
                self.consecutive_failures = 0;
            }
            CircuitState::Open => {}
        }
    }

    pub fn record_failure(&mut self, config: &CircuitBreakerConfig) {
        let now = Instant::now();
        self.prune_window(config.rolling_window, now);
        self.recent_outcomes.push_back(Outcome { timestamp: now, is_failure: true });
        self.recent_failures.push_back(now);
        if self.recent_failures.len() > MAX_RECENT_FAILURES {
            self.recent_failures.pop_front();
        }

        config.event_listeners.emit(&CircuitBreakerEvent::FailureRecorded {
            pattern_name: config.name.clone(),
            timestamp: now,
            state: self.state,
        });
        #[cfg(feature = "metrics")]
        counter!("circuitbreaker_calls_total", "circuitbreaker" => config.name.clone(), "outcome" => "failure").increment(1);

        match self.state {
            CircuitState::HalfOpen => {
                self.half_open_probes_in_flight = self.half_open_probes_in_flight.saturating_sub(1);
                self.transition_to(CircuitState::Open, config);
            }
            CircuitState::Closed => {
                self.consecutive_successes = 0;
                self.consecutive_failures += 1;
                let rate = self.windowed_failure_rate();
                if self.consecutive_failures >= config.failure_threshold || rate >= config.rate_threshold {
                    self.transition_to(CircuitState::Open, config);
                }
            }
            CircuitState::Open => {}
        }
    }

    pub fn force_open(&mut self, config: &CircuitBreakerConfig) {
        self.transition_to(CircuitState::Open, config);
    }

    pub fn force_closed(&mut self, config: &CircuitBreakerConfig) {
        self.transition_to(CircuitState::Closed, config);
    }

    pub fn reset(&mut self, config: &CircuitBreakerConfig) {
        self.transition_to(CircuitState::Closed, config);
        self.recent_failures.clear();
        self.recent_outcomes.clear();
    }

    fn transition_to(&mut self, to: CircuitState, config: &CircuitBreakerConfig) {
        if self.state == to {
            return;
        }
        let from = self.state;

        config.event_listeners.emit(&CircuitBreakerEvent::StateTransition {
            pattern_name: config.name.clone(),
            timestamp: Instant::now(),
            from_state: from,
            to_state: to,
        });

        #[cfg(feature = "tracing")]
        tracing::info!(breaker = %config.name, from = ?from, to = ?to, "circuit breaker state transition");

        #[cfg(feature = "metrics")]
        {
            counter!(
                "circuitbreaker_transitions_total",
                "circuitbreaker" => config.name.clone(),
                "from" => from.label(),
                "to" => to.label()
            )
            .increment(1);
            gauge!("circuitbreaker_state", "circuitbreaker" => config.name.clone(), "state" => to.label()).set(1.0);
        }

        self.state = to;
        self.state_atomic.store(to as u8, Ordering::Release);
        self.last_state_change = Instant::now();
        self.state_changes += 1;
        self.consecutive_failures = 0;
        self.consecutive_successes = 0;
        self.half_open_probes_in_flight = 0;
        self.half_open_credit = 0.0;
        self.opened_at = if to == CircuitState::Open { Some(self.last_state_change) } else { None };
    }

    fn emit_permitted(&self, config: &CircuitBreakerConfig) {
        config.event_listeners.emit(&CircuitBreakerEvent::CallPermitted {
            pattern_name: config.name.clone(),
            timestamp: Instant::now(),
            state: self.state,
        });
    }

    fn emit_rejected(&self, config: &CircuitBreakerConfig) {
        config.event_listeners.emit(&CircuitBreakerEvent::CallRejected {
            pattern_name: config.name.clone(),
            timestamp: Instant::now(),
            state: self.state,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CircuitBreakerConfig;

    fn config() -> CircuitBreakerConfig {
        CircuitBreakerConfig::builder()
            .failure_threshold(3)
            .success_threshold(2)
            .timeout(Duration::from_millis(20))
            .recovery_factor(1.0)
            .build()
    }

    #[test]
    fn opens_on_nth_consecutive_failure() {
        let mut circuit = Circuit::new();
        let config = config();
        circuit.record_failure(&config);
        circuit.record_failure(&config);
        assert_eq!(circuit.state(), CircuitState::Closed);
        circuit.record_failure(&config);
        assert_eq!(circuit.state(), CircuitState::Open);
    }

    #[test]
    fn stays_closed_below_threshold_with_interleaved_success() {
        let mut circuit = Circuit::new();
        let config = config();
        circuit.record_failure(&config);
        circuit.record_success(&config);
        circuit.record_failure(&config);
        assert_eq!(circuit.state(), CircuitState::Closed);
    }

    #[test]
    fn open_denies_until_timeout_then_admits_half_open() {
        let mut circuit = Circuit::new();
        let config = config();
        for _ in 0..3 {
            circuit.record_failure(&config);
        }
        assert_eq!(circuit.state(), CircuitState::Open);
        assert!(!circuit.try_acquire(&config));

        std::thread::sleep(Duration::from_millis(25));
        assert!(circuit.try_acquire(&config));
        assert_eq!(circuit.state(), CircuitState::HalfOpen);
    }

    #[test]
    fn half_open_closes_after_success_threshold() {
        let mut circuit = Circuit::new();
        let config = config();
        for _ in 0..3 {
            circuit.record_failure(&config);
        }
        std::thread::sleep(Duration::from_millis(25));
        circuit.try_acquire(&config);
        circuit.record_success(&config);
        assert_eq!(circuit.state(), CircuitState::HalfOpen);
        circuit.try_acquire(&config);
        circuit.record_success(&config);
        assert_eq!(circuit.state(), CircuitState::Closed);
    }

    #[test]
    fn half_open_reopens_on_any_failure() {
        let mut circuit = Circuit::new();
        let config = config();
        for _ in 0..3 {
            circuit.record_failure(&config);
        }
        std::thread::sleep(Duration::from_millis(25));
        circuit.try_acquire(&config);
        circuit.record_failure(&config);
        assert_eq!(circuit.state(), CircuitState::Open);
    }

    #[test]
    fn half_open_caps_probes_in_flight_at_success_threshold() {
        let mut circuit = Circuit::new();
        let config = config();
        for _ in 0..3 {
            circuit.record_failure(&config);
        }
        std::thread::sleep(Duration::from_millis(25));

        assert!(circuit.try_acquire(&config));
        assert!(circuit.try_acquire(&config));
        assert!(!circuit.try_acquire(&config));
    }

    #[test]
    fn recovery_factor_below_one_throttles_admission() {
        let mut circuit = Circuit::new();
        let config = CircuitBreakerConfig::builder()
            .failure_threshold(1)
            .success_threshold(5)
            .timeout(Duration::from_millis(10))
            .recovery_factor(0.5)
            .build();
        circuit.record_failure(&config);
        std::thread::sleep(Duration::from_millis(15));

        assert!(circuit.try_acquire(&config));
        assert!(!circuit.try_acquire(&config));
        assert!(circuit.try_acquire(&config));
    }
}
