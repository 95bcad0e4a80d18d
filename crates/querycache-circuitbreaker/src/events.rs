//! Events emitted by the circuit breaker (§4.2).

use crate::circuit::CircuitState;
use querycache_core::ResilienceEvent;
use std::time::Instant;

#[derive(Debug)]
pub enum CircuitBreakerEvent {
    StateTransition {
        pattern_name: String,
        timestamp: Instant,
        from_state: CircuitState,
        to_state: CircuitState,
    },
    CallPermitted {
        pattern_name: String,
        timestamp: Instant,
        state: CircuitState,
    },
    CallRejected {
        pattern_name: String,
        timestamp: Instant,
        state: CircuitState,
    },
    SuccessRecorded {
        pattern_name: String,
        timestamp: Instant,
        state: CircuitState,
    },
    FailureRecorded {
        pattern_name: String,
        timestamp: Instant,
        state: CircuitState,
    },
}

impl ResilienceEvent for CircuitBreakerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::StateTransition { .. } => "circuitbreaker_state_transition",
            Self::CallPermitted { .. } => "circuitbreaker_call_permitted",
            Self::CallRejected { .. } => "circuitbreaker_call_rejected",
            Self::SuccessRecorded { .. } => "circuitbreaker_success",
            Self::FailureRecorded { .. } => "circuitbreaker_failure",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            Self::StateTransition { timestamp, .. }
            | Self::CallPermitted { timestamp, .. }
            | Self::CallRejected { timestamp, .. }
            | Self::SuccessRecorded { timestamp, .. }
            | Self::FailureRecorded { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            Self::StateTransition { pattern_name, .. }
            | Self::CallPermitted { pattern_name, .. }
            | Self::CallRejected { pattern_name, .. }
            | Self::SuccessRecorded { pattern_name, .. }
            | Self::FailureRecorded { pattern_name, .. } => pattern_name,
        }
    }
}
