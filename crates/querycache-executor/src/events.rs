//! Events emitted by the tool executor (§4.7).

use querycache_core::ResilienceEvent;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub enum ExecutorEvent {
    CallPermitted { pattern_name: String, timestamp: Instant, tool: String, concurrent_calls: usize },
    CallRejected { pattern_name: String, timestamp: Instant, tool: String },
    CallSucceeded { pattern_name: String, timestamp: Instant, tool: String, duration: Duration },
    CallFailed { pattern_name: String, timestamp: Instant, tool: String, duration: Duration, kind: &'static str },
}

impl ResilienceEvent for ExecutorEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::CallPermitted { .. } => "call_permitted",
            Self::CallRejected { .. } => "call_rejected",
            Self::CallSucceeded { .. } => "call_succeeded",
            Self::CallFailed { .. } => "call_failed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            Self::CallPermitted { timestamp, .. } => *timestamp,
            Self::CallRejected { timestamp, .. } => *timestamp,
            Self::CallSucceeded { timestamp, .. } => *timestamp,
            Self::CallFailed { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            Self::CallPermitted { pattern_name, .. } => pattern_name,
            Self::CallRejected { pattern_name, .. } => pattern_name,
            Self::CallSucceeded { pattern_name, .. } => pattern_name,
            Self::CallFailed { pattern_name, .. } => pattern_name,
        }
    }
}
