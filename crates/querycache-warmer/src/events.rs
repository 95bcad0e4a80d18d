//! Events emitted by [`crate::warmer::Warmer`] (§4.8).

use querycache_core::ResilienceEvent;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub enum WarmerEvent {
    RunStarted { pattern_name: String, timestamp: Instant, planned: usize },
    QueryWarmed { pattern_name: String, timestamp: Instant, query: String, tokens_added: usize },
    QueryFailed { pattern_name: String, timestamp: Instant, query: String, reason: String },
    RunFinished { pattern_name: String, timestamp: Instant, attempted: usize, succeeded: usize, elapsed: Duration },
}

impl ResilienceEvent for WarmerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::RunStarted { .. } => "warmer_run_started",
            Self::QueryWarmed { .. } => "warmer_query_warmed",
            Self::QueryFailed { .. } => "warmer_query_failed",
            Self::RunFinished { .. } => "warmer_run_finished",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            Self::RunStarted { timestamp, .. }
            | Self::QueryWarmed { timestamp, .. }
            | Self::QueryFailed { timestamp, .. }
            | Self::RunFinished { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            Self::RunStarted { pattern_name, .. }
            | Self::QueryWarmed { pattern_name, .. }
            | Self::QueryFailed { pattern_name, .. }
            | Self::RunFinished { pattern_name, .. } => pattern_name,
        }
    }
}
