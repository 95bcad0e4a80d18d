//! Configuration for [`crate::ToolExecutor`] (§6 `executor.*` keys).

use crate::events::ExecutorEvent;
use querycache_core::{EventListeners, FnListener};
use std::time::Duration;

pub struct ExecutorConfig {
    pub(crate) max_concurrency: usize,
    pub(crate) default_timeout: Duration,
    pub(crate) event_listeners: EventListeners<ExecutorEvent>,
    pub(crate) name: String,
}

impl ExecutorConfig {
    pub fn builder() -> ExecutorConfigBuilder {
        ExecutorConfigBuilder::new()
    }
}

/// Builder for [`ExecutorConfig`]. Defaults mirror §6.
pub struct ExecutorConfigBuilder {
    max_concurrency: usize,
    default_timeout: Duration,
    event_listeners: EventListeners<ExecutorEvent>,
    name: String,
}

impl Default for ExecutorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutorConfigBuilder {
    pub fn new() -> Self {
        Self {
            max_concurrency: 50,
            default_timeout: Duration::from_millis(30_000),
            event_listeners: EventListeners::new(),
            name: String::from("<unnamed>"),
        }
    }

    /// Maximum in-flight tool calls. Default: 50.
    pub fn max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = n;
        self
    }

    /// Timeout applied to a tool that didn't set its own. Default: 30s.
    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn on_call_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &ExecutorEvent| {
            if let ExecutorEvent::CallRejected { tool, .. } = event {
                f(tool);
            }
        }));
        self
    }

    pub fn on_call_failed<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &'static str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &ExecutorEvent| {
            if let ExecutorEvent::CallFailed { tool, kind, .. } = event {
                f(tool, kind);
            }
        }));
        self
    }

    pub fn build(self) -> ExecutorConfig {
        ExecutorConfig {
            max_concurrency: self.max_concurrency,
            default_timeout: self.default_timeout,
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }
}
