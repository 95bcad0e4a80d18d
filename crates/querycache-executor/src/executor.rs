//! The tool-call pipeline: lookup, validate, rate-limit, authorize, invoke
//! with a deadline, classify (§4.7).
//!
//! Concurrency admission is a `tokio::sync::Semaphore` sized to
//! `maxConcurrency`, the same acquire/emit-event/invoke/release shape the
//! bulkhead pattern uses for its own concurrent-call cap.

use crate::config::ExecutorConfig;
use crate::error::ExecutorError;
use crate::events::ExecutorEvent;
use crate::registry::ToolRegistry;
use crate::validator::validate;
use querycache_ratelimiter::{Authorizer, RateLimiter};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// One tool invocation request.
pub struct ToolCall {
    pub tool: String,
    pub args: Value,
    pub user_id: String,
    pub token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ToolResultError {
    pub kind: &'static str,
    pub message: String,
    pub retry_after: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct ToolResult {
    pub success: bool,
    pub data: Option<Value>,
    pub error: Option<ToolResultError>,
    pub duration_ms: u64,
}

/// Runs validated, rate-limited, authorized, deadline-bounded tool calls,
/// capped at `maxConcurrency` in flight (§4.7, §5 backpressure).
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    rate_limiter: Option<Arc<RateLimiter>>,
    authorizer: Option<Authorizer>,
    semaphore: Arc<Semaphore>,
    config: ExecutorConfig,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>, config: ExecutorConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrency));
        Self { registry, rate_limiter: None, authorizer: None, semaphore, config }
    }

    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    pub fn with_authorizer(mut self, authorizer: Authorizer) -> Self {
        self.authorizer = Some(authorizer);
        self
    }

    fn emit(&self, event: ExecutorEvent) {
        self.config.event_listeners.emit(&event);
    }

    pub async fn execute(&self, call: ToolCall) -> ToolResult {
        let start = Instant::now();
        match self.execute_inner(&call).await {
            Ok(data) => {
                let duration = start.elapsed();
                self.emit(ExecutorEvent::CallSucceeded {
                    pattern_name: self.config.name.clone(),
                    timestamp: Instant::now(),
                    tool: call.tool.clone(),
                    duration,
                });
                ToolResult { success: true, data: Some(data), error: None, duration_ms: duration.as_millis() as u64 }
            }
            Err(err) => {
                let duration = start.elapsed();
                self.emit(ExecutorEvent::CallFailed {
                    pattern_name: self.config.name.clone(),
                    timestamp: Instant::now(),
                    tool: call.tool.clone(),
                    duration,
                    kind: err.kind(),
                });
                ToolResult {
                    success: false,
                    data: None,
                    error: Some(ToolResultError {
                        kind: err.kind(),
                        message: err.to_string(),
                        retry_after: err.retry_after(),
                    }),
                    duration_ms: duration.as_millis() as u64,
                }
            }
        }
    }

    /// Submits a batch of independent calls; no ordering is promised between
    /// them, but each result's position corresponds to its call's position
    /// (§4.7 "call IDs allow callers to reassociate results").
    pub async fn execute_batch(&self, calls: Vec<ToolCall>) -> Vec<ToolResult> {
        let futures = calls.into_iter().map(|call| self.execute(call));
        futures::future::join_all(futures).await
    }

    async fn execute_inner(&self, call: &ToolCall) -> Result<Value, ExecutorError> {
        let tool = self.registry.get(&call.tool)?;
        validate(&tool.schema, &call.args)?;

        if let Some(limiter) = &self.rate_limiter {
            limiter.try_acquire(&call.user_id, 1.0)?;
        }

        if let Some(authorizer) = &self.authorizer {
            authorizer.authorize(tool.requires_auth, &tool.required_scopes, call.token.as_deref())?;
        }

        let permit = match Arc::clone(&self.semaphore).try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                self.emit(ExecutorEvent::CallRejected {
                    pattern_name: self.config.name.clone(),
                    timestamp: Instant::now(),
                    tool: call.tool.clone(),
                });
                return Err(ExecutorError::Busy);
            }
        };
        self.emit(ExecutorEvent::CallPermitted {
            pattern_name: self.config.name.clone(),
            timestamp: Instant::now(),
            tool: call.tool.clone(),
            concurrent_calls: self.config.max_concurrency - self.semaphore.available_permits(),
        });

        let handler = Arc::clone(&tool.handler);
        let args = call.args.clone();
        let timeout = tool.timeout.unwrap_or(self.config.default_timeout);

        let handle = tokio::spawn(async move {
            let _permit = permit;
            handler.invoke(args).await
        });
        let abort_handle = handle.abort_handle();

        match tokio::time::timeout(timeout, handle).await {
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(message))) => Err(ExecutorError::ExecutionError(message)),
            Ok(Err(join_err)) => Err(ExecutorError::ExecutionError(format!("tool handler panicked: {join_err}"))),
            Err(_) => {
                abort_handle.abort();
                Err(ExecutorError::Timeout(timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ToolHandler, ToolRecord};
    use crate::schema::ToolSchema;
    use futures::future::BoxFuture;
    use querycache_ratelimiter::RateLimiterConfig;
    use serde_json::json;

    fn handler(f: impl Fn(Value) -> BoxFuture<'static, Result<Value, String>> + Send + Sync + 'static) -> impl ToolHandler {
        f
    }

    fn registry_with_echo() -> Arc<ToolRegistry> {
        let registry = ToolRegistry::new();
        registry
            .register(ToolRecord::new(
                "echo",
                ToolSchema::new(),
                handler(|args| Box::pin(async move { Ok(args) })),
            ))
            .unwrap();
        Arc::new(registry)
    }

    fn call(tool: &str) -> ToolCall {
        ToolCall { tool: tool.to_string(), args: json!({}), user_id: "u1".to_string(), token: None }
    }

    #[tokio::test]
    async fn successful_call_returns_data() {
        let executor = ToolExecutor::new(registry_with_echo(), ExecutorConfig::builder().build());
        let result = executor.execute(call("echo")).await;
        assert!(result.success);
        assert_eq!(result.data, Some(json!({})));
    }

    #[tokio::test]
    async fn missing_tool_is_tool_not_found() {
        let executor = ToolExecutor::new(registry_with_echo(), ExecutorConfig::builder().build());
        let result = executor.execute(call("missing")).await;
        assert!(!result.success);
        assert_eq!(result.error.unwrap().kind, "ToolNotFound");
    }

    #[tokio::test]
    async fn slow_tool_times_out() {
        let registry = ToolRegistry::new();
        registry
            .register(
                ToolRecord::new(
                    "slow",
                    ToolSchema::new(),
                    handler(|_| {
                        Box::pin(async move {
                            tokio::time::sleep(Duration::from_millis(500)).await;
                            Ok(json!("too late"))
                        })
                    }),
                )
                .timeout(Duration::from_millis(50)),
            )
            .unwrap();

        let executor = ToolExecutor::new(Arc::new(registry), ExecutorConfig::builder().build());
        let start = Instant::now();
        let result = executor.execute(call("slow")).await;
        assert!(!result.success);
        assert_eq!(result.error.unwrap().kind, "Timeout");
        assert!(start.elapsed() < Duration::from_millis(400));
    }

    #[tokio::test]
    async fn exhausted_concurrency_returns_busy() {
        let registry = ToolRegistry::new();
        registry
            .register(ToolRecord::new(
                "slow",
                ToolSchema::new(),
                handler(|_| {
                    Box::pin(async move {
                        tokio::time::sleep(Duration::from_millis(200)).await;
                        Ok(json!("done"))
                    })
                }),
            ))
            .unwrap();

        let executor = Arc::new(ToolExecutor::new(
            Arc::new(registry),
            ExecutorConfig::builder().max_concurrency(1).build(),
        ));

        let first = tokio::spawn({
            let executor = Arc::clone(&executor);
            async move { executor.execute(call("slow")).await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        let second = executor.execute(call("slow")).await;

        assert!(!second.success);
        assert_eq!(second.error.unwrap().kind, "Busy");
        assert!(first.await.unwrap().success);
    }

    #[tokio::test]
    async fn tool_without_its_own_timeout_uses_the_executors_default() {
        let registry = ToolRegistry::new();
        registry
            .register(ToolRecord::new(
                "slow",
                ToolSchema::new(),
                handler(|_| {
                    Box::pin(async move {
                        tokio::time::sleep(Duration::from_millis(200)).await;
                        Ok(json!("too late"))
                    })
                }),
            ))
            .unwrap();

        let executor = ToolExecutor::new(
            Arc::new(registry),
            ExecutorConfig::builder().default_timeout(Duration::from_millis(50)).build(),
        );
        let start = Instant::now();
        let result = executor.execute(call("slow")).await;
        assert!(!result.success);
        assert_eq!(result.error.unwrap().kind, "Timeout");
        assert!(start.elapsed() < Duration::from_millis(150));
    }

    #[tokio::test]
    async fn rate_limited_user_is_rejected() {
        let limiter = Arc::new(RateLimiter::new(RateLimiterConfig::builder().max_calls_per_minute(1).build()));
        let executor = ToolExecutor::new(registry_with_echo(), ExecutorConfig::builder().build())
            .with_rate_limiter(limiter);
        assert!(executor.execute(call("echo")).await.success);
        let second = executor.execute(call("echo")).await;
        assert!(!second.success);
        assert_eq!(second.error.unwrap().kind, "RateLimited");
    }
}
