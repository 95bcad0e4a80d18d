use querycache_ratelimiter::{AuthorizerError, RateLimiterError};
use std::time::Duration;
use thiserror::Error;

/// The executor's error taxonomy (§7).
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("tool `{0}` is not registered")]
    ToolNotFound(String),

    #[error("schema conflict re-registering tool `{0}`")]
    SchemaConflict(String),

    #[error("validation failed for field(s): {fields:?}")]
    Validation { fields: Vec<String> },

    #[error(transparent)]
    RateLimited(#[from] RateLimiterError),

    #[error(transparent)]
    Auth(#[from] AuthorizerError),

    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    #[error("execution failed: {0}")]
    ExecutionError(String),

    #[error("executor at capacity (max_concurrency reached)")]
    Busy,
}

impl ExecutorError {
    /// The §7 error kind name, for logging and `ToolResult::error`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ToolNotFound(_) => "ToolNotFound",
            Self::SchemaConflict(_) => "SchemaConflict",
            Self::Validation { .. } => "ValidationError",
            Self::RateLimited(_) => "RateLimited",
            Self::Auth(AuthorizerError::Unauthenticated) => "Unauthenticated",
            Self::Auth(AuthorizerError::Unauthorized { .. }) => "Unauthorized",
            Self::Timeout(_) => "Timeout",
            Self::ExecutionError(_) => "ExecutionError",
            Self::Busy => "Busy",
        }
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited(err) => Some(err.retry_after()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_taxonomy_name() {
        assert_eq!(ExecutorError::ToolNotFound("x".into()).kind(), "ToolNotFound");
        assert_eq!(ExecutorError::Busy.kind(), "Busy");
    }
}
