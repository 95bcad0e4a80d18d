//! The crate-wide error taxonomy for querycache.
//!
//! This module provides [`QueryCacheError`], a single error type that every
//! component (cache, breaker, executor, rate limiter, registry) can convert
//! into without hand-written `From` impls at every call site. It plays the
//! same role here that `ResilienceError<E>` plays in a composed Tower stack:
//! one error type at the boundary, with helper predicates for the caller.
//!
//! # Example
//!
//! ```
//! use querycache_core::QueryCacheError;
//!
//! fn handle(err: QueryCacheError) {
//!     if err.is_rate_limited() {
//!         if let Some(retry_after) = err.retry_after() {
//!             eprintln!("retry after {:?}", retry_after);
//!         }
//!     } else if err.is_internal() {
//!         eprintln!("internal error: {}", err);
//!     }
//! }
//! ```

use std::fmt;
use std::time::Duration;

/// Every user-visible failure kind produced by the engine.
///
/// Variants never carry stack traces or internal identifiers; that context
/// belongs in logs emitted alongside the error, not in the error itself.
#[derive(Debug, Clone)]
pub enum QueryCacheError {
    /// Content was below `cache.minTokens`; the caller may pad and retry.
    ContentTooSmall { token_count: usize, min_tokens: usize },
    /// The content's `version` does not match the cache's current version.
    VersionMismatch { expected: String, actual: String },
    /// Eviction could not free enough space for the new entry.
    Full { required_bytes: usize },
    /// An internal cache invariant was violated (never caller-triggerable).
    Corrupt { detail: String },
    /// The circuit breaker denied the call outright.
    CircuitOpen { name: Option<String> },
    /// The circuit breaker denied the call under half-open throttling.
    CircuitThrottling { name: Option<String> },
    /// No tool is registered under this name.
    ToolNotFound { name: String },
    /// Re-registering a tool under an existing name with an incompatible schema.
    SchemaConflict { name: String },
    /// Argument validation failed; every offending field is listed (no short-circuit).
    ValidationError { fields: Vec<String> },
    /// The caller exceeded their rate limit.
    RateLimited { retry_after: Duration },
    /// The call carried no resolvable identity but the tool requires one.
    Unauthenticated,
    /// The caller's identity lacks one or more required scopes.
    Unauthorized { missing_scopes: Vec<String> },
    /// The tool handler did not complete before its deadline.
    Timeout { elapsed: Duration },
    /// The tool handler returned or raised an error.
    ExecutionError { status: String },
    /// The executor is at `executor.maxConcurrency` and cannot accept more work.
    Busy { max_concurrency: usize },
    /// Anything else; always logged with full context server-side.
    Internal { detail: String },
}

impl fmt::Display for QueryCacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContentTooSmall { token_count, min_tokens } => write!(
                f,
                "content too small to cache ({token_count} < {min_tokens} tokens)"
            ),
            Self::VersionMismatch { expected, actual } => {
                write!(f, "version mismatch (expected {expected}, got {actual})")
            }
            Self::Full { required_bytes } => {
                write!(f, "cache full, could not free {required_bytes} bytes")
            }
            Self::Corrupt { detail } => write!(f, "cache corrupt: {detail}"),
            Self::CircuitOpen { name } => match name {
                Some(n) => write!(f, "circuit '{n}' is open"),
                None => write!(f, "circuit is open"),
            },
            Self::CircuitThrottling { name } => match name {
                Some(n) => write!(f, "circuit '{n}' is throttling half-open calls"),
                None => write!(f, "circuit is throttling half-open calls"),
            },
            Self::ToolNotFound { name } => write!(f, "no tool registered as '{name}'"),
            Self::SchemaConflict { name } => {
                write!(f, "tool '{name}' already registered with an incompatible schema")
            }
            Self::ValidationError { fields } => {
                write!(f, "validation failed for fields: {}", fields.join(", "))
            }
            Self::RateLimited { retry_after } => {
                write!(f, "rate limited, retry after {retry_after:?}")
            }
            Self::Unauthenticated => write!(f, "no caller identity resolved"),
            Self::Unauthorized { missing_scopes } => {
                write!(f, "missing required scopes: {}", missing_scopes.join(", "))
            }
            Self::Timeout { elapsed } => write!(f, "timed out after {elapsed:?}"),
            Self::ExecutionError { status } => write!(f, "execution failed: {status}"),
            Self::Busy { max_concurrency } => {
                write!(f, "executor busy (max_concurrency={max_concurrency})")
            }
            Self::Internal { detail } => write!(f, "internal error: {detail}"),
        }
    }
}

impl std::error::Error for QueryCacheError {}

impl QueryCacheError {
    /// `true` for any circuit-breaker denial (`CircuitOpen` or `CircuitThrottling`).
    pub fn is_circuit_denied(&self) -> bool {
        matches!(self, Self::CircuitOpen { .. } | Self::CircuitThrottling { .. })
    }

    /// `true` if this is a rate-limiter rejection.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// `true` if this is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// `true` for `Internal` or `Corrupt`, both of which should always be logged.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. } | Self::Corrupt { .. })
    }

    /// `true` if the caller may pad the content and retry the store.
    pub fn is_content_too_small(&self) -> bool {
        matches!(self, Self::ContentTooSmall { .. })
    }

    /// The suggested wait duration, present only for `RateLimited`.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const _: () = {
        const fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<QueryCacheError>();
    };

    #[test]
    fn display_includes_context() {
        let err = QueryCacheError::ContentTooSmall { token_count: 80, min_tokens: 500 };
        assert!(err.to_string().contains("80"));
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn retry_after_only_on_rate_limited() {
        let rl = QueryCacheError::RateLimited { retry_after: Duration::from_secs(10) };
        assert_eq!(rl.retry_after(), Some(Duration::from_secs(10)));

        let other = QueryCacheError::Unauthenticated;
        assert_eq!(other.retry_after(), None);
    }

    #[test]
    fn circuit_denied_covers_both_variants() {
        assert!(QueryCacheError::CircuitOpen { name: None }.is_circuit_denied());
        assert!(QueryCacheError::CircuitThrottling { name: None }.is_circuit_denied());
        assert!(!QueryCacheError::Unauthenticated.is_circuit_denied());
    }
}
