use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by [`crate::RateLimiter`] and [`crate::Authorizer`] (§7).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RateLimiterError {
    #[error("rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },
}

impl RateLimiterError {
    pub fn retry_after(&self) -> Duration {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthorizerError {
    #[error("no identity supplied for a tool that requires authentication")]
    Unauthenticated,
    #[error("caller is missing required scope(s): {missing:?}")]
    Unauthorized { missing: Vec<String> },
}

impl AuthorizerError {
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Unauthenticated)
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_after_extracts_duration() {
        let err = RateLimiterError::RateLimited {
            retry_after: Duration::from_secs(3),
        };
        assert_eq!(err.retry_after(), Duration::from_secs(3));
    }
}
