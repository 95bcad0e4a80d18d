//! Errors returned by [`crate::store::CacheStore`].

use querycache_core::QueryCacheError;
use std::fmt;

/// Failure kinds for `store`/`get`/`invalidate` (§4.1, §7).
#[derive(Debug, Clone)]
pub enum CacheError {
    ContentTooSmall { token_count: usize, min_tokens: usize },
    VersionMismatch { expected: String, actual: String },
    Full { required_bytes: usize },
    Corrupt { detail: String },
}

impl fmt::Display for CacheError {
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
        }
    }
}

impl std::error::Error for CacheError {}

impl From<CacheError> for QueryCacheError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::ContentTooSmall { token_count, min_tokens } => {
                QueryCacheError::ContentTooSmall { token_count, min_tokens }
            }
            CacheError::VersionMismatch { expected, actual } => {
                QueryCacheError::VersionMismatch { expected, actual }
            }
            CacheError::Full { required_bytes } => QueryCacheError::Full { required_bytes },
            CacheError::Corrupt { detail } => QueryCacheError::Corrupt { detail },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_into_query_cache_error() {
        let err = CacheError::Full { required_bytes: 10 };
        let converted: QueryCacheError = err.into();
        assert!(matches!(converted, QueryCacheError::Full { required_bytes: 10 }));
    }
}
