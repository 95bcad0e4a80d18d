use thiserror::Error;

/// Errors returned by [`crate::CircuitBreaker::call`].
#[derive(Debug, Error)]
pub enum CircuitBreakerError<E> {
    /// The circuit is open; calls are not permitted (§7 `CircuitOpen`).
    #[error("circuit is open; call not permitted")]
    Open,

    /// The circuit is half-open and this call fell outside `recoveryFactor`'s
    /// admitted fraction (§7 `CircuitThrottling`).
    #[error("circuit is half-open; call throttled")]
    Throttled,

    /// The wrapped call itself failed.
    #[error("inner call error: {0}")]
    Inner(E),
}

impl<E> CircuitBreakerError<E> {
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    pub fn is_throttled(&self) -> bool {
        matches!(self, Self::Throttled)
    }

    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Inner(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helpers_classify_variants() {
        let open: CircuitBreakerError<&str> = CircuitBreakerError::Open;
        assert!(open.is_circuit_open());
        assert_eq!(open.into_inner(), None);

        let inner = CircuitBreakerError::Inner("boom");
        assert!(!inner.is_circuit_open());
        assert_eq!(inner.into_inner(), Some("boom"));
    }
}
