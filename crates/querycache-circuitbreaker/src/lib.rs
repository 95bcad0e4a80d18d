//! Circuit breaker with CLOSED / HALF_OPEN / OPEN states and graceful
//! degradation (§4.2).
//!
//! `CircuitBreaker` is a standalone, call-wrapping collaborator — not a Tower
//! middleware. [`crate::CircuitBreaker::call`] gates an arbitrary async
//! operation; admission and outcome recording are driven by the state
//! machine in [`circuit`].
//!
//! ## Feature Flags
//! - `metrics`: counters/gauges via the `metrics` crate.
//! - `tracing`: structured logs via the `tracing` crate.

mod circuit;
mod config;
mod error;
mod events;

use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

pub use circuit::{CircuitMetrics, CircuitState};
pub use config::{CircuitBreakerConfig, CircuitBreakerConfigBuilder};
pub use error::CircuitBreakerError;
pub use events::CircuitBreakerEvent;

use circuit::Circuit;

/// A circuit breaker guarding an arbitrary fallible async operation.
///
/// Admission and outcome bookkeeping are serialized by a single lock (§5
/// "single mutex covering state transition and counter updates"); the
/// current state is also mirrored into an atomic so [`Self::state_sync`] can
/// be read lock-free from sync contexts such as health checks.
pub struct CircuitBreaker {
    circuit: Mutex<Circuit>,
    state_atomic: Arc<AtomicU8>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        let state_atomic = Arc::new(AtomicU8::new(CircuitState::Closed as u8));
        Self {
            circuit: Mutex::new(Circuit::new_with_atomic(Arc::clone(&state_atomic))),
            state_atomic,
            config,
        }
    }

    /// Runs `f` if the breaker admits the call, recording the outcome.
    ///
    /// Denials never invoke `f`: an `Open` circuit yields
    /// [`CircuitBreakerError::Open`], and a HALF_OPEN call outside the
    /// `recoveryFactor` fraction yields [`CircuitBreakerError::Throttled`].
    pub async fn call<F, Fut, T, E>(&self, f: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let (permitted, state_after) = {
            let mut circuit = self.circuit.lock();
            let permitted = circuit.try_acquire(&self.config);
            (permitted, circuit.state())
        };

        if !permitted {
            return Err(if state_after == CircuitState::HalfOpen {
                CircuitBreakerError::Throttled
            } else {
                CircuitBreakerError::Open
            });
        }

        match f().await {
            Ok(value) => {
                self.circuit.lock().record_success(&self.config);
                Ok(value)
            }
            Err(err) => {
                self.circuit.lock().record_failure(&self.config);
                Err(CircuitBreakerError::Inner(err))
            }
        }
    }

    /// Forces the circuit open. Administrative only — never call from the hot path (§4.2).
    pub fn force_open(&self) {
        self.circuit.lock().force_open(&self.config);
    }

    /// Forces the circuit closed. Administrative only — never call from the hot path (§4.2).
    pub fn force_closed(&self) {
        self.circuit.lock().force_closed(&self.config);
    }

    /// Resets to CLOSED and clears counters. Administrative only (§4.2).
    pub fn reset(&self) {
        self.circuit.lock().reset(&self.config);
    }

    pub fn state(&self) -> CircuitState {
        self.circuit.lock().state()
    }

    /// Lock-free state read, safe from sync code such as health checks.
    pub fn state_sync(&self) -> CircuitState {
        CircuitState::from_u8(self.state_atomic.load(Ordering::Acquire))
    }

    pub fn metrics(&self) -> CircuitMetrics {
        self.circuit.lock().metrics(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(failure_threshold: u32) -> CircuitBreaker {
        CircuitBreaker::new(
            CircuitBreakerConfig::builder()
                .failure_threshold(failure_threshold)
                .success_threshold(1)
                .timeout(std::time::Duration::from_millis(20))
                .recovery_factor(1.0)
                .build(),
        )
    }

    #[tokio::test]
    async fn successful_calls_keep_circuit_closed() {
        let cb = breaker(3);
        for _ in 0..10 {
            let result: Result<i32, &str> = cb.call(|| async { Ok(1) }).await;
            assert!(result.is_ok());
        }
        assert_eq!(cb.state_sync(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn opens_after_threshold_and_denies_calls() {
        let cb = breaker(2);
        for _ in 0..2 {
            let _: Result<i32, &str> = cb.call(|| async { Err("boom") }).await;
        }
        assert_eq!(cb.state_sync(), CircuitState::Open);

        let result: Result<i32, &str> = cb.call(|| async { Ok(1) }).await;
        assert!(matches!(result, Err(CircuitBreakerError::Open)));
    }

    #[tokio::test]
    async fn recovers_through_half_open_after_timeout() {
        let cb = breaker(1);
        let _: Result<i32, &str> = cb.call(|| async { Err("boom") }).await;
        assert_eq!(cb.state_sync(), CircuitState::Open);

        tokio::time::sleep(std::time::Duration::from_millis(25)).await;
        let result: Result<i32, &str> = cb.call(|| async { Ok(1) }).await;
        assert!(result.is_ok());
        assert_eq!(cb.state_sync(), CircuitState::Closed);
    }

    #[test]
    fn manual_overrides_work() {
        let cb = breaker(5);
        cb.force_open();
        assert_eq!(cb.state_sync(), CircuitState::Open);
        cb.force_closed();
        assert_eq!(cb.state_sync(), CircuitState::Closed);
    }
}
