//! Circuit breaker for model backends
//!
//! A backend that keeps failing (model not pulled, server overloaded) stops
//! receiving requests for a cool-down period instead of stalling every node of
//! every run on its own timeout.

use std::sync::Mutex;
use std::time::{Duration, Instant};
use triage_core::{Result, TriageError};

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Requests flow normally
    Closed,
    /// Requests are rejected without being sent
    Open,
    /// Cool-down elapsed; the next request decides
    HalfOpen,
}

#[derive(Debug, Default)]
struct Tally {
    consecutive_failures: u32,
    last_failure: Option<Instant>,
}

/// Failure tally for one backend client
///
/// ```
/// use std::time::Duration;
/// use triage_agent::{CircuitBreaker, CircuitState};
///
/// let breaker = CircuitBreaker::new(2, Duration::from_secs(30));
/// breaker.record_failure();
/// breaker.record_failure();
///
/// assert_eq!(breaker.state(), CircuitState::Open);
/// assert!(breaker.check("mistral").is_err());
/// ```
#[derive(Debug)]
pub struct CircuitBreaker {
    tally: Mutex<Tally>,
    threshold: u32,
    cool_down: Duration,
}

impl CircuitBreaker {
    /// Open after `threshold` consecutive failures, for `cool_down`
    pub fn new(threshold: u32, cool_down: Duration) -> Self {
        Self {
            tally: Mutex::new(Tally::default()),
            threshold: threshold.max(1),
            cool_down,
        }
    }

    fn with_tally<T>(&self, f: impl FnOnce(&mut Tally) -> T) -> T {
        // A poisoned tally is still a valid count
        let mut tally = match self.tally.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut tally)
    }

    pub fn state(&self) -> CircuitState {
        self.with_tally(|tally| {
            if tally.consecutive_failures < self.threshold {
                return CircuitState::Closed;
            }
            match tally.last_failure {
                Some(at) if at.elapsed() < self.cool_down => CircuitState::Open,
                _ => CircuitState::HalfOpen,
            }
        })
    }

    /// Whether a request may be sent (closed or half-open)
    pub fn can_execute(&self) -> bool {
        self.state() != CircuitState::Open
    }

    /// Reject a request to `backend` while the circuit is open
    pub fn check(&self, backend: &str) -> Result<()> {
        if self.can_execute() {
            return Ok(());
        }
        Err(TriageError::ApiLimit(format!(
            "Circuit breaker is OPEN for {} - wait {} seconds before retry",
            backend,
            self.time_until_retry().as_secs().max(1)
        )))
    }

    pub fn record_success(&self) {
        self.with_tally(|tally| *tally = Tally::default());
    }

    /// Count a failure, returning the consecutive total
    pub fn record_failure(&self) -> u32 {
        self.with_tally(|tally| {
            tally.consecutive_failures += 1;
            tally.last_failure = Some(Instant::now());
            tally.consecutive_failures
        })
    }

    pub fn failure_count(&self) -> u32 {
        self.with_tally(|tally| tally.consecutive_failures)
    }

    /// Remaining cool-down, zero unless open
    pub fn time_until_retry(&self) -> Duration {
        if self.state() != CircuitState::Open {
            return Duration::ZERO;
        }
        self.with_tally(|tally| {
            tally
                .last_failure
                .map(|at| self.cool_down.saturating_sub(at.elapsed()))
                .unwrap_or_default()
        })
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        // 3 failures, 30 second cool-down
        Self::new(3, Duration::from_secs(30))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_until_threshold() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(60));
        assert_eq!(breaker.record_failure(), 1);
        assert_eq!(breaker.record_failure(), 2);
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert!(breaker.check("phi3:mini").is_ok());

        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        let err = breaker.check("phi3:mini").unwrap_err();
        assert!(matches!(err, TriageError::ApiLimit(_)));
        assert!(err.to_string().contains("phi3:mini"));
    }

    #[test]
    fn test_success_closes_circuit() {
        let breaker = CircuitBreaker::new(1, Duration::from_secs(60));
        breaker.record_failure();
        assert!(!breaker.can_execute());

        breaker.record_success();
        assert_eq!(breaker.failure_count(), 0);
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn test_half_open_after_cool_down() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(100));
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(breaker.time_until_retry() > Duration::ZERO);

        std::thread::sleep(Duration::from_millis(150));
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        assert_eq!(breaker.time_until_retry(), Duration::ZERO);
        assert!(breaker.check("mistral").is_ok());
    }
}
