//! Failure-counting circuit breaker for the oracle upstream
//!
//! A closed circuit passes every call. After `failure_threshold` consecutive
//! failures it opens and rejects calls until `reset_timeout` has elapsed,
//! then lets a trial call through half-open. A success closes it; a failed trial
//! reopens it.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone)]
struct Circuit {
    state: BreakerState,
    consecutive_failures: usize,
    last_failure: Option<Instant>,
    opened_at: Option<Instant>,
}

impl Default for Circuit {
    fn default() -> Self {
        Self {
            state: BreakerState::Closed,
            consecutive_failures: 0,
            last_failure: None,
            opened_at: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: usize,
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(30),
        }
    }
}

/// Circuit breaker shared by every caller of one client
pub struct CircuitBreaker {
    circuit: Mutex<Circuit>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            circuit: Mutex::new(Circuit::default()),
            config,
        }
    }

    fn circuit(&self) -> MutexGuard<'_, Circuit> {
        self.circuit.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether the next call must be rejected without being attempted
    pub fn is_open(&self) -> bool {
        let mut circuit = self.circuit();
        if circuit.state != BreakerState::Open {
            return false;
        }

        let cooled_down = circuit
            .opened_at
            .map_or(true, |opened_at| opened_at.elapsed() >= self.config.reset_timeout);
        if cooled_down {
            circuit.state = BreakerState::HalfOpen;
        }
        !cooled_down
    }

    pub fn mark_success(&self) {
        *self.circuit() = Circuit::default();
    }

    pub fn mark_failure(&self) {
        let now = Instant::now();
        let mut circuit = self.circuit();

        circuit.consecutive_failures += 1;
        circuit.last_failure = Some(now);

        if circuit.state == BreakerState::HalfOpen
            || circuit.consecutive_failures >= self.config.failure_threshold
        {
            circuit.state = BreakerState::Open;
            circuit.opened_at = Some(now);
        }
    }

    pub fn stats(&self) -> BreakerStats {
        let circuit = self.circuit();
        BreakerStats {
            state: circuit.state,
            failure_count: circuit.consecutive_failures,
            last_failure: circuit.last_failure,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BreakerStats {
    pub state: BreakerState,
    pub failure_count: usize,
    pub last_failure: Option<Instant>,
}
