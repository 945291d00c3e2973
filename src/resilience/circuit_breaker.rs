//! Circuit breaker for the external dependency.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: dependency assumed down, calls fail fast
//! - Half-Open: one trial call tests whether it recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure_count >= failure_threshold
//! Open → Half-Open: first call after last_failure + reset_timeout
//! Half-Open → Closed: trial succeeds (failure_count = 0)
//! Half-Open → Open: trial fails
//! Closed → Closed: any success resets failure_count
//! ```
//!
//! # Design Decisions
//! - One breaker per guarded dependency, shared through `Arc`
//! - The mutex covers bookkeeping only, never the guarded call
//! - Single trial in Half-Open; concurrent callers are rejected meanwhile
//! - An abandoned trial (future dropped) puts the breaker back to Open

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;

use crate::clock::Clock;
use crate::config::CircuitBreakerConfig;
use crate::observability::metrics;

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    fn as_gauge(self) -> f64 {
        match self {
            CircuitState::Closed => 0.0,
            CircuitState::Open => 1.0,
            CircuitState::HalfOpen => 2.0,
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half_open"),
        }
    }
}

/// Failure of a call made through the breaker.
#[derive(Debug, Error)]
pub enum BreakerError<E> {
    /// Rejected without invoking the guarded function.
    #[error("circuit breaker is open")]
    Open,

    /// The guarded function ran and failed.
    #[error("guarded call failed: {0}")]
    Inner(E),
}

/// Point-in-time view of the breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    pub failure_count: u32,
    /// Time of the last recorded failure since the Unix epoch, if any.
    pub last_failure: Option<Duration>,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    failure_count: u32,
    last_failure: Option<Duration>,
    trial_in_flight: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    Normal,
    Trial,
}

/// A shared circuit breaker guarding one dependency.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    failure_threshold: u32,
    reset_timeout: Duration,
    clock: Arc<dyn Clock>,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: &CircuitBreakerConfig, clock: Arc<dyn Clock>) -> Self {
        let breaker = Self {
            name: name.into(),
            failure_threshold: config.failure_threshold.max(1),
            reset_timeout: config.reset_timeout(),
            clock,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failure_count: 0,
                last_failure: None,
                trial_in_flight: false,
            }),
        };
        metrics::record_breaker_state(&breaker.name, CircuitState::Closed.as_gauge());
        breaker
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        BreakerSnapshot {
            state: inner.state,
            failure_count: inner.failure_count,
            last_failure: inner.last_failure,
        }
    }

    pub fn state(&self) -> CircuitState {
        self.snapshot().state
    }

    /// Run `f` through the breaker.
    ///
    /// Returns [`BreakerError::Open`] without calling `f` while the circuit
    /// is open, otherwise records the outcome of `f` and passes it through.
    pub async fn call<T, E, F, Fut>(&self, f: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let admission = match self.admit() {
            Some(admission) => admission,
            None => {
                metrics::record_breaker_rejection(&self.name);
                return Err(BreakerError::Open);
            }
        };

        let mut trial = TrialGuard {
            breaker: self,
            armed: admission == Admission::Trial,
        };

        let result = f().await;

        trial.armed = false;
        match &result {
            Ok(_) => self.on_success(admission),
            Err(_) => self.on_failure(admission),
        }
        result.map_err(BreakerError::Inner)
    }

    fn admit(&self) -> Option<Admission> {
        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        match inner.state {
            CircuitState::Closed => Some(Admission::Normal),
            CircuitState::Open => {
                let now = self.clock.now();
                let reopen_at = inner.last_failure.unwrap_or_default() + self.reset_timeout;
                if now > reopen_at {
                    self.transition(&mut inner, CircuitState::HalfOpen);
                    inner.trial_in_flight = true;
                    Some(Admission::Trial)
                } else {
                    tracing::debug!(breaker = %self.name, "Circuit open, rejecting call");
                    None
                }
            }
            CircuitState::HalfOpen => {
                if inner.trial_in_flight {
                    tracing::debug!(breaker = %self.name, "Trial in flight, rejecting call");
                    None
                } else {
                    inner.trial_in_flight = true;
                    Some(Admission::Trial)
                }
            }
        }
    }

    fn on_success(&self, admission: Admission) {
        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        if admission == Admission::Trial {
            inner.trial_in_flight = false;
        }
        inner.failure_count = 0;
        self.transition(&mut inner, CircuitState::Closed);
    }

    fn on_failure(&self, admission: Admission) {
        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        if admission == Admission::Trial {
            inner.trial_in_flight = false;
        }
        inner.failure_count = inner.failure_count.saturating_add(1);
        inner.last_failure = Some(self.clock.now());

        if inner.state == CircuitState::HalfOpen || inner.failure_count >= self.failure_threshold {
            self.transition(&mut inner, CircuitState::Open);
        }
    }

    fn on_abandoned_trial(&self) {
        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        inner.trial_in_flight = false;
        if inner.state == CircuitState::HalfOpen {
            tracing::debug!(breaker = %self.name, "Trial call abandoned");
            self.transition(&mut inner, CircuitState::Open);
        }
    }

    fn transition(&self, inner: &mut BreakerInner, to: CircuitState) {
        let from = inner.state;
        if from == to {
            return;
        }
        inner.state = to;
        if to == CircuitState::Closed {
            inner.failure_count = 0;
        }

        match to {
            CircuitState::Open => tracing::warn!(
                breaker = %self.name,
                %from,
                failure_count = inner.failure_count,
                "Circuit opened"
            ),
            _ => tracing::info!(breaker = %self.name, %from, %to, "Circuit state changed"),
        }
        metrics::record_breaker_state(&self.name, to.as_gauge());
    }
}

/// Restores the breaker if a trial call is dropped before it completes.
struct TrialGuard<'a> {
    breaker: &'a CircuitBreaker,
    armed: bool,
}

impl Drop for TrialGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.breaker.on_abandoned_trial();
        }
    }
}
