//! Circuit breaker for upstream protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: upstream assumed down, calls fail fast
//! - Half-Open: a bounded number of probe calls test recovery
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure rate >= threshold over the sliding window
//! Open → Half-Open: after the cooldown (evaluated on the next call)
//! Half-Open → Closed: every permitted probe succeeds
//! Half-Open → Open: any probe fails
//! ```
//!
//! # Design Decisions
//! - One breaker per call class, not one global breaker
//! - Fail fast in Open state (the action is never invoked)
//! - Outcomes of calls admitted under an earlier state are discarded
//! - The lock is synchronous and never held across an `.await`

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::future::Future;
use std::time::Instant;
use thiserror::Error;

use crate::config::CircuitBreakerConfig;
use crate::observability::metrics;

/// Externally visible breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half-open",
        }
    }
}

/// Why a guarded call did not produce a value.
#[derive(Debug, Error)]
pub enum BreakerFailure<E> {
    /// The breaker is open; the action was not invoked.
    #[error("call not permitted (circuit open)")]
    CallNotPermitted,

    /// The action ran and failed.
    #[error(transparent)]
    Call(E),
}

impl<E> BreakerFailure<E> {
    pub fn is_call_not_permitted(&self) -> bool {
        matches!(self, BreakerFailure::CallNotPermitted)
    }
}

#[derive(Debug, Clone, Copy)]
enum State {
    Closed,
    /// `None` when forced open; stays open until `reset`.
    Open { until: Option<Instant> },
    HalfOpen { in_flight: usize, successes: usize },
}

#[derive(Debug)]
struct Inner {
    state: State,
    /// Bumped on every transition so late outcomes can be discarded.
    generation: u64,
    /// Most recent outcomes in Closed state, `true` = failure.
    window: VecDeque<bool>,
}

/// Point-in-time view for the admin API.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerSnapshot {
    pub name: String,
    pub state: CircuitState,
    pub buffered_calls: usize,
    pub failed_calls: usize,
}

/// A count-based circuit breaker.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
}

/// Permission to run one call. Dropping it unrecorded (e.g. the caller was
/// cancelled) frees a half-open probe slot without counting an outcome.
#[must_use]
pub struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    recorded: bool,
}

impl CallPermit<'_> {
    pub fn record_success(mut self) {
        self.recorded = true;
        self.breaker.on_outcome(self.generation, false);
    }

    pub fn record_failure(mut self) {
        self.recorded = true;
        self.breaker.on_outcome(self.generation, true);
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if !self.recorded {
            self.breaker.release(self.generation);
        }
    }
}

impl CircuitBreaker {
    /// Create a closed breaker.
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            inner: Mutex::new(Inner {
                state: State::Closed,
                generation: 0,
                window: VecDeque::with_capacity(config.sliding_window_size),
            }),
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Current state, applying a due Open → Half-Open transition.
    pub fn state(&self) -> CircuitState {
        let mut inner = self.inner.lock();
        self.maybe_half_open(&mut inner);
        public_state(&inner.state)
    }

    /// Ask for permission to run one call.
    pub fn try_acquire(&self) -> Option<CallPermit<'_>> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        self.maybe_half_open(inner);

        match &mut inner.state {
            State::Closed => {}
            State::Open { .. } => return None,
            State::HalfOpen { in_flight, successes } => {
                if *in_flight + *successes >= self.config.half_open_max_calls {
                    return None;
                }
                *in_flight += 1;
            }
        }

        Some(CallPermit {
            breaker: self,
            generation: inner.generation,
            recorded: false,
        })
    }

    /// Run `action` under the breaker.
    ///
    /// `is_failure` decides whether an error counts against the breaker; errors
    /// it rejects are still returned to the caller but recorded as successes.
    pub async fn run<T, E, F, Fut>(
        &self,
        action: F,
        is_failure: impl Fn(&E) -> bool,
    ) -> Result<T, BreakerFailure<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let Some(permit) = self.try_acquire() else {
            return Err(BreakerFailure::CallNotPermitted);
        };

        match action().await {
            Ok(value) => {
                permit.record_success();
                Ok(value)
            }
            Err(e) => {
                if is_failure(&e) {
                    permit.record_failure();
                } else {
                    permit.record_success();
                }
                Err(BreakerFailure::Call(e))
            }
        }
    }

    /// Force the breaker open until `reset`.
    pub fn force_open(&self) {
        let mut inner = self.inner.lock();
        self.transition(&mut inner, State::Open { until: None });
    }

    /// Return to Closed with an empty window.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        self.transition(&mut inner, State::Closed);
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let mut inner = self.inner.lock();
        self.maybe_half_open(&mut inner);
        BreakerSnapshot {
            name: self.name.clone(),
            state: public_state(&inner.state),
            buffered_calls: inner.window.len(),
            failed_calls: inner.window.iter().filter(|failed| **failed).count(),
        }
    }

    fn on_outcome(&self, generation: u64, failed: bool) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        if inner.generation != generation {
            return;
        }

        let next = match &mut inner.state {
            State::Closed => {
                if inner.window.len() == self.config.sliding_window_size {
                    inner.window.pop_front();
                }
                inner.window.push_back(failed);

                if self.failure_threshold_reached(&inner.window) {
                    tracing::warn!(
                        breaker = %self.name,
                        failed_calls = inner.window.iter().filter(|f| **f).count(),
                        buffered_calls = inner.window.len(),
                        "Failure rate threshold reached, opening circuit"
                    );
                    Some(State::Open {
                        until: Some(Instant::now() + self.config.open_cooldown()),
                    })
                } else {
                    None
                }
            }
            State::HalfOpen { in_flight, successes } => {
                *in_flight = in_flight.saturating_sub(1);
                if failed {
                    tracing::warn!(breaker = %self.name, "Probe call failed, reopening circuit");
                    Some(State::Open {
                        until: Some(Instant::now() + self.config.open_cooldown()),
                    })
                } else {
                    *successes += 1;
                    (*successes >= self.config.half_open_max_calls).then_some(State::Closed)
                }
            }
            State::Open { .. } => None,
        };

        if let Some(next) = next {
            self.transition(inner, next);
        }
    }

    fn release(&self, generation: u64) {
        let mut inner = self.inner.lock();
        if inner.generation != generation {
            return;
        }
        if let State::HalfOpen { in_flight, .. } = &mut inner.state {
            *in_flight = in_flight.saturating_sub(1);
        }
    }

    fn failure_threshold_reached(&self, window: &VecDeque<bool>) -> bool {
        if window.len() < self.config.minimum_calls {
            return false;
        }
        let failures = window.iter().filter(|f| **f).count();
        failures * 100 >= usize::from(self.config.failure_rate_threshold) * window.len()
    }

    fn maybe_half_open(&self, inner: &mut Inner) {
        if let State::Open { until: Some(until) } = inner.state {
            if Instant::now() >= until {
                self.transition(
                    inner,
                    State::HalfOpen {
                        in_flight: 0,
                        successes: 0,
                    },
                );
            }
        }
    }

    fn transition(&self, inner: &mut Inner, to: State) {
        let from = public_state(&inner.state);
        let to_public = public_state(&to);

        inner.state = to;
        inner.generation = inner.generation.wrapping_add(1);
        inner.window.clear();

        if from != to_public {
            tracing::info!(
                breaker = %self.name,
                from = from.as_str(),
                to = to_public.as_str(),
                "Circuit breaker state change"
            );
            metrics::record_breaker_transition(&self.name, to_public.as_str());
        }
    }
}

fn public_state(state: &State) -> CircuitState {
    match state {
        State::Closed => CircuitState::Closed,
        State::Open { .. } => CircuitState::Open,
        State::HalfOpen { .. } => CircuitState::HalfOpen,
    }
}
