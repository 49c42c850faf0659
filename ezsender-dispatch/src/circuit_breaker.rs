//! Circuit breaker guarding the downstream mail service
//!
//! One breaker instance is shared by every concurrent send of a dispatch. It
//! tracks the health of the mail capability and stops invoking it once it
//! looks unhealthy, so a struggling service is not buried under retries.
//!
//! # Circuit Breaker Pattern
//!
//! The circuit breaker has three states:
//! - **Closed**: Normal operation, every send is attempted
//! - **Open**: Circuit tripped, sends fail immediately without being attempted
//! - **Half-Open**: Testing recovery, sends are attempted and their results decide
//!   whether the circuit closes or reopens
//!
//! # State Transitions
//!
//! ```text
//! ┌─────────┐  failure_count reaches failure_threshold  ┌──────┐
//! │ Closed  │ ────────────────────────────────────────> │ Open │ <──┐
//! └─────────┘                                           └──────┘    │
//!     ^                                                    │        │
//!     │                                                    │ now > next_attempt_at
//!     │  success_count exceeds success_threshold           v        │
//!     └──────────────────────────────────────────── ┌───────────┐   │
//!                                                   │ Half-Open │ ──┘
//!                                                   └───────────┘  any failure
//! ```
//!
//! # Concurrency
//!
//! All state lives behind a single mutex, and every admission decision and
//! every recorded result is one critical section. Only the first caller past
//! the open timeout performs the Open -> Half-Open transition; concurrent
//! callers then find the circuit half-open and are admitted as well. Each
//! transition bumps a generation counter; a result is only applied if it was
//! admitted in the current generation, so completions that straddle a
//! transition never move counters based on a state they did not observe.

use std::future::Future;

use ezsender_common::tracing;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::time::{Duration, Instant};

/// Configuration for circuit breaker behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Number of failures required to open the circuit
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Half-open successes needed to close the circuit (it closes once this is exceeded)
    #[serde(default = "default_success_threshold")]
    pub success_threshold: u32,

    /// How long the circuit stays open before testing recovery (seconds)
    #[serde(default = "default_open_timeout_secs")]
    pub open_timeout_secs: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            success_threshold: default_success_threshold(),
            open_timeout_secs: default_open_timeout_secs(),
        }
    }
}

const fn default_failure_threshold() -> u32 {
    5
}

const fn default_success_threshold() -> u32 {
    2
}

const fn default_open_timeout_secs() -> u64 {
    30
}

impl CircuitBreakerConfig {
    #[must_use]
    pub const fn open_timeout(&self) -> Duration {
        Duration::from_secs(self.open_timeout_secs)
    }

    /// Semantic checks serde cannot express
    ///
    /// Returns every problem found, not just the first.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.failure_threshold == 0 {
            problems.push("circuit_breaker.failure_threshold must be at least 1".to_string());
        }
        if self.success_threshold == 0 {
            problems.push("circuit_breaker.success_threshold must be at least 1".to_string());
        }
        problems
    }
}

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CircuitState {
    /// Normal operation - all sends allowed
    Closed,
    /// Circuit tripped - reject all sends immediately
    Open,
    /// Testing recovery - sends allowed, any failure reopens
    HalfOpen,
}

/// Error returned by [`CircuitBreaker::call`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallError<E> {
    /// The breaker rejected the call; the action was not invoked
    Open,
    /// The action ran and failed
    Failed(E),
}

#[derive(Debug)]
struct CircuitBreakerData {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    next_attempt_at: Option<Instant>,
    /// Bumped on every state transition
    generation: u64,
}

impl CircuitBreakerData {
    const fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            success_count: 0,
            next_attempt_at: None,
            generation: 0,
        }
    }

    fn transition(&mut self, state: CircuitState) {
        self.state = state;
        self.generation += 1;
    }

    fn open(&mut self, open_timeout: Duration) {
        self.transition(CircuitState::Open);
        self.success_count = 0;
        self.next_attempt_at = Some(Instant::now() + open_timeout);
    }

    fn is_timeout_expired(&self) -> bool {
        self.next_attempt_at
            .is_none_or(|next_attempt_at| Instant::now() > next_attempt_at)
    }
}

/// Circuit breaker statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerStats {
    pub state: CircuitState,
    pub failure_count: u32,
    pub success_count: u32,
    /// When an open circuit will next admit sends
    pub next_attempt_at: Option<Instant>,
}

/// Gate in front of the mail capability
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    data: Mutex<CircuitBreakerData>,
}

impl CircuitBreaker {
    /// Create a new breaker in the closed state
    ///
    /// Zero thresholds are raised to 1.
    #[must_use]
    pub fn new(mut config: CircuitBreakerConfig) -> Self {
        config.failure_threshold = config.failure_threshold.max(1);
        config.success_threshold = config.success_threshold.max(1);

        Self {
            config,
            data: Mutex::new(CircuitBreakerData::new()),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Run `action` if the circuit allows it, and record its result.
    ///
    /// # Errors
    ///
    /// [`CallError::Open`] when the circuit is open - `action` is not invoked
    /// in that case.
    /// [`CallError::Failed`] when the action itself fails.
    pub async fn call<F, Fut, T, E>(&self, action: F) -> Result<T, CallError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let Some(generation) = self.admit() else {
            return Err(CallError::Open);
        };

        match action().await {
            Ok(value) => {
                self.record(generation, true);
                Ok(value)
            }
            Err(e) => {
                self.record(generation, false);
                Err(CallError::Failed(e))
            }
        }
    }

    /// Decide whether a new action may run, returning the generation it was
    /// admitted in
    fn admit(&self) -> Option<u64> {
        let mut data = self.data.lock();

        match data.state {
            CircuitState::Closed | CircuitState::HalfOpen => Some(data.generation),
            CircuitState::Open => {
                if !data.is_timeout_expired() {
                    return None;
                }

                data.transition(CircuitState::HalfOpen);
                data.success_count = 0;
                tracing::info!("Circuit breaker entering HALF-OPEN state - testing recovery");

                Some(data.generation)
            }
        }
    }

    /// Apply the result of an admitted action
    fn record(&self, admitted: u64, success: bool) {
        let mut data = self.data.lock();

        if data.generation != admitted {
            tracing::trace!(
                admitted,
                current = data.generation,
                success,
                "Ignoring result admitted before the last circuit transition"
            );
            return;
        }

        match (data.state, success) {
            (CircuitState::Closed, true) | (CircuitState::Open, _) => {}
            (CircuitState::Closed, false) => {
                data.failure_count += 1;

                if data.failure_count >= self.config.failure_threshold {
                    data.open(self.config.open_timeout());
                    tracing::warn!(
                        failure_count = data.failure_count,
                        threshold = self.config.failure_threshold,
                        open_timeout_secs = self.config.open_timeout_secs,
                        "Circuit breaker OPENED - rejecting sends to protect the mail service"
                    );
                }
            }
            (CircuitState::HalfOpen, true) => {
                data.success_count += 1;

                if data.success_count > self.config.success_threshold {
                    data.transition(CircuitState::Closed);
                    data.failure_count = 0;
                    data.success_count = 0;
                    data.next_attempt_at = None;
                    tracing::info!("Circuit breaker CLOSED - normal operation resumed");
                }
            }
            (CircuitState::HalfOpen, false) => {
                data.open(self.config.open_timeout());
                tracing::warn!("Circuit breaker half-open send failed - reopening circuit");
            }
        }
    }

    /// Current circuit state
    ///
    /// This does not move an expired open circuit to half-open; only an
    /// admitted call does that.
    pub fn state(&self) -> CircuitState {
        self.data.lock().state
    }

    /// Snapshot of the breaker (for monitoring/debugging)
    pub fn stats(&self) -> CircuitBreakerStats {
        let data = self.data.lock();
        CircuitBreakerStats {
            state: data.state,
            failure_count: data.failure_count,
            success_count: data.success_count,
            next_attempt_at: data.next_attempt_at,
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}
