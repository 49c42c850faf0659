//! Retry policy for send operations.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::codes;

/// Retry policy configuration for send operations.
///
/// Encapsulates all retry-related configuration and provides methods for
/// determining retry behavior without exposing implementation details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt.
    ///
    /// Default: 3
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Base delay for exponential backoff (in milliseconds).
    ///
    /// The delay before retry `n` (1-indexed) is `base * 2^n`.
    ///
    /// Default: 1000 milliseconds
    #[serde(default = "defaults::base_delay_ms")]
    pub base_delay_ms: u64,

    /// Maximum retry delay (in milliseconds).
    ///
    /// Default: 60000 milliseconds
    #[serde(default = "defaults::max_delay_ms")]
    pub max_delay_ms: u64,

    /// Jitter factor for randomizing retry delays.
    ///
    /// The delay is randomized within ±`jitter_factor`.
    ///
    /// Default: 0.0 (exact delays)
    #[serde(default = "defaults::jitter_factor")]
    pub jitter_factor: f64,

    /// Mailer error codes worth retrying. Anything else is terminal.
    #[serde(default = "defaults::transient_codes")]
    pub transient_codes: Vec<String>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: defaults::max_retries(),
            base_delay_ms: defaults::base_delay_ms(),
            max_delay_ms: defaults::max_delay_ms(),
            jitter_factor: defaults::jitter_factor(),
            transient_codes: defaults::transient_codes(),
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `code` belongs to the transient set.
    #[must_use]
    pub fn is_transient(&self, code: &str) -> bool {
        self.transient_codes.iter().any(|c| c == code)
    }

    /// Check if another retry is allowed after `retries` retries.
    #[must_use]
    pub const fn should_retry(&self, retries: u32) -> bool {
        retries < self.max_retries
    }

    /// Delay before retry number `retry` (1-indexed).
    ///
    /// `min(base * 2^retry, max_delay) * (1 ± jitter_factor)`
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let delay = if retry >= 63 {
            self.max_delay_ms
        } else {
            self.base_delay_ms
                .saturating_mul(1u64 << retry)
                .min(self.max_delay_ms)
        };

        // NaN and infinite factors would make the jitter range unsampleable
        if !self.jitter_factor.is_finite() || self.jitter_factor <= 0.0 || delay == 0 {
            return Duration::from_millis(delay);
        }

        // Intentional precision loss and casting for randomization
        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        let jittered = {
            let jitter_range = (delay as f64) * self.jitter_factor;
            let jitter: f64 = rand::rng().random_range(-jitter_range..=jitter_range);
            ((delay as f64) + jitter).max(0.0) as u64
        };

        Duration::from_millis(jittered)
    }

    /// Semantic checks serde cannot express
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if !(0.0..=1.0).contains(&self.jitter_factor) {
            problems.push(format!(
                "retry.jitter_factor must be within 0.0..=1.0, got {}",
                self.jitter_factor
            ));
        }
        if self.max_delay_ms < self.base_delay_ms {
            problems.push("retry.max_delay_ms must not be below retry.base_delay_ms".to_string());
        }
        problems
    }
}

mod defaults {
    use super::codes;

    pub const fn max_retries() -> u32 {
        3
    }

    pub const fn base_delay_ms() -> u64 {
        1000
    }

    pub const fn max_delay_ms() -> u64 {
        60_000
    }

    pub const fn jitter_factor() -> f64 {
        0.0
    }

    pub fn transient_codes() -> Vec<String> {
        [
            codes::THROTTLING,
            codes::INTERNAL_FAILURE,
            codes::SERVICE_UNAVAILABLE,
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }
}
