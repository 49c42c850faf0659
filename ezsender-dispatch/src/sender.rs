//! Breaker-gated sending with exponential backoff on transient failures.

use std::sync::Arc;

use ezsender_common::{
    Recipient,
    tracing::{debug, error, warn},
};

use crate::{
    circuit_breaker::{CallError, CircuitBreaker},
    error::{SendError, SendFailure},
    mailer::Mailer,
    policy::RetryPolicy,
};

/// Sends one email per call, retrying transient failures.
///
/// Every attempt goes through the shared [`CircuitBreaker`], so an open
/// circuit stops a retry loop as well as fresh sends. Each invocation of the
/// mailer counts as one attempt, transient or terminal, and is recorded by
/// the breaker.
pub struct RetryingSender<M: ?Sized + Mailer = dyn Mailer> {
    mailer: Arc<M>,
    breaker: Arc<CircuitBreaker>,
    policy: RetryPolicy,
}

impl<M: ?Sized + Mailer> Clone for RetryingSender<M> {
    fn clone(&self) -> Self {
        Self {
            mailer: Arc::clone(&self.mailer),
            breaker: Arc::clone(&self.breaker),
            policy: self.policy.clone(),
        }
    }
}

impl<M: ?Sized + Mailer> std::fmt::Debug for RetryingSender<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryingSender")
            .field("breaker", &self.breaker.stats())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl<M: ?Sized + Mailer> RetryingSender<M> {
    pub const fn new(mailer: Arc<M>, breaker: Arc<CircuitBreaker>, policy: RetryPolicy) -> Self {
        Self {
            mailer,
            breaker,
            policy,
        }
    }

    pub const fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Send to `recipient`, returning the number of mailer invocations on
    /// success.
    ///
    /// # Errors
    ///
    /// - [`SendError::CircuitOpen`] when the breaker refuses an attempt. This
    ///   is never retried.
    /// - [`SendError::Terminal`] on the first failure whose code is not in
    ///   the policy's transient set.
    /// - [`SendError::Transient`] once `max_retries` retries have failed.
    pub async fn send(&self, recipient: &Recipient) -> Result<u32, SendFailure> {
        let mut retries = 0;
        let mut attempts = 0;

        loop {
            let result = self
                .breaker
                .call(|| {
                    attempts += 1;
                    self.mailer.send(recipient)
                })
                .await;

            let error = match result {
                Ok(()) => {
                    debug!(recipient = %recipient, attempts, "Email sent");
                    return Ok(attempts);
                }
                Err(CallError::Open) => {
                    warn!(recipient = %recipient, attempts, "Circuit open, skipping send");
                    return Err(SendFailure {
                        error: SendError::CircuitOpen,
                        attempts,
                    });
                }
                Err(CallError::Failed(error)) => error,
            };

            if !self.policy.is_transient(error.code()) {
                error!(
                    recipient = %recipient,
                    code = error.code(),
                    error = %error,
                    "Send failed with a non-retryable error"
                );
                return Err(SendFailure {
                    error: SendError::Terminal(error),
                    attempts,
                });
            }

            if !self.policy.should_retry(retries) {
                error!(
                    recipient = %recipient,
                    code = error.code(),
                    attempts,
                    "Retries exhausted"
                );
                return Err(SendFailure {
                    error: SendError::Transient(error),
                    attempts,
                });
            }

            retries += 1;
            let delay = self.policy.delay_for(retries);
            warn!(
                recipient = %recipient,
                code = error.code(),
                retry = retries,
                max_retries = self.policy.max_retries,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "Transient send failure, backing off"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
