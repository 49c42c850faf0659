//! Bounded fan-out of sends over a recipient list.
//!
//! Recipients are split into contiguous batches. All sends within a batch run
//! concurrently and the dispatcher waits for every one of them to settle
//! before starting the next batch, so at most `batch_size` sends are ever in
//! flight against the mail service.

use std::{collections::HashMap, num::NonZeroUsize};

use ezsender_common::{
    Recipient, internal,
    tracing::{debug, error},
};
use ezsender_tracing::traced;
use serde::{Deserialize, Serialize};
use tokio::task::{JoinError, JoinSet};

use crate::{
    error::{SendError, SendFailure},
    mailer::Mailer,
    report::{DispatchReport, ReportBuilder, SendOutcome},
    sender::RetryingSender,
};

/// Batching configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Maximum number of concurrent sends.
    ///
    /// Default: 10
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

const fn default_batch_size() -> usize {
    10
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
        }
    }
}

impl DispatchConfig {
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        if self.batch_size == 0 {
            vec!["dispatch.batch_size must be at least 1".to_string()]
        } else {
            Vec::new()
        }
    }
}

/// Drives a [`RetryingSender`] over a recipient list, batch by batch.
pub struct BatchDispatcher<M: ?Sized + Mailer = dyn Mailer> {
    sender: RetryingSender<M>,
    batch_size: NonZeroUsize,
}

impl<M: ?Sized + Mailer> std::fmt::Debug for BatchDispatcher<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchDispatcher")
            .field("sender", &self.sender)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl<M: ?Sized + Mailer + 'static> BatchDispatcher<M> {
    /// Create a dispatcher. A zero batch size is raised to 1.
    pub fn new(sender: RetryingSender<M>, config: &DispatchConfig) -> Self {
        Self {
            sender,
            batch_size: NonZeroUsize::new(config.batch_size).unwrap_or(NonZeroUsize::MIN),
        }
    }

    pub const fn batch_size(&self) -> NonZeroUsize {
        self.batch_size
    }

    pub const fn sender(&self) -> &RetryingSender<M> {
        &self.sender
    }

    /// Send to every recipient using the configured batch size.
    pub async fn dispatch(&self, recipients: Vec<Recipient>) -> DispatchReport {
        self.dispatch_in_batches(recipients, self.batch_size).await
    }

    /// Send to every recipient, at most `batch_size` at a time.
    ///
    /// Individual failures never stop the dispatch: every recipient ends up
    /// with exactly one outcome, in input order.
    #[traced(instrument(level = tracing::Level::INFO, skip_all, fields(total = recipients.len(), batch_size = batch_size.get())), timing(precision = "ms"))]
    pub async fn dispatch_in_batches(
        &self,
        recipients: Vec<Recipient>,
        batch_size: NonZeroUsize,
    ) -> DispatchReport {
        let total = recipients.len();
        let batches = total.div_ceil(batch_size.get());
        internal!(
            level = INFO,
            total,
            batches,
            "Dispatching to {total} recipient(s) in {batches} batch(es)"
        );

        let mut report = ReportBuilder::with_capacity(total);
        for (number, batch) in recipients.chunks(batch_size.get()).enumerate() {
            debug!(batch = number + 1, size = batch.len(), "Starting batch");
            let outcomes = self.run_batch(batch).await;
            debug!(
                batch = number + 1,
                sent = outcomes.iter().filter(|o| o.is_sent()).count(),
                breaker = ?self.sender.breaker().state(),
                "Batch settled"
            );
            report.record_batch(outcomes);
        }

        let report = report.build();
        internal!(
            level = INFO,
            total = report.total(),
            sent = report.sent(),
            failed = report.failed(),
            duration_ms = report.duration_ms(),
            "Dispatch complete"
        );
        report
    }

    /// Send to every recipient in `batch` concurrently and wait for all of
    /// them. The returned outcomes follow the order of `batch`.
    async fn run_batch(&self, batch: &[Recipient]) -> Vec<SendOutcome> {
        let mut tasks = JoinSet::new();
        let mut positions = HashMap::with_capacity(batch.len());

        for (index, recipient) in batch.iter().cloned().enumerate() {
            let sender = self.sender.clone();
            let handle = tasks.spawn(async move {
                let outcome = match sender.send(&recipient).await {
                    Ok(attempts) => SendOutcome::sent(recipient, attempts),
                    Err(failure) => SendOutcome::failed(recipient, &failure),
                };
                (index, outcome)
            });
            positions.insert(handle.id(), index);
        }

        let mut settled = Vec::with_capacity(batch.len());
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((_, entry)) => settled.push(entry),
                Err(join_error) => {
                    let Some((index, recipient)) = positions
                        .get(&join_error.id())
                        .and_then(|&index| Some((index, batch.get(index)?)))
                    else {
                        error!(error = %join_error, "Unknown send task failed");
                        continue;
                    };

                    error!(recipient = %recipient, error = %join_error, "Send task panicked");
                    let failure = SendFailure {
                        error: SendError::Panicked(panic_message(join_error)),
                        attempts: 0,
                    };
                    settled.push((index, SendOutcome::failed(recipient.clone(), &failure)));
                }
            }
        }

        settled.sort_unstable_by_key(|&(index, _)| index);
        settled.into_iter().map(|(_, outcome)| outcome).collect()
    }
}

fn panic_message(error: JoinError) -> String {
    match error.try_into_panic() {
        Ok(payload) => payload
            .downcast_ref::<&str>()
            .map(|message| (*message).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string()),
        Err(error) => error.to_string(),
    }
}
