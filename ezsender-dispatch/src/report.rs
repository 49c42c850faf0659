//! Per-recipient outcomes and the aggregated dispatch report.

use chrono::{DateTime, Utc};
use ezsender_common::Recipient;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorInfo, SendFailure};

/// Whether a recipient's email went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SendStatus {
    Sent,
    Failed,
}

/// Result of sending to one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOutcome {
    pub recipient: Recipient,
    pub status: SendStatus,
    /// Mailer invocations made, 0 when the circuit refused every attempt
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl SendOutcome {
    #[must_use]
    pub const fn sent(recipient: Recipient, attempts: u32) -> Self {
        Self {
            recipient,
            status: SendStatus::Sent,
            attempts,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(recipient: Recipient, failure: &SendFailure) -> Self {
        Self {
            recipient,
            status: SendStatus::Failed,
            attempts: failure.attempts,
            error: Some(ErrorInfo::from(&failure.error)),
        }
    }

    #[must_use]
    pub fn is_sent(&self) -> bool {
        self.status == SendStatus::Sent
    }
}

/// Final accounting of one dispatch.
///
/// Only a [`ReportBuilder`] can produce one, so `sent + failed == total` and
/// `outcomes.len() == total` always hold for a returned report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchReport {
    total: usize,
    sent: usize,
    failed: usize,
    batches: usize,
    started_at: DateTime<Utc>,
    duration_ms: u64,
    outcomes: Vec<SendOutcome>,
}

impl DispatchReport {
    pub const fn total(&self) -> usize {
        self.total
    }

    pub const fn sent(&self) -> usize {
        self.sent
    }

    pub const fn failed(&self) -> usize {
        self.failed
    }

    /// Number of batches processed
    pub const fn batches(&self) -> usize {
        self.batches
    }

    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub const fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// Outcomes in input order
    pub fn outcomes(&self) -> &[SendOutcome] {
        &self.outcomes
    }

    /// Every recipient was sent to.
    ///
    /// A report with failures is still a completed dispatch; this only
    /// distinguishes the two.
    pub const fn is_complete_success(&self) -> bool {
        self.failed == 0
    }

    pub fn into_outcomes(self) -> Vec<SendOutcome> {
        self.outcomes
    }
}

/// Accumulates outcomes batch by batch.
#[derive(Debug)]
pub struct ReportBuilder {
    started_at: DateTime<Utc>,
    batches: usize,
    outcomes: Vec<SendOutcome>,
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            started_at: Utc::now(),
            batches: 0,
            outcomes: Vec::with_capacity(capacity),
        }
    }

    /// Record one fully settled batch.
    pub fn record_batch(&mut self, outcomes: impl IntoIterator<Item = SendOutcome>) {
        self.batches += 1;
        self.outcomes.extend(outcomes);
    }

    #[must_use]
    pub fn build(self) -> DispatchReport {
        let sent = self.outcomes.iter().filter(|o| o.is_sent()).count();
        let total = self.outcomes.len();
        let duration_ms = (Utc::now() - self.started_at)
            .num_milliseconds()
            .try_into()
            .unwrap_or(0);

        DispatchReport {
            total,
            sent,
            failed: total - sent,
            batches: self.batches,
            started_at: self.started_at,
            duration_ms,
            outcomes: self.outcomes,
        }
    }
}
