//! The `{statusCode, body}` result of one invocation.

use std::fmt::Display;

use ezsender_dispatch::DispatchReport;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub status_code: u16,
    pub body: String,
}

impl Response {
    pub const OK: u16 = 200;
    pub const INTERNAL_SERVER_ERROR: u16 = 500;

    /// Dispatch ran to completion. Individual send failures do not change
    /// the status; they are counted in the body.
    pub fn completed(report: &DispatchReport) -> Self {
        let body = if report.is_complete_success() {
            format!("Emails sent successfully ({} of {})", report.sent(), report.total())
        } else {
            format!(
                "Dispatch completed: {} sent, {} failed of {}",
                report.sent(),
                report.failed(),
                report.total()
            )
        };

        Self {
            status_code: Self::OK,
            body,
        }
    }

    /// The recipient list could not be produced.
    pub fn upstream_failure(error: impl Display) -> Self {
        Self {
            status_code: Self::INTERNAL_SERVER_ERROR,
            body: format!("Failed to send emails: {error}"),
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status_code == Self::OK
    }
}
