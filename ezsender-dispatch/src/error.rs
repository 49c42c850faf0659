//! Typed error handling for send operations.
//!
//! A [`Mailer`](crate::Mailer) reports failures as a [`MailerError`] carrying
//! a service error code. The retrying sender classifies that code and wraps
//! the failure in a [`SendError`], which distinguishes between:
//! - Circuit open - the breaker refused to attempt the send
//! - Transient failures - retried with backoff until the budget runs out
//! - Terminal failures - never retried

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Well-known error codes reported by mail capabilities.
///
/// The first three form the default transient set.
pub mod codes {
    /// The downstream service is rate limiting this sender.
    pub const THROTTLING: &str = "Throttling";
    /// The downstream service failed internally.
    pub const INTERNAL_FAILURE: &str = "InternalFailure";
    /// The downstream service is temporarily unreachable or overloaded.
    pub const SERVICE_UNAVAILABLE: &str = "ServiceUnavailable";
    /// The message was rejected and resending it will not help.
    pub const MESSAGE_REJECTED: &str = "MessageRejected";
    /// A request parameter (usually an address) was malformed.
    pub const INVALID_PARAMETER_VALUE: &str = "InvalidParameterValue";
    /// The request failed validation.
    pub const VALIDATION_ERROR: &str = "ValidationError";
    /// The message template could not be rendered for this recipient.
    pub const TEMPLATE_ERROR: &str = "TemplateError";
}

/// Failure reported by a single send attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct MailerError {
    code: String,
    message: String,
}

impl MailerError {
    /// Create a new error from a service error code and a description
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Service error code used for transient classification
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Terminal error for one recipient, after retries and breaker gating.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    /// The breaker refused the attempt without invoking the mailer.
    #[error("Circuit open: send skipped to protect the mail service")]
    CircuitOpen,

    /// A recoverable failure that exhausted the retry budget.
    #[error("Transient failure: {0}")]
    Transient(MailerError),

    /// A failure that is never retried.
    #[error("Terminal failure: {0}")]
    Terminal(MailerError),

    /// The send task panicked before producing a result.
    #[error("Send task panicked: {0}")]
    Panicked(String),
}

impl SendError {
    /// Returns `true` if the breaker short-circuited the send.
    #[must_use]
    pub const fn is_circuit_open(&self) -> bool {
        matches!(self, Self::CircuitOpen)
    }

    /// Returns `true` if this error was classified as transient.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Returns `true` if this error was classified as terminal.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal(_))
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::CircuitOpen => ErrorKind::CircuitOpen,
            Self::Transient(_) => ErrorKind::Transient,
            Self::Terminal(_) => ErrorKind::Terminal,
            Self::Panicked(_) => ErrorKind::Panicked,
        }
    }

    /// The mailer error behind this failure, if the mailer was invoked
    #[must_use]
    pub const fn mailer_error(&self) -> Option<&MailerError> {
        match self {
            Self::Transient(e) | Self::Terminal(e) => Some(e),
            Self::CircuitOpen | Self::Panicked(_) => None,
        }
    }
}

/// A [`SendError`] together with the number of mailer invocations it took.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{error} (after {attempts} attempt(s))")]
pub struct SendFailure {
    pub error: SendError,
    pub attempts: u32,
}

/// Classification of a failed outcome, as recorded in a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    CircuitOpen,
    Transient,
    Terminal,
    Panicked,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CircuitOpen => "circuit-open",
            Self::Transient => "transient",
            Self::Terminal => "terminal",
            Self::Panicked => "panicked",
        })
    }
}

/// Serializable snapshot of a [`SendError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
}

impl From<&SendError> for ErrorInfo {
    fn from(error: &SendError) -> Self {
        Self {
            kind: error.kind(),
            code: error.mailer_error().map(|e| e.code().to_string()),
            message: error
                .mailer_error()
                .map_or_else(|| error.to_string(), |e| e.message().to_string()),
        }
    }
}
