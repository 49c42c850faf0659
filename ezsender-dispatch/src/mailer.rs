//! The send capability the dispatcher drives.
//!
//! The core never knows how mail leaves the process; it is handed a
//! [`Mailer`] and only looks at the error code of a failure.

use async_trait::async_trait;
use ezsender_common::Recipient;

use crate::error::MailerError;

/// One attempt at sending the templated email to one recipient.
///
/// Implementations must not retry internally; retries, backoff and breaker
/// gating are applied around them.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send a single email.
    ///
    /// # Errors
    ///
    /// A [`MailerError`] whose code decides whether the send is retried.
    async fn send(&self, recipient: &Recipient) -> Result<(), MailerError>;
}
