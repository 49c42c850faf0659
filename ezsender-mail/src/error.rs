//! Errors raised while building a mail capability.
//!
//! Failures of an individual send are reported as
//! [`MailerError`](ezsender_dispatch::MailerError) instead, so the dispatcher
//! can classify them.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    /// A subject or body template failed to compile.
    #[error("Invalid {part} template: {source}")]
    Template {
        part: &'static str,
        #[source]
        source: Box<handlebars::TemplateError>,
    },

    /// The sender is not a valid mailbox.
    #[error("Invalid sender mailbox `{address}`: {source}")]
    Sender {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    /// The SMTP transport could not be configured.
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}
