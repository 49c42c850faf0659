//! Dry-run mailer: renders every message and logs it instead of sending.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use ezsender_common::{Recipient, outgoing};
use ezsender_dispatch::{Mailer, MailerError};

use crate::template::MessageTemplate;

#[derive(Debug)]
pub struct LogMailer {
    from: String,
    template: Arc<MessageTemplate>,
    rendered: AtomicUsize,
}

impl LogMailer {
    pub fn new(from: impl Into<String>, template: Arc<MessageTemplate>) -> Self {
        Self {
            from: from.into(),
            template,
            rendered: AtomicUsize::new(0),
        }
    }

    /// Messages rendered so far
    pub fn rendered(&self) -> usize {
        self.rendered.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, recipient: &Recipient) -> Result<(), MailerError> {
        let message = self.template.render(recipient)?;
        self.rendered.fetch_add(1, Ordering::Relaxed);

        outgoing!(
            level = INFO,
            from = %self.from,
            to = %recipient,
            subject = %message.subject,
            body = %message.body,
            "Dry run, email not sent"
        );
        Ok(())
    }
}
