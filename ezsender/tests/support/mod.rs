//! Test support utilities for handler tests
#![allow(dead_code)] // Test utility module - not all methods used in every test

use std::collections::HashSet;

use async_trait::async_trait;
use ezsender_common::Recipient;
use ezsender_dispatch::{Mailer, MailerError};
use tokio::sync::Mutex;

/// Records every recipient and fails for the configured addresses.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    failing: HashSet<String>,
    code: &'static str,
    sent: Mutex<Vec<Recipient>>,
}

impl RecordingMailer {
    pub fn failing_for(code: &'static str, addresses: &[&str]) -> Self {
        Self {
            failing: addresses.iter().map(ToString::to_string).collect(),
            code,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub async fn sent(&self) -> Vec<Recipient> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, recipient: &Recipient) -> Result<(), MailerError> {
        if self.failing.contains(recipient.email()) {
            return Err(MailerError::new(self.code, "rejected by test"));
        }
        self.sent.lock().await.push(recipient.clone());
        Ok(())
    }
}

pub const CSV: &str = "\
Name,Email
Ada,ada@example.com
Grace,grace@example.com
Nobody,
Linus,linus@example.com
";
