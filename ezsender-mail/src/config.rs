use std::sync::Arc;

use ezsender_dispatch::Mailer;
use serde::{Deserialize, Serialize};

use crate::{
    error::MailError,
    log::LogMailer,
    smtp::{SmtpConfig, SmtpMailer, parse_mailbox},
    template::{MessageTemplate, TemplateConfig},
};

/// Which mail capability to dispatch through.
///
/// Dry run (the default):
/// ```ron
/// mailer: Log,
/// ```
///
/// SMTP relay:
/// ```ron
/// mailer: Smtp((host: "smtp.example.com", port: 587)),
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MailerConfig {
    /// Render and log each message without sending
    #[default]
    Log,
    /// Send through an SMTP relay
    Smtp(SmtpConfig),
}

impl MailerConfig {
    /// Checks that need the template configuration too
    #[must_use]
    pub fn validate(&self, template: &TemplateConfig) -> Vec<String> {
        match self {
            Self::Log => Vec::new(),
            Self::Smtp(smtp) => {
                let mut problems = smtp.validate();
                if let Err(e) = parse_mailbox(&template.from) {
                    problems.push(format!("template.from: {e}"));
                }
                problems
            }
        }
    }

    /// Build the configured mailer.
    ///
    /// # Errors
    ///
    /// If a template does not compile, or the SMTP relay cannot be set up.
    pub fn build(&self, template: &TemplateConfig) -> Result<Arc<dyn Mailer>, MailError> {
        let compiled = Arc::new(MessageTemplate::new(template)?);

        Ok(match self {
            Self::Log => Arc::new(LogMailer::new(template.from.clone(), compiled)),
            Self::Smtp(smtp) => Arc::new(SmtpMailer::new(smtp, &template.from, compiled)?),
        })
    }
}
