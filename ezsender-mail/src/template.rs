//! Per-recipient subject and body rendering.
//!
//! Templates are handlebars strings with `{{name}}` and `{{email}}` in scope.
//! Rendering is strict: a template referencing anything else fails for every
//! recipient, which [`TemplateConfig::validate`] catches before dispatch.

use ezsender_common::Recipient;
use ezsender_dispatch::{MailerError, codes};
use handlebars::Handlebars;
use serde::{Deserialize, Serialize};

use crate::error::MailError;

const SUBJECT: &str = "subject";
const BODY: &str = "body";

/// Message content configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Sender mailbox, e.g. `"Ops <ops@example.com>"`.
    #[serde(default = "defaults::from")]
    pub from: String,

    /// Default: `"Test Email"`
    #[serde(default = "defaults::subject")]
    pub subject: String,

    /// Default: `"Hello {{name}}, this is a test email!"`
    #[serde(default = "defaults::body")]
    pub body: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            from: defaults::from(),
            subject: defaults::subject(),
            body: defaults::body(),
        }
    }
}

impl TemplateConfig {
    /// Compile both templates and render them once for a sample recipient.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let template = match MessageTemplate::new(self) {
            Ok(template) => template,
            Err(e) => return vec![format!("template: {e}")],
        };

        let sample = Recipient::new("Sample", "sample@example.com");
        match template.render(&sample) {
            Ok(_) => Vec::new(),
            Err(e) => vec![format!("template: {}", e.message())],
        }
    }
}

mod defaults {
    pub fn from() -> String {
        "ezsender@localhost".to_string()
    }

    pub fn subject() -> String {
        "Test Email".to_string()
    }

    pub fn body() -> String {
        "Hello {{name}}, this is a test email!".to_string()
    }
}

/// A rendered email for one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub body: String,
}

/// Compiled subject and body templates.
#[derive(Debug)]
pub struct MessageTemplate {
    registry: Handlebars<'static>,
}

impl MessageTemplate {
    /// Compile the templates in `config`.
    ///
    /// # Errors
    ///
    /// [`MailError::Template`] if either template is malformed.
    pub fn new(config: &TemplateConfig) -> Result<Self, MailError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        // Plain text mail: names like "Tom & Jerry" must survive as-is
        registry.register_escape_fn(handlebars::no_escape);

        for (part, source) in [(SUBJECT, &config.subject), (BODY, &config.body)] {
            registry
                .register_template_string(part, source)
                .map_err(|e| MailError::Template {
                    part,
                    source: Box::new(e),
                })?;
        }

        Ok(Self { registry })
    }

    /// Render the message for `recipient`.
    ///
    /// # Errors
    ///
    /// A `TemplateError` [`MailerError`], which is never retried.
    pub fn render(&self, recipient: &Recipient) -> Result<RenderedMessage, MailerError> {
        let render = |part| {
            self.registry
                .render(part, recipient)
                .map_err(|e| MailerError::new(codes::TEMPLATE_ERROR, e.to_string()))
        };

        Ok(RenderedMessage {
            subject: render(SUBJECT)?,
            body: render(BODY)?,
        })
    }
}
