//! SMTP relay mailer.
//!
//! Each send renders the template, submits one message through the relay and
//! maps any failure onto the error codes the retry policy understands:
//!
//! | SMTP outcome                         | Code                    |
//! |--------------------------------------|-------------------------|
//! | 450, 452                             | `Throttling`            |
//! | 451                                  | `InternalFailure`       |
//! | 421, other 4xx, connection, timeout  | `ServiceUnavailable`    |
//! | 501, 553, unparsable recipient       | `InvalidParameterValue` |
//! | other 5xx                            | `MessageRejected`       |

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use ezsender_common::{Recipient, outgoing};
use ezsender_dispatch::{Mailer, MailerError, codes};
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::{self, authentication::Credentials},
};
use serde::{Deserialize, Serialize};

use crate::{
    error::MailError,
    template::{MessageTemplate, RenderedMessage},
};

/// SMTP relay settings.
///
/// ```ron
/// mailer: Smtp((
///     host: "smtp.example.com",
///     port: 587,
///     username: Some("ops"),
///     password: Some("secret"),
/// )),
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,

    /// Default: 587
    #[serde(default = "defaults::port")]
    pub port: u16,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Upgrade the connection with STARTTLS. Disable only for local relays.
    ///
    /// Default: true
    #[serde(default = "defaults::starttls")]
    pub starttls: bool,

    /// Per-command timeout in seconds.
    ///
    /// Default: 30
    #[serde(default = "defaults::timeout_secs")]
    pub timeout_secs: u64,
}

mod defaults {
    pub const fn port() -> u16 {
        587
    }

    pub const fn starttls() -> bool {
        true
    }

    pub const fn timeout_secs() -> u64 {
        30
    }
}

impl SmtpConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: defaults::port(),
            username: None,
            password: None,
            starttls: defaults::starttls(),
            timeout_secs: defaults::timeout_secs(),
        }
    }

    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.host.trim().is_empty() {
            problems.push("mailer.host must not be empty".to_string());
        }
        if self.port == 0 {
            problems.push("mailer.port must not be 0".to_string());
        }
        if self.username.is_some() != self.password.is_some() {
            problems.push("mailer.username and mailer.password must be set together".to_string());
        }
        problems
    }
}

/// Sends each email through an SMTP relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    template: Arc<MessageTemplate>,
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("from", &self.from.to_string())
            .finish_non_exhaustive()
    }
}

impl SmtpMailer {
    /// Configure a mailer. No connection is made until the first send.
    ///
    /// # Errors
    ///
    /// If `from` is not a valid mailbox or the relay cannot be configured.
    pub fn new(
        config: &SmtpConfig,
        from: &str,
        template: Arc<MessageTemplate>,
    ) -> Result<Self, MailError> {
        let from = parse_mailbox(from)?;

        let builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };

        let mut builder = builder
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout_secs)));
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
            template,
        })
    }

    fn build_message(
        &self,
        recipient: &Recipient,
        rendered: RenderedMessage,
    ) -> Result<Message, MailerError> {
        let to = recipient_mailbox(recipient)?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(rendered.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(rendered.body)
            .map_err(|e| MailerError::new(codes::VALIDATION_ERROR, e.to_string()))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, recipient: &Recipient) -> Result<(), MailerError> {
        let rendered = self.template.render(recipient)?;
        let message = self.build_message(recipient, rendered)?;

        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| classify(&e))?;

        outgoing!(
            level = DEBUG,
            recipient = %recipient,
            code = %response.code(),
            "Email accepted by relay"
        );
        Ok(())
    }
}

/// Parse a sender mailbox such as `"Ops <ops@example.com>"`.
///
/// # Errors
///
/// [`MailError::Sender`] if `address` is not a mailbox.
pub fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.parse().map_err(|source| MailError::Sender {
        address: address.to_string(),
        source,
    })
}

fn recipient_mailbox(recipient: &Recipient) -> Result<Mailbox, MailerError> {
    let email = recipient.email().parse().map_err(|e| {
        MailerError::new(
            codes::INVALID_PARAMETER_VALUE,
            format!("invalid recipient address `{}`: {e}", recipient.email()),
        )
    })?;
    let name = Some(recipient.name())
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    Ok(Mailbox::new(name, email))
}

/// Error code for an SMTP reply status.
pub const fn code_for_status(status: u16) -> &'static str {
    match status {
        450 | 452 => codes::THROTTLING,
        451 => codes::INTERNAL_FAILURE,
        400..=499 => codes::SERVICE_UNAVAILABLE,
        501 | 553 => codes::INVALID_PARAMETER_VALUE,
        _ => codes::MESSAGE_REJECTED,
    }
}

/// Map a transport failure onto an error code.
pub fn classify(error: &smtp::Error) -> MailerError {
    let status = error
        .status()
        .and_then(|code| code.to_string().parse::<u16>().ok());

    let code = match status {
        _ if error.is_timeout() => codes::SERVICE_UNAVAILABLE,
        Some(status) => code_for_status(status),
        None if error.is_client() => codes::MESSAGE_REJECTED,
        // Connection, TLS and I/O failures
        None => codes::SERVICE_UNAVAILABLE,
    };

    MailerError::new(code, error.to_string())
}
