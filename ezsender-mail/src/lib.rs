//! Mail capabilities for the dispatcher
//!
//! This crate provides:
//! - Per-recipient message templating (handlebars)
//! - An SMTP relay mailer that maps SMTP failures onto retryable error codes
//! - A dry-run mailer that only logs what it would send

pub mod config;
pub mod error;
pub mod log;
pub mod smtp;
pub mod template;

pub use config::MailerConfig;
pub use error::MailError;
pub use log::LogMailer;
pub use smtp::{SmtpConfig, SmtpMailer};
pub use template::{MessageTemplate, RenderedMessage, TemplateConfig};
