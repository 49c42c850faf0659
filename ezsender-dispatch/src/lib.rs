//! Bulk email dispatch that protects a rate-limited mail service
//!
//! This crate provides functionality to:
//! - Split a recipient list into bounded concurrent batches
//! - Retry transient send failures with exponential backoff
//! - Fast-fail sends while the mail service looks unhealthy (circuit breaker)
//! - Account for every recipient in a single dispatch report

pub mod circuit_breaker;
mod dispatcher;
mod error;
mod mailer;
pub mod policy;
mod report;
mod sender;

// Re-export breaker types
pub use circuit_breaker::{
    CallError, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats, CircuitState,
};
// Re-export core types
pub use dispatcher::{BatchDispatcher, DispatchConfig};
// Re-export error types
pub use error::{ErrorInfo, ErrorKind, MailerError, SendError, SendFailure, codes};
pub use ezsender_common::Recipient;
pub use mailer::Mailer;
pub use policy::RetryPolicy;
pub use report::{DispatchReport, ReportBuilder, SendOutcome, SendStatus};
pub use sender::RetryingSender;
