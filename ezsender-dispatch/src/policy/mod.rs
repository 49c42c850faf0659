//! Policies that shape how sends are retried.
//!
//! Keeping these separate from the sender makes retry behavior testable
//! without a mailer or a runtime.

pub mod retry;

pub use retry::RetryPolicy;
