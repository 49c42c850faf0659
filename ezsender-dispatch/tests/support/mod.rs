//! Test support utilities for dispatch tests

pub mod mock_mailer;

use std::sync::Arc;

use ezsender_dispatch::{
    BatchDispatcher, CircuitBreaker, CircuitBreakerConfig, DispatchConfig, Recipient,
    RetryPolicy, RetryingSender,
};
pub use mock_mailer::{Behaviour, MockMailer};

/// `count` recipients named `User <n>` with address `user<n>@example.com`
pub fn recipients(count: usize) -> Vec<Recipient> {
    (0..count)
        .map(|n| Recipient::new(format!("User {n}"), format!("user{n}@example.com")))
        .collect()
}

pub fn dispatcher(
    mailer: &Arc<MockMailer>,
    breaker: CircuitBreakerConfig,
    batch_size: usize,
) -> BatchDispatcher<MockMailer> {
    let sender = RetryingSender::new(
        Arc::clone(mailer),
        Arc::new(CircuitBreaker::new(breaker)),
        RetryPolicy::default(),
    );
    BatchDispatcher::new(sender, &DispatchConfig { batch_size })
}
