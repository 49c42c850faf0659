//! Scripted mailer for driving dispatch scenarios
#![allow(dead_code)] // Test utility module - not all methods used in every test

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use ezsender_dispatch::{Mailer, MailerError, Recipient};
use parking_lot::Mutex;

/// What the mock does for one send attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Behaviour {
    Succeed,
    Fail(&'static str),
    Panic,
}

/// Mailer whose results are scripted per recipient address.
///
/// Each address has a queue of behaviours consumed one per attempt; once the
/// queue is empty the fallback behaviour applies. Every attempt is recorded.
#[derive(Debug)]
pub struct MockMailer {
    scripts: Mutex<HashMap<String, VecDeque<Behaviour>>>,
    fallback: Behaviour,
    delay: Duration,
    invocations: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

#[derive(Debug)]
pub struct MockMailerBuilder {
    scripts: HashMap<String, VecDeque<Behaviour>>,
    fallback: Behaviour,
    delay: Duration,
}

impl MockMailerBuilder {
    /// Behaviour once a recipient's script runs out (default: succeed)
    pub fn with_fallback(mut self, behaviour: Behaviour) -> Self {
        self.fallback = behaviour;
        self
    }

    /// How long each attempt takes
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_script(
        mut self,
        email: &str,
        behaviours: impl IntoIterator<Item = Behaviour>,
    ) -> Self {
        self.scripts
            .entry(email.to_string())
            .or_default()
            .extend(behaviours);
        self
    }

    pub fn build(self) -> Arc<MockMailer> {
        Arc::new(MockMailer {
            scripts: Mutex::new(self.scripts),
            fallback: self.fallback,
            delay: self.delay,
            invocations: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }
}

impl MockMailer {
    pub fn builder() -> MockMailerBuilder {
        MockMailerBuilder {
            scripts: HashMap::new(),
            fallback: Behaviour::Succeed,
            delay: Duration::ZERO,
        }
    }

    /// Addresses in the order attempts started
    pub fn invocations(&self) -> Vec<String> {
        self.invocations.lock().clone()
    }

    pub fn invocation_count(&self) -> usize {
        self.invocations.lock().len()
    }

    pub fn attempts_for(&self, email: &str) -> usize {
        self.invocations
            .lock()
            .iter()
            .filter(|e| e.as_str() == email)
            .count()
    }

    /// Highest number of attempts that were running at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_behaviour(&self, email: &str) -> Behaviour {
        self.scripts
            .lock()
            .get_mut(email)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| self.fallback.clone())
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(&self, recipient: &Recipient) -> Result<(), MailerError> {
        self.invocations.lock().push(recipient.email().to_string());
        let behaviour = self.next_behaviour(recipient.email());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _in_flight = InFlight(&self.in_flight);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match behaviour {
            Behaviour::Succeed => Ok(()),
            Behaviour::Fail(code) => Err(MailerError::new(code, format!("mock {code}"))),
            Behaviour::Panic => panic!("mock mailer told to panic for {}", recipient.email()),
        }
    }
}
