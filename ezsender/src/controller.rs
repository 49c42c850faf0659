//! Wires configuration, intake, mailer and dispatcher together.

use std::sync::Arc;

use ezsender_common::{internal, tracing::error};
use ezsender_dispatch::{BatchDispatcher, CircuitBreaker, DispatchReport, Mailer, RetryingSender};
use ezsender_intake::RecipientSource;
use ezsender_tracing::traced;

use crate::{config::Config, response::Response};

/// Result of handling one recipient list.
#[derive(Debug)]
pub struct Invocation {
    pub response: Response,
    /// Absent when the recipient list could not be loaded
    pub report: Option<DispatchReport>,
}

/// The top-level handler.
///
/// Owns the circuit breaker, so breaker state carries over between
/// invocations handled by the same instance.
#[derive(Debug)]
pub struct Ezsender {
    dispatcher: BatchDispatcher,
}

impl Ezsender {
    /// Build the handler and the mailer named in `config`.
    ///
    /// # Errors
    ///
    /// If the configuration is invalid or the mailer cannot be built.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        config.validate()?;
        let mailer = config.mailer.build(&config.template)?;
        Ok(Self::with_mailer(config, mailer))
    }

    /// Build the handler around an existing mailer.
    pub fn with_mailer(config: &Config, mailer: Arc<dyn Mailer>) -> Self {
        let breaker = Arc::new(CircuitBreaker::new(config.circuit_breaker.clone()));
        let sender = RetryingSender::new(mailer, breaker, config.retry.clone());

        Self {
            dispatcher: BatchDispatcher::new(sender, &config.dispatch),
        }
    }

    pub const fn breaker(&self) -> &Arc<CircuitBreaker> {
        self.dispatcher.sender().breaker()
    }

    /// Load recipients from `source` and dispatch to all of them.
    ///
    /// Never fails: a recipient list that cannot be loaded becomes a 500
    /// response, anything after that a 200 carrying the report.
    #[traced(instrument(level = tracing::Level::TRACE, skip_all, fields(source = %source.describe())), timing(precision = "ms"))]
    pub async fn handle(&self, source: &dyn RecipientSource) -> Invocation {
        internal!(level = INFO, "Loading recipients from {}", source.describe());

        let recipients = match source.load().await {
            Ok(recipients) => recipients,
            Err(e) => {
                error!(source = %source.describe(), error = %e, "Failed to load recipients");
                return Invocation {
                    response: Response::upstream_failure(e),
                    report: None,
                };
            }
        };

        let report = self.dispatcher.dispatch(recipients).await;
        Invocation {
            response: Response::completed(&report),
            report: Some(report),
        }
    }
}
