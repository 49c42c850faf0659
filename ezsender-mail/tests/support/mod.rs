//! Test support utilities for mailer tests

pub mod mock_server;

pub use mock_server::{MockSmtpServer, SmtpCommand};
