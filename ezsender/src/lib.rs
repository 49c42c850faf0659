pub mod config;
pub mod controller;
pub mod response;

pub use config::{Config, ConfigError};
pub use controller::{Ezsender, Invocation};
pub use response::Response;
