//! Recipient intake: turns a CSV document into a recipient list.
//!
//! Failures here are upstream failures: no partial list is ever returned.

pub mod error;
pub mod reader;
pub mod source;

pub use error::{IntakeError, Result};
pub use reader::{parse, parse_bytes};
pub use source::{FileSource, MemorySource, RecipientSource};
