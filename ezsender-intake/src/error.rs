//! Error types for recipient intake.
//!
//! Any of these means the recipient list could not be produced at all, so
//! dispatch never starts.

use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntakeError {
    /// The source could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The data is not valid CSV.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The header row lacks a required column.
    #[error("Missing required column `{0}`")]
    MissingColumn(&'static str),
}

/// Specialized `Result` type for intake operations.
pub type Result<T> = std::result::Result<T, IntakeError>;
