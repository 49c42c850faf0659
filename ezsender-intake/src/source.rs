//! Where recipient CSV data comes from.
//!
//! - `FileSource`: a CSV file on disk
//! - `MemorySource`: a CSV buffer already held in memory (uploads, tests)

use std::{
    fmt::Debug,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use ezsender_common::{Recipient, tracing::debug};

use crate::{
    error::{IntakeError, Result},
    reader,
};

/// A fetchable CSV document of recipients.
#[async_trait]
pub trait RecipientSource: Send + Sync + Debug {
    /// Fetch the raw CSV bytes.
    ///
    /// # Errors
    ///
    /// If the document cannot be read.
    async fn fetch(&self) -> Result<Vec<u8>>;

    /// Human-readable name for logs.
    fn describe(&self) -> String;

    /// Fetch and parse the document.
    ///
    /// # Errors
    ///
    /// If fetching fails or the CSV cannot be parsed.
    async fn load(&self) -> Result<Vec<Recipient>> {
        let data = self.fetch().await?;
        debug!(source = %self.describe(), bytes = data.len(), "Fetched recipient list");
        reader::parse_bytes(&data)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RecipientSource for FileSource {
    async fn fetch(&self) -> Result<Vec<u8>> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|source| IntakeError::Io {
                path: self.path.clone(),
                source,
            })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySource {
    name: String,
    data: Arc<[u8]>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

#[async_trait]
impl RecipientSource for MemorySource {
    async fn fetch(&self) -> Result<Vec<u8>> {
        Ok(self.data.to_vec())
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}
