//! CSV recipient lists.
//!
//! The header row must contain an `Email` column and may contain a `Name`
//! column; other columns are ignored. Rows without an email are skipped.

use std::io::Read;

use ezsender_common::{
    Recipient,
    tracing::{info, warn},
};

use crate::error::{IntakeError, Result};

pub const EMAIL_COLUMN: &str = "Email";
pub const NAME_COLUMN: &str = "Name";

/// Parse recipients from CSV data.
///
/// # Errors
///
/// [`IntakeError::MissingColumn`] if there is no `Email` header, or
/// [`IntakeError::Csv`] for malformed CSV.
pub fn parse<R: Read>(reader: R) -> Result<Vec<Recipient>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let email = headers
        .iter()
        .position(|h| h == EMAIL_COLUMN)
        .ok_or(IntakeError::MissingColumn(EMAIL_COLUMN))?;
    let name = headers.iter().position(|h| h == NAME_COLUMN);
    if name.is_none() {
        warn!("No `{NAME_COLUMN}` column, recipients will have empty names");
    }

    let mut recipients = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        match record.get(email).filter(|e| !e.is_empty()) {
            Some(address) => {
                let name = name.and_then(|i| record.get(i)).unwrap_or_default();
                recipients.push(Recipient::new(name, address));
            }
            // The header occupies line 1
            None => warn!(
                line = row + 2,
                record = ?record,
                "Skipping row with missing Email"
            ),
        }
    }

    info!(count = recipients.len(), "CSV parsing completed");
    Ok(recipients)
}

/// Parse recipients from an in-memory CSV buffer.
///
/// # Errors
///
/// See [`parse`].
pub fn parse_bytes(data: &[u8]) -> Result<Vec<Recipient>> {
    parse(data)
}
