pub mod codec;
pub mod dropdown;
pub mod google;
pub mod range;
pub mod validation;

#[cfg(test)]
pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Cell values for one A1 range. `None` cells are sent as `null`, which the
/// Sheets API leaves untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueRange {
    pub range: String,
    pub values: Vec<Vec<Option<String>>>,
}

impl ValueRange {
    pub fn row(range: String, cells: Vec<Option<String>>) -> Self {
        Self {
            range,
            values: vec![cells],
        }
    }
}

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("Sheets API returned {status} for {operation}: {body}")]
    Api {
        operation: String,
        status: reqwest::StatusCode,
        body: String,
    },
}

#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Values of `range`. The first row is the header; rows may be ragged.
    async fn get_range(&self, range: &str) -> Result<Vec<Vec<String>>>;

    /// Append rows after the last non-empty row of `sheet`.
    async fn append_rows(&self, sheet: &str, rows: Vec<Vec<Option<String>>>) -> Result<()>;

    async fn batch_update_values(&self, data: Vec<ValueRange>) -> Result<()>;

    /// Raw `spreadsheets.batchUpdate` requests (validation, formatting, merges).
    async fn batch_update(&self, requests: Vec<serde_json::Value>) -> Result<()>;
}
