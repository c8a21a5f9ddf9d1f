//! Import result models.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structurally fatal import failures. Row-level problems never surface
/// here; they are collected into `ImportResult::errors`.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Unreadable workbook: {0}")]
    UnreadableWorkbook(String),
}

/// One excluded row, attributed to its sheet/row/column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRowError {
    pub sheet: String,
    /// 1-based workbook row (the header is row 1).
    pub row: usize,
    pub column: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertedCounts {
    pub transactions: usize,
    pub dividends: usize,
    pub interests: usize,
    pub assets: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedCounts {
    pub transactions: usize,
    pub dividends: usize,
    pub interests: usize,
}

/// Outcome of one reconciliation pass. A dry run reports the same counts
/// a commit of the same workbook would produce, without mutating any
/// store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub dry_run: bool,
    pub inserted: InsertedCounts,
    pub skipped_duplicates: SkippedCounts,
    pub errors: Vec<ImportRowError>,
}

impl ImportResult {
    pub fn new(dry_run: bool) -> Self {
        ImportResult {
            dry_run,
            inserted: InsertedCounts::default(),
            skipped_duplicates: SkippedCounts::default(),
            errors: Vec::new(),
        }
    }

    pub fn push_error(
        &mut self,
        sheet: &str,
        row: usize,
        column: &str,
        message: impl Into<String>,
    ) {
        self.errors.push(ImportRowError {
            sheet: sheet.to_string(),
            row,
            column: column.to_string(),
            message: message.into(),
        });
    }
}

#[cfg(test)]
mod import_model_tests {
    use super::*;

    #[test]
    fn test_result_serializes_camel_case() {
        let mut result = ImportResult::new(true);
        result.inserted.transactions = 2;
        result.skipped_duplicates.dividends = 1;
        result.push_error("Transactions", 4, "Quantity", "must be positive");

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["dryRun"], true);
        assert_eq!(json["inserted"]["transactions"], 2);
        assert_eq!(json["skippedDuplicates"]["dividends"], 1);
        assert_eq!(json["errors"][0]["column"], "Quantity");
    }
}
