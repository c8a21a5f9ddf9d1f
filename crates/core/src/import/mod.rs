//! Import module - bulk workbook reconciliation with dry-run preview and
//! duplicate suppression.

mod fingerprint;
mod import_model;
mod import_service;
mod workbook;

#[cfg(test)]
mod import_service_tests;

pub use fingerprint::{dividend_fingerprint, interest_fingerprint, transaction_fingerprint};
pub use import_model::{
    ImportError, ImportResult, ImportRowError, InsertedCounts, SkippedCounts,
};
pub use import_service::ImportService;
pub use workbook::{CsvWorkbookParser, Sheet, Workbook, WorkbookParserTrait};
