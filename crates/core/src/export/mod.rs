//! Export module - flat CSV dumps of ledger and income records.

mod export_service;

pub use export_service::ExportService;
