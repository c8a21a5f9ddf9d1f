//! Patrimonio Core - Portfolio ledger and reconciliation engine.
//!
//! Domain entities, services, and traits for weighted-average-cost
//! position tracking, income accounting, valuation, price refresh, and
//! bulk workbook import. The engine is storage-agnostic behind
//! repository traits; the quote provider and workbook parser are
//! injected seams.

pub mod accounts;
pub mod assets;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod export;
pub mod import;
pub mod income;
pub mod ledger;
pub mod portfolio;
pub mod quotes;
pub mod settings;
pub mod store;
pub mod utils;

// Re-export the assembled engine and common types
pub use engine::PortfolioEngine;
pub use portfolio::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
