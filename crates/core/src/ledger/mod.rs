//! Ledger module - BUY/SELL/GIFT transaction entry, the single source of
//! truth for positions.

mod ledger_errors;
mod ledger_model;
mod ledger_service;
mod ledger_traits;

#[cfg(test)]
mod ledger_service_tests;

pub use ledger_errors::LedgerError;
pub use ledger_model::{
    NewTransaction, Transaction, TransactionFilter, TransactionType, TransactionUpdate,
};
pub use ledger_service::LedgerService;
pub use ledger_traits::{LedgerServiceTrait, TransactionRepositoryTrait};
