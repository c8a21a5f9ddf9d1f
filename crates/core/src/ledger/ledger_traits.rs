use std::collections::HashSet;

use crate::ledger::{NewTransaction, Transaction, TransactionFilter, TransactionUpdate};
use crate::utils::Page;
use crate::Result;
use async_trait::async_trait;

/// Trait defining the contract for Transaction repository operations.
///
/// `insert_transaction` assigns the monotonically increasing `sequence`
/// used as the same-day tie-break; `update_transaction` preserves it.
#[async_trait]
pub trait TransactionRepositoryTrait: Send + Sync {
    fn get_transaction(&self, transaction_id: &str) -> Result<Transaction>;
    /// Lists matching transactions in ledger order `(date, sequence)`.
    fn list_transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>>;
    fn transaction_fingerprints(&self) -> Result<HashSet<String>>;
    async fn insert_transaction(&self, transaction: Transaction) -> Result<Transaction>;
    async fn update_transaction(&self, transaction: Transaction) -> Result<Transaction>;
    async fn delete_transaction(&self, transaction_id: &str) -> Result<Transaction>;
}

/// Trait defining the contract for ledger service operations.
#[async_trait]
pub trait LedgerServiceTrait: Send + Sync {
    fn get_transaction(&self, transaction_id: &str) -> Result<Transaction>;
    /// Ledger-ordered list of matching transactions.
    fn list_for(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>>;
    /// Paginated variant of `list_for`; `page` is 1-based.
    fn search(
        &self,
        page: usize,
        page_size: usize,
        filter: &TransactionFilter,
    ) -> Result<Page<Transaction>>;
    async fn record(&self, new_transaction: NewTransaction) -> Result<Transaction>;
    async fn amend(&self, update: TransactionUpdate) -> Result<Transaction>;
    async fn remove(&self, transaction_id: &str) -> Result<Transaction>;
}
