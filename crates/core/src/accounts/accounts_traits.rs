use crate::accounts::{Account, AccountUpdate, NewAccount};
use crate::Result;
use async_trait::async_trait;

/// Trait defining the contract for Account repository operations.
#[async_trait]
pub trait AccountRepositoryTrait: Send + Sync {
    fn get_account(&self, account_id: &str) -> Result<Account>;
    fn list_accounts(&self) -> Result<Vec<Account>>;
    fn find_account_by_name(&self, name: &str) -> Result<Option<Account>>;
    async fn create_account(&self, new_account: NewAccount) -> Result<Account>;
    async fn update_account(&self, update: AccountUpdate) -> Result<Account>;
    async fn delete_account(&self, account_id: &str) -> Result<Account>;
}

/// Trait defining the contract for Account service operations.
#[async_trait]
pub trait AccountServiceTrait: Send + Sync {
    fn get_account(&self, account_id: &str) -> Result<Account>;
    fn list_accounts(&self) -> Result<Vec<Account>>;
    async fn create_account(&self, new_account: NewAccount) -> Result<Account>;
    async fn update_account(&self, update: AccountUpdate) -> Result<Account>;
    /// Deletes an account. Rejected with a constraint error when any
    /// transaction or interest payment still references it.
    async fn delete_account(&self, account_id: &str) -> Result<Account>;
}
