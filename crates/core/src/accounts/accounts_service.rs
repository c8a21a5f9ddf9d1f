use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use crate::accounts::{
    Account, AccountRepositoryTrait, AccountServiceTrait, AccountUpdate, NewAccount,
};
use crate::errors::ValidationError;
use crate::income::InterestRepositoryTrait;
use crate::ledger::{TransactionFilter, TransactionRepositoryTrait};
use crate::Error;
use crate::Result;

/// Service for managing accounts.
pub struct AccountService {
    account_repository: Arc<dyn AccountRepositoryTrait>,
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    interest_repository: Arc<dyn InterestRepositoryTrait>,
}

impl AccountService {
    pub fn new(
        account_repository: Arc<dyn AccountRepositoryTrait>,
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
        interest_repository: Arc<dyn InterestRepositoryTrait>,
    ) -> Self {
        Self {
            account_repository,
            transaction_repository,
            interest_repository,
        }
    }

    fn validate_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(ValidationError::MissingField("name".to_string()).into());
        }
        Ok(())
    }
}

#[async_trait]
impl AccountServiceTrait for AccountService {
    fn get_account(&self, account_id: &str) -> Result<Account> {
        self.account_repository.get_account(account_id)
    }

    fn list_accounts(&self) -> Result<Vec<Account>> {
        self.account_repository.list_accounts()
    }

    async fn create_account(&self, new_account: NewAccount) -> Result<Account> {
        Self::validate_name(&new_account.name)?;
        let account = self.account_repository.create_account(new_account).await?;
        debug!("Created account {} ({})", account.name, account.id);
        Ok(account)
    }

    async fn update_account(&self, update: AccountUpdate) -> Result<Account> {
        if let Some(ref name) = update.name {
            Self::validate_name(name)?;
        }
        self.account_repository.update_account(update).await
    }

    async fn delete_account(&self, account_id: &str) -> Result<Account> {
        let referenced_by_ledger = !self
            .transaction_repository
            .list_transactions(&TransactionFilter {
                account_id: Some(account_id.to_string()),
                ..Default::default()
            })?
            .is_empty();
        let referenced_by_interests = !self
            .interest_repository
            .list_interests_for_account(account_id)?
            .is_empty();

        if referenced_by_ledger || referenced_by_interests {
            return Err(Error::ConstraintViolation(
                "cannot delete an account with transactions or interest payments".to_string(),
            ));
        }

        self.account_repository.delete_account(account_id).await
    }
}
