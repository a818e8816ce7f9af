//! Account checks run by the transport layer before a transfer reaches
//! the engine.

use thiserror::Error;

use crate::core_types::AccountId;
use crate::ledger::{Account, LedgerError, TransactionCoordinator};

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("account [{0}] not found")]
    AccountNotFound(AccountId),

    #[error("account [{account_id}] currency mismatch: {actual} vs {expected}")]
    CurrencyMismatch {
        account_id: AccountId,
        /// Currency the caller asked to transfer
        expected: String,
        /// Currency the account is held in
        actual: String,
    },

    #[error("account [{0}] doesn't belong to the authenticated user")]
    NotOwner(AccountId),

    #[error(transparent)]
    Store(#[from] LedgerError),
}

impl ValidationError {
    pub fn status_code(&self) -> u16 {
        match self {
            ValidationError::AccountNotFound(_) => 404,
            ValidationError::CurrencyMismatch { .. } => 400,
            ValidationError::NotOwner(_) => 401,
            ValidationError::Store(_) => 500,
        }
    }
}

pub struct AccountValidator;

impl AccountValidator {
    /// Load `account_id` and confirm it is held in `currency`.
    pub async fn validate<C: TransactionCoordinator>(
        coordinator: &C,
        account_id: AccountId,
        currency: &str,
    ) -> Result<Account, ValidationError> {
        let account = coordinator
            .run_atomic(move |store| store.get_account(account_id))
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    ValidationError::AccountNotFound(account_id)
                } else {
                    ValidationError::Store(e)
                }
            })?;
        Self::check_currency(&account, currency)?;
        Ok(account)
    }

    pub fn check_currency(account: &Account, currency: &str) -> Result<(), ValidationError> {
        if account.currency != currency {
            return Err(ValidationError::CurrencyMismatch {
                account_id: account.id,
                expected: currency.to_string(),
                actual: account.currency.clone(),
            });
        }
        Ok(())
    }

    pub fn ensure_owner(account: &Account, principal: &str) -> Result<(), ValidationError> {
        if account.owner != principal {
            return Err(ValidationError::NotOwner(account.id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{CreateAccountParams, MemoryLedger};

    async fn open(ledger: &MemoryLedger, owner: &str, currency: &str) -> Account {
        let params = CreateAccountParams {
            owner: owner.into(),
            currency: currency.into(),
        };
        ledger
            .run_atomic(move |store| store.create_account(params))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_validate_ok() {
        let ledger = MemoryLedger::new();
        let account = open(&ledger, "alice", "USD").await;

        let found = AccountValidator::validate(&ledger, account.id, "USD")
            .await
            .unwrap();
        assert_eq!(found, account);
    }

    #[tokio::test]
    async fn test_validate_missing_account() {
        let ledger = MemoryLedger::new();
        let err = AccountValidator::validate(&ledger, 404, "USD")
            .await
            .unwrap_err();
        assert!(matches!(err, ValidationError::AccountNotFound(404)));
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_validate_currency_mismatch() {
        let ledger = MemoryLedger::new();
        let account = open(&ledger, "alice", "EUR").await;

        let err = AccountValidator::validate(&ledger, account.id, "USD")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(
            err.to_string(),
            format!("account [{}] currency mismatch: EUR vs USD", account.id)
        );
    }

    #[tokio::test]
    async fn test_ensure_owner() {
        let ledger = MemoryLedger::new();
        let account = open(&ledger, "alice", "USD").await;

        assert!(AccountValidator::ensure_owner(&account, "alice").is_ok());
        let err = AccountValidator::ensure_owner(&account, "mallory").unwrap_err();
        assert!(matches!(err, ValidationError::NotOwner(_)));
        assert_eq!(err.status_code(), 401);
    }
}
