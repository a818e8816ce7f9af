//! Ledger Store capability
//!
//! The transfer engine depends on this trait only, never on a concrete
//! database client. Every method runs inside whatever transaction scope the
//! handle is bound to; a handle obtained from a coordinator is scoped to
//! one atomic unit of work.

use async_trait::async_trait;

use super::error::LedgerError;
use super::models::{
    Account, CreateAccountParams, CreateTransferParams, Entry, ListAccountsParams,
    ListEntriesParams, ListTransfersParams, Transfer,
};
use crate::core_types::{AccountId, Amount, EntryId, TransferId};

/// Point CRUD over accounts, entries and transfers plus the atomic
/// balance-adjustment primitive.
#[async_trait]
pub trait LedgerStore: Send {
    /// Open an account with zero balance.
    ///
    /// `ConstraintViolation` on duplicate (owner, currency) or unknown currency.
    async fn create_account(&mut self, params: CreateAccountParams)
    -> Result<Account, LedgerError>;

    async fn get_account(&mut self, id: AccountId) -> Result<Account, LedgerError>;

    async fn list_accounts(
        &mut self,
        params: ListAccountsParams,
    ) -> Result<Vec<Account>, LedgerError>;

    /// Administrative set-balance.
    ///
    /// Bypasses the entry ledger, so the account's balance no longer equals
    /// the sum of its entries afterwards. Never used by the transfer path.
    async fn update_account_balance(
        &mut self,
        id: AccountId,
        balance: Amount,
    ) -> Result<Account, LedgerError>;

    /// Atomically add `delta` to the stored balance and return the new value.
    ///
    /// Single read-modify-write; takes the row lock for the rest of the
    /// enclosing transaction.
    async fn adjust_account_balance(
        &mut self,
        id: AccountId,
        delta: Amount,
    ) -> Result<Amount, LedgerError>;

    async fn delete_account(&mut self, id: AccountId) -> Result<(), LedgerError>;

    /// Record a ledger line. Does not touch the account balance.
    async fn create_entry(
        &mut self,
        account_id: AccountId,
        amount: Amount,
    ) -> Result<Entry, LedgerError>;

    async fn get_entry(&mut self, id: EntryId) -> Result<Entry, LedgerError>;

    async fn list_entries(&mut self, params: ListEntriesParams)
    -> Result<Vec<Entry>, LedgerError>;

    async fn create_transfer(
        &mut self,
        params: CreateTransferParams,
    ) -> Result<Transfer, LedgerError>;

    async fn get_transfer(&mut self, id: TransferId) -> Result<Transfer, LedgerError>;

    async fn list_transfers(
        &mut self,
        params: ListTransfersParams,
    ) -> Result<Vec<Transfer>, LedgerError>;
}
