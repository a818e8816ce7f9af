//! In-memory Ledger Store
//!
//! A process-local ledger with the same transactional behaviour the engine
//! relies on from Postgres:
//!
//! - writes are staged in a [`MemoryScope`] and published in one step on
//!   commit, so no reader ever sees part of a unit of work
//! - balance adjustment, set-balance and delete take an exclusive per-account
//!   row lock that is held until the scope commits or rolls back
//! - dropping a scope discards its writes and releases its locks
//!
//! Used as the test double for the transfer engine and the gateway. Faults
//! can be armed with [`MemoryLedger::inject_fault`].

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures::future::BoxFuture;
use tokio::sync::{Mutex as RowLock, OwnedMutexGuard};
use tracing::{debug, warn};

use super::coordinator::{TransactionCoordinator, bounded};
use super::error::LedgerError;
use super::models::{
    Account, CreateAccountParams, CreateTransferParams, Entry, ListAccountsParams,
    ListEntriesParams, ListTransfersParams, Transfer,
};
use super::store::LedgerStore;
use crate::core_types::{AccountId, Amount, EntryId, TransferId};
use crate::currency::Currency;

/// One-shot failure points for exercising rollback paths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    CreateEntry,
    AdjustBalance,
    Commit,
    Rollback,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryOptions {
    /// Reject any write that would leave a balance below zero
    pub enforce_non_negative: bool,
    pub tx_timeout: Option<Duration>,
}

#[derive(Default)]
struct Tables {
    accounts: BTreeMap<AccountId, Account>,
    entries: BTreeMap<EntryId, Entry>,
    transfers: BTreeMap<TransferId, Transfer>,
}

struct Shared {
    tables: Mutex<Tables>,
    row_locks: Mutex<HashMap<AccountId, Arc<RowLock<()>>>>,
    faults: Mutex<Vec<Fault>>,
    next_account_id: AtomicI64,
    next_entry_id: AtomicI64,
    next_transfer_id: AtomicI64,
    options: MemoryOptions,
}

fn poisoned(what: &str) -> LedgerError {
    LedgerError::Internal(format!("{} lock poisoned", what))
}

impl Shared {
    fn tables(&self) -> Result<MutexGuard<'_, Tables>, LedgerError> {
        self.tables.lock().map_err(|_| poisoned("ledger tables"))
    }

    fn take_fault(&self, fault: Fault) -> bool {
        let Ok(mut faults) = self.faults.lock() else {
            return false;
        };
        match faults.iter().position(|f| *f == fault) {
            Some(idx) => {
                faults.remove(idx);
                true
            }
            None => false,
        }
    }
}

/// In-memory ledger: shared tables + transaction coordinator
#[derive(Clone)]
pub struct MemoryLedger {
    shared: Arc<Shared>,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::with_options(MemoryOptions::default())
    }

    pub fn with_options(options: MemoryOptions) -> Self {
        Self {
            shared: Arc::new(Shared {
                tables: Mutex::new(Tables::default()),
                row_locks: Mutex::new(HashMap::new()),
                faults: Mutex::new(Vec::new()),
                next_account_id: AtomicI64::new(1),
                next_entry_id: AtomicI64::new(1),
                next_transfer_id: AtomicI64::new(1),
                options,
            }),
        }
    }

    /// Open a transaction scope. Finish it with [`MemoryScope::commit`] or
    /// [`MemoryScope::rollback`]; dropping it rolls back.
    pub fn begin(&self) -> MemoryScope {
        MemoryScope {
            shared: self.shared.clone(),
            created: BTreeMap::new(),
            balances: HashMap::new(),
            deleted: HashSet::new(),
            entries: Vec::new(),
            transfers: Vec::new(),
            held: HashMap::new(),
        }
    }

    /// Arm a fault that fires on the next matching operation in any scope
    pub fn inject_fault(&self, fault: Fault) {
        if let Ok(mut faults) = self.shared.faults.lock() {
            faults.push(fault);
        }
    }
}

impl TransactionCoordinator for MemoryLedger {
    fn run_atomic<'a, T, F>(&'a self, work: F) -> BoxFuture<'a, Result<T, LedgerError>>
    where
        T: Send + 'a,
        F: for<'c> FnOnce(&'c mut dyn LedgerStore) -> BoxFuture<'c, Result<T, LedgerError>>
            + Send
            + 'a,
    {
        Box::pin(async move {
            let mut scope = self.begin();
            let outcome = bounded(self.shared.options.tx_timeout, work(&mut scope)).await;

            match outcome {
                Ok(value) => {
                    scope
                        .commit()
                        .map_err(|e| LedgerError::transaction(e, None))?;
                    Ok(value)
                }
                Err(cause) => {
                    let rollback = scope.rollback().err();
                    if let Some(ref rb) = rollback {
                        warn!(cause = %cause, rollback = %rb, "Rollback failed");
                    }
                    Err(LedgerError::transaction(cause, rollback))
                }
            }
        })
    }
}

/// Store handle bound to one in-memory transaction
pub struct MemoryScope {
    shared: Arc<Shared>,
    /// Accounts inserted by this scope, not yet visible to others
    created: BTreeMap<AccountId, Account>,
    /// In-scope balance of every row this scope has written
    balances: HashMap<AccountId, Amount>,
    deleted: HashSet<AccountId>,
    entries: Vec<Entry>,
    transfers: Vec<Transfer>,
    held: HashMap<AccountId, OwnedMutexGuard<()>>,
}

impl MemoryScope {
    /// Take the row lock for `id` unless this scope already holds it.
    async fn lock_row(&mut self, id: AccountId) -> Result<(), LedgerError> {
        if self.held.contains_key(&id) || self.created.contains_key(&id) {
            return Ok(());
        }
        let lock = {
            let mut locks = self.shared.row_locks.lock().map_err(|_| poisoned("row"))?;
            locks.entry(id).or_default().clone()
        };
        let guard = lock.lock_owned().await;
        self.held.insert(id, guard);
        Ok(())
    }

    fn account_exists(&self, tables: &Tables, id: AccountId) -> bool {
        !self.deleted.contains(&id)
            && (self.created.contains_key(&id) || tables.accounts.contains_key(&id))
    }

    fn visible_account(&self, id: AccountId) -> Result<Account, LedgerError> {
        if self.deleted.contains(&id) {
            return Err(LedgerError::account_not_found(id));
        }
        let mut account = match self.created.get(&id) {
            Some(account) => account.clone(),
            None => self
                .shared
                .tables()?
                .accounts
                .get(&id)
                .cloned()
                .ok_or_else(|| LedgerError::account_not_found(id))?,
        };
        if let Some(balance) = self.balances.get(&id) {
            account.balance = *balance;
        }
        Ok(account)
    }

    fn require_account(&self, id: AccountId, constraint: &str) -> Result<(), LedgerError> {
        let tables = self.shared.tables()?;
        if self.account_exists(&tables, id) {
            Ok(())
        } else {
            Err(LedgerError::ConstraintViolation(format!(
                "{}: account {} does not exist",
                constraint, id
            )))
        }
    }

    fn check_balance(&self, id: AccountId, balance: Amount) -> Result<(), LedgerError> {
        if self.shared.options.enforce_non_negative && balance < 0 {
            return Err(LedgerError::ConstraintViolation(format!(
                "balance_nonnegative: account {} would become {}",
                id, balance
            )));
        }
        Ok(())
    }

    /// Publish every staged write, then release the row locks.
    pub fn commit(self) -> Result<(), LedgerError> {
        if self.shared.take_fault(Fault::Commit) {
            return Err(LedgerError::Internal("injected fault: commit".into()));
        }

        let shared = self.shared.clone();
        let mut tables = shared.tables()?;

        for account in self.created.values() {
            let duplicate = tables
                .accounts
                .values()
                .any(|a| a.owner == account.owner && a.currency == account.currency);
            if duplicate {
                return Err(LedgerError::ConstraintViolation(format!(
                    "owner_currency_key: ({}, {}) already exists",
                    account.owner, account.currency
                )));
            }
        }
        let missing = self
            .entries
            .iter()
            .map(|e| e.account_id)
            .chain(
                self.transfers
                    .iter()
                    .flat_map(|t| [t.from_account_id, t.to_account_id]),
            )
            .chain(self.balances.keys().copied())
            .find(|id| !self.account_exists(&tables, *id));
        if let Some(id) = missing {
            return Err(LedgerError::ConstraintViolation(format!(
                "account {} was removed before commit",
                id
            )));
        }
        // Rows committed by other scopes since the delete ran still count.
        let referenced = self.deleted.iter().copied().find(|id| {
            tables.entries.values().any(|e| e.account_id == *id)
                || tables
                    .transfers
                    .values()
                    .any(|t| t.from_account_id == *id || t.to_account_id == *id)
        });
        if let Some(id) = referenced {
            return Err(LedgerError::ConstraintViolation(format!(
                "account {} is still referenced by ledger rows",
                id
            )));
        }

        for (id, account) in &self.created {
            tables.accounts.insert(*id, account.clone());
        }
        for (id, balance) in &self.balances {
            if let Some(account) = tables.accounts.get_mut(id) {
                account.balance = *balance;
            }
        }
        for id in &self.deleted {
            tables.accounts.remove(id);
        }
        for entry in &self.entries {
            tables.entries.insert(entry.id, entry.clone());
        }
        for transfer in &self.transfers {
            tables.transfers.insert(transfer.id, transfer.clone());
        }
        drop(tables);

        // Already published: a poisoned lock map only leaks entries.
        if let Ok(mut locks) = shared.row_locks.lock() {
            for id in &self.deleted {
                locks.remove(id);
            }
        }

        debug!(
            entries = self.entries.len(),
            transfers = self.transfers.len(),
            locks = self.held.len(),
            "Memory scope committed"
        );
        Ok(())
    }

    /// Discard staged writes and release the row locks.
    pub fn rollback(self) -> Result<(), LedgerError> {
        if self.shared.take_fault(Fault::Rollback) {
            return Err(LedgerError::Internal("injected fault: rollback".into()));
        }
        debug!(locks = self.held.len(), "Memory scope rolled back");
        Ok(())
    }
}

fn page<T>(rows: Vec<T>, limit: i64, offset: i64) -> Result<Vec<T>, LedgerError> {
    if limit < 0 || offset < 0 {
        return Err(LedgerError::InvalidArgument(format!(
            "limit {} / offset {} must not be negative",
            limit, offset
        )));
    }
    Ok(rows
        .into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .collect())
}

#[async_trait]
impl LedgerStore for MemoryScope {
    async fn create_account(
        &mut self,
        params: CreateAccountParams,
    ) -> Result<Account, LedgerError> {
        Currency::new(&params.currency)
            .map_err(|e| LedgerError::ConstraintViolation(e.to_string()))?;
        {
            let tables = self.shared.tables()?;
            let duplicate = tables
                .accounts
                .values()
                .filter(|a| !self.deleted.contains(&a.id))
                .chain(self.created.values())
                .any(|a| a.owner == params.owner && a.currency == params.currency);
            if duplicate {
                return Err(LedgerError::ConstraintViolation(format!(
                    "owner_currency_key: ({}, {}) already exists",
                    params.owner, params.currency
                )));
            }
        }

        let account = Account {
            id: self.shared.next_account_id.fetch_add(1, Ordering::SeqCst),
            owner: params.owner,
            balance: 0,
            currency: params.currency,
            created_at: Utc::now(),
        };
        self.created.insert(account.id, account.clone());
        Ok(account)
    }

    async fn get_account(&mut self, id: AccountId) -> Result<Account, LedgerError> {
        self.visible_account(id)
    }

    async fn list_accounts(
        &mut self,
        params: ListAccountsParams,
    ) -> Result<Vec<Account>, LedgerError> {
        let mut rows: BTreeMap<AccountId, Account> = {
            let tables = self.shared.tables()?;
            tables
                .accounts
                .iter()
                .filter(|(id, _)| !self.deleted.contains(id))
                .map(|(id, a)| (*id, a.clone()))
                .collect()
        };
        rows.extend(self.created.iter().map(|(id, a)| (*id, a.clone())));

        let matching = rows
            .into_values()
            .filter(|a| params.owner.as_ref().is_none_or(|owner| &a.owner == owner))
            .map(|mut a| {
                if let Some(balance) = self.balances.get(&a.id) {
                    a.balance = *balance;
                }
                a
            })
            .collect();
        page(matching, params.limit, params.offset)
    }

    async fn update_account_balance(
        &mut self,
        id: AccountId,
        balance: Amount,
    ) -> Result<Account, LedgerError> {
        self.lock_row(id).await?;
        let mut account = self.visible_account(id)?;
        self.check_balance(id, balance)?;

        warn!(
            account_id = id,
            balance = balance,
            "Administrative balance overwrite bypasses the entry ledger"
        );
        self.balances.insert(id, balance);
        account.balance = balance;
        Ok(account)
    }

    async fn adjust_account_balance(
        &mut self,
        id: AccountId,
        delta: Amount,
    ) -> Result<Amount, LedgerError> {
        if self.shared.take_fault(Fault::AdjustBalance) {
            return Err(LedgerError::Internal(
                "injected fault: adjust_account_balance".into(),
            ));
        }
        self.lock_row(id).await?;

        // Read after the lock: the previous holder has already published.
        let current = self.visible_account(id)?.balance;
        let updated = current.checked_add(delta).ok_or_else(|| {
            LedgerError::ConstraintViolation(format!("balance overflow on account {}", id))
        })?;
        self.check_balance(id, updated)?;

        self.balances.insert(id, updated);
        Ok(updated)
    }

    async fn delete_account(&mut self, id: AccountId) -> Result<(), LedgerError> {
        self.lock_row(id).await?;
        self.visible_account(id)?;

        let referenced = {
            let tables = self.shared.tables()?;
            tables
                .entries
                .values()
                .chain(self.entries.iter())
                .any(|e| e.account_id == id)
                || tables
                    .transfers
                    .values()
                    .chain(self.transfers.iter())
                    .any(|t| t.from_account_id == id || t.to_account_id == id)
        };
        if referenced {
            return Err(LedgerError::ConstraintViolation(format!(
                "account {} is still referenced by ledger rows",
                id
            )));
        }

        self.balances.remove(&id);
        if self.created.remove(&id).is_none() {
            self.deleted.insert(id);
        }
        Ok(())
    }

    async fn create_entry(
        &mut self,
        account_id: AccountId,
        amount: Amount,
    ) -> Result<Entry, LedgerError> {
        if self.shared.take_fault(Fault::CreateEntry) {
            return Err(LedgerError::Internal("injected fault: create_entry".into()));
        }
        self.require_account(account_id, "entries_account_id_fkey")?;

        let entry = Entry {
            id: self.shared.next_entry_id.fetch_add(1, Ordering::SeqCst),
            account_id,
            amount,
            created_at: Utc::now(),
        };
        self.entries.push(entry.clone());
        Ok(entry)
    }

    async fn get_entry(&mut self, id: EntryId) -> Result<Entry, LedgerError> {
        if let Some(entry) = self.entries.iter().find(|e| e.id == id) {
            return Ok(entry.clone());
        }
        self.shared
            .tables()?
            .entries
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("entry {}", id)))
    }

    async fn list_entries(
        &mut self,
        params: ListEntriesParams,
    ) -> Result<Vec<Entry>, LedgerError> {
        let mut rows: Vec<Entry> = {
            let tables = self.shared.tables()?;
            tables
                .entries
                .values()
                .filter(|e| e.account_id == params.account_id)
                .cloned()
                .collect()
        };
        rows.extend(
            self.entries
                .iter()
                .filter(|e| e.account_id == params.account_id)
                .cloned(),
        );
        rows.sort_by_key(|e| e.id);
        page(rows, params.limit, params.offset)
    }

    async fn create_transfer(
        &mut self,
        params: CreateTransferParams,
    ) -> Result<Transfer, LedgerError> {
        if params.amount <= 0 {
            return Err(LedgerError::ConstraintViolation(format!(
                "transfers_amount_check: amount {} must be positive",
                params.amount
            )));
        }
        self.require_account(params.from_account_id, "transfers_from_account_id_fkey")?;
        self.require_account(params.to_account_id, "transfers_to_account_id_fkey")?;

        let transfer = Transfer {
            id: self.shared.next_transfer_id.fetch_add(1, Ordering::SeqCst),
            from_account_id: params.from_account_id,
            to_account_id: params.to_account_id,
            amount: params.amount,
            created_at: Utc::now(),
        };
        self.transfers.push(transfer.clone());
        Ok(transfer)
    }

    async fn get_transfer(&mut self, id: TransferId) -> Result<Transfer, LedgerError> {
        if let Some(transfer) = self.transfers.iter().find(|t| t.id == id) {
            return Ok(transfer.clone());
        }
        self.shared
            .tables()?
            .transfers
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("transfer {}", id)))
    }

    async fn list_transfers(
        &mut self,
        params: ListTransfersParams,
    ) -> Result<Vec<Transfer>, LedgerError> {
        let matches = |t: &&Transfer| {
            t.from_account_id == params.from_account_id || t.to_account_id == params.to_account_id
        };
        let mut rows: Vec<Transfer> = {
            let tables = self.shared.tables()?;
            tables.transfers.values().filter(matches).cloned().collect()
        };
        rows.extend(self.transfers.iter().filter(matches).cloned());
        rows.sort_by_key(|t| t.id);
        page(rows, params.limit, params.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd(owner: &str) -> CreateAccountParams {
        CreateAccountParams {
            owner: owner.to_string(),
            currency: "USD".to_string(),
        }
    }

    async fn open(ledger: &MemoryLedger, owner: &str) -> Account {
        let params = usd(owner);
        ledger
            .run_atomic(move |store| store.create_account(params))
            .await
            .unwrap()
    }

    async fn balance_of(ledger: &MemoryLedger, id: AccountId) -> Amount {
        ledger
            .run_atomic(move |store| store.get_account(id))
            .await
            .unwrap()
            .balance
    }

    #[tokio::test]
    async fn test_create_account_starts_at_zero() {
        let ledger = MemoryLedger::new();
        let account = open(&ledger, "alice").await;
        assert_eq!(account.id, 1);
        assert_eq!(account.balance, 0);
        assert_eq!(account.currency, "USD");
    }

    #[tokio::test]
    async fn test_duplicate_owner_currency_rejected() {
        let ledger = MemoryLedger::new();
        open(&ledger, "alice").await;

        let err = ledger
            .run_atomic(|store| store.create_account(usd("alice")))
            .await
            .unwrap_err();
        assert!(err.is_constraint_violation(), "{}", err);
    }

    #[tokio::test]
    async fn test_unsupported_currency_rejected() {
        let ledger = MemoryLedger::new();
        let err = ledger
            .run_atomic(|store| {
                store.create_account(CreateAccountParams {
                    owner: "bob".into(),
                    currency: "YEN".into(),
                })
            })
            .await
            .unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[tokio::test]
    async fn test_staged_writes_invisible_until_commit() {
        let ledger = MemoryLedger::new();
        let account = open(&ledger, "alice").await;

        let mut scope = ledger.begin();
        scope.create_entry(account.id, 40).await.unwrap();
        assert_eq!(scope.adjust_account_balance(account.id, 40).await.unwrap(), 40);

        let mut reader = ledger.begin();
        assert_eq!(reader.get_account(account.id).await.unwrap().balance, 0);
        let entries = reader
            .list_entries(ListEntriesParams {
                account_id: account.id,
                limit: 10,
                offset: 0,
            })
            .await
            .unwrap();
        assert!(entries.is_empty());
        drop(reader);

        scope.commit().unwrap();
        assert_eq!(balance_of(&ledger, account.id).await, 40);
    }

    #[tokio::test]
    async fn test_dropped_scope_rolls_back() {
        let ledger = MemoryLedger::new();
        let account = open(&ledger, "alice").await;

        {
            let mut scope = ledger.begin();
            scope.adjust_account_balance(account.id, 75).await.unwrap();
        }

        assert_eq!(balance_of(&ledger, account.id).await, 0);
        // Lock released by the drop: a new adjustment does not block
        let id = account.id;
        let out = ledger
            .run_atomic(move |store| store.adjust_account_balance(id, 5))
            .await
            .unwrap();
        assert_eq!(out, 5);
    }

    #[tokio::test]
    async fn test_row_lock_serialises_adjusters() {
        let ledger = MemoryLedger::new();
        let account = open(&ledger, "alice").await;

        let mut first = ledger.begin();
        first.adjust_account_balance(account.id, 10).await.unwrap();

        let ledger2 = ledger.clone();
        let id = account.id;
        let waiter = tokio::spawn(async move {
            ledger2
                .run_atomic(move |store| store.adjust_account_balance(id, 1))
                .await
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished(), "second adjuster must wait for the row lock");

        first.commit().unwrap();
        // Second adjuster reads the committed value, no lost update
        assert_eq!(waiter.await.unwrap().unwrap(), 11);
        assert_eq!(balance_of(&ledger, account.id).await, 11);
    }

    #[tokio::test]
    async fn test_non_negative_enforcement() {
        let ledger = MemoryLedger::with_options(MemoryOptions {
            enforce_non_negative: true,
            ..MemoryOptions::default()
        });
        let account = open(&ledger, "alice").await;
        let id = account.id;

        let err = ledger
            .run_atomic(move |store| store.adjust_account_balance(id, -1))
            .await
            .unwrap_err();
        assert!(err.is_constraint_violation());
        assert_eq!(balance_of(&ledger, id).await, 0);
    }

    #[tokio::test]
    async fn test_delete_account() {
        let ledger = MemoryLedger::new();
        let account = open(&ledger, "alice").await;
        let id = account.id;

        ledger
            .run_atomic(move |store| store.delete_account(id))
            .await
            .unwrap();
        let err = ledger
            .run_atomic(move |store| store.get_account(id))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = ledger
            .run_atomic(move |store| store.delete_account(id))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_referenced_account_rejected() {
        let ledger = MemoryLedger::new();
        let account = open(&ledger, "alice").await;
        let id = account.id;
        ledger
            .run_atomic(move |store| store.create_entry(id, 10))
            .await
            .unwrap();

        let err = ledger
            .run_atomic(move |store| store.delete_account(id))
            .await
            .unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[tokio::test]
    async fn test_delete_fails_when_entry_committed_meanwhile() {
        let ledger = MemoryLedger::new();
        let account = open(&ledger, "alice").await;
        let id = account.id;

        let mut deleter = ledger.begin();
        deleter.delete_account(id).await.unwrap();

        let mut writer = ledger.begin();
        writer.create_entry(id, 10).await.unwrap();
        writer.commit().unwrap();

        let err = deleter.commit().unwrap_err();
        assert!(err.is_constraint_violation(), "{}", err);

        // Account survives alongside the entry that references it
        let entries = ledger
            .run_atomic(move |store| {
                store.list_entries(ListEntriesParams {
                    account_id: id,
                    limit: 10,
                    offset: 0,
                })
            })
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(balance_of(&ledger, id).await, 0);
    }

    #[tokio::test]
    async fn test_entry_after_committed_delete_is_rejected() {
        let ledger = MemoryLedger::new();
        let account = open(&ledger, "alice").await;
        let id = account.id;

        let mut deleter = ledger.begin();
        deleter.delete_account(id).await.unwrap();
        let mut writer = ledger.begin();
        writer.create_entry(id, 10).await.unwrap();

        deleter.commit().unwrap();
        let err = writer.commit().unwrap_err();
        assert!(err.is_constraint_violation(), "{}", err);
    }

    #[tokio::test]
    async fn test_committed_delete_drops_row_lock() {
        let ledger = MemoryLedger::new();
        let keep = open(&ledger, "alice").await.id;
        let gone = open(&ledger, "bob").await.id;

        ledger
            .run_atomic(move |store| {
                Box::pin(async move {
                    store.adjust_account_balance(keep, 1).await?;
                    store.delete_account(gone).await
                })
            })
            .await
            .unwrap();

        let locks = ledger.shared.row_locks.lock().unwrap();
        assert!(locks.contains_key(&keep));
        assert!(!locks.contains_key(&gone));
    }

    #[tokio::test]
    async fn test_get_entry_and_transfer() {
        let ledger = MemoryLedger::new();
        let a = open(&ledger, "alice").await.id;
        let b = open(&ledger, "bob").await.id;

        let (entry, transfer) = ledger
            .run_atomic(move |store| {
                Box::pin(async move {
                    let transfer = store
                        .create_transfer(CreateTransferParams {
                            from_account_id: a,
                            to_account_id: b,
                            amount: 25,
                        })
                        .await?;
                    let entry = store.create_entry(a, -25).await?;
                    // Visible to the scope that wrote it
                    assert_eq!(store.get_entry(entry.id).await?, entry);
                    Ok((entry, transfer))
                })
            })
            .await
            .unwrap();

        let (entry_id, transfer_id) = (entry.id, transfer.id);
        let found = ledger
            .run_atomic(move |store| store.get_entry(entry_id))
            .await
            .unwrap();
        assert_eq!(found, entry);
        let found = ledger
            .run_atomic(move |store| store.get_transfer(transfer_id))
            .await
            .unwrap();
        assert_eq!(found, transfer);

        let err = ledger
            .run_atomic(|store| store.get_entry(404))
            .await
            .unwrap_err();
        assert!(err.is_not_found(), "{}", err);
        let err = ledger
            .run_atomic(|store| store.get_transfer(404))
            .await
            .unwrap_err();
        assert!(err.is_not_found(), "{}", err);
    }

    #[tokio::test]
    async fn test_list_transfers_both_sides_paged() {
        let ledger = MemoryLedger::new();
        let a = open(&ledger, "alice").await.id;
        let b = open(&ledger, "bob").await.id;
        let c = open(&ledger, "carol").await.id;

        // a is the source of two, the target of two, and absent from one
        for (from, to) in [(a, b), (b, a), (b, c), (a, c), (c, a)] {
            ledger
                .run_atomic(move |store| {
                    store.create_transfer(CreateTransferParams {
                        from_account_id: from,
                        to_account_id: to,
                        amount: 1,
                    })
                })
                .await
                .unwrap();
        }

        let list = |offset: i64| {
            let ledger = ledger.clone();
            async move {
                ledger
                    .run_atomic(move |store| {
                        store.list_transfers(ListTransfersParams {
                            from_account_id: a,
                            to_account_id: a,
                            limit: 2,
                            offset,
                        })
                    })
                    .await
                    .unwrap()
            }
        };

        let first = list(0).await;
        let second = list(2).await;
        let third = list(4).await;
        let pairs: Vec<_> = first
            .iter()
            .chain(second.iter())
            .map(|t| (t.from_account_id, t.to_account_id))
            .collect();
        assert_eq!(pairs, vec![(a, b), (b, a), (a, c), (c, a)]);
        assert!(first[0].id < first[1].id && first[1].id < second[0].id);
        assert!(third.is_empty());
    }

    #[tokio::test]
    async fn test_entry_for_missing_account_is_fk_violation() {
        let ledger = MemoryLedger::new();
        let err = ledger
            .run_atomic(|store| store.create_entry(99, 10))
            .await
            .unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[tokio::test]
    async fn test_list_accounts_paging_and_owner_filter() {
        let ledger = MemoryLedger::new();
        for owner in ["a", "b", "c", "d", "e", "f"] {
            open(&ledger, owner).await;
        }

        let page2 = ledger
            .run_atomic(|store| {
                store.list_accounts(ListAccountsParams {
                    owner: None,
                    limit: 5,
                    offset: 5,
                })
            })
            .await
            .unwrap();
        assert_eq!(page2.len(), 1);
        assert_eq!(page2[0].owner, "f");

        let only_c = ledger
            .run_atomic(|store| {
                store.list_accounts(ListAccountsParams {
                    owner: Some("c".into()),
                    limit: 5,
                    offset: 0,
                })
            })
            .await
            .unwrap();
        assert_eq!(only_c.len(), 1);
        assert_eq!(only_c[0].owner, "c");
    }

    #[tokio::test]
    async fn test_negative_limit_is_invalid_argument() {
        let ledger = MemoryLedger::new();
        let err = ledger
            .run_atomic(|store| {
                store.list_accounts(ListAccountsParams {
                    owner: None,
                    limit: -1,
                    offset: 0,
                })
            })
            .await
            .unwrap_err();
        assert!(matches!(err.root_cause(), LedgerError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_rollback_fault_reports_both_errors() {
        let ledger = MemoryLedger::new();
        ledger.inject_fault(Fault::Rollback);

        let err = ledger
            .run_atomic(|_store| {
                Box::pin(async { Err::<(), _>(LedgerError::Internal("work failed".into())) })
            })
            .await
            .unwrap_err();
        match err {
            LedgerError::TransactionFailure { cause, rollback } => {
                assert!(cause.to_string().contains("work failed"));
                assert!(rollback.unwrap().to_string().contains("rollback"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_commit_fault_discards_writes() {
        let ledger = MemoryLedger::new();
        let account = open(&ledger, "alice").await;
        let id = account.id;
        ledger.inject_fault(Fault::Commit);

        let err = ledger
            .run_atomic(move |store| store.adjust_account_balance(id, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::TransactionFailure { rollback: None, .. }));
        assert_eq!(balance_of(&ledger, id).await, 0);
    }

    #[tokio::test]
    async fn test_timeout_rolls_back() {
        let ledger = MemoryLedger::with_options(MemoryOptions {
            tx_timeout: Some(Duration::from_millis(20)),
            ..MemoryOptions::default()
        });
        let account = open(&ledger, "alice").await;
        let id = account.id;

        let err = ledger
            .run_atomic(move |store| {
                Box::pin(async move {
                    store.adjust_account_balance(id, 10).await?;
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(())
                })
            })
            .await
            .unwrap_err();
        assert!(matches!(err.root_cause(), LedgerError::Timeout(_)));
        assert_eq!(balance_of(&ledger, id).await, 0);
    }
}
