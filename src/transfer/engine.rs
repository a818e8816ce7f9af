//! Transfer Engine
//!
//! Moves funds between two accounts as one atomic unit of work:
//!
//! ```text
//! create_transfer ─▶ entry(from, -amount) ─▶ entry(to, +amount)
//!     ─▶ adjust(min id) ─▶ adjust(max id) ─▶ re-read both accounts
//! ```
//!
//! Balance adjustments always go to the numerically smaller account id
//! first, whichever side it is on. Every concurrent transfer therefore
//! takes row locks in ascending id order and no wait cycle can form.
//!
//! The engine never retries. A `SerializationConflict` is returned to the
//! caller as is.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{Instrument, info, info_span, warn};

use crate::core_types::{AccountId, Amount};
use crate::ledger::{
    Account, CreateTransferParams, Entry, LedgerError, LedgerStore, Transfer,
    TransactionCoordinator,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferParams {
    pub from_account_id: AccountId,
    pub to_account_id: AccountId,
    pub amount: Amount,
}

/// Everything a committed transfer wrote, with post-transfer balances
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferResult {
    pub transfer: Transfer,
    pub from_account: Account,
    pub to_account: Account,
    pub from_entry: Entry,
    pub to_entry: Entry,
}

/// Reject calls the ordering rule is undefined for.
pub fn check_params(params: &TransferParams) -> Result<(), LedgerError> {
    if params.amount <= 0 {
        return Err(LedgerError::InvalidArgument(format!(
            "transfer amount must be positive, got {}",
            params.amount
        )));
    }
    if params.from_account_id == params.to_account_id {
        return Err(LedgerError::InvalidArgument(format!(
            "cannot transfer from account {} to itself",
            params.from_account_id
        )));
    }
    Ok(())
}

/// Balance deltas in lock order: lower account id first.
pub fn balance_adjustments(params: &TransferParams) -> [(AccountId, Amount); 2] {
    let debit = (params.from_account_id, -params.amount);
    let credit = (params.to_account_id, params.amount);
    if params.from_account_id < params.to_account_id {
        [debit, credit]
    } else {
        [credit, debit]
    }
}

async fn execute(
    store: &mut dyn LedgerStore,
    params: TransferParams,
) -> Result<TransferResult, LedgerError> {
    let transfer = store
        .create_transfer(CreateTransferParams {
            from_account_id: params.from_account_id,
            to_account_id: params.to_account_id,
            amount: params.amount,
        })
        .await?;
    let from_entry = store
        .create_entry(params.from_account_id, -params.amount)
        .await?;
    let to_entry = store
        .create_entry(params.to_account_id, params.amount)
        .await?;

    for (account_id, delta) in balance_adjustments(&params) {
        store.adjust_account_balance(account_id, delta).await?;
    }

    let from_account = store.get_account(params.from_account_id).await?;
    let to_account = store.get_account(params.to_account_id).await?;

    Ok(TransferResult {
        transfer,
        from_account,
        to_account,
        from_entry,
        to_entry,
    })
}

/// Stateless apart from the coordinator handle
pub struct TransferEngine<C> {
    coordinator: Arc<C>,
}

impl<C> Clone for TransferEngine<C> {
    fn clone(&self) -> Self {
        Self {
            coordinator: self.coordinator.clone(),
        }
    }
}

impl<C: TransactionCoordinator> TransferEngine<C> {
    pub fn new(coordinator: C) -> Self {
        Self::from_shared(Arc::new(coordinator))
    }

    pub fn from_shared(coordinator: Arc<C>) -> Self {
        Self { coordinator }
    }

    pub fn coordinator(&self) -> &C {
        &self.coordinator
    }

    /// Execute one transfer.
    ///
    /// Either every row (header, both entries, both balances) is committed
    /// or none is. Invalid parameters fail before a transaction is opened.
    pub async fn transfer(&self, params: TransferParams) -> Result<TransferResult, LedgerError> {
        check_params(&params)?;

        let span = info_span!(
            "transfer",
            from = params.from_account_id,
            to = params.to_account_id,
            amount = params.amount
        );

        async move {
            let outcome = self
                .coordinator
                .run_atomic(move |store| Box::pin(execute(store, params)))
                .await;

            match &outcome {
                Ok(result) => info!(
                    transfer_id = result.transfer.id,
                    from_balance = result.from_account.balance,
                    to_balance = result.to_account.balance,
                    "Transfer committed"
                ),
                Err(e) => warn!(error = %e, code = e.code(), "Transfer rolled back"),
            }
            outcome
        }
        .instrument(span)
        .await
    }
}
