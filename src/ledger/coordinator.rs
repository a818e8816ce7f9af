//! Transaction Coordinator
//!
//! Runs a caller-supplied unit of work against a store handle bound to one
//! transaction. The handle is passed to the closure explicitly; nothing is
//! kept in ambient or thread-local state.
//!
//! ```text
//! begin ──▶ work(&mut scope) ──Ok──▶ commit ──▶ Ok(value)
//!                 │                    └─Err─▶ TransactionFailure { cause: commit }
//!                 └──Err/timeout──▶ rollback ──▶ TransactionFailure { cause, rollback? }
//! ```
//!
//! Dropping the future returned by [`TransactionCoordinator::run_atomic`]
//! before it completes (caller cancellation) rolls the transaction back.

use std::time::Duration;

use futures::future::BoxFuture;

use super::error::LedgerError;
use super::store::LedgerStore;

/// Atomic all-or-nothing execution of ledger operations.
///
/// Nested scopes are not supported: `work` receives a plain store handle,
/// not a coordinator.
pub trait TransactionCoordinator: Send + Sync {
    fn run_atomic<'a, T, F>(&'a self, work: F) -> BoxFuture<'a, Result<T, LedgerError>>
    where
        T: Send + 'a,
        F: for<'c> FnOnce(&'c mut dyn LedgerStore) -> BoxFuture<'c, Result<T, LedgerError>>
            + Send
            + 'a;
}

/// Await `work`, giving up after `limit` when one is configured.
///
/// On timeout the work future is dropped before returning, so the caller can
/// roll back with no operation still in flight.
pub(crate) async fn bounded<T>(
    limit: Option<Duration>,
    work: BoxFuture<'_, Result<T, LedgerError>>,
) -> Result<T, LedgerError> {
    match limit {
        Some(limit) => match tokio::time::timeout(limit, work).await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!(timeout_ms = limit.as_millis() as u64, "Transaction timed out");
                Err(LedgerError::Timeout(limit))
            }
        },
        None => work.await,
    }
}
