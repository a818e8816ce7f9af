//! Ledger storage and transactions
//!
//! - [`store`] - the `LedgerStore` capability the engine is written against
//! - [`coordinator`] - `TransactionCoordinator::run_atomic`
//! - [`postgres`] - SQLx-backed store and coordinator
//! - [`memory`] - in-process store used by tests and local runs

pub mod coordinator;
pub mod error;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use coordinator::TransactionCoordinator;
pub use error::LedgerError;
pub use memory::{Fault, MemoryLedger, MemoryOptions, MemoryScope};
pub use models::{
    Account, CreateAccountParams, CreateTransferParams, Entry, ListAccountsParams,
    ListEntriesParams, ListTransfersParams, Transfer,
};
pub use postgres::{PgLedger, PgStore};
pub use store::LedgerStore;
