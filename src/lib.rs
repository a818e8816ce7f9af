//! bank_ledger - double-entry ledger with an atomic funds-transfer engine
//!
//! # Modules
//!
//! - [`core_types`] - id and amount aliases
//! - [`currency`] - supported currency table
//! - [`ledger`] - store capability, transaction coordinator, PostgreSQL and
//!   in-memory backends
//! - [`transfer`] - transfer engine and account validator
//! - [`db`] - PostgreSQL pool
//! - [`gateway`] - HTTP API
//! - [`config`] / [`logging`] - YAML config and tracing setup

// Core types - must be first!
pub mod core_types;

pub mod currency;
pub mod ledger;
pub mod transfer;

pub mod config;
pub mod db;
pub mod gateway;
pub mod logging;

// Convenient re-exports at crate root
pub use core_types::{AccountId, Amount, EntryId, TransferId};
pub use ledger::{
    Account, Entry, LedgerError, LedgerStore, MemoryLedger, PgLedger, TransactionCoordinator,
    Transfer,
};
pub use transfer::{TransferEngine, TransferParams, TransferResult};
