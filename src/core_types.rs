//! Core types used throughout the system
//!
//! These are fundamental type aliases used by all modules.
//! They map 1:1 onto the `BIGINT` columns of the ledger tables.

/// Account ID - database-assigned, immutable after creation.
///
/// # Ordering:
/// The numeric order of account ids is the global lock order used by the
/// transfer engine. Never compare accounts by anything else when deciding
/// which row to lock first.
pub type AccountId = i64;

/// Entry ID - append-only ledger line identifier
pub type EntryId = i64;

/// Transfer ID - transfer header identifier
pub type TransferId = i64;

/// Amount in minor currency units (cents, pesewas, ...).
///
/// Signed: entries use negative values for debits.
pub type Amount = i64;
