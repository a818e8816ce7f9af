//! Funds transfer between ledger accounts
//!
//! - [`engine`] - atomic transfer with lower-id-first balance ordering
//! - [`validator`] - existence, currency and ownership checks used by the
//!   gateway before calling the engine

pub mod engine;
pub mod validator;

pub use engine::{TransferEngine, TransferParams, TransferResult, balance_adjustments};
pub use validator::{AccountValidator, ValidationError};
