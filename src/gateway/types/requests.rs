//! Request DTOs, checked with `validator` before any store call.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core_types::{AccountId, Amount};
use crate::currency::validate_currency;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateAccountRequest {
    #[validate(custom(function = "validate_currency"))]
    pub currency: String,
}

#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct AccountIdPath {
    #[validate(range(min = 1))]
    pub id: AccountId,
}

#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct ListAccountsQuery {
    #[validate(range(min = 1, max = 1_000_000))]
    pub page_id: i64,
    #[validate(range(min = 5, max = 10))]
    pub page_size: i64,
}

impl ListAccountsQuery {
    pub fn offset(&self) -> i64 {
        (self.page_id - 1) * self.page_size
    }
}

/// Administrative balance overwrite
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
pub struct UpdateAccountRequest {
    #[validate(range(min = 1))]
    pub id: AccountId,
    pub balance: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TransferRequest {
    #[validate(range(min = 1))]
    pub from_account_id: AccountId,
    #[validate(range(min = 1))]
    pub to_account_id: AccountId,
    #[validate(range(min = 1))]
    pub amount: Amount,
    #[validate(custom(function = "validate_currency"))]
    pub currency: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteAccountResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub timestamp_ms: i64,
}
