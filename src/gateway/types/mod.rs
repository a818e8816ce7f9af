//! Gateway types
//!
//! - [`requests`]: request DTOs with `validator` rules
//! - [`response`]: `ApiResponse<T>` envelope, `ApiError` and error codes

pub mod requests;
pub mod response;

pub use requests::{
    AccountIdPath, CreateAccountRequest, DeleteAccountResponse, HealthResponse,
    ListAccountsQuery, TransferRequest, UpdateAccountRequest,
};
pub use response::{ApiError, ApiResponse, ApiResult, error_codes, ok};
