//! API response envelope and error mapping
//!
//! - `ApiResponse<T>`: unified response wrapper
//! - `ApiError`: handler error, rendered as an `ApiResponse` with no data
//! - `error_codes`: business error codes carried in `code`

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::ledger::LedgerError;
use crate::transfer::ValidationError;

/// Unified API response wrapper
///
/// - code: 0 = success, non-zero = error code
/// - msg: short message description
/// - data: payload on success, absent on error
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: error_codes::SUCCESS,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    pub fn error(code: i32, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

/// Standard API error codes
pub mod error_codes {
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_PARAMETER: i32 = 1001;
    pub const CURRENCY_MISMATCH: i32 = 1002;

    // Auth errors (2xxx)
    pub const MISSING_AUTH: i32 = 2001;
    pub const NOT_OWNER: i32 = 2003;

    // Ledger conflicts (3xxx)
    pub const CONSTRAINT_VIOLATION: i32 = 3001;
    pub const SERIALIZATION_CONFLICT: i32 = 3002;

    // Resource errors (4xxx)
    pub const NOT_FOUND: i32 = 4001;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const SERVICE_UNAVAILABLE: i32 = 5001;
    pub const TIMEOUT: i32 = 5004;
}

/// Handler error: HTTP status + business code + message
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub msg: String,
}

pub type ApiResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

/// 200 + success envelope
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok((StatusCode::OK, Json(ApiResponse::success(data))))
}

impl ApiError {
    pub fn new(status: StatusCode, code: i32, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error_codes::INVALID_PARAMETER, msg)
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, error_codes::MISSING_AUTH, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, error_codes::NOT_FOUND, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            error_codes::INTERNAL_ERROR,
            msg,
        )
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            error_codes::SERVICE_UNAVAILABLE,
            msg,
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::<()>::error(self.code, self.msg))).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        let msg = err.to_string();
        match err.root_cause() {
            LedgerError::NotFound(_) => ApiError::not_found(msg),
            LedgerError::ConstraintViolation(_) => {
                ApiError::new(StatusCode::FORBIDDEN, error_codes::CONSTRAINT_VIOLATION, msg)
            }
            LedgerError::InvalidArgument(_) => ApiError::bad_request(msg),
            LedgerError::SerializationConflict(_) => {
                ApiError::new(StatusCode::CONFLICT, error_codes::SERIALIZATION_CONFLICT, msg)
            }
            LedgerError::Timeout(_) => {
                ApiError::new(StatusCode::GATEWAY_TIMEOUT, error_codes::TIMEOUT, msg)
            }
            LedgerError::Unavailable(_) => ApiError::service_unavailable(msg),
            LedgerError::TransactionFailure { .. } | LedgerError::Internal(_) => {
                tracing::error!(error = %msg, "Ledger internal error");
                ApiError::internal("internal error")
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::AccountNotFound(_) => ApiError::not_found(err.to_string()),
            ValidationError::CurrencyMismatch { .. } => ApiError::new(
                StatusCode::BAD_REQUEST,
                error_codes::CURRENCY_MISMATCH,
                err.to_string(),
            ),
            ValidationError::NotOwner(_) => ApiError::new(
                StatusCode::UNAUTHORIZED,
                error_codes::NOT_OWNER,
                err.to_string(),
            ),
            ValidationError::Store(e) => e.into(),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::bad_request(err.to_string())
    }
}
