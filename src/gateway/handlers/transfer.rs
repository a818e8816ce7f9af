//! Transfer handler

use std::sync::Arc;

use axum::{Extension, Json, extract::State};
use validator::Validate;

use super::super::auth::Principal;
use super::super::state::AppState;
use super::super::types::{ApiResult, TransferRequest, ok};
use crate::ledger::TransactionCoordinator;
use crate::transfer::{AccountValidator, TransferParams, TransferResult};

/// POST /api/v1/transfers
///
/// Both accounts must exist and be held in `currency`; the source account
/// must belong to the caller.
pub async fn create_transfer<C: TransactionCoordinator + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<TransferRequest>,
) -> ApiResult<TransferResult> {
    req.validate()?;

    let from =
        AccountValidator::validate(state.ledger.as_ref(), req.from_account_id, &req.currency)
            .await?;
    AccountValidator::ensure_owner(&from, &principal.0)?;
    AccountValidator::validate(state.ledger.as_ref(), req.to_account_id, &req.currency).await?;

    let result = state
        .engine
        .transfer(TransferParams {
            from_account_id: req.from_account_id,
            to_account_id: req.to_account_id,
            amount: req.amount,
        })
        .await?;

    ok(result)
}
