//! Account handlers

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use validator::Validate;

use super::super::auth::Principal;
use super::super::state::AppState;
use super::super::types::{
    AccountIdPath, ApiResult, CreateAccountRequest, DeleteAccountResponse, ListAccountsQuery,
    UpdateAccountRequest, ok,
};
use crate::ledger::{Account, CreateAccountParams, ListAccountsParams, TransactionCoordinator};
use crate::transfer::AccountValidator;

/// POST /api/v1/accounts
///
/// Opens a zero-balance account owned by the caller.
pub async fn create_account<C: TransactionCoordinator + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<CreateAccountRequest>,
) -> ApiResult<Account> {
    req.validate()?;

    let params = CreateAccountParams {
        owner: principal.0,
        currency: req.currency,
    };
    let account = state
        .ledger
        .run_atomic(move |store| store.create_account(params))
        .await?;

    tracing::info!(account_id = account.id, owner = %account.owner, currency = %account.currency, "Account created");
    ok(account)
}

/// GET /api/v1/accounts/{id}
pub async fn get_account<C: TransactionCoordinator + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Extension(principal): Extension<Principal>,
    Path(path): Path<AccountIdPath>,
) -> ApiResult<Account> {
    path.validate()?;

    let id = path.id;
    let account = state
        .ledger
        .run_atomic(move |store| store.get_account(id))
        .await?;
    AccountValidator::ensure_owner(&account, &principal.0)?;

    ok(account)
}

/// GET /api/v1/accounts?page_id=1&page_size=5
///
/// Lists the caller's accounts, ordered by id.
pub async fn list_accounts<C: TransactionCoordinator + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<ListAccountsQuery>,
) -> ApiResult<Vec<Account>> {
    query.validate()?;

    let params = ListAccountsParams {
        owner: Some(principal.0),
        limit: query.page_size,
        offset: query.offset(),
    };
    let accounts = state
        .ledger
        .run_atomic(move |store| store.list_accounts(params))
        .await?;

    ok(accounts)
}

/// PUT /api/v1/accounts
///
/// Administrative balance overwrite. Writes no entry, so the account's
/// entries stop summing to its balance.
pub async fn update_account<C: TransactionCoordinator + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<UpdateAccountRequest>,
) -> ApiResult<Account> {
    req.validate()?;

    tracing::warn!(
        account_id = req.id,
        balance = req.balance,
        principal = %principal.0,
        "Administrative balance update requested"
    );
    let account = state
        .ledger
        .run_atomic(move |store| store.update_account_balance(req.id, req.balance))
        .await?;

    ok(account)
}

/// DELETE /api/v1/accounts/{id}
pub async fn delete_account<C: TransactionCoordinator + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Extension(principal): Extension<Principal>,
    Path(path): Path<AccountIdPath>,
) -> ApiResult<DeleteAccountResponse> {
    path.validate()?;

    let id = path.id;
    let owner = principal.0;
    // Ownership check and delete share one unit of work.
    state
        .ledger
        .run_atomic(move |store| {
            Box::pin(async move {
                let account = store.get_account(id).await?;
                if let Err(e) = AccountValidator::ensure_owner(&account, &owner) {
                    return Ok(Err(e));
                }
                store.delete_account(id).await?;
                Ok(Ok(()))
            })
        })
        .await??;

    tracing::info!(account_id = id, "Account deleted");
    ok(DeleteAccountResponse {
        status: "deleted".to_string(),
    })
}
