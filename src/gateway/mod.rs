//! HTTP gateway
//!
//! Thin transport over the ledger: request validation, principal checks and
//! status mapping. Money movement correctness lives in the transfer engine.

pub mod auth;
pub mod handlers;
pub mod state;
pub mod types;

use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::GatewayConfig;
use crate::ledger::TransactionCoordinator;
use auth::principal_middleware;
use state::AppState;

/// Build the router. Everything except the health check requires a principal.
pub fn router<C: TransactionCoordinator + 'static>(state: Arc<AppState<C>>) -> Router {
    let private_routes = Router::new()
        .route(
            "/api/v1/accounts",
            post(handlers::create_account::<C>)
                .get(handlers::list_accounts::<C>)
                .put(handlers::update_account::<C>),
        )
        .route(
            "/api/v1/accounts/{id}",
            get(handlers::get_account::<C>).delete(handlers::delete_account::<C>),
        )
        .route("/api/v1/transfers", post(handlers::create_transfer::<C>))
        .layer(from_fn(principal_middleware));

    Router::new()
        .route("/api/v1/health", get(handlers::health_check::<C>))
        .merge(private_routes)
        .with_state(state)
}

/// Start HTTP Gateway server; returns after Ctrl-C.
pub async fn run_server<C: TransactionCoordinator + 'static>(
    config: &GatewayConfig,
    state: Arc<AppState<C>>,
) -> std::io::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await.inspect_err(|e| {
        tracing::error!(addr = %addr, error = %e, "Failed to bind gateway");
    })?;

    tracing::info!("Gateway listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Shutdown signal received");
        })
        .await
}
