use std::sync::Arc;

use crate::db::Database;
use crate::ledger::TransactionCoordinator;
use crate::transfer::TransferEngine;

/// Gateway shared state
pub struct AppState<C> {
    /// Coordinator for single-operation requests
    pub ledger: Arc<C>,
    pub engine: TransferEngine<C>,
    /// Pinged by the health check when running against PostgreSQL
    pub db: Option<Database>,
}

impl<C: TransactionCoordinator> AppState<C> {
    pub fn new(ledger: C, db: Option<Database>) -> Self {
        let ledger = Arc::new(ledger);
        Self {
            engine: TransferEngine::from_shared(ledger.clone()),
            ledger,
            db,
        }
    }
}
