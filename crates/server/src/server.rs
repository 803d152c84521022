use axum::{
    Router,
    routing::{get, post},
};

use std::sync::Arc;

use crate::{accounts, reconciliation, reports, transactions};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/accounts", post(accounts::create).get(accounts::list))
        .route("/accounts/{id}", get(accounts::get))
        .route(
            "/transactions",
            post(transactions::ingest).get(transactions::list),
        )
        .route("/transactions/{id}", get(transactions::get))
        .route("/transactions/{id}/reconcile", post(transactions::reconcile))
        .route("/reconciliation/initiate", post(reconciliation::initiate))
        .route("/reconciliation/runs", get(reconciliation::list_runs))
        .route("/reconciliation/runs/{id}", get(reconciliation::get_run))
        .route(
            "/reconciliation/used-sources",
            get(reconciliation::used_sources),
        )
        .route("/reports/summary", get(reports::summary))
        .route("/reports/export.csv", get(reports::export_csv))
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
    };

    axum::serve(listener, router(state)).await
}
