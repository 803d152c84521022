//! Reconciliation run API endpoints

use api_types::reconciliation::{InitiateRequest, InitiateResponse, Run, UsedSource};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use chrono::Utc;
use engine::{EngineError, InitiateCmd, ReconciliationRun, parse_request_id};

use crate::{ServerError, server::ServerState, transactions::transaction_view};

fn run_view(run: ReconciliationRun) -> Run {
    Run {
        id: run.id,
        source_account_id: run.source_account_id,
        target_account_ids: run.target_account_ids,
        period_days: run.period_days,
        post_date: run.post_date,
        value_date: run.value_date,
        created_at: run.created_at,
        result_transaction_ids: run.result_transaction_ids,
    }
}

/// Narrow a requested period to the engine's type; the engine checks the range.
fn period_days(days: i64) -> Result<u32, EngineError> {
    u32::try_from(days).map_err(|_| {
        EngineError::InvalidRequest(format!("period must be a positive number of days, got {days}"))
    })
}

/// Handle requests for starting a reconciliation run
pub async fn initiate(
    State(state): State<ServerState>,
    payload: Result<Json<InitiateRequest>, JsonRejection>,
) -> Result<Json<InitiateResponse>, ServerError> {
    let Json(payload) = payload?;
    let source_account_id = parse_request_id(&payload.source_account_id, "source account")?;
    let target_account_ids = payload
        .target_account_ids
        .iter()
        .map(|id| parse_request_id(id, "target account"))
        .collect::<Result<Vec<_>, _>>()?;

    let mut cmd = InitiateCmd::new(
        source_account_id,
        target_account_ids,
        Utc::now().date_naive(),
    );
    if let Some(days) = payload.reconciliation_days {
        cmd = cmd.period_days(period_days(days)?);
    }

    let outcome = state.engine.initiate_reconciliation(cmd).await?;
    Ok(Json(InitiateResponse {
        id: outcome.run.id,
        run: run_view(outcome.run),
        transactions: outcome
            .transactions
            .into_iter()
            .map(transaction_view)
            .collect(),
    }))
}

pub async fn list_runs(State(state): State<ServerState>) -> Result<Json<Vec<Run>>, ServerError> {
    let runs = state.engine.list_runs().await?;
    Ok(Json(runs.into_iter().map(run_view).collect()))
}

pub async fn get_run(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<Run>, ServerError> {
    let run_id = parse_request_id(&id, "run")?;
    Ok(Json(run_view(state.engine.run(run_id).await?)))
}

pub async fn used_sources(
    State(state): State<ServerState>,
) -> Result<Json<Vec<UsedSource>>, ServerError> {
    let used = state.engine.used_sources().await?;
    Ok(Json(
        used.into_iter()
            .map(|entry| UsedSource {
                account_id: entry.account_id,
                run_id: entry.run_id,
                used_at: entry.used_at,
            })
            .collect(),
    ))
}
