//! Report API endpoints

use api_types::{report::Summary, transaction::TransactionQuery};
use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    http::header,
    response::IntoResponse,
};

use crate::{ServerError, server::ServerState, transactions::filter_from_query};

pub async fn summary(
    State(state): State<ServerState>,
    query: Result<Query<TransactionQuery>, QueryRejection>,
) -> Result<Json<Summary>, ServerError> {
    let Query(query) = query?;
    let filter = filter_from_query(query)?;
    let summary = state.engine.summary(&filter).await?;
    Ok(Json(Summary {
        total_count: summary.total_count,
        matched_count: summary.matched_count,
        unmatched_count: summary.unmatched_count,
        total_amount: summary.total_amount.value(),
        matched_amount: summary.matched_amount.value(),
        unmatched_amount: summary.unmatched_amount.value(),
        within_period_count: summary.within_period_count,
        outside_period_count: summary.outside_period_count,
        unevaluated_count: summary.unevaluated_count,
    }))
}

/// CSV download of the filtered transactions
pub async fn export_csv(
    State(state): State<ServerState>,
    query: Result<Query<TransactionQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ServerError> {
    let Query(query) = query?;
    let filter = filter_from_query(query)?;
    let body = state.engine.export_csv(&filter).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"transactions.csv\"",
            ),
        ],
        body,
    ))
}
