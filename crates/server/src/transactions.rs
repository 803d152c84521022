//! Transactions API endpoints

use api_types::transaction::{
    ManualReconcile, MatchOrigin as ApiOrigin, Transaction, TransactionIngest, TransactionQuery,
    TransactionStatus, TransactionType as ApiType,
};
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use engine::{
    Amount, EngineError, ManualReconcileCmd, MatchOrigin, MatchStatus, NewTransaction,
    TransactionFilter, TransactionType, parse_request_id,
};

use crate::{ServerError, server::ServerState};

fn map_type(kind: TransactionType) -> ApiType {
    match kind {
        TransactionType::Debit => ApiType::Debit,
        TransactionType::Credit => ApiType::Credit,
    }
}

fn map_api_type(kind: ApiType) -> TransactionType {
    match kind {
        ApiType::Debit => TransactionType::Debit,
        ApiType::Credit => TransactionType::Credit,
    }
}

fn map_status(status: MatchStatus) -> TransactionStatus {
    match status {
        MatchStatus::Matched => TransactionStatus::Matched,
        MatchStatus::Unmatched => TransactionStatus::Unmatched,
    }
}

pub(crate) fn transaction_view(tx: engine::Transaction) -> Transaction {
    let (match_origin, matched_run_id) = match tx.matched_by {
        Some(MatchOrigin::Run { run_id }) => (Some(ApiOrigin::Run), Some(run_id)),
        Some(MatchOrigin::Manual) => (Some(ApiOrigin::Manual), None),
        None => (None, None),
    };
    Transaction {
        id: tx.id,
        date: tx.date,
        description: tx.description,
        amount: tx.amount.value(),
        kind: map_type(tx.kind),
        source_account: tx.source_account_id,
        target_account: tx.target_account_id,
        status: map_status(tx.status),
        post_date: tx.post_date,
        value_date: tx.value_date,
        is_within_period: tx.is_within_period,
        match_origin,
        matched_run_id,
    }
}

/// Turn a query string into an engine filter.
pub(crate) fn filter_from_query(query: TransactionQuery) -> Result<TransactionFilter, ServerError> {
    let mut filter = TransactionFilter::default();
    if let Some(status) = query.status {
        filter = filter.status(match status {
            TransactionStatus::Matched => MatchStatus::Matched,
            TransactionStatus::Unmatched => MatchStatus::Unmatched,
        });
    }
    if let Some(kind) = query.kind {
        filter = filter.kind(map_api_type(kind));
    }
    if let Some(account) = query.account.as_deref().filter(|s| !s.trim().is_empty()) {
        filter = filter.account(parse_request_id(account, "account")?);
    }
    if let Some(search) = query.search {
        filter = filter.search(search);
    }
    Ok(filter)
}

/// Handle requests for storing a batch of ingested transactions
pub async fn ingest(
    State(state): State<ServerState>,
    payload: Result<Json<TransactionIngest>, JsonRejection>,
) -> Result<(StatusCode, Json<Vec<Transaction>>), ServerError> {
    let Json(payload) = payload?;
    let batch = payload
        .transactions
        .into_iter()
        .map(|tx| -> Result<NewTransaction, EngineError> {
            Ok(NewTransaction {
                date: tx.date,
                description: tx.description,
                amount: Amount::new(tx.amount)?,
                kind: map_api_type(tx.kind),
                source_account_id: parse_request_id(&tx.source_account, "source account")?,
                target_account_id: tx
                    .target_account
                    .as_deref()
                    .map(|id| parse_request_id(id, "target account"))
                    .transpose()?,
                post_date: tx.post_date,
                value_date: tx.value_date,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let stored = state.engine.ingest_transactions(batch).await?;
    Ok((
        StatusCode::CREATED,
        Json(stored.into_iter().map(transaction_view).collect()),
    ))
}

pub async fn list(
    State(state): State<ServerState>,
    query: Result<Query<TransactionQuery>, QueryRejection>,
) -> Result<Json<Vec<Transaction>>, ServerError> {
    let Query(query) = query?;
    let filter = filter_from_query(query)?;
    let transactions = state.engine.list_transactions(&filter).await?;
    Ok(Json(transactions.into_iter().map(transaction_view).collect()))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<Transaction>, ServerError> {
    let transaction_id = parse_request_id(&id, "transaction")?;
    let tx = state.engine.transaction(transaction_id).await?;
    Ok(Json(transaction_view(tx)))
}

/// Handle manual reconciliation of a single transaction
pub async fn reconcile(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    payload: Result<Json<ManualReconcile>, JsonRejection>,
) -> Result<Json<Transaction>, ServerError> {
    let Json(payload) = payload?;
    let cmd = ManualReconcileCmd {
        transaction_id: parse_request_id(&id, "transaction")?,
        target_account_id: parse_request_id(&payload.target_account_id, "target account")?,
    };
    let tx = state.engine.manual_reconcile(cmd).await?;
    Ok(Json(transaction_view(tx)))
}
