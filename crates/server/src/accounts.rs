//! Account API endpoints

use api_types::account::{Account, AccountNew};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use engine::{NewAccount, parse_request_id};

use crate::{ServerError, server::ServerState};

fn account_view(account: engine::Account) -> Account {
    Account {
        id: account.id,
        account_name: account.account_name,
        account_number: account.account_number,
        bank_name: account.bank_name,
        bank_branch: account.branch,
        statement: account.statement_ref,
        balance: account.balance,
        active: account.active,
    }
}

/// Handle requests for registering a new account
pub async fn create(
    State(state): State<ServerState>,
    payload: Result<Json<AccountNew>, JsonRejection>,
) -> Result<(StatusCode, Json<Account>), ServerError> {
    let Json(payload) = payload?;
    let account = state
        .engine
        .register_account(NewAccount {
            account_name: payload.account_name,
            account_number: payload.account_number,
            bank_name: payload.bank_name,
            branch: payload.bank_branch,
            balance: payload.balance,
            statement_ref: payload.statement,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(account_view(account))))
}

pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<Account>>, ServerError> {
    let accounts = state.engine.list_accounts().await?;
    Ok(Json(accounts.into_iter().map(account_view).collect()))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<Account>, ServerError> {
    let account_id = parse_request_id(&id, "account")?;
    let account = state.engine.account(account_id).await?;
    Ok(Json(account_view(account)))
}
