//! The module contains the `Account` struct and its storage model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine,
    util::{parse_stored_decimal, parse_uuid},
};

/// A bank account held by the ledger.
///
/// Accounts are never deleted: they are deactivated and then rejected as
/// source or target of new reconciliation runs.
#[derive(Clone, Debug, PartialEq)]
pub struct Account {
    /// Stable identifier, generated once at registration.
    pub id: Uuid,
    pub account_name: String,
    pub account_number: String,
    pub bank_name: String,
    pub branch: String,
    /// Running balance. Non-negative by convention, not enforced.
    pub balance: Decimal,
    /// Reference to the uploaded statement, if any.
    pub statement_ref: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for [`Engine::register_account`](crate::Engine::register_account).
#[derive(Clone, Debug, Default)]
pub struct NewAccount {
    pub account_name: String,
    pub account_number: String,
    pub bank_name: String,
    pub branch: String,
    pub balance: Decimal,
    pub statement_ref: Option<String>,
}

impl Account {
    pub fn new(input: NewAccount, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_name: input.account_name,
            account_number: input.account_number,
            bank_name: input.bank_name,
            branch: input.branch,
            balance: input.balance,
            statement_ref: input.statement_ref,
            active: true,
            created_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub account_name: String,
    pub account_number: String,
    pub bank_name: String,
    pub bank_branch: String,
    pub statement: Option<String>,
    pub balance: String,
    pub active: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(value: &Account) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            account_name: ActiveValue::Set(value.account_name.clone()),
            account_number: ActiveValue::Set(value.account_number.clone()),
            bank_name: ActiveValue::Set(value.bank_name.clone()),
            bank_branch: ActiveValue::Set(value.branch.clone()),
            statement: ActiveValue::Set(value.statement_ref.clone()),
            balance: ActiveValue::Set(value.balance.normalize().to_string()),
            active: ActiveValue::Set(value.active),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "account")?,
            account_name: model.account_name,
            account_number: model.account_number,
            bank_name: model.bank_name,
            branch: model.bank_branch,
            balance: parse_stored_decimal(&model.balance, "account balance")?,
            statement_ref: model.statement,
            active: model.active,
            created_at: model.created_at,
        })
    }
}
