//! Transaction records.
//!
//! A `Transaction` is one line of a bank statement or live feed. It is created
//! by ingestion and afterwards mutated only through the two reconcile paths:
//! an automatic run ([`MatchOrigin::Run`]) or an operator decision
//! ([`MatchOrigin::Manual`]).

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{
    Amount, EngineError, ResultEngine,
    util::{parse_stored_amount, parse_uuid},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransactionType {
    Debit,
    Credit,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }
}

impl TryFrom<&str> for TransactionType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "debit" => Ok(Self::Debit),
            "credit" => Ok(Self::Credit),
            other => Err(EngineError::PersistenceFailure(format!(
                "invalid transaction type: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MatchStatus {
    Matched,
    #[default]
    Unmatched,
}

impl MatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Matched => "matched",
            Self::Unmatched => "unmatched",
        }
    }
}

impl TryFrom<&str> for MatchStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "matched" => Ok(Self::Matched),
            "unmatched" => Ok(Self::Unmatched),
            other => Err(EngineError::PersistenceFailure(format!(
                "invalid match status: {other}"
            ))),
        }
    }
}

/// Which write path matched a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchOrigin {
    /// Paired by the matching engine during the given run.
    Run { run_id: Uuid },
    /// Operator override; period evaluation is bypassed.
    Manual,
}

impl MatchOrigin {
    pub(crate) fn to_columns(self) -> (String, Option<String>) {
        match self {
            Self::Run { run_id } => ("run".to_string(), Some(run_id.to_string())),
            Self::Manual => ("manual".to_string(), None),
        }
    }

    fn from_columns(origin: Option<&str>, run_id: Option<&str>) -> ResultEngine<Option<Self>> {
        match (origin, run_id) {
            (None, _) => Ok(None),
            (Some("manual"), _) => Ok(Some(Self::Manual)),
            (Some("run"), Some(run_id)) => Ok(Some(Self::Run {
                run_id: parse_uuid(run_id, "run")?,
            })),
            (Some(other), _) => Err(EngineError::PersistenceFailure(format!(
                "invalid match origin: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub id: Uuid,
    /// Calendar date the transaction occurred.
    pub date: NaiveDate,
    pub description: String,
    pub amount: Amount,
    pub kind: TransactionType,
    /// Account whose statement or feed produced the record.
    pub source_account_id: Uuid,
    /// Receiving account; `None` until assigned (tentatively by ingestion or
    /// definitively by a reconcile path).
    pub target_account_id: Option<Uuid>,
    pub status: MatchStatus,
    /// Date funds left/entered the ledger.
    pub post_date: Option<NaiveDate>,
    /// Date funds are expected to clear.
    pub value_date: Option<NaiveDate>,
    /// Unset until a run evaluates the transaction, then never changed.
    pub is_within_period: Option<bool>,
    pub matched_by: Option<MatchOrigin>,
    pub created_at: DateTime<Utc>,
}

/// Input for [`Engine::ingest_transactions`](crate::Engine::ingest_transactions).
#[derive(Clone, Debug)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub description: String,
    pub amount: Amount,
    pub kind: TransactionType,
    pub source_account_id: Uuid,
    pub target_account_id: Option<Uuid>,
    pub post_date: Option<NaiveDate>,
    pub value_date: Option<NaiveDate>,
}

impl Transaction {
    pub fn new(input: NewTransaction, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            date: input.date,
            description: input.description,
            amount: input.amount,
            kind: input.kind,
            source_account_id: input.source_account_id,
            target_account_id: input.target_account_id,
            status: MatchStatus::Unmatched,
            post_date: input.post_date,
            value_date: input.value_date,
            is_within_period: None,
            matched_by: None,
            created_at,
        }
    }

    /// Account the money arrives in, if known.
    ///
    /// A credit without an assigned target was received by the account that
    /// recorded it.
    pub fn receiving_account_id(&self) -> Option<Uuid> {
        match self.kind {
            TransactionType::Credit => Some(self.target_account_id.unwrap_or(self.source_account_id)),
            TransactionType::Debit => self.target_account_id,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.status == MatchStatus::Matched
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub date: Date,
    pub description: String,
    pub amount: String,
    pub kind: String,
    pub source_account_id: String,
    pub target_account_id: Option<String>,
    pub status: String,
    pub post_date: Option<Date>,
    pub value_date: Option<Date>,
    pub is_within_period: Option<bool>,
    pub match_origin: Option<String>,
    pub matched_run_id: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::SourceAccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    SourceAccount,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SourceAccount.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        let (match_origin, matched_run_id) = match tx.matched_by.map(MatchOrigin::to_columns) {
            Some((origin, run_id)) => (Some(origin), run_id),
            None => (None, None),
        };
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            date: ActiveValue::Set(tx.date),
            description: ActiveValue::Set(tx.description.clone()),
            amount: ActiveValue::Set(tx.amount.to_storage()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            source_account_id: ActiveValue::Set(tx.source_account_id.to_string()),
            target_account_id: ActiveValue::Set(tx.target_account_id.map(|id| id.to_string())),
            status: ActiveValue::Set(tx.status.as_str().to_string()),
            post_date: ActiveValue::Set(tx.post_date),
            value_date: ActiveValue::Set(tx.value_date),
            is_within_period: ActiveValue::Set(tx.is_within_period),
            match_origin: ActiveValue::Set(match_origin),
            matched_run_id: ActiveValue::Set(matched_run_id),
            created_at: ActiveValue::Set(tx.created_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        let matched_by = MatchOrigin::from_columns(
            model.match_origin.as_deref(),
            model.matched_run_id.as_deref(),
        )?;
        Ok(Self {
            id: parse_uuid(&model.id, "transaction")?,
            date: model.date,
            description: model.description,
            amount: parse_stored_amount(&model.amount)?,
            kind: TransactionType::try_from(model.kind.as_str())?,
            source_account_id: parse_uuid(&model.source_account_id, "account")?,
            target_account_id: model
                .target_account_id
                .as_deref()
                .map(|id| parse_uuid(id, "account"))
                .transpose()?,
            status: MatchStatus::try_from(model.status.as_str())?,
            post_date: model.post_date,
            value_date: model.value_date,
            is_within_period: model.is_within_period,
            matched_by,
            created_at: model.created_at,
        })
    }
}
