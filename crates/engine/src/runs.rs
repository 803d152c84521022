//! Reconciliation run records.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, matching::Window, util::parse_uuid};

/// One successful initiation of the matching engine.
///
/// Immutable once persisted. `result_transaction_ids` is filled in the same
/// database transaction that creates the row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconciliationRun {
    pub id: Uuid,
    pub source_account_id: Uuid,
    /// Ordered, without duplicates, never containing the source.
    pub target_account_ids: Vec<Uuid>,
    pub period_days: u32,
    pub post_date: NaiveDate,
    /// Always `post_date + period_days`.
    pub value_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub result_transaction_ids: Vec<Uuid>,
}

impl ReconciliationRun {
    pub(crate) fn new(
        id: Uuid,
        source_account_id: Uuid,
        target_account_ids: Vec<Uuid>,
        window: Window,
        created_at: DateTime<Utc>,
        result_transaction_ids: Vec<Uuid>,
    ) -> Self {
        Self {
            id,
            source_account_id,
            target_account_ids,
            period_days: window.period_days(),
            post_date: window.post_date(),
            value_date: window.value_date(),
            created_at,
            result_transaction_ids,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "reconciliation_runs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub source_account_id: String,
    /// JSON array of account ids.
    pub target_account_ids: String,
    pub period_days: i32,
    pub post_date: Date,
    pub value_date: Date,
    pub created_at: DateTimeUtc,
    /// JSON array of transaction ids.
    pub result_transaction_ids: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn encode_ids(ids: &[Uuid]) -> ResultEngine<String> {
    serde_json::to_string(ids)
        .map_err(|err| EngineError::PersistenceFailure(format!("cannot encode ids: {err}")))
}

fn decode_ids(value: &str, label: &str) -> ResultEngine<Vec<Uuid>> {
    serde_json::from_str(value)
        .map_err(|_| EngineError::PersistenceFailure(format!("invalid stored {label} ids")))
}

impl TryFrom<&ReconciliationRun> for ActiveModel {
    type Error = EngineError;

    fn try_from(run: &ReconciliationRun) -> ResultEngine<Self> {
        let period_days = i32::try_from(run.period_days)
            .map_err(|_| EngineError::InvalidRequest("period out of range".to_string()))?;
        Ok(Self {
            id: ActiveValue::Set(run.id.to_string()),
            source_account_id: ActiveValue::Set(run.source_account_id.to_string()),
            target_account_ids: ActiveValue::Set(encode_ids(&run.target_account_ids)?),
            period_days: ActiveValue::Set(period_days),
            post_date: ActiveValue::Set(run.post_date),
            value_date: ActiveValue::Set(run.value_date),
            created_at: ActiveValue::Set(run.created_at),
            result_transaction_ids: ActiveValue::Set(encode_ids(&run.result_transaction_ids)?),
        })
    }
}

impl TryFrom<Model> for ReconciliationRun {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        let period_days = u32::try_from(model.period_days)
            .map_err(|_| EngineError::PersistenceFailure("invalid stored period".to_string()))?;
        Ok(Self {
            id: parse_uuid(&model.id, "run")?,
            source_account_id: parse_uuid(&model.source_account_id, "account")?,
            target_account_ids: decode_ids(&model.target_account_ids, "target account")?,
            period_days,
            post_date: model.post_date,
            value_date: model.value_date,
            created_at: model.created_at,
            result_transaction_ids: decode_ids(&model.result_transaction_ids, "transaction")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_stored_as_json_arrays() {
        let ids = vec![Uuid::new_v4(), Uuid::new_v4()];
        let encoded = encode_ids(&ids).unwrap();
        assert!(encoded.starts_with("[\""));
        assert_eq!(decode_ids(&encoded, "x").unwrap(), ids);
        assert!(decode_ids("{}", "x").is_err());
    }
}
