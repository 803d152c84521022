//! Durable storage of the run registry.
//!
//! One row per source account consumed by a completed run. The primary key
//! on `account_id` makes the claim a single conditional insert.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::parse_uuid};

/// A source account that can no longer start a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UsedSource {
    pub account_id: Uuid,
    pub run_id: Uuid,
    pub used_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "used_source_accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub account_id: String,
    pub run_id: String,
    pub used_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for UsedSource {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            account_id: parse_uuid(&model.account_id, "account")?,
            run_id: parse_uuid(&model.run_id, "run")?,
            used_at: model.used_at,
        })
    }
}
