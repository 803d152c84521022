//! Run registry: each source account may start at most one successful run.
//!
//! Two layers guard the rule. [`SourceClaims`] serializes concurrent
//! initiations inside one process; the `used_source_accounts` primary key
//! rejects a second durable claim from any writer.

use std::{
    collections::HashSet,
    sync::{Mutex, PoisonError},
};

use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, DbErr, QueryOrder, SqlErr, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, UsedSource, used_sources};

use super::{Engine, with_tx};

/// Source accounts with an initiation in flight.
#[derive(Debug, Default)]
pub(super) struct SourceClaims {
    in_flight: Mutex<HashSet<Uuid>>,
}

impl SourceClaims {
    /// Claim `account_id` until the returned guard drops.
    pub(super) fn claim(&self, account_id: Uuid) -> ResultEngine<ClaimGuard<'_>> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !in_flight.insert(account_id) {
            return Err(already_used(account_id));
        }
        Ok(ClaimGuard {
            claims: self,
            account_id,
        })
    }

    fn release(&self, account_id: Uuid) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&account_id);
    }
}

/// Releases an in-flight claim on drop, whether the run committed or not.
#[derive(Debug)]
pub(super) struct ClaimGuard<'a> {
    claims: &'a SourceClaims,
    account_id: Uuid,
}

impl Drop for ClaimGuard<'_> {
    fn drop(&mut self) {
        self.claims.release(self.account_id);
    }
}

fn already_used(account_id: Uuid) -> EngineError {
    EngineError::SourceAlreadyUsed(account_id.to_string())
}

// SQLite reports a primary key clash with its own extended code, which not
// every driver version classifies, so the message is checked as well.
fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
        || err.to_string().contains("UNIQUE constraint failed")
}

impl Engine {
    /// Whether `account_id` already started a successful run.
    pub async fn is_source_used(&self, account_id: Uuid) -> ResultEngine<bool> {
        with_tx!(self, |db_tx| self.source_is_used(&db_tx, account_id).await)
    }

    /// Every consumed source account, oldest first.
    pub async fn used_sources(&self) -> ResultEngine<Vec<UsedSource>> {
        with_tx!(self, |db_tx| {
            used_sources::Entity::find()
                .order_by_asc(used_sources::Column::UsedAt)
                .order_by_asc(used_sources::Column::AccountId)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(UsedSource::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    pub(super) async fn source_is_used(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
    ) -> ResultEngine<bool> {
        Ok(used_sources::Entity::find_by_id(account_id.to_string())
            .one(db)
            .await?
            .is_some())
    }

    /// Record `account_id` as consumed by `run_id`.
    ///
    /// Must run in the same database transaction that stores the run.
    pub(super) async fn mark_used(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
        run_id: Uuid,
    ) -> ResultEngine<()> {
        let model = used_sources::ActiveModel {
            account_id: ActiveValue::Set(account_id.to_string()),
            run_id: ActiveValue::Set(run_id.to_string()),
            used_at: ActiveValue::Set(Utc::now()),
        };
        match model.insert(db).await {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => Err(already_used(account_id)),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_claim_fails_until_guard_drops() {
        let claims = SourceClaims::default();
        let account = Uuid::new_v4();

        let guard = claims.claim(account).unwrap();
        assert!(matches!(
            claims.claim(account),
            Err(EngineError::SourceAlreadyUsed(_))
        ));
        assert!(claims.claim(Uuid::new_v4()).is_ok());

        drop(guard);
        assert!(claims.claim(account).is_ok());
    }
}
