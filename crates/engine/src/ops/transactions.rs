use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sea_orm::{
    Condition, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::{Expr, LikeExpr},
};
use uuid::Uuid;

use crate::{
    EngineError, MatchOrigin, MatchStatus, NewTransaction, ResultEngine, Transaction,
    TransactionFilter, TransactionType, matching::Scope, transactions,
};

use super::{Engine, with_tx};

/// Stored fields a run expects to find unchanged when it writes back.
#[derive(Clone, Copy, Debug)]
pub(super) struct Snapshot {
    pub status: MatchStatus,
    pub is_within_period: Option<bool>,
}

impl From<&Transaction> for Snapshot {
    fn from(tx: &Transaction) -> Self {
        Self {
            status: tx.status,
            is_within_period: tx.is_within_period,
        }
    }
}

/// `%term%` pattern matching `term` literally, with a backslash as escape character.
fn contains_pattern(term: &str) -> LikeExpr {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    LikeExpr::new(pattern).escape('\\')
}

fn origin_columns(origin: Option<MatchOrigin>) -> (Option<String>, Option<String>) {
    match origin.map(MatchOrigin::to_columns) {
        Some((origin, run_id)) => (Some(origin), run_id),
        None => (None, None),
    }
}

impl Engine {
    /// Store a batch of ingested transactions atomically.
    ///
    /// Every row starts `Unmatched` with no period evaluation. A target
    /// given at ingestion is kept as a tentative assignment. Either the whole
    /// batch is stored or nothing is.
    pub async fn ingest_transactions(
        &self,
        batch: Vec<NewTransaction>,
    ) -> ResultEngine<Vec<Transaction>> {
        if batch.is_empty() {
            return Err(EngineError::InvalidRequest(
                "transaction batch must not be empty".to_string(),
            ));
        }
        for input in &batch {
            if input.target_account_id == Some(input.source_account_id) {
                return Err(EngineError::InvalidRequest(format!(
                    "transaction target equals its source account {}",
                    input.source_account_id
                )));
            }
        }

        let created_at = Utc::now();
        with_tx!(self, |db_tx| {
            let mut known: HashSet<Uuid> = HashSet::new();
            for input in &batch {
                for account_id in std::iter::once(input.source_account_id)
                    .chain(input.target_account_id)
                {
                    if known.insert(account_id) {
                        self.require_account(&db_tx, account_id).await?;
                    }
                }
            }

            let mut stored = Vec::with_capacity(batch.len());
            for mut input in batch {
                input.description = input.description.trim().to_string();
                let tx = Transaction::new(input, created_at);
                let model: transactions::ActiveModel = (&tx).into();
                model.insert(&db_tx).await?;
                stored.push(tx);
            }
            tracing::info!(count = stored.len(), "transactions ingested");
            Ok(stored)
        })
    }

    /// Return a transaction by id.
    pub async fn transaction(&self, transaction_id: Uuid) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| self.require_transaction(&db_tx, transaction_id).await)
    }

    /// List transactions matching `filter`, ordered by `(date, id)`.
    pub async fn list_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> ResultEngine<Vec<Transaction>> {
        let mut query = transactions::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(transactions::Column::Status.eq(status.as_str()));
        }
        if let Some(kind) = filter.kind {
            query = query.filter(transactions::Column::Kind.eq(kind.as_str()));
        }
        if let Some(account_id) = filter.account_id {
            let account_id = account_id.to_string();
            query = query.filter(
                Condition::any()
                    .add(transactions::Column::SourceAccountId.eq(account_id.clone()))
                    .add(transactions::Column::TargetAccountId.eq(account_id)),
            );
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            // SQLite LIKE is case-insensitive for ASCII.
            query = query.filter(
                Condition::any()
                    .add(transactions::Column::Description.like(contains_pattern(search)))
                    .add(transactions::Column::SourceAccountId.like(contains_pattern(search)))
                    .add(transactions::Column::TargetAccountId.like(contains_pattern(search))),
            );
        }

        with_tx!(self, |db_tx| {
            query
                .order_by_asc(transactions::Column::Date)
                .order_by_asc(transactions::Column::Id)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Transaction::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    pub(super) async fn require_transaction(
        &self,
        db: &DatabaseTransaction,
        transaction_id: Uuid,
    ) -> ResultEngine<Transaction> {
        transactions::Entity::find_by_id(transaction_id.to_string())
            .one(db)
            .await?
            .map(Transaction::try_from)
            .transpose()?
            .ok_or_else(|| EngineError::NotFound(format!("transaction {transaction_id}")))
    }

    /// Load the candidate set of a run.
    pub(super) async fn load_candidates(
        &self,
        db: &DatabaseTransaction,
        scope: Scope<'_>,
    ) -> ResultEngine<Vec<Transaction>> {
        let targets: Vec<String> = scope
            .target_account_ids
            .iter()
            .map(ToString::to_string)
            .collect();
        let debit = TransactionType::Debit.as_str();
        let credit = TransactionType::Credit.as_str();

        transactions::Entity::find()
            .filter(
                Condition::any()
                    .add(
                        Condition::all()
                            .add(transactions::Column::Kind.eq(debit))
                            .add(
                                transactions::Column::SourceAccountId
                                    .eq(scope.source_account_id.to_string()),
                            ),
                    )
                    .add(
                        Condition::all()
                            .add(transactions::Column::Kind.eq(credit))
                            .add(transactions::Column::TargetAccountId.is_in(targets.clone())),
                    )
                    .add(
                        Condition::all()
                            .add(transactions::Column::Kind.eq(credit))
                            .add(transactions::Column::TargetAccountId.is_null())
                            .add(transactions::Column::SourceAccountId.is_in(targets)),
                    ),
            )
            .order_by_asc(transactions::Column::Date)
            .order_by_asc(transactions::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(Transaction::try_from)
            .collect()
    }

    /// Write back the fields a run changed on `tx`.
    ///
    /// The update only applies if the row still has the status and period
    /// flag the run read; otherwise another writer got there first and the
    /// whole run must roll back.
    pub(super) async fn write_run_classification(
        &self,
        db: &DatabaseTransaction,
        tx: &Transaction,
        expected: Snapshot,
    ) -> ResultEngine<()> {
        let (origin, run_id) = origin_columns(tx.matched_by);
        let mut update = transactions::Entity::update_many()
            .col_expr(transactions::Column::Status, Expr::value(tx.status.as_str()))
            .col_expr(
                transactions::Column::TargetAccountId,
                Expr::value(tx.target_account_id.map(|id| id.to_string())),
            )
            .col_expr(
                transactions::Column::IsWithinPeriod,
                Expr::value(tx.is_within_period),
            )
            .col_expr(transactions::Column::MatchOrigin, Expr::value(origin))
            .col_expr(transactions::Column::MatchedRunId, Expr::value(run_id))
            .filter(transactions::Column::Id.eq(tx.id.to_string()))
            .filter(transactions::Column::Status.eq(expected.status.as_str()));
        update = match expected.is_within_period {
            Some(flag) => update.filter(transactions::Column::IsWithinPeriod.eq(flag)),
            None => update.filter(transactions::Column::IsWithinPeriod.is_null()),
        };

        let result = update.exec(db).await?;
        if result.rows_affected != 1 {
            return Err(EngineError::PersistenceFailure(format!(
                "transaction {} was modified concurrently",
                tx.id
            )));
        }
        Ok(())
    }

    /// Mark an unmatched transaction as manually matched.
    ///
    /// Returns `false` when the row was no longer unmatched.
    pub(super) async fn write_manual_match(
        &self,
        db: &DatabaseTransaction,
        transaction_id: Uuid,
        target_account_id: Uuid,
    ) -> ResultEngine<bool> {
        let (origin, run_id) = origin_columns(Some(MatchOrigin::Manual));
        let result = transactions::Entity::update_many()
            .col_expr(
                transactions::Column::Status,
                Expr::value(MatchStatus::Matched.as_str()),
            )
            .col_expr(
                transactions::Column::TargetAccountId,
                Expr::value(target_account_id.to_string()),
            )
            .col_expr(transactions::Column::MatchOrigin, Expr::value(origin))
            .col_expr(transactions::Column::MatchedRunId, Expr::value(run_id))
            .filter(transactions::Column::Id.eq(transaction_id.to_string()))
            .filter(transactions::Column::Status.eq(MatchStatus::Unmatched.as_str()))
            .exec(db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    pub(super) fn snapshots(candidates: &[Transaction]) -> HashMap<Uuid, Snapshot> {
        candidates
            .iter()
            .map(|tx| (tx.id, Snapshot::from(tx)))
            .collect()
    }
}
