use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{QueryOrder, TransactionTrait, prelude::*};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    EngineError, InitiateCmd, ManualReconcileCmd, ReconciliationRun, ResultEngine, Transaction,
    matching::{Scope, Window, classify, validate_period_days},
    runs,
};

use super::{Engine, with_tx};

/// A committed run together with its classified candidate set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunOutcome {
    pub run: ReconciliationRun,
    /// Every candidate transaction, ordered by `(date, id)`.
    pub transactions: Vec<Transaction>,
}

fn validate_targets(source_account_id: Uuid, target_account_ids: &[Uuid]) -> ResultEngine<()> {
    if target_account_ids.is_empty() {
        return Err(EngineError::InvalidRequest(
            "at least one target account is required".to_string(),
        ));
    }
    let mut seen = HashSet::with_capacity(target_account_ids.len());
    for target in target_account_ids {
        if *target == source_account_id {
            return Err(EngineError::InvalidRequest(format!(
                "target account {target} is also the source account"
            )));
        }
        if !seen.insert(*target) {
            return Err(EngineError::InvalidRequest(format!(
                "target account {target} is listed twice"
            )));
        }
    }
    Ok(())
}

impl Engine {
    /// Run the matching engine for one source account.
    ///
    /// On success the run record, the registry entry and every changed
    /// transaction are committed together. On any failure nothing is
    /// written and the source account stays available.
    pub async fn initiate_reconciliation(&self, cmd: InitiateCmd) -> ResultEngine<RunOutcome> {
        let period_days =
            validate_period_days(cmd.period_days.unwrap_or(self.default_period_days))?;
        validate_targets(cmd.source_account_id, &cmd.target_account_ids)?;
        let window = Window::new(cmd.today, period_days)?;

        let _claim = self.claims.claim(cmd.source_account_id)?;
        self.commit_run(&cmd, window).await.map_err(|err| match err {
            EngineError::Database(db_err) => {
                error!(
                    source_account_id = %cmd.source_account_id,
                    error = %db_err,
                    "reconciliation run rolled back"
                );
                EngineError::PersistenceFailure(
                    "reconciliation run could not be stored".to_string(),
                )
            }
            EngineError::PersistenceFailure(reason) => {
                error!(
                    source_account_id = %cmd.source_account_id,
                    %reason,
                    "reconciliation run rolled back"
                );
                EngineError::PersistenceFailure(reason)
            }
            other => other,
        })
    }

    async fn commit_run(&self, cmd: &InitiateCmd, window: Window) -> ResultEngine<RunOutcome> {
        let source_account_id = cmd.source_account_id;
        let scope = Scope {
            source_account_id,
            target_account_ids: &cmd.target_account_ids,
        };

        with_tx!(self, |db_tx| {
            match self.find_account(&db_tx, source_account_id).await? {
                Some(account) if account.active => {}
                Some(_) => {
                    return Err(EngineError::InvalidRequest(format!(
                        "source account {source_account_id} is inactive"
                    )));
                }
                None => {
                    return Err(EngineError::InvalidRequest(format!(
                        "unknown source account {source_account_id}"
                    )));
                }
            }
            if self.source_is_used(&db_tx, source_account_id).await? {
                warn!(%source_account_id, "source account already used");
                return Err(EngineError::SourceAlreadyUsed(source_account_id.to_string()));
            }
            for target in scope.target_account_ids {
                match self.find_account(&db_tx, *target).await? {
                    Some(account) if account.active => {}
                    Some(_) => {
                        return Err(EngineError::InvalidRequest(format!(
                            "target account {target} is inactive"
                        )));
                    }
                    None => {
                        return Err(EngineError::InvalidRequest(format!(
                            "unknown target account {target}"
                        )));
                    }
                }
            }

            let candidates = self.load_candidates(&db_tx, scope).await?;
            let snapshots = Self::snapshots(&candidates);
            let run_id = Uuid::new_v4();
            let classification = classify(candidates, scope, &window, run_id);

            let run = ReconciliationRun::new(
                run_id,
                source_account_id,
                cmd.target_account_ids.clone(),
                window,
                Utc::now(),
                classification.transactions.iter().map(|tx| tx.id).collect(),
            );
            let model = runs::ActiveModel::try_from(&run)?;
            model.insert(&db_tx).await?;
            self.mark_used(&db_tx, source_account_id, run_id).await?;

            for tx in &classification.transactions {
                if !classification.changed.contains(&tx.id) {
                    continue;
                }
                let expected = snapshots.get(&tx.id).copied().ok_or_else(|| {
                    EngineError::PersistenceFailure(format!(
                        "transaction {} missing from the candidate set",
                        tx.id
                    ))
                })?;
                self.write_run_classification(&db_tx, tx, expected).await?;
            }

            info!(
                %run_id,
                %source_account_id,
                candidates = classification.transactions.len(),
                pairs = classification.pairings.len(),
                updated = classification.changed.len(),
                "reconciliation run committed"
            );
            Ok(RunOutcome {
                run,
                transactions: classification.transactions,
            })
        })
    }

    /// Operator override: mark one unmatched transaction as matched to
    /// `target_account_id`. Period evaluation is left untouched.
    pub async fn manual_reconcile(&self, cmd: ManualReconcileCmd) -> ResultEngine<Transaction> {
        let ManualReconcileCmd {
            transaction_id,
            target_account_id,
        } = cmd;

        with_tx!(self, |db_tx| {
            let tx = self.require_transaction(&db_tx, transaction_id).await?;
            if tx.is_matched() {
                return Err(EngineError::AlreadyMatched(transaction_id.to_string()));
            }
            let target = self.require_account(&db_tx, target_account_id).await?;
            if target.id == tx.source_account_id {
                return Err(EngineError::InvalidTarget(format!(
                    "target account {target_account_id} is the transaction's source"
                )));
            }
            if !target.active {
                return Err(EngineError::InvalidTarget(format!(
                    "target account {target_account_id} is inactive"
                )));
            }

            if !self
                .write_manual_match(&db_tx, transaction_id, target_account_id)
                .await?
            {
                return Err(EngineError::AlreadyMatched(transaction_id.to_string()));
            }
            info!(%transaction_id, %target_account_id, "transaction reconciled manually");
            self.require_transaction(&db_tx, transaction_id).await
        })
    }

    /// Return a run by id.
    pub async fn run(&self, run_id: Uuid) -> ResultEngine<ReconciliationRun> {
        with_tx!(self, |db_tx| {
            runs::Entity::find_by_id(run_id.to_string())
                .one(&db_tx)
                .await?
                .map(ReconciliationRun::try_from)
                .transpose()?
                .ok_or_else(|| EngineError::NotFound(format!("run {run_id}")))
        })
    }

    /// Every run, oldest first.
    pub async fn list_runs(&self) -> ResultEngine<Vec<ReconciliationRun>> {
        with_tx!(self, |db_tx| {
            runs::Entity::find()
                .order_by_asc(runs::Column::CreatedAt)
                .order_by_asc(runs::Column::Id)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(ReconciliationRun::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }
}
