//! Read-only aggregation over classified transactions.
//!
//! Both functions are pure: they never touch storage and can be fed any
//! slice the caller already holds.

use csv::Writer;
use serde::Serialize;

use crate::{Amount, EngineError, MatchStatus, ResultEngine, Transaction, TransactionType};

/// Totals shown by the reports screen.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconciliationSummary {
    pub total_count: usize,
    pub matched_count: usize,
    pub unmatched_count: usize,
    pub total_amount: Amount,
    pub matched_amount: Amount,
    pub unmatched_amount: Amount,
    pub within_period_count: usize,
    pub outside_period_count: usize,
    /// Transactions no run has evaluated yet.
    pub unevaluated_count: usize,
}

pub fn summarize(transactions: &[Transaction]) -> ReconciliationSummary {
    let mut summary = ReconciliationSummary {
        total_count: transactions.len(),
        ..Default::default()
    };

    for tx in transactions {
        summary.total_amount += tx.amount;
        match tx.status {
            MatchStatus::Matched => {
                summary.matched_count += 1;
                summary.matched_amount += tx.amount;
            }
            MatchStatus::Unmatched => {
                summary.unmatched_count += 1;
                summary.unmatched_amount += tx.amount;
            }
        }
        match tx.is_within_period {
            Some(true) => summary.within_period_count += 1,
            Some(false) => summary.outside_period_count += 1,
            None => summary.unevaluated_count += 1,
        }
    }

    summary
}

#[derive(Serialize)]
struct ExportRow {
    id: String,
    date: String,
    description: String,
    amount: String,
    #[serde(rename = "type")]
    kind: &'static str,
    source_account: String,
    target_account: String,
    status: &'static str,
    post_date: String,
    value_date: String,
    within_period: &'static str,
}

impl From<&Transaction> for ExportRow {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: tx.id.to_string(),
            date: tx.date.to_string(),
            description: tx.description.clone(),
            amount: tx.amount.to_storage(),
            kind: match tx.kind {
                TransactionType::Debit => "Debit",
                TransactionType::Credit => "Credit",
            },
            source_account: tx.source_account_id.to_string(),
            target_account: tx
                .target_account_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            status: match tx.status {
                MatchStatus::Matched => "Matched",
                MatchStatus::Unmatched => "Unmatched",
            },
            post_date: tx.post_date.map(|d| d.to_string()).unwrap_or_default(),
            value_date: tx.value_date.map(|d| d.to_string()).unwrap_or_default(),
            within_period: match tx.is_within_period {
                Some(true) => "yes",
                Some(false) => "no",
                None => "",
            },
        }
    }
}

/// Export transactions as CSV, one row per transaction, header included.
pub fn export_csv(transactions: &[Transaction]) -> ResultEngine<Vec<u8>> {
    let mut writer = Writer::from_writer(vec![]);
    for tx in transactions {
        writer
            .serialize(ExportRow::from(tx))
            .map_err(|err| EngineError::PersistenceFailure(format!("csv export failed: {err}")))?;
    }
    writer
        .into_inner()
        .map_err(|err| EngineError::PersistenceFailure(format!("csv export failed: {err}")))
}
