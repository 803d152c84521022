//! Command structs for engine write operations.
//!
//! The two reconcile paths have their own command so their differing
//! invariants stay visible at the call site: a run evaluates the period
//! window, a manual reconcile never touches it.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{MatchStatus, TransactionType};

/// Start an automatic reconciliation run.
#[derive(Clone, Debug)]
pub struct InitiateCmd {
    pub source_account_id: Uuid,
    pub target_account_ids: Vec<Uuid>,
    /// `None` uses the engine default.
    pub period_days: Option<u32>,
    /// Run creation date, the start of the period window.
    pub today: NaiveDate,
}

impl InitiateCmd {
    #[must_use]
    pub fn new(source_account_id: Uuid, target_account_ids: Vec<Uuid>, today: NaiveDate) -> Self {
        Self {
            source_account_id,
            target_account_ids,
            period_days: None,
            today,
        }
    }

    #[must_use]
    pub fn period_days(mut self, period_days: u32) -> Self {
        self.period_days = Some(period_days);
        self
    }
}

/// Operator override matching a single transaction to a target account.
#[derive(Clone, Debug)]
pub struct ManualReconcileCmd {
    pub transaction_id: Uuid,
    pub target_account_id: Uuid,
}

/// Filters for listing transactions. Every field is optional and they
/// combine with AND.
#[derive(Clone, Debug, Default)]
pub struct TransactionFilter {
    pub status: Option<MatchStatus>,
    pub kind: Option<TransactionType>,
    /// Matches either the source or the target account.
    pub account_id: Option<Uuid>,
    /// Case-insensitive substring of the description or account ids.
    pub search: Option<String>,
}

impl TransactionFilter {
    #[must_use]
    pub fn status(mut self, status: MatchStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: TransactionType) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn account(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }

    #[must_use]
    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }
}
