//! Pure matching and period logic.
//!
//! Nothing here touches storage: [`classify`] receives the candidate set
//! loaded by the engine and returns the classified transactions together with
//! the ids that must be written back. Re-running it on the same input always
//! yields the same output, whatever the input order.

use std::collections::{BTreeMap, VecDeque};

use chrono::{Days, NaiveDate};
use uuid::Uuid;

use crate::{
    Amount, EngineError, MatchOrigin, MatchStatus, ResultEngine, Transaction, TransactionType,
};

pub const MIN_PERIOD_DAYS: u32 = 1;
pub const MAX_PERIOD_DAYS: u32 = 90;
pub const DEFAULT_PERIOD_DAYS: u32 = 7;

/// Validate a reconciliation period length.
pub fn validate_period_days(period_days: u32) -> ResultEngine<u32> {
    if !(MIN_PERIOD_DAYS..=MAX_PERIOD_DAYS).contains(&period_days) {
        return Err(EngineError::InvalidRequest(format!(
            "period must be between {MIN_PERIOD_DAYS} and {MAX_PERIOD_DAYS} days, got {period_days}"
        )));
    }
    Ok(period_days)
}

/// The `[post_date, value_date]` window of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    post_date: NaiveDate,
    value_date: NaiveDate,
    period_days: u32,
}

impl Window {
    /// Builds the window starting at `post_date` and lasting `period_days`.
    pub fn new(post_date: NaiveDate, period_days: u32) -> ResultEngine<Self> {
        let period_days = validate_period_days(period_days)?;
        let value_date = post_date
            .checked_add_days(Days::new(u64::from(period_days)))
            .ok_or_else(|| EngineError::InvalidRequest("period end overflows".to_string()))?;
        Ok(Self {
            post_date,
            value_date,
            period_days,
        })
    }

    pub fn post_date(&self) -> NaiveDate {
        self.post_date
    }

    pub fn value_date(&self) -> NaiveDate {
        self.value_date
    }

    pub fn period_days(&self) -> u32 {
        self.period_days
    }

    /// `true` iff both dates are present, the post date is not before the
    /// window start and the value date is not after the window end.
    pub fn contains(&self, post_date: Option<NaiveDate>, value_date: Option<NaiveDate>) -> bool {
        match (post_date, value_date) {
            (Some(post), Some(value)) => self.post_date <= post && value <= self.value_date,
            _ => false,
        }
    }

    pub fn evaluate(&self, tx: &Transaction) -> bool {
        self.contains(tx.post_date, tx.value_date)
    }
}

/// Accounts involved in a run.
#[derive(Clone, Copy, Debug)]
pub struct Scope<'a> {
    pub source_account_id: Uuid,
    pub target_account_ids: &'a [Uuid],
}

impl Scope<'_> {
    fn is_target(&self, account_id: Uuid) -> bool {
        self.target_account_ids.contains(&account_id)
    }

    /// Whether a transaction belongs to the run's candidate set.
    ///
    /// Debits leaving the source, credits whose assigned target is one of
    /// the targets, and unassigned credits recorded on one of the targets.
    pub fn is_candidate(&self, tx: &Transaction) -> bool {
        match tx.kind {
            TransactionType::Debit => tx.source_account_id == self.source_account_id,
            TransactionType::Credit => match tx.target_account_id {
                Some(target) => self.is_target(target),
                None => self.is_target(tx.source_account_id),
            },
        }
    }

    fn is_pairable_debit(&self, tx: &Transaction) -> bool {
        tx.kind == TransactionType::Debit
            && tx.source_account_id == self.source_account_id
            && tx.status == MatchStatus::Unmatched
    }

    fn pairable_credit_account(&self, tx: &Transaction) -> Option<Uuid> {
        if tx.kind != TransactionType::Credit || tx.status != MatchStatus::Unmatched {
            return None;
        }
        tx.receiving_account_id().filter(|id| self.is_target(*id))
    }
}

/// A debit and a credit forming one logical transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pairing {
    pub debit_id: Uuid,
    pub credit_id: Uuid,
    pub amount: Amount,
    pub receiving_account_id: Uuid,
}

fn chronological(a: &Transaction, b: &Transaction) -> std::cmp::Ordering {
    a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id))
}

/// Pair unmatched source debits with unmatched target credits.
///
/// Debits are visited by `(date, id)`; each takes the not-yet-paired credit
/// of exactly the same amount with the earliest `date`, then the lowest `id`.
pub fn pair(candidates: &[Transaction], scope: Scope<'_>) -> Vec<Pairing> {
    let mut debits: Vec<&Transaction> = candidates
        .iter()
        .filter(|tx| scope.is_pairable_debit(tx))
        .collect();
    debits.sort_by(|a, b| chronological(a, b));

    let mut credits: Vec<(&Transaction, Uuid)> = candidates
        .iter()
        .filter_map(|tx| scope.pairable_credit_account(tx).map(|account| (tx, account)))
        .collect();
    credits.sort_by(|(a, _), (b, _)| chronological(a, b));

    let mut by_amount: BTreeMap<Amount, VecDeque<(&Transaction, Uuid)>> = BTreeMap::new();
    for (credit, account) in credits {
        by_amount
            .entry(credit.amount)
            .or_default()
            .push_back((credit, account));
    }

    debits
        .into_iter()
        .filter_map(|debit| {
            let (credit, account) = by_amount.get_mut(&debit.amount)?.pop_front()?;
            Some(Pairing {
                debit_id: debit.id,
                credit_id: credit.id,
                amount: debit.amount,
                receiving_account_id: account,
            })
        })
        .collect()
}

/// Result of classifying a candidate set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Classification {
    /// Every candidate, classified, ordered by `(date, id)`.
    pub transactions: Vec<Transaction>,
    pub pairings: Vec<Pairing>,
    /// Ids of transactions whose stored fields changed.
    pub changed: Vec<Uuid>,
}

/// Classify the candidate set of a run.
///
/// Paired transactions become `Matched` with the receiving account as
/// target. Transactions evaluated for the first time get `is_within_period`
/// from `window`; an existing value is left alone. Anything outside `scope`
/// is dropped.
pub fn classify(
    candidates: Vec<Transaction>,
    scope: Scope<'_>,
    window: &Window,
    run_id: Uuid,
) -> Classification {
    let mut transactions: Vec<Transaction> = candidates
        .into_iter()
        .filter(|tx| scope.is_candidate(tx))
        .collect();
    transactions.sort_by(chronological);
    transactions.dedup_by_key(|tx| tx.id);

    let pairings = pair(&transactions, scope);
    let mut counterpart: BTreeMap<Uuid, Uuid> = BTreeMap::new();
    for pairing in &pairings {
        counterpart.insert(pairing.debit_id, pairing.receiving_account_id);
        counterpart.insert(pairing.credit_id, pairing.receiving_account_id);
    }

    let mut changed = Vec::new();
    for tx in &mut transactions {
        let mut dirty = false;
        if let Some(receiving) = counterpart.get(&tx.id) {
            tx.target_account_id = Some(*receiving);
            tx.status = MatchStatus::Matched;
            tx.matched_by = Some(MatchOrigin::Run { run_id });
            dirty = true;
        }
        if tx.is_within_period.is_none() {
            tx.is_within_period = Some(window.evaluate(tx));
            dirty = true;
        }
        if dirty {
            changed.push(tx.id);
        }
    }

    Classification {
        transactions,
        pairings,
        changed,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::NewTransaction;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(
        kind: TransactionType,
        account: Uuid,
        amount: &str,
        on: NaiveDate,
        post: Option<NaiveDate>,
        value: Option<NaiveDate>,
    ) -> Transaction {
        Transaction::new(
            NewTransaction {
                date: on,
                description: String::new(),
                amount: amount.parse().unwrap(),
                kind,
                source_account_id: account,
                target_account_id: None,
                post_date: post,
                value_date: value,
            },
            Utc.timestamp_opt(0, 0).unwrap(),
        )
    }

    #[test]
    fn window_ends_exactly_period_days_later() {
        let window = Window::new(date(2024, 1, 1), 7).unwrap();
        assert_eq!(window.value_date(), date(2024, 1, 8));
        assert!(window.value_date() > window.post_date());
    }

    #[test]
    fn period_bounds_are_enforced() {
        assert!(Window::new(date(2024, 1, 1), 0).is_err());
        assert!(Window::new(date(2024, 1, 1), 91).is_err());
        assert!(Window::new(date(2024, 1, 1), 1).is_ok());
        assert!(Window::new(date(2024, 1, 1), 90).is_ok());
    }

    #[test]
    fn window_edges_are_inclusive() {
        let window = Window::new(date(2024, 1, 1), 7).unwrap();
        assert!(window.contains(Some(date(2024, 1, 1)), Some(date(2024, 1, 8))));
        assert!(!window.contains(Some(date(2023, 12, 31)), Some(date(2024, 1, 2))));
        assert!(!window.contains(Some(date(2024, 1, 2)), Some(date(2024, 1, 9))));
    }

    #[test]
    fn missing_dates_are_outside_the_window() {
        let window = Window::new(date(2024, 1, 1), 7).unwrap();
        assert!(!window.contains(None, Some(date(2024, 1, 2))));
        assert!(!window.contains(Some(date(2024, 1, 2)), None));
        assert!(!window.contains(None, None));
    }

    #[test]
    fn equal_amounts_are_paired_and_matched() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let debit = tx(
            TransactionType::Debit,
            a,
            "500",
            date(2024, 1, 1),
            Some(date(2024, 1, 1)),
            Some(date(2024, 1, 5)),
        );
        let credit = tx(
            TransactionType::Credit,
            b,
            "500.00",
            date(2024, 1, 2),
            Some(date(2024, 1, 2)),
            Some(date(2024, 1, 4)),
        );
        let window = Window::new(date(2024, 1, 1), 7).unwrap();
        let targets = [b];
        let scope = Scope {
            source_account_id: a,
            target_account_ids: &targets,
        };
        let run_id = Uuid::new_v4();

        let out = classify(vec![debit.clone(), credit.clone()], scope, &window, run_id);

        assert_eq!(out.pairings.len(), 1);
        assert_eq!(out.changed.len(), 2);
        for tx in &out.transactions {
            assert_eq!(tx.status, MatchStatus::Matched);
            assert_eq!(tx.is_within_period, Some(true));
            assert_eq!(tx.target_account_id, Some(b));
            assert_eq!(tx.matched_by, Some(MatchOrigin::Run { run_id }));
        }
    }

    #[test]
    fn different_amounts_stay_unmatched_but_are_evaluated() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let debit = tx(
            TransactionType::Debit,
            a,
            "500",
            date(2024, 1, 1),
            Some(date(2024, 1, 1)),
            Some(date(2024, 1, 5)),
        );
        let credit = tx(
            TransactionType::Credit,
            b,
            "499.99",
            date(2024, 1, 2),
            Some(date(2024, 1, 2)),
            Some(date(2024, 1, 20)),
        );
        let window = Window::new(date(2024, 1, 1), 7).unwrap();
        let targets = [b];
        let scope = Scope {
            source_account_id: a,
            target_account_ids: &targets,
        };

        let out = classify(vec![debit.clone(), credit.clone()], scope, &window, Uuid::new_v4());

        assert!(out.pairings.is_empty());
        let by_id = |id: Uuid| out.transactions.iter().find(|t| t.id == id).unwrap();
        assert_eq!(by_id(debit.id).status, MatchStatus::Unmatched);
        assert_eq!(by_id(debit.id).is_within_period, Some(true));
        assert_eq!(by_id(credit.id).status, MatchStatus::Unmatched);
        assert_eq!(by_id(credit.id).is_within_period, Some(false));
        assert_eq!(by_id(credit.id).target_account_id, None);
    }

    #[test]
    fn ties_go_to_earliest_date_then_lowest_id() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let debit = tx(TransactionType::Debit, a, "10", date(2024, 1, 1), None, None);
        let late = tx(TransactionType::Credit, b, "10", date(2024, 1, 3), None, None);
        let mut early_high = tx(TransactionType::Credit, c, "10", date(2024, 1, 2), None, None);
        let mut early_low = tx(TransactionType::Credit, b, "10", date(2024, 1, 2), None, None);
        early_low.id = Uuid::from_u128(1);
        early_high.id = Uuid::from_u128(2);

        let targets = [b, c];
        let scope = Scope {
            source_account_id: a,
            target_account_ids: &targets,
        };
        let pairs = pair(&[late, early_high, debit.clone(), early_low], scope);

        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].debit_id, debit.id);
        assert_eq!(pairs[0].credit_id, Uuid::from_u128(1));
        assert_eq!(pairs[0].receiving_account_id, b);
    }

    #[test]
    fn a_credit_is_paired_at_most_once() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let first = tx(TransactionType::Debit, a, "25", date(2024, 1, 1), None, None);
        let second = tx(TransactionType::Debit, a, "25", date(2024, 1, 2), None, None);
        let credit = tx(TransactionType::Credit, b, "25", date(2024, 1, 3), None, None);

        let targets = [b];
        let scope = Scope {
            source_account_id: a,
            target_account_ids: &targets,
        };
        let pairs = pair(&[second, credit.clone(), first.clone()], scope);

        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].debit_id, first.id);
        assert_eq!(pairs[0].credit_id, credit.id);
    }

    #[test]
    fn matched_credits_are_not_paired_again() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let debit = tx(TransactionType::Debit, a, "25", date(2024, 1, 1), None, None);
        let mut credit = tx(TransactionType::Credit, b, "25", date(2024, 1, 3), None, None);
        credit.status = MatchStatus::Matched;
        credit.target_account_id = Some(b);
        credit.matched_by = Some(MatchOrigin::Manual);

        let targets = [b];
        let scope = Scope {
            source_account_id: a,
            target_account_ids: &targets,
        };
        assert!(pair(&[debit, credit], scope).is_empty());
    }

    #[test]
    fn existing_period_flag_is_kept() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut debit = tx(
            TransactionType::Debit,
            a,
            "1",
            date(2024, 1, 1),
            Some(date(2024, 1, 1)),
            Some(date(2024, 1, 2)),
        );
        debit.is_within_period = Some(false);

        let targets = [b];
        let scope = Scope {
            source_account_id: a,
            target_account_ids: &targets,
        };
        let window = Window::new(date(2024, 1, 1), 7).unwrap();
        let out = classify(vec![debit], scope, &window, Uuid::new_v4());

        assert_eq!(out.transactions[0].is_within_period, Some(false));
        assert!(out.changed.is_empty());
    }

    #[test]
    fn credits_into_other_accounts_are_not_candidates() {
        let (a, b, other) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let debit = tx(TransactionType::Debit, a, "5", date(2024, 1, 1), None, None);
        let stray = tx(TransactionType::Credit, other, "5", date(2024, 1, 1), None, None);
        let mut assigned = tx(TransactionType::Credit, other, "5", date(2024, 1, 2), None, None);
        assigned.target_account_id = Some(b);

        let targets = [b];
        let scope = Scope {
            source_account_id: a,
            target_account_ids: &targets,
        };
        assert!(!scope.is_candidate(&stray));
        assert!(scope.is_candidate(&assigned));

        let window = Window::new(date(2024, 1, 1), 7).unwrap();
        let out = classify(vec![debit, stray, assigned.clone()], scope, &window, Uuid::new_v4());
        assert_eq!(out.transactions.len(), 2);
        assert_eq!(out.pairings[0].credit_id, assigned.id);
        assert_eq!(out.pairings[0].receiving_account_id, b);
    }
}
