//! Property-based tests for the pairing and period rules.

use std::collections::HashSet;

use chrono::{NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use uuid::Uuid;

use engine::{
    MatchStatus, NewTransaction, Transaction, TransactionType,
    matching::{Scope, Window, classify},
};

#[derive(Clone, Debug)]
struct Movement {
    debit: bool,
    account: usize,
    cents: u32,
    day: u32,
    clears_after: Option<u32>,
}

fn movement() -> impl Strategy<Value = Movement> {
    (
        any::<bool>(),
        0usize..4,
        1u32..6,
        1u32..20,
        prop::option::of(0u32..12),
    )
        .prop_map(|(debit, account, cents, day, clears_after)| Movement {
            debit,
            account,
            cents,
            day,
            clears_after,
        })
}

fn movements_and_order() -> impl Strategy<Value = (Vec<Movement>, Vec<usize>)> {
    prop::collection::vec(movement(), 0..24).prop_flat_map(|movements| {
        let order: Vec<usize> = (0..movements.len()).collect();
        (Just(movements), Just(order).prop_shuffle())
    })
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap() + chrono::Days::new(u64::from(d))
}

fn materialize(movements: &[Movement], accounts: &[Uuid; 4]) -> Vec<Transaction> {
    movements
        .iter()
        .map(|m| {
            let post = day(m.day);
            Transaction::new(
                NewTransaction {
                    date: post,
                    description: String::new(),
                    amount: format!("{}.{:02}", m.cents, m.cents * 7 % 100).parse().unwrap(),
                    kind: if m.debit {
                        TransactionType::Debit
                    } else {
                        TransactionType::Credit
                    },
                    source_account_id: accounts[m.account],
                    target_account_id: None,
                    post_date: Some(post),
                    value_date: m.clears_after.map(|n| post + chrono::Days::new(u64::from(n))),
                },
                Utc.timestamp_opt(0, 0).unwrap(),
            )
        })
        .collect()
}

proptest! {
    /// Property: input order never changes the outcome of a run.
    #[test]
    fn classification_ignores_input_order((movements, order) in movements_and_order()) {
        let accounts = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        let targets = [accounts[1], accounts[2]];
        let scope = Scope { source_account_id: accounts[0], target_account_ids: &targets };
        let window = Window::new(day(3), 7).unwrap();
        let run_id = Uuid::new_v4();

        let transactions = materialize(&movements, &accounts);
        let shuffled: Vec<Transaction> = order.iter().map(|i| transactions[*i].clone()).collect();

        let a = classify(transactions, scope, &window, run_id);
        let b = classify(shuffled, scope, &window, run_id);
        prop_assert_eq!(a, b);
    }

    /// Property: pairs join equal amounts and never reuse a transaction.
    #[test]
    fn pairs_are_disjoint_and_equal((movements, _) in movements_and_order()) {
        let accounts = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        let targets = [accounts[1], accounts[2]];
        let scope = Scope { source_account_id: accounts[0], target_account_ids: &targets };
        let window = Window::new(day(3), 7).unwrap();

        let result = classify(materialize(&movements, &accounts), scope, &window, Uuid::new_v4());

        let mut used = HashSet::new();
        for pairing in &result.pairings {
            prop_assert!(used.insert(pairing.debit_id));
            prop_assert!(used.insert(pairing.credit_id));
            let debit = result.transactions.iter().find(|tx| tx.id == pairing.debit_id).unwrap();
            let credit = result.transactions.iter().find(|tx| tx.id == pairing.credit_id).unwrap();
            prop_assert_eq!(debit.amount, credit.amount);
            prop_assert_eq!(debit.kind, TransactionType::Debit);
            prop_assert_eq!(credit.kind, TransactionType::Credit);
            prop_assert!(targets.contains(&pairing.receiving_account_id));
        }

        let matched = result
            .transactions
            .iter()
            .filter(|tx| tx.status == MatchStatus::Matched)
            .count();
        prop_assert_eq!(matched, result.pairings.len() * 2);
    }

    /// Property: the period flag only depends on the window and the
    /// transaction's own dates.
    #[test]
    fn period_flag_follows_the_window((movements, _) in movements_and_order(), period in 1u32..=90) {
        let accounts = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        let targets = [accounts[1], accounts[2]];
        let scope = Scope { source_account_id: accounts[0], target_account_ids: &targets };
        let window = Window::new(day(3), period).unwrap();

        let result = classify(materialize(&movements, &accounts), scope, &window, Uuid::new_v4());

        for tx in &result.transactions {
            let expected = match (tx.post_date, tx.value_date) {
                (Some(post), Some(value)) => window.post_date() <= post && value <= window.value_date(),
                _ => false,
            };
            prop_assert_eq!(tx.is_within_period, Some(expected));
        }
    }
}
