//! JSON shapes exchanged with the reconciliation HTTP API.
//!
//! Request ids are plain strings so the server can report malformed ids as
//! `invalid_request` instead of a generic deserialization failure.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod account {
    use super::*;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct AccountNew {
        pub account_name: String,
        pub account_number: String,
        pub bank_name: String,
        #[serde(default)]
        pub bank_branch: String,
        #[serde(default)]
        pub statement: Option<String>,
        /// Accepts a JSON number or a decimal string.
        #[serde(default)]
        pub balance: Decimal,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct Account {
        pub id: Uuid,
        pub account_name: String,
        pub account_number: String,
        pub bank_name: String,
        pub bank_branch: String,
        pub statement: Option<String>,
        #[serde(with = "rust_decimal::serde::arbitrary_precision")]
        pub balance: Decimal,
        pub active: bool,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub enum TransactionType {
        #[serde(alias = "debit")]
        Debit,
        #[serde(alias = "credit")]
        Credit,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub enum TransactionStatus {
        #[serde(alias = "matched")]
        Matched,
        #[serde(alias = "unmatched")]
        Unmatched,
    }

    /// How a matched transaction got its status.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum MatchOrigin {
        Run,
        Manual,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Transaction {
        pub id: Uuid,
        pub date: NaiveDate,
        pub description: String,
        #[serde(with = "rust_decimal::serde::arbitrary_precision")]
        pub amount: Decimal,
        #[serde(rename = "type")]
        pub kind: TransactionType,
        pub source_account: Uuid,
        pub target_account: Option<Uuid>,
        pub status: TransactionStatus,
        pub post_date: Option<NaiveDate>,
        pub value_date: Option<NaiveDate>,
        pub is_within_period: Option<bool>,
        pub match_origin: Option<MatchOrigin>,
        pub matched_run_id: Option<Uuid>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionNew {
        pub date: NaiveDate,
        #[serde(default)]
        pub description: String,
        /// Accepts a JSON number or a decimal string.
        pub amount: Decimal,
        #[serde(rename = "type")]
        pub kind: TransactionType,
        pub source_account: String,
        #[serde(default)]
        pub target_account: Option<String>,
        #[serde(default)]
        pub post_date: Option<NaiveDate>,
        #[serde(default)]
        pub value_date: Option<NaiveDate>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct TransactionIngest {
        pub transactions: Vec<TransactionNew>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ManualReconcile {
        pub target_account_id: String,
    }

    /// Query string of `GET /transactions` and the report endpoints.
    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    pub struct TransactionQuery {
        pub status: Option<TransactionStatus>,
        #[serde(rename = "type")]
        pub kind: Option<TransactionType>,
        pub account: Option<String>,
        pub search: Option<String>,
    }
}

pub mod reconciliation {
    use super::*;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct InitiateRequest {
        pub source_account_id: String,
        pub target_account_ids: Vec<String>,
        /// Period in days; the server default applies when absent. Signed so
        /// that out-of-range values reach validation instead of failing to
        /// parse.
        #[serde(default)]
        pub reconciliation_days: Option<i64>,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Run {
        pub id: Uuid,
        pub source_account_id: Uuid,
        pub target_account_ids: Vec<Uuid>,
        pub period_days: u32,
        pub post_date: NaiveDate,
        pub value_date: NaiveDate,
        pub created_at: DateTime<Utc>,
        pub result_transaction_ids: Vec<Uuid>,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct InitiateResponse {
        /// Id of the created run.
        pub id: Uuid,
        pub run: Run,
        pub transactions: Vec<transaction::Transaction>,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct UsedSource {
        pub account_id: Uuid,
        pub run_id: Uuid,
        pub used_at: DateTime<Utc>,
    }
}

pub mod report {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Summary {
        pub total_count: usize,
        pub matched_count: usize,
        pub unmatched_count: usize,
        #[serde(with = "rust_decimal::serde::arbitrary_precision")]
        pub total_amount: Decimal,
        #[serde(with = "rust_decimal::serde::arbitrary_precision")]
        pub matched_amount: Decimal,
        #[serde(with = "rust_decimal::serde::arbitrary_precision")]
        pub unmatched_amount: Decimal,
        pub within_period_count: usize,
        pub outside_period_count: usize,
        pub unevaluated_count: usize,
    }
}

pub mod error {
    use super::*;

    /// Body of every non-2xx response.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ErrorBody {
        pub message: String,
        /// Stable machine-readable error code.
        pub code: String,
    }
}
