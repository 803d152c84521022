//! Bank reconciliation engine.
//!
//! Pairs outgoing debits of a source account with incoming credits on its
//! counterpart accounts, evaluates each transaction against a period window
//! and records every run so a source account is reconciled at most once.
//!
//! Storage goes through SeaORM; every write operation runs inside a single
//! database transaction.

pub use accounts::{Account, NewAccount};
pub use commands::{InitiateCmd, ManualReconcileCmd, TransactionFilter};
pub use error::EngineError;
pub use money::Amount;
pub use ops::{Engine, EngineBuilder, RunOutcome};
pub use report::ReconciliationSummary;
pub use runs::ReconciliationRun;
pub use transactions::{MatchOrigin, MatchStatus, NewTransaction, Transaction, TransactionType};
pub use used_sources::UsedSource;
pub use util::parse_request_id;

mod accounts;
mod commands;
mod error;
pub mod matching;
mod money;
mod ops;
pub mod report;
mod runs;
mod transactions;
mod used_sources;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
