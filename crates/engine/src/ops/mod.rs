use sea_orm::DatabaseConnection;

use crate::{ResultEngine, matching::{DEFAULT_PERIOD_DAYS, validate_period_days}};

mod accounts;
mod reconciliation;
mod registry;
mod reports;
mod transactions;

pub use reconciliation::RunOutcome;
use registry::SourceClaims;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
///
/// On error the `DatabaseTransaction` is dropped without commit, which rolls
/// every write of the block back.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Reconciliation engine.
///
/// Owns the database handle and the in-process claim set of the run
/// registry. Share it behind an `Arc`; every operation takes `&self`.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    default_period_days: u32,
    claims: SourceClaims,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Period used when a request does not specify one.
    pub fn default_period_days(&self) -> u32 {
        self.default_period_days
    }
}

/// The builder for `Engine`
pub struct EngineBuilder {
    database: DatabaseConnection,
    default_period_days: u32,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            database: DatabaseConnection::default(),
            default_period_days: DEFAULT_PERIOD_DAYS,
        }
    }
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Override the default reconciliation period (1..=90 days).
    pub fn default_period_days(mut self, days: u32) -> EngineBuilder {
        self.default_period_days = days;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let default_period_days = validate_period_days(self.default_period_days)?;
        Ok(Engine {
            database: self.database,
            default_period_days,
            claims: SourceClaims::default(),
        })
    }
}
