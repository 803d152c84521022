use crate::{
    ReconciliationSummary, ResultEngine, TransactionFilter,
    report::{export_csv, summarize},
};

use super::Engine;

impl Engine {
    /// Totals over the transactions selected by `filter`.
    pub async fn summary(&self, filter: &TransactionFilter) -> ResultEngine<ReconciliationSummary> {
        let transactions = self.list_transactions(filter).await?;
        Ok(summarize(&transactions))
    }

    /// CSV export of the transactions selected by `filter`.
    pub async fn export_csv(&self, filter: &TransactionFilter) -> ResultEngine<Vec<u8>> {
        let transactions = self.list_transactions(filter).await?;
        export_csv(&transactions)
    }
}
