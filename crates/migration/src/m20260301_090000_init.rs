//! Initial schema migration.
//!
//! It creates the complete schema for the reconciler:
//!
//! - `accounts`: bank accounts known to the ledger
//! - `transactions`: ingested statement/feed records, classified by runs
//! - `reconciliation_runs`: one row per successful initiation
//! - `used_source_accounts`: durable run registry, one row per consumed source

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    AccountName,
    AccountNumber,
    BankName,
    BankBranch,
    Statement,
    Balance,
    Active,
    CreatedAt,
}

#[derive(Iden)]
pub(crate) enum Transactions {
    Table,
    Id,
    Date,
    Description,
    Amount,
    Kind,
    SourceAccountId,
    TargetAccountId,
    Status,
    PostDate,
    ValueDate,
    IsWithinPeriod,
    CreatedAt,
}

#[derive(Iden)]
enum ReconciliationRuns {
    Table,
    Id,
    SourceAccountId,
    TargetAccountIds,
    PeriodDays,
    PostDate,
    ValueDate,
    CreatedAt,
    ResultTransactionIds,
}

#[derive(Iden)]
enum UsedSourceAccounts {
    Table,
    AccountId,
    RunId,
    UsedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ─────────────────────────────────────────────────────────────────────
        // accounts
        // ─────────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Accounts::AccountName).string().not_null())
                    .col(ColumnDef::new(Accounts::AccountNumber).string().not_null())
                    .col(ColumnDef::new(Accounts::BankName).string().not_null())
                    .col(ColumnDef::new(Accounts::BankBranch).string().not_null())
                    .col(ColumnDef::new(Accounts::Statement).string())
                    .col(ColumnDef::new(Accounts::Balance).string().not_null())
                    .col(
                        ColumnDef::new(Accounts::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Accounts::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx-accounts-account_number")
                    .table(Accounts::Table)
                    .col(Accounts::AccountNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ─────────────────────────────────────────────────────────────────────
        // transactions
        // ─────────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::Date).date().not_null())
                    .col(
                        ColumnDef::new(Transactions::Description)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Transactions::Amount).string().not_null())
                    .col(ColumnDef::new(Transactions::Kind).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::SourceAccountId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::TargetAccountId).string())
                    .col(ColumnDef::new(Transactions::Status).string().not_null())
                    .col(ColumnDef::new(Transactions::PostDate).date())
                    .col(ColumnDef::new(Transactions::ValueDate).date())
                    .col(ColumnDef::new(Transactions::IsWithinPeriod).boolean())
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-source_account_id")
                            .from(Transactions::Table, Transactions::SourceAccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-target_account_id")
                            .from(Transactions::Table, Transactions::TargetAccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-source_account_id-kind")
                    .table(Transactions::Table)
                    .col(Transactions::SourceAccountId)
                    .col(Transactions::Kind)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-target_account_id")
                    .table(Transactions::Table)
                    .col(Transactions::TargetAccountId)
                    .to_owned(),
            )
            .await?;

        // ─────────────────────────────────────────────────────────────────────
        // reconciliation_runs
        // ─────────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(ReconciliationRuns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReconciliationRuns::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ReconciliationRuns::SourceAccountId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReconciliationRuns::TargetAccountIds)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReconciliationRuns::PeriodDays)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReconciliationRuns::PostDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReconciliationRuns::ValueDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReconciliationRuns::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReconciliationRuns::ResultTransactionIds)
                            .text()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-reconciliation_runs-source_account_id")
                            .from(
                                ReconciliationRuns::Table,
                                ReconciliationRuns::SourceAccountId,
                            )
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ─────────────────────────────────────────────────────────────────────
        // used_source_accounts
        // ─────────────────────────────────────────────────────────────────────
        // The primary key is the claim: a second insert for the same account
        // fails with a unique violation.
        manager
            .create_table(
                Table::create()
                    .table(UsedSourceAccounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UsedSourceAccounts::AccountId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UsedSourceAccounts::RunId).string().not_null())
                    .col(
                        ColumnDef::new(UsedSourceAccounts::UsedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-used_source_accounts-account_id")
                            .from(UsedSourceAccounts::Table, UsedSourceAccounts::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-used_source_accounts-run_id")
                            .from(UsedSourceAccounts::Table, UsedSourceAccounts::RunId)
                            .to(ReconciliationRuns::Table, ReconciliationRuns::Id),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UsedSourceAccounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ReconciliationRuns::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        Ok(())
    }
}
