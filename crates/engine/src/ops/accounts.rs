use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    Account, EngineError, NewAccount, ResultEngine, accounts,
    util::{normalize_optional_text, normalize_required_text},
};

use super::{Engine, with_tx};

impl Engine {
    /// Register a new bank account.
    ///
    /// Name, number and bank are required; the account number is unique.
    pub async fn register_account(&self, input: NewAccount) -> ResultEngine<Account> {
        let input = NewAccount {
            account_name: normalize_required_text(&input.account_name, "account name")?,
            account_number: normalize_required_text(&input.account_number, "account number")?,
            bank_name: normalize_required_text(&input.bank_name, "bank name")?,
            branch: input.branch.trim().to_string(),
            balance: input.balance,
            statement_ref: normalize_optional_text(input.statement_ref.as_deref()),
        };
        if input.balance < Decimal::ZERO {
            tracing::warn!(
                account_number = %input.account_number,
                "registering account with a negative balance"
            );
        }

        with_tx!(self, |db_tx| {
            let exists = accounts::Entity::find()
                .filter(accounts::Column::AccountNumber.eq(input.account_number.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(input.account_number));
            }

            let account = Account::new(input, Utc::now());
            let model: accounts::ActiveModel = (&account).into();
            model.insert(&db_tx).await?;
            tracing::info!(account_id = %account.id, "account registered");
            Ok(account)
        })
    }

    /// Return an account by id.
    pub async fn account(&self, account_id: Uuid) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| self.require_account(&db_tx, account_id).await)
    }

    /// List every account, ordered by name then id.
    pub async fn list_accounts(&self) -> ResultEngine<Vec<Account>> {
        with_tx!(self, |db_tx| {
            accounts::Entity::find()
                .order_by_asc(accounts::Column::AccountName)
                .order_by_asc(accounts::Column::Id)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Account::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Deactivates/reactivates an account.
    ///
    /// Inactive accounts cannot take part in new reconciliation runs.
    pub async fn set_account_active(&self, account_id: Uuid, active: bool) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, account_id).await?;
            let model = accounts::ActiveModel {
                id: ActiveValue::Set(account_id.to_string()),
                active: ActiveValue::Set(active),
                ..Default::default()
            };
            model.update(&db_tx).await?;
            Ok(())
        })
    }

    pub(super) async fn find_account(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
    ) -> ResultEngine<Option<Account>> {
        accounts::Entity::find_by_id(account_id.to_string())
            .one(db)
            .await?
            .map(Account::try_from)
            .transpose()
    }

    pub(super) async fn require_account(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
    ) -> ResultEngine<Account> {
        self.find_account(db, account_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("account {account_id}")))
    }
}
