use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Account, AccountKind, ClearedState, EngineError, NewAccountCmd, ResultEngine, Transaction,
    accounts, categories, transactions, util::parse_opt_uuid,
};

use super::{Engine, normalize_optional_text, normalize_required_name, with_tx};

const STARTING_BALANCE_PAYEE: &str = "Starting Balance";

impl Engine {
    async fn account_name_taken(
        &self,
        db: &DatabaseTransaction,
        budget_id: &str,
        name: &str,
        except: Option<&str>,
    ) -> ResultEngine<bool> {
        let mut query = accounts::Entity::find()
            .filter(accounts::Column::BudgetId.eq(budget_id.to_string()))
            .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()));
        if let Some(except) = except {
            query = query.filter(accounts::Column::Id.ne(except.to_string()));
        }
        Ok(query.one(db).await?.is_some())
    }

    /// Return an account snapshot from DB.
    pub async fn account(&self, account_id: Uuid, user_id: &str) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, account_id, user_id).await?;
            Account::try_from(model)
        })
    }

    /// Add a new account to a budget.
    ///
    /// An on-budget credit card gets its payment category in the system
    /// group. `opening_balance != 0` is recorded as a cleared, uncategorized
    /// "Starting Balance" transaction that bypasses the card subroutine: a
    /// positive balance is income, a negative card balance is existing debt.
    pub async fn new_account(&self, cmd: NewAccountCmd) -> ResultEngine<Account> {
        let name = normalize_required_name(&cmd.name, "account")?;
        let note = normalize_optional_text(cmd.note.as_deref());
        let on_budget = cmd
            .on_budget
            .unwrap_or_else(|| cmd.kind.default_on_budget());
        with_tx!(self, |db_tx| {
            let budget = self
                .require_budget_access(&db_tx, cmd.budget_id, &cmd.user_id)
                .await?;
            if self
                .account_name_taken(&db_tx, &budget.id, &name, None)
                .await?
            {
                return Err(EngineError::ExistingKey(name));
            }

            let mut account = Account::new(cmd.budget_id, name, cmd.kind, on_budget, note);
            if on_budget && cmd.kind == AccountKind::CreditCard {
                account.payment_category_id = Some(
                    self.payment_category_for(&db_tx, cmd.budget_id, &account.name)
                        .await?,
                );
            }
            let model: accounts::ActiveModel = (&account).into();
            model.insert(&db_tx).await?;

            if !cmd.opening_balance.is_zero() {
                let payee_id = self
                    .find_or_create_payee(&db_tx, cmd.budget_id, STARTING_BALANCE_PAYEE)
                    .await?;
                let now = Utc::now();
                let opening = Transaction {
                    id: Uuid::new_v4(),
                    budget_id: cmd.budget_id,
                    account_id: account.id,
                    payee_id: Some(payee_id),
                    category_id: None,
                    amount: cmd.opening_balance,
                    date: cmd.opening_date.unwrap_or_else(|| now.date_naive()),
                    memo: None,
                    cleared: ClearedState::Cleared,
                    approved: true,
                    is_transfer: false,
                    transfer_group_id: None,
                    transfer_account_id: None,
                    is_split: false,
                    card_adjustment: None,
                    import_id: None,
                    created_at: now,
                    updated_at: now,
                    splits: Vec::new(),
                };
                let model: transactions::ActiveModel = (&opening).into();
                model.insert(&db_tx).await?;
            }

            tracing::debug!(
                account_id = %account.id,
                budget_id = %account.budget_id,
                kind = account.kind.as_str(),
                on_budget,
                opening_balance = %cmd.opening_balance,
                "created account"
            );
            Ok(account)
        })
    }

    /// Accounts of a budget ordered by name; closed ones only on request.
    pub async fn list_accounts(
        &self,
        budget_id: Uuid,
        user_id: &str,
        include_closed: bool,
    ) -> ResultEngine<Vec<Account>> {
        with_tx!(self, |db_tx| {
            self.require_budget_access(&db_tx, budget_id, user_id)
                .await?;
            let mut query = accounts::Entity::find()
                .filter(accounts::Column::BudgetId.eq(budget_id.to_string()))
                .order_by_asc(accounts::Column::Name);
            if !include_closed {
                query = query.filter(accounts::Column::IsClosed.eq(false));
            }
            let models = query.all(&db_tx).await?;
            models.into_iter().map(Account::try_from).collect()
        })
    }

    /// Renames an account; its payment category follows.
    pub async fn rename_account(
        &self,
        account_id: Uuid,
        name: &str,
        user_id: &str,
    ) -> ResultEngine<Account> {
        let name = normalize_required_name(name, "account")?;
        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, account_id, user_id).await?;
            if self
                .account_name_taken(&db_tx, &model.budget_id, &name, Some(&model.id))
                .await?
            {
                return Err(EngineError::ExistingKey(name));
            }

            if let Some(category_id) =
                parse_opt_uuid(model.payment_category_id.as_deref(), "payment category")?
            {
                let (category, group) = self.category_with_group(&db_tx, category_id).await?;
                let clash = categories::Entity::find()
                    .filter(categories::Column::GroupId.eq(group.id))
                    .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()))
                    .filter(categories::Column::Id.ne(category.id.clone()))
                    .one(&db_tx)
                    .await?
                    .is_some();
                if clash {
                    return Err(EngineError::ExistingKey(name));
                }
                let mut active: categories::ActiveModel = category.into();
                active.name = ActiveValue::Set(name.clone());
                active.update(&db_tx).await?;
            }

            let mut active: accounts::ActiveModel = model.into();
            active.name = ActiveValue::Set(name);
            let updated = active.update(&db_tx).await?;
            Account::try_from(updated)
        })
    }

    /// Sets or clears (blank) the note of an account.
    pub async fn set_account_note(
        &self,
        account_id: Uuid,
        note: Option<&str>,
        user_id: &str,
    ) -> ResultEngine<Account> {
        let note = normalize_optional_text(note);
        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, account_id, user_id).await?;
            let mut active: accounts::ActiveModel = model.into();
            active.note = ActiveValue::Set(note);
            let updated = active.update(&db_tx).await?;
            Account::try_from(updated)
        })
    }

    /// Closes or reopens an account. Closed accounts reject new postings but
    /// keep their history and balances.
    pub async fn set_account_closed(
        &self,
        account_id: Uuid,
        closed: bool,
        user_id: &str,
    ) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, account_id, user_id).await?;
            let mut active: accounts::ActiveModel = model.into();
            active.is_closed = ActiveValue::Set(closed);
            let updated = active.update(&db_tx).await?;
            tracing::debug!(%account_id, closed, "account closed flag changed");
            Account::try_from(updated)
        })
    }

    /// Deletes an account without transactions. A payment category is kept
    /// (hidden) so its history stays visible in past months.
    pub async fn delete_account(&self, account_id: Uuid, user_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, account_id, user_id).await?;
            let has_transactions = transactions::Entity::find()
                .filter(transactions::Column::AccountId.eq(model.id.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if has_transactions {
                return Err(EngineError::Conflict(format!(
                    "account '{}' still has transactions",
                    model.name
                )));
            }

            let payment_category_id =
                parse_opt_uuid(model.payment_category_id.as_deref(), "payment category")?;
            accounts::Entity::delete_by_id(model.id)
                .exec(&db_tx)
                .await?;
            if let Some(category_id) = payment_category_id {
                categories::Entity::update_many()
                    .col_expr(categories::Column::Hidden, Expr::value(true))
                    .filter(categories::Column::Id.eq(category_id.to_string()))
                    .exec(&db_tx)
                    .await?;
            }
            tracing::debug!(%account_id, "deleted account");
            Ok(())
        })
    }
}
