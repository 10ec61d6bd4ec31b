//! Budget entries: the per-month assigned amount of a category.
//!
//! All writes go through three primitives that take the caller's open
//! transaction:
//!
//! - [`Engine::adjust_entry`] adds a signed delta (`assigned = assigned + delta`)
//! - [`Engine::set_entry`] stores an absolute value
//! - [`Engine::take_from_entry`] decrements only if enough is assigned
//!
//! Rows are upserted on `(category_id, year, month)` so a missing entry is
//! created on first touch.

use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*,
    sea_query::{Expr, OnConflict},
};
use uuid::Uuid;

use crate::{
    BudgetEntry, BudgetMonth, EngineError, MoneyCents, MoveMoneyCmd, ResultEngine,
    budget_entries, util::parse_uuid,
};

use super::{Engine, with_tx};

fn entry_filter(category_id: Uuid, month: BudgetMonth) -> sea_orm::Condition {
    sea_orm::Condition::all()
        .add(budget_entries::Column::CategoryId.eq(category_id.to_string()))
        .add(budget_entries::Column::Year.eq(month.year()))
        .add(budget_entries::Column::Month.eq(month.month() as i32))
}

fn new_entry(category_id: Uuid, month: BudgetMonth, assigned: MoneyCents) -> budget_entries::ActiveModel {
    budget_entries::ActiveModel {
        id: ActiveValue::Set(Uuid::new_v4().to_string()),
        category_id: ActiveValue::Set(category_id.to_string()),
        year: ActiveValue::Set(month.year()),
        month: ActiveValue::Set(month.month() as i32),
        assigned_minor: ActiveValue::Set(assigned.cents()),
        updated_at: ActiveValue::Set(Utc::now()),
    }
}

fn entry_conflict_key() -> OnConflict {
    OnConflict::columns([
        budget_entries::Column::CategoryId,
        budget_entries::Column::Year,
        budget_entries::Column::Month,
    ])
    .to_owned()
}

impl Engine {
    /// Assigned amount for the month, 0 when no entry exists.
    pub(super) async fn assigned_amount(
        &self,
        db: &DatabaseTransaction,
        category_id: Uuid,
        month: BudgetMonth,
    ) -> ResultEngine<MoneyCents> {
        let model = budget_entries::Entity::find()
            .filter(entry_filter(category_id, month))
            .one(db)
            .await?;
        Ok(model
            .map(|m| MoneyCents::new(m.assigned_minor))
            .unwrap_or(MoneyCents::ZERO))
    }

    pub(super) async fn adjust_entry(
        &self,
        db: &DatabaseTransaction,
        category_id: Uuid,
        month: BudgetMonth,
        delta: MoneyCents,
    ) -> ResultEngine<()> {
        if delta.is_zero() {
            return Ok(());
        }
        let on_conflict = entry_conflict_key()
            .value(
                budget_entries::Column::AssignedMinor,
                Expr::col(budget_entries::Column::AssignedMinor).add(delta.cents()),
            )
            .value(budget_entries::Column::UpdatedAt, Utc::now())
            .to_owned();
        budget_entries::Entity::insert(new_entry(category_id, month, delta))
            .on_conflict(on_conflict)
            .exec_without_returning(db)
            .await?;
        Ok(())
    }

    pub(super) async fn set_entry(
        &self,
        db: &DatabaseTransaction,
        category_id: Uuid,
        month: BudgetMonth,
        amount: MoneyCents,
    ) -> ResultEngine<()> {
        let on_conflict = entry_conflict_key()
            .update_columns([
                budget_entries::Column::AssignedMinor,
                budget_entries::Column::UpdatedAt,
            ])
            .to_owned();
        budget_entries::Entity::insert(new_entry(category_id, month, amount))
            .on_conflict(on_conflict)
            .exec_without_returning(db)
            .await?;
        Ok(())
    }

    /// Guarded decrement: a single conditional update, so the sufficiency
    /// check and the write cannot interleave with another writer.
    pub(super) async fn take_from_entry(
        &self,
        db: &DatabaseTransaction,
        category_id: Uuid,
        month: BudgetMonth,
        amount: MoneyCents,
    ) -> ResultEngine<()> {
        let result = budget_entries::Entity::update_many()
            .col_expr(
                budget_entries::Column::AssignedMinor,
                Expr::col(budget_entries::Column::AssignedMinor).sub(amount.cents()),
            )
            .col_expr(budget_entries::Column::UpdatedAt, Expr::value(Utc::now()).into())
            .filter(entry_filter(category_id, month))
            .filter(budget_entries::Column::AssignedMinor.gte(amount.cents()))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            let available = self.assigned_amount(db, category_id, month).await?;
            return Err(EngineError::InsufficientFunds(format!(
                "category has {available} assigned in {month}, requested {amount}"
            )));
        }
        Ok(())
    }

    async fn entry_snapshot(
        &self,
        db: &DatabaseTransaction,
        category_id: Uuid,
        month: BudgetMonth,
    ) -> ResultEngine<BudgetEntry> {
        Ok(BudgetEntry {
            category_id,
            month,
            assigned: self.assigned_amount(db, category_id, month).await?,
        })
    }

    async fn reject_payment_category(
        &self,
        db: &DatabaseTransaction,
        category_id: Uuid,
    ) -> ResultEngine<()> {
        if self.is_payment_category(db, category_id).await? {
            return Err(EngineError::InvalidCategory(
                "payment categories are funded by card activity or fund_card_payment".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the entry of a category for a month (0 when never assigned).
    pub async fn budget_entry(
        &self,
        category_id: Uuid,
        month: BudgetMonth,
        user_id: &str,
    ) -> ResultEngine<BudgetEntry> {
        with_tx!(self, |db_tx| {
            self.require_category(&db_tx, category_id, user_id).await?;
            self.entry_snapshot(&db_tx, category_id, month).await
        })
    }

    /// Sets the assigned amount of a category for a month.
    ///
    /// This is an absolute set, not a delta. `amount` must be `>= 0`.
    pub async fn assign(
        &self,
        category_id: Uuid,
        month: BudgetMonth,
        amount: MoneyCents,
        user_id: &str,
    ) -> ResultEngine<BudgetEntry> {
        if amount.is_negative() {
            return Err(EngineError::InvalidAmount(
                "assigned amount must be >= 0".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            self.require_category(&db_tx, category_id, user_id).await?;
            self.reject_payment_category(&db_tx, category_id).await?;
            self.set_entry(&db_tx, category_id, month, amount).await?;
            tracing::debug!(%category_id, %month, %amount, "assigned");
            self.entry_snapshot(&db_tx, category_id, month).await
        })
    }

    /// Moves assigned money between two categories of the same budget.
    ///
    /// Fails with `InsufficientFunds` (and changes nothing) when the source
    /// has less than `amount` assigned for the month.
    pub async fn move_money(&self, cmd: MoveMoneyCmd) -> ResultEngine<(BudgetEntry, BudgetEntry)> {
        let MoveMoneyCmd {
            user_id,
            from_category_id,
            to_category_id,
            month,
            amount,
        } = cmd;
        if from_category_id == to_category_id {
            return Err(EngineError::InvalidCategory(
                "source and destination must differ".to_string(),
            ));
        }
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "amount must be > 0".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            let (_, from_group) = self
                .require_category(&db_tx, from_category_id, &user_id)
                .await?;
            let budget_id = parse_uuid(&from_group.budget_id, "budget")?;
            self.require_category_in_budget(&db_tx, budget_id, to_category_id)
                .await?;
            self.reject_payment_category(&db_tx, from_category_id)
                .await?;
            self.reject_payment_category(&db_tx, to_category_id).await?;

            self.take_from_entry(&db_tx, from_category_id, month, amount)
                .await?;
            self.adjust_entry(&db_tx, to_category_id, month, amount)
                .await?;
            tracing::debug!(
                from = %from_category_id,
                to = %to_category_id,
                %month,
                %amount,
                "moved money"
            );

            let from = self
                .entry_snapshot(&db_tx, from_category_id, month)
                .await?;
            let to = self.entry_snapshot(&db_tx, to_category_id, month).await?;
            Ok((from, to))
        })
    }

    /// Direct top-up of a card's payment category, for debt that predates
    /// the budget. Absolute set, `amount >= 0`.
    pub async fn fund_card_payment(
        &self,
        account_id: Uuid,
        month: BudgetMonth,
        amount: MoneyCents,
        user_id: &str,
    ) -> ResultEngine<BudgetEntry> {
        if amount.is_negative() {
            return Err(EngineError::InvalidAmount(
                "assigned amount must be >= 0".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            let account = self.require_account(&db_tx, account_id, user_id).await?;
            let payment_category_id = account
                .payment_category_id
                .as_deref()
                .map(|id| parse_uuid(id, "payment category"))
                .transpose()?
                .ok_or_else(|| {
                    EngineError::InvalidAccount(
                        "account has no payment category".to_string(),
                    )
                })?;
            self.set_entry(&db_tx, payment_category_id, month, amount)
                .await?;
            tracing::debug!(%account_id, %month, %amount, "funded card payment");
            self.entry_snapshot(&db_tx, payment_category_id, month)
                .await
        })
    }
}
