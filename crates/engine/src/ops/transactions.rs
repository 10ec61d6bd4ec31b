//! Transaction engine.
//!
//! Creation, update, and deletion of ledger rows, transfer pairs, and split
//! transactions. Each public operation runs in one DB transaction and drives
//! the credit-card subroutine through the same handle.

use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    BudgetMonth, EngineError, MoneyCents, ResultEngine, SplitLine, SplitTransaction, Transaction,
    accounts, splits, transactions, util::parse_uuid,
};

use super::{
    Engine,
    credit_card::{CardEffect, classify_posting, classify_transfer},
    normalize_optional_text, with_tx,
};

mod create;
mod delete;
mod helpers;
mod list;
mod update;

pub use list::TransactionListFilter;

/// Payment category of an on-budget credit card, `None` for any other account.
fn card_payment_category(account: &accounts::Model) -> ResultEngine<Option<Uuid>> {
    if !account.on_budget {
        return Ok(None);
    }
    account
        .payment_category_id
        .as_deref()
        .map(|id| parse_uuid(id, "payment category"))
        .transpose()
}

fn build_split_rows(transaction_id: Uuid, lines: &[SplitLine]) -> Vec<SplitTransaction> {
    lines
        .iter()
        .map(|line| SplitTransaction {
            id: Uuid::new_v4(),
            transaction_id,
            category_id: line.category_id,
            amount: line.amount,
            memo: normalize_optional_text(line.memo.as_deref()),
            card_adjustment: None,
        })
        .collect()
}

impl Engine {
    /// Returns a transaction with its split lines.
    pub async fn transaction(
        &self,
        transaction_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_transaction(&db_tx, transaction_id, user_id)
                .await?;
            self.load_transaction(&db_tx, model).await
        })
    }

    pub(super) async fn load_transaction(
        &self,
        db: &DatabaseTransaction,
        model: transactions::Model,
    ) -> ResultEngine<Transaction> {
        let mut tx = Transaction::try_from(model)?;
        if tx.is_split {
            tx.splits = self.load_splits(db, tx.id).await?;
        }
        Ok(tx)
    }

    async fn load_splits(
        &self,
        db: &DatabaseTransaction,
        transaction_id: Uuid,
    ) -> ResultEngine<Vec<SplitTransaction>> {
        let models = splits::Entity::find()
            .filter(splits::Column::TransactionId.eq(transaction_id.to_string()))
            .order_by_asc(splits::Column::Id)
            .all(db)
            .await?;
        models.into_iter().map(SplitTransaction::try_from).collect()
    }

    /// The other row of a transfer pair.
    async fn transfer_sibling(
        &self,
        db: &DatabaseTransaction,
        tx: &Transaction,
    ) -> ResultEngine<Option<Transaction>> {
        let Some(group_id) = tx.transfer_group_id else {
            return Ok(None);
        };
        let model = transactions::Entity::find()
            .filter(transactions::Column::TransferGroupId.eq(group_id.to_string()))
            .filter(transactions::Column::Id.ne(tx.id.to_string()))
            .one(db)
            .await?;
        match model {
            Some(model) => Ok(Some(Transaction::try_from(model)?)),
            None => {
                tracing::warn!(
                    transaction_id = %tx.id,
                    transfer_group_id = %group_id,
                    "transfer sibling missing"
                );
                Ok(None)
            }
        }
    }

    async fn account_model(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
    ) -> ResultEngine<accounts::Model> {
        accounts::Entity::find_by_id(account_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))
    }

    /// Checks that `category_id` may be used on a non-transfer posting of
    /// `amount` on `account`.
    async fn validate_posting_category(
        &self,
        db: &DatabaseTransaction,
        budget_id: Uuid,
        account: &accounts::Model,
        category_id: Option<Uuid>,
        amount: MoneyCents,
    ) -> ResultEngine<()> {
        let Some(category_id) = category_id else {
            return Ok(());
        };
        if !account.on_budget {
            return Err(EngineError::InvalidCategory(
                "tracking account transactions cannot carry a category".to_string(),
            ));
        }
        self.require_category_in_budget(db, budget_id, category_id)
            .await?;
        if let Some(card) = self.card_of_payment_category(db, category_id).await?
            && (card.id != account.id || !amount.is_positive())
        {
            return Err(EngineError::InvalidCategory(
                "a payment category only accepts inflows on its own card".to_string(),
            ));
        }
        Ok(())
    }

    async fn validate_split_categories(
        &self,
        db: &DatabaseTransaction,
        budget_id: Uuid,
        account: &accounts::Model,
        lines: &[SplitLine],
    ) -> ResultEngine<()> {
        if !account.on_budget {
            return Err(EngineError::InvalidSplit(
                "tracking accounts cannot hold split transactions".to_string(),
            ));
        }
        for line in lines {
            self.validate_posting_category(db, budget_id, account, line.category_id, line.amount)
                .await?;
        }
        Ok(())
    }

    /// Runs the card subroutine for a row that is about to be persisted and
    /// records the moved amounts on the row (or its split lines).
    async fn apply_row_card_effects(
        &self,
        db: &DatabaseTransaction,
        account: &accounts::Model,
        other_account: Option<&accounts::Model>,
        tx: &mut Transaction,
    ) -> ResultEngine<()> {
        tx.card_adjustment = None;
        for line in &mut tx.splits {
            line.card_adjustment = None;
        }
        let Some(payment_category_id) = card_payment_category(account)? else {
            return Ok(());
        };
        let month = BudgetMonth::from_date(tx.date);

        if tx.is_transfer {
            let other_on_budget = other_account.is_some_and(|a| a.on_budget);
            if let Some(effect) = classify_transfer(tx.amount, other_on_budget) {
                tx.card_adjustment = Some(
                    self.apply_card_effect(db, payment_category_id, effect, month)
                        .await?,
                );
            }
        } else if tx.is_split {
            for line in &mut tx.splits {
                if let Some(effect) =
                    classify_posting(payment_category_id, line.category_id, line.amount)
                {
                    line.card_adjustment = Some(
                        self.apply_card_effect(db, payment_category_id, effect, month)
                            .await?,
                    );
                }
            }
        } else if let Some(effect) = classify_posting(payment_category_id, tx.category_id, tx.amount)
        {
            tx.card_adjustment = Some(
                self.apply_card_effect(db, payment_category_id, effect, month)
                    .await?,
            );
        }
        Ok(())
    }

    /// Reverses whatever the card subroutine recorded on a persisted row.
    async fn reverse_row_card_effects(
        &self,
        db: &DatabaseTransaction,
        account: &accounts::Model,
        tx: &Transaction,
    ) -> ResultEngine<()> {
        let has_stored = tx.card_adjustment.is_some()
            || tx.splits.iter().any(|line| line.card_adjustment.is_some());
        if !has_stored {
            return Ok(());
        }
        let Some(payment_category_id) = card_payment_category(account)? else {
            tracing::warn!(
                transaction_id = %tx.id,
                "stored card adjustment on an account without payment category"
            );
            return Ok(());
        };
        let month = BudgetMonth::from_date(tx.date);

        if tx.is_transfer {
            if let Some(moved) = tx.card_adjustment {
                let effect = CardEffect::Payment { amount: tx.amount };
                self.reverse_card_effect(db, payment_category_id, effect, month, moved)
                    .await?;
            }
            return Ok(());
        }

        let postings: Vec<(Option<Uuid>, MoneyCents, Option<MoneyCents>)> = if tx.is_split {
            tx.splits
                .iter()
                .map(|line| (line.category_id, line.amount, line.card_adjustment))
                .collect()
        } else {
            vec![(tx.category_id, tx.amount, tx.card_adjustment)]
        };
        for (category_id, amount, stored) in postings {
            let Some(moved) = stored else {
                continue;
            };
            match classify_posting(payment_category_id, category_id, amount) {
                Some(effect) => {
                    self.reverse_card_effect(db, payment_category_id, effect, month, moved)
                        .await?;
                }
                None => {
                    tracing::warn!(
                        transaction_id = %tx.id,
                        "stored card adjustment on an unclassifiable posting"
                    );
                    self.adjust_entry(db, payment_category_id, month, -moved)
                        .await?;
                }
            }
        }
        Ok(())
    }

    async fn insert_transaction(
        &self,
        db: &DatabaseTransaction,
        tx: &Transaction,
    ) -> ResultEngine<()> {
        let model: transactions::ActiveModel = tx.into();
        model.insert(db).await?;
        self.insert_splits(db, &tx.splits).await
    }

    async fn insert_splits(
        &self,
        db: &DatabaseTransaction,
        lines: &[SplitTransaction],
    ) -> ResultEngine<()> {
        for line in lines {
            let model: splits::ActiveModel = line.into();
            model.insert(db).await?;
        }
        Ok(())
    }

    /// Persists every column of an existing row and the stored card
    /// adjustments of its split lines.
    async fn save_transaction(
        &self,
        db: &DatabaseTransaction,
        tx: &Transaction,
    ) -> ResultEngine<()> {
        let model: transactions::ActiveModel = tx.into();
        model.update(db).await?;
        for line in &tx.splits {
            splits::ActiveModel {
                id: ActiveValue::Unchanged(line.id.to_string()),
                card_adjustment_minor: ActiveValue::Set(line.card_adjustment.map(MoneyCents::cents)),
                ..Default::default()
            }
            .update(db)
            .await?;
        }
        Ok(())
    }

    async fn delete_splits(&self, db: &DatabaseTransaction, transaction_id: Uuid) -> ResultEngine<()> {
        splits::Entity::delete_many()
            .filter(splits::Column::TransactionId.eq(transaction_id.to_string()))
            .exec(db)
            .await?;
        Ok(())
    }
}
