use chrono::Utc;
use sea_orm::{DatabaseTransaction, TransactionTrait};

use crate::{
    EngineError, MoneyCents, ResultEngine, SplitLine, Transaction, UpdateTransactionCmd,
};

use super::{
    super::{Engine, with_tx},
    helpers::{apply_optional_text_patch, ensure_unlocked},
};

impl Engine {
    /// Updates a transaction.
    ///
    /// When the account, amount, date, or category changes, the card
    /// adjustment recorded for the old values is reversed and the new one is
    /// applied, each against its own month. Memo, payee, cleared, and
    /// approval edits leave budget entries untouched.
    ///
    /// Transfers accept amount and date changes (mirrored onto the sibling)
    /// plus per-row memo, cleared, and approval edits. A split header's
    /// amount is fixed; use [`Engine::replace_splits`] to edit its lines.
    ///
    /// Returns the updated row(s), the edited row first.
    pub async fn update_transaction(
        &self,
        cmd: UpdateTransactionCmd,
    ) -> ResultEngine<Vec<Transaction>> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_transaction(&db_tx, cmd.transaction_id, &cmd.user_id)
                .await?;
            let tx = self.load_transaction(&db_tx, model).await?;
            ensure_unlocked(&tx)?;

            let updated = if tx.is_transfer {
                self.update_transfer(&db_tx, tx, &cmd).await?
            } else {
                vec![self.update_regular(&db_tx, tx, &cmd).await?]
            };
            Ok(updated)
        })
    }

    async fn update_regular(
        &self,
        db: &DatabaseTransaction,
        mut tx: Transaction,
        cmd: &UpdateTransactionCmd,
    ) -> ResultEngine<Transaction> {
        if tx.is_split {
            if cmd.amount.is_some_and(|amount| amount != tx.amount) {
                return Err(EngineError::InvalidSplit(
                    "the total of a split transaction cannot change, edit its lines instead"
                        .to_string(),
                ));
            }
            if matches!(cmd.category, Some(Some(_))) {
                return Err(EngineError::InvalidSplit(
                    "a split header cannot carry a category".to_string(),
                ));
            }
        }

        let old = tx.clone();
        let old_account = self.account_model(db, tx.account_id).await?;
        let account = match cmd.account_id {
            Some(account_id) if account_id != tx.account_id => {
                let account = self
                    .require_account_in_budget(db, tx.budget_id, account_id)
                    .await?;
                if account.is_closed {
                    return Err(EngineError::InvalidAccount(format!(
                        "account '{}' is closed",
                        account.name
                    )));
                }
                self.ensure_import_id_free(db, account_id, tx.import_id.as_deref())
                    .await?;
                tx.account_id = account_id;
                account
            }
            _ => old_account.clone(),
        };

        if let Some(amount) = cmd.amount {
            tx.amount = amount;
        }
        if let Some(date) = cmd.date {
            tx.date = date;
        }
        if let Some(category_id) = cmd.category {
            tx.category_id = category_id;
        }
        if let Some(payee) = &cmd.payee {
            tx.payee_id = match payee {
                Some(payee) => Some(self.resolve_payee(db, tx.budget_id, payee).await?),
                None => None,
            };
        }
        tx.memo = apply_optional_text_patch(tx.memo, cmd.memo.as_deref());
        if let Some(cleared) = cmd.cleared {
            tx.cleared = cleared;
        }
        if let Some(approved) = cmd.approved {
            tx.approved = approved;
        }
        tx.updated_at = Utc::now();

        let ledger_changed = tx.account_id != old.account_id
            || tx.amount != old.amount
            || tx.date != old.date
            || tx.category_id != old.category_id;

        if ledger_changed {
            if tx.is_split {
                let lines: Vec<SplitLine> = tx
                    .splits
                    .iter()
                    .map(|line| SplitLine::new(line.category_id, line.amount))
                    .collect();
                self.validate_split_categories(db, tx.budget_id, &account, &lines)
                    .await?;
            } else {
                self.validate_posting_category(db, tx.budget_id, &account, tx.category_id, tx.amount)
                    .await?;
            }
            self.reverse_row_card_effects(db, &old_account, &old)
                .await?;
            self.apply_row_card_effects(db, &account, None, &mut tx)
                .await?;
        }

        self.save_transaction(db, &tx).await?;
        tracing::debug!(
            transaction_id = %tx.id,
            ledger_changed,
            amount = %tx.amount,
            "updated transaction"
        );
        Ok(tx)
    }

    async fn update_transfer(
        &self,
        db: &DatabaseTransaction,
        mut tx: Transaction,
        cmd: &UpdateTransactionCmd,
    ) -> ResultEngine<Vec<Transaction>> {
        if cmd.account_id.is_some() || cmd.category.is_some() || cmd.payee.is_some() {
            return Err(EngineError::InvalidTransfer(
                "account, category and payee of a transfer cannot change, delete and recreate it"
                    .to_string(),
            ));
        }
        let mut sibling = self
            .transfer_sibling(db, &tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("transfer sibling not exists".to_string()))?;
        ensure_unlocked(&sibling)?;

        if let Some(amount) = cmd.amount {
            if amount.is_zero() {
                return Err(EngineError::InvalidTransfer(
                    "transfer amount must not be zero".to_string(),
                ));
            }
            if amount.is_negative() != tx.amount.is_negative() {
                return Err(EngineError::InvalidTransfer(
                    "cannot reverse the direction of a transfer".to_string(),
                ));
            }
        }

        let new_amount = cmd.amount.unwrap_or(tx.amount);
        let new_date = cmd.date.unwrap_or(tx.date);
        let ledger_changed = new_amount != tx.amount || new_date != tx.date;

        if ledger_changed {
            let mirrored = MoneyCents::ZERO
                .checked_sub(new_amount)
                .ok_or_else(|| EngineError::InvalidAmount("amount overflow".to_string()))?;
            let account = self.account_model(db, tx.account_id).await?;
            let other = self.account_model(db, sibling.account_id).await?;

            self.reverse_row_card_effects(db, &account, &tx).await?;
            self.reverse_row_card_effects(db, &other, &sibling)
                .await?;

            tx.amount = new_amount;
            tx.date = new_date;
            sibling.amount = mirrored;
            sibling.date = new_date;

            self.apply_row_card_effects(db, &account, Some(&other), &mut tx)
                .await?;
            self.apply_row_card_effects(db, &other, Some(&account), &mut sibling)
                .await?;
        }

        tx.memo = apply_optional_text_patch(tx.memo, cmd.memo.as_deref());
        if let Some(cleared) = cmd.cleared {
            tx.cleared = cleared;
        }
        if let Some(approved) = cmd.approved {
            tx.approved = approved;
        }
        let now = Utc::now();
        tx.updated_at = now;
        sibling.updated_at = now;

        self.save_transaction(db, &tx).await?;
        self.save_transaction(db, &sibling).await?;
        tracing::debug!(
            transaction_id = %tx.id,
            sibling_id = %sibling.id,
            ledger_changed,
            amount = %tx.amount,
            "updated transfer"
        );
        Ok(vec![tx, sibling])
    }
}
