use chrono::Utc;
use sea_orm::{DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, MoneyCents, NewTransactionCmd, ResultEngine, Transaction, accounts, transactions,
};

use super::{
    super::{Engine, normalize_optional_text, with_tx},
    build_split_rows,
    helpers::{check_transfer_category, transfer_category_rule, validate_split_lines},
};

fn ensure_open(account: &accounts::Model) -> ResultEngine<()> {
    if account.is_closed {
        return Err(EngineError::InvalidAccount(format!(
            "account '{}' is closed",
            account.name
        )));
    }
    Ok(())
}

fn blank_row(cmd: &NewTransactionCmd, payee_id: Option<Uuid>) -> Transaction {
    let now = Utc::now();
    Transaction {
        id: Uuid::new_v4(),
        budget_id: cmd.budget_id,
        account_id: cmd.account_id,
        payee_id,
        category_id: None,
        amount: cmd.amount,
        date: cmd.date,
        memo: normalize_optional_text(cmd.memo.as_deref()),
        cleared: cmd.cleared,
        approved: cmd.approved,
        is_transfer: false,
        transfer_group_id: None,
        transfer_account_id: None,
        is_split: false,
        card_adjustment: None,
        import_id: normalize_optional_text(cmd.import_id.as_deref()),
        created_at: now,
        updated_at: now,
        splits: Vec::new(),
    }
}

impl Engine {
    /// Creates a transaction.
    ///
    /// - With `transfer_account_id`: two rows sharing a new transfer group,
    ///   with opposite amounts. The category rule depends on which side is
    ///   on budget.
    /// - With split lines: a header without category plus one child per
    ///   line; the lines must sum to the header amount.
    /// - Otherwise a single row.
    ///
    /// Card accounts run the credit-card subroutine in the same DB
    /// transaction. Returns the created row(s), source row first.
    pub async fn create_transaction(&self, cmd: NewTransactionCmd) -> ResultEngine<Vec<Transaction>> {
        with_tx!(self, |db_tx| {
            self.require_budget_access(&db_tx, cmd.budget_id, &cmd.user_id)
                .await?;
            let account = self
                .require_account_in_budget(&db_tx, cmd.budget_id, cmd.account_id)
                .await?;
            ensure_open(&account)?;

            let payee_id = match &cmd.payee {
                Some(payee) => Some(self.resolve_payee(&db_tx, cmd.budget_id, payee).await?),
                None => None,
            };

            let created = match cmd.transfer_account_id {
                Some(destination_id) => {
                    self.create_transfer_rows(&db_tx, &cmd, &account, destination_id, payee_id)
                        .await?
                }
                None => vec![
                    self.create_regular_row(&db_tx, &cmd, &account, payee_id)
                        .await?,
                ],
            };
            Ok(created)
        })
    }

    pub(super) async fn ensure_import_id_free(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
        import_id: Option<&str>,
    ) -> ResultEngine<()> {
        let Some(import_id) = import_id else {
            return Ok(());
        };
        let exists = transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account_id.to_string()))
            .filter(transactions::Column::ImportId.eq(import_id))
            .one(db)
            .await?
            .is_some();
        if exists {
            return Err(EngineError::ExistingKey(import_id.to_string()));
        }
        Ok(())
    }

    async fn create_regular_row(
        &self,
        db: &DatabaseTransaction,
        cmd: &NewTransactionCmd,
        account: &accounts::Model,
        payee_id: Option<Uuid>,
    ) -> ResultEngine<Transaction> {
        let mut tx = blank_row(cmd, payee_id);
        self.ensure_import_id_free(db, cmd.account_id, tx.import_id.as_deref())
            .await?;

        if cmd.splits.is_empty() {
            self.validate_posting_category(db, cmd.budget_id, account, cmd.category_id, cmd.amount)
                .await?;
            tx.category_id = cmd.category_id;
        } else {
            if cmd.category_id.is_some() {
                return Err(EngineError::InvalidSplit(
                    "a split header cannot carry a category".to_string(),
                ));
            }
            validate_split_lines(cmd.amount, &cmd.splits)?;
            self.validate_split_categories(db, cmd.budget_id, account, &cmd.splits)
                .await?;
            tx.is_split = true;
            tx.splits = build_split_rows(tx.id, &cmd.splits);
        }

        self.apply_row_card_effects(db, account, None, &mut tx)
            .await?;
        self.insert_transaction(db, &tx).await?;
        tracing::debug!(
            transaction_id = %tx.id,
            account_id = %tx.account_id,
            amount = %tx.amount,
            split_lines = tx.splits.len(),
            "created transaction"
        );
        Ok(tx)
    }

    async fn create_transfer_rows(
        &self,
        db: &DatabaseTransaction,
        cmd: &NewTransactionCmd,
        account: &accounts::Model,
        destination_id: Uuid,
        payee_id: Option<Uuid>,
    ) -> ResultEngine<Vec<Transaction>> {
        if destination_id == cmd.account_id {
            return Err(EngineError::InvalidTransfer(
                "cannot transfer to the same account".to_string(),
            ));
        }
        if !cmd.splits.is_empty() {
            return Err(EngineError::InvalidTransfer(
                "transfers cannot be split".to_string(),
            ));
        }
        if cmd.amount.is_zero() {
            return Err(EngineError::InvalidTransfer(
                "transfer amount must not be zero".to_string(),
            ));
        }
        let mirrored = MoneyCents::ZERO
            .checked_sub(cmd.amount)
            .ok_or_else(|| EngineError::InvalidAmount("amount overflow".to_string()))?;

        let other = self
            .require_account_in_budget(db, cmd.budget_id, destination_id)
            .await?;
        ensure_open(&other)?;

        let (from, to) = if cmd.amount.is_negative() {
            (account, &other)
        } else {
            (&other, account)
        };
        check_transfer_category(
            transfer_category_rule(from.on_budget, to.on_budget),
            cmd.category_id,
        )?;
        if let Some(category_id) = cmd.category_id {
            self.require_category_in_budget(db, cmd.budget_id, category_id)
                .await?;
            if self.is_payment_category(db, category_id).await? {
                return Err(EngineError::InvalidCategory(
                    "a transfer cannot be categorized to a payment category".to_string(),
                ));
            }
        }

        let group_id = Uuid::new_v4();

        let mut source = blank_row(cmd, payee_id);
        self.ensure_import_id_free(db, cmd.account_id, source.import_id.as_deref())
            .await?;
        source.is_transfer = true;
        source.transfer_group_id = Some(group_id);
        source.transfer_account_id = Some(destination_id);
        source.category_id = cmd.category_id.filter(|_| account.on_budget);

        let mut sibling = blank_row(cmd, payee_id);
        sibling.account_id = destination_id;
        sibling.amount = mirrored;
        sibling.import_id = None;
        sibling.is_transfer = true;
        sibling.transfer_group_id = Some(group_id);
        sibling.transfer_account_id = Some(cmd.account_id);
        sibling.category_id = cmd.category_id.filter(|_| other.on_budget);

        self.apply_row_card_effects(db, account, Some(&other), &mut source)
            .await?;
        self.apply_row_card_effects(db, &other, Some(account), &mut sibling)
            .await?;
        self.insert_transaction(db, &source).await?;
        self.insert_transaction(db, &sibling).await?;

        tracing::debug!(
            transfer_group_id = %group_id,
            from_account = %source.account_id,
            to_account = %sibling.account_id,
            amount = %source.amount,
            "created transfer"
        );
        Ok(vec![source, sibling])
    }
}
