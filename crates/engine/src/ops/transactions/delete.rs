use chrono::Utc;
use sea_orm::{TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, SplitLine, Transaction, transactions};

use super::{
    super::{Engine, with_tx},
    build_split_rows,
    helpers::{ensure_unlocked, validate_split_lines},
};

impl Engine {
    /// Deletes a transaction. A transfer takes its sibling with it; a split
    /// header takes its lines. Card adjustments recorded for the deleted
    /// rows are reversed first.
    ///
    /// Returns the ids of the deleted rows.
    pub async fn delete_transaction(
        &self,
        transaction_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Vec<Uuid>> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_transaction(&db_tx, transaction_id, user_id)
                .await?;
            let tx = self.load_transaction(&db_tx, model).await?;
            ensure_unlocked(&tx)?;

            let mut rows = vec![tx];
            if rows[0].is_transfer
                && let Some(sibling) = self.transfer_sibling(&db_tx, &rows[0]).await?
            {
                ensure_unlocked(&sibling)?;
                rows.push(sibling);
            }

            let mut deleted = Vec::with_capacity(rows.len());
            for row in &rows {
                let account = self.account_model(&db_tx, row.account_id).await?;
                self.reverse_row_card_effects(&db_tx, &account, row).await?;
                if row.is_split {
                    self.delete_splits(&db_tx, row.id).await?;
                }
                transactions::Entity::delete_by_id(row.id.to_string())
                    .exec(&db_tx)
                    .await?;
                deleted.push(row.id);
            }

            tracing::debug!(
                transaction_id = %transaction_id,
                rows = deleted.len(),
                "deleted transaction"
            );
            Ok(deleted)
        })
    }

    /// Replaces the lines of a split transaction. The new lines must sum to
    /// the header amount.
    pub async fn replace_splits(
        &self,
        transaction_id: Uuid,
        lines: Vec<SplitLine>,
        user_id: &str,
    ) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_transaction(&db_tx, transaction_id, user_id)
                .await?;
            let mut tx = self.load_transaction(&db_tx, model).await?;
            ensure_unlocked(&tx)?;
            if !tx.is_split {
                return Err(EngineError::InvalidSplit(
                    "transaction is not split".to_string(),
                ));
            }

            validate_split_lines(tx.amount, &lines)?;
            let account = self.account_model(&db_tx, tx.account_id).await?;
            self.validate_split_categories(&db_tx, tx.budget_id, &account, &lines)
                .await?;

            self.reverse_row_card_effects(&db_tx, &account, &tx).await?;
            self.delete_splits(&db_tx, tx.id).await?;

            tx.splits = build_split_rows(tx.id, &lines);
            self.apply_row_card_effects(&db_tx, &account, None, &mut tx)
                .await?;
            self.insert_splits(&db_tx, &tx.splits).await?;
            tx.updated_at = Utc::now();
            self.save_transaction(&db_tx, &tx).await?;

            tracing::debug!(
                transaction_id = %tx.id,
                split_lines = tx.splits.len(),
                "replaced split lines"
            );
            Ok(tx)
        })
    }
}
