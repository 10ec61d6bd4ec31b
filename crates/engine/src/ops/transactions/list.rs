use base64::Engine as _;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sea_orm::{
    Condition, QueryFilter, QueryOrder, QuerySelect, QueryTrait, TransactionTrait, prelude::*,
};

use crate::{EngineError, ResultEngine, Transaction, splits, transactions};

use super::super::{Engine, with_tx};

/// Filters for listing transactions.
///
/// `from` is inclusive and `to` is exclusive (`[from, to)`).
#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    pub account_id: Option<Uuid>,
    /// Matches the row's category or any of its split lines.
    pub category_id: Option<Uuid>,
    pub payee_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// If false, transfer rows are left out (default: false).
    pub include_transfers: bool,
    /// If true, only rows still awaiting approval.
    pub only_unapproved: bool,
}

fn validate_list_filter(filter: &TransactionListFilter) -> ResultEngine<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from >= to
    {
        return Err(EngineError::InvalidAmount(
            "empty date range: `from` must precede `to`".to_string(),
        ));
    }
    Ok(())
}

trait ApplyTxFilters: QueryFilter + Sized {
    fn apply_tx_filters(self, filter: &TransactionListFilter) -> Self;
}

impl<T> ApplyTxFilters for T
where
    T: QueryFilter + Sized,
{
    fn apply_tx_filters(mut self, filter: &TransactionListFilter) -> Self {
        if let Some(account_id) = filter.account_id {
            self = self.filter(transactions::Column::AccountId.eq(account_id.to_string()));
        }
        if let Some(payee_id) = filter.payee_id {
            self = self.filter(transactions::Column::PayeeId.eq(payee_id.to_string()));
        }
        if let Some(category_id) = filter.category_id {
            let split_parents = splits::Entity::find()
                .select_only()
                .column(splits::Column::TransactionId)
                .filter(splits::Column::CategoryId.eq(category_id.to_string()))
                .into_query();
            self = self.filter(
                Condition::any()
                    .add(transactions::Column::CategoryId.eq(category_id.to_string()))
                    .add(transactions::Column::Id.in_subquery(split_parents)),
            );
        }
        if let Some(from) = filter.from {
            self = self.filter(transactions::Column::Date.gte(from));
        }
        if let Some(to) = filter.to {
            self = self.filter(transactions::Column::Date.lt(to));
        }
        if !filter.include_transfers {
            self = self.filter(transactions::Column::IsTransfer.eq(false));
        }
        if filter.only_unapproved {
            self = self.filter(transactions::Column::Approved.eq(false));
        }
        self
    }
}

/// Position after the last row of a page: `(date, id)` of that row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct PageCursor {
    #[serde(rename = "d")]
    date: NaiveDate,
    #[serde(rename = "id")]
    transaction_id: String,
}

fn bad_cursor() -> EngineError {
    EngineError::InvalidCursor("unreadable page cursor".to_string())
}

impl PageCursor {
    fn after(tx: &Transaction) -> Self {
        Self {
            date: tx.date,
            transaction_id: tx.id.to_string(),
        }
    }

    fn encode(&self) -> ResultEngine<String> {
        let json = serde_json::to_vec(self).map_err(|_| bad_cursor())?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(json))
    }

    fn decode(token: &str) -> ResultEngine<Self> {
        let json = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|_| bad_cursor())?;
        serde_json::from_slice(&json).map_err(|_| bad_cursor())
    }

    /// Rows strictly older than the cursor in `(date DESC, id DESC)` order.
    fn older_rows(&self) -> Condition {
        Condition::any()
            .add(transactions::Column::Date.lt(self.date))
            .add(
                Condition::all()
                    .add(transactions::Column::Date.eq(self.date))
                    .add(transactions::Column::Id.lt(self.transaction_id.clone())),
            )
    }
}

impl Engine {
    /// Lists the transactions of a budget, newest first.
    ///
    /// Rows are ordered by `(date DESC, id DESC)`. The returned token, when
    /// present, continues after the last row of the page. Split headers come
    /// back with their lines.
    pub async fn list_transactions(
        &self,
        budget_id: Uuid,
        user_id: &str,
        limit: u64,
        cursor: Option<&str>,
        filter: &TransactionListFilter,
    ) -> ResultEngine<(Vec<Transaction>, Option<String>)> {
        if limit == 0 {
            return Err(EngineError::InvalidCursor(
                "page limit must be at least 1".to_string(),
            ));
        }
        validate_list_filter(filter)?;
        let after = cursor.map(PageCursor::decode).transpose()?;
        with_tx!(self, |db_tx| {
            self.require_budget_access(&db_tx, budget_id, user_id)
                .await?;
            if let Some(account_id) = filter.account_id {
                self.require_account_in_budget(&db_tx, budget_id, account_id)
                    .await?;
            }

            let mut query = transactions::Entity::find()
                .filter(transactions::Column::BudgetId.eq(budget_id.to_string()))
                .apply_tx_filters(filter)
                .order_by_desc(transactions::Column::Date)
                .order_by_desc(transactions::Column::Id)
                .limit(limit.saturating_add(1));
            if let Some(after) = &after {
                query = query.filter(after.older_rows());
            }

            let mut models = query.all(&db_tx).await?;
            let page_size = usize::try_from(limit).unwrap_or(usize::MAX);
            let more = models.len() > page_size;
            models.truncate(page_size);

            let mut page = Vec::with_capacity(models.len());
            for model in models {
                page.push(self.load_transaction(&db_tx, model).await?);
            }
            let next = match page.last() {
                Some(last) if more => Some(PageCursor::after(last).encode()?),
                _ => None,
            };
            tracing::debug!(%budget_id, rows = page.len(), more, "listed transactions");
            Ok((page, next))
        })
    }
}
