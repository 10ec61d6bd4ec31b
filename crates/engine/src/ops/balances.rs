//! Balance projector.
//!
//! Balances are folded from the ledger on every read and never stored on the
//! account row.

use std::collections::HashMap;

use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{ClearedState, MoneyCents, ResultEngine, accounts, transactions, util::parse_uuid};

use super::{Engine, with_tx};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct AccountBalances {
    pub account_id: Uuid,
    /// Sum of every transaction on the account.
    pub working: MoneyCents,
    /// Sum of cleared and reconciled transactions.
    pub cleared: MoneyCents,
    /// `working - cleared`.
    pub uncleared: MoneyCents,
}

impl AccountBalances {
    fn empty(account_id: Uuid) -> Self {
        Self {
            account_id,
            working: MoneyCents::ZERO,
            cleared: MoneyCents::ZERO,
            uncleared: MoneyCents::ZERO,
        }
    }

    fn post(&mut self, amount: MoneyCents, cleared: ClearedState) -> ResultEngine<()> {
        self.working = self.working.try_add(amount)?;
        if cleared.is_cleared() {
            self.cleared = self.cleared.try_add(amount)?;
        } else {
            self.uncleared = self.uncleared.try_add(amount)?;
        }
        Ok(())
    }
}

impl Engine {
    /// Working, cleared, and uncleared balance of one account.
    pub async fn account_balances(
        &self,
        account_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<AccountBalances> {
        with_tx!(self, |db_tx| {
            let account = self.require_account(&db_tx, account_id, user_id).await?;
            let rows = transactions::Entity::find()
                .filter(transactions::Column::AccountId.eq(account.id))
                .all(&db_tx)
                .await?;
            let mut balances = AccountBalances::empty(account_id);
            for row in rows {
                balances.post(
                    MoneyCents::new(row.amount_minor),
                    ClearedState::try_from(row.cleared.as_str())?,
                )?;
            }
            Ok(balances)
        })
    }

    /// Balances of every account of a budget, closed ones included, ordered
    /// by account name.
    pub async fn budget_account_balances(
        &self,
        budget_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Vec<AccountBalances>> {
        with_tx!(self, |db_tx| {
            self.require_budget_access(&db_tx, budget_id, user_id)
                .await?;
            let account_models = accounts::Entity::find()
                .filter(accounts::Column::BudgetId.eq(budget_id.to_string()))
                .order_by_asc(accounts::Column::Name)
                .all(&db_tx)
                .await?;

            let mut order = Vec::with_capacity(account_models.len());
            let mut by_account: HashMap<String, AccountBalances> = HashMap::new();
            for model in account_models {
                let account_id = parse_uuid(&model.id, "account")?;
                order.push(model.id.clone());
                by_account.insert(model.id, AccountBalances::empty(account_id));
            }

            let rows = transactions::Entity::find()
                .filter(transactions::Column::BudgetId.eq(budget_id.to_string()))
                .all(&db_tx)
                .await?;
            for row in rows {
                let Some(balances) = by_account.get_mut(&row.account_id) else {
                    tracing::warn!(
                        transaction_id = %row.id,
                        account_id = %row.account_id,
                        "transaction on an account outside its budget"
                    );
                    continue;
                };
                balances.post(
                    MoneyCents::new(row.amount_minor),
                    ClearedState::try_from(row.cleared.as_str())?,
                )?;
            }

            Ok(order
                .into_iter()
                .filter_map(|id| by_account.remove(&id))
                .collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncleared_is_working_minus_cleared() {
        let mut balances = AccountBalances::empty(Uuid::new_v4());
        balances
            .post(MoneyCents::new(1000_00), ClearedState::Reconciled)
            .unwrap();
        balances
            .post(MoneyCents::new(-60_00), ClearedState::Cleared)
            .unwrap();
        balances
            .post(MoneyCents::new(-25_50), ClearedState::Uncleared)
            .unwrap();
        assert_eq!(balances.working, MoneyCents::new(914_50));
        assert_eq!(balances.cleared, MoneyCents::new(940_00));
        assert_eq!(balances.uncleared, balances.working - balances.cleared);
    }
}
