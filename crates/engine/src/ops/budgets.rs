use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{Budget, ResultEngine, budgets};

use super::{Engine, normalize_required_name, with_tx};

impl Engine {
    /// Creates an empty budget owned by `user_id`.
    pub async fn new_budget(&self, name: &str, user_id: &str) -> ResultEngine<Budget> {
        let name = normalize_required_name(name, "budget")?;
        with_tx!(self, |db_tx| {
            self.require_user_exists(&db_tx, user_id).await?;
            let budget = Budget::new(name, user_id.to_string());
            let model: budgets::ActiveModel = (&budget).into();
            model.insert(&db_tx).await?;
            tracing::debug!(budget_id = %budget.id, %user_id, "created budget");
            Ok(budget)
        })
    }

    pub async fn budget(&self, budget_id: Uuid, user_id: &str) -> ResultEngine<Budget> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_budget_access(&db_tx, budget_id, user_id)
                .await?;
            Budget::try_from(model)
        })
    }

    /// Budgets of a user, oldest first.
    pub async fn list_budgets(&self, user_id: &str) -> ResultEngine<Vec<Budget>> {
        with_tx!(self, |db_tx| {
            self.require_user_exists(&db_tx, user_id).await?;
            let models = budgets::Entity::find()
                .filter(budgets::Column::UserId.eq(user_id.to_string()))
                .order_by_asc(budgets::Column::CreatedAt)
                .order_by_asc(budgets::Column::Id)
                .all(&db_tx)
                .await?;
            models.into_iter().map(Budget::try_from).collect()
        })
    }

    pub async fn rename_budget(
        &self,
        budget_id: Uuid,
        name: &str,
        user_id: &str,
    ) -> ResultEngine<Budget> {
        let name = normalize_required_name(name, "budget")?;
        with_tx!(self, |db_tx| {
            let model = self
                .require_budget_access(&db_tx, budget_id, user_id)
                .await?;
            let mut active: budgets::ActiveModel = model.into();
            active.name = ActiveValue::Set(name);
            let updated = active.update(&db_tx).await?;
            Budget::try_from(updated)
        })
    }
}
