use chrono::Utc;
use sea_orm::{QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{EngineError, Goal, GoalSpec, ResultEngine, goals};

use super::{Engine, with_tx};

impl Engine {
    /// Sets the goal of a category, replacing any previous one.
    pub async fn upsert_goal(
        &self,
        category_id: Uuid,
        spec: GoalSpec,
        user_id: &str,
    ) -> ResultEngine<Goal> {
        spec.validate()?;
        with_tx!(self, |db_tx| {
            self.require_category(&db_tx, category_id, user_id).await?;
            if self.is_payment_category(&db_tx, category_id).await? {
                return Err(EngineError::InvalidGoal(
                    "payment categories cannot carry a goal".to_string(),
                ));
            }

            let existing = goals::Entity::find()
                .filter(goals::Column::CategoryId.eq(category_id.to_string()))
                .one(&db_tx)
                .await?;
            let goal = match existing {
                Some(model) => {
                    let goal = Goal {
                        spec,
                        ..Goal::try_from(model)?
                    };
                    let active: goals::ActiveModel = (&goal).into();
                    active.update(&db_tx).await?;
                    goal
                }
                None => {
                    let goal = Goal {
                        id: Uuid::new_v4(),
                        category_id,
                        spec,
                        created_at: Utc::now(),
                    };
                    let active: goals::ActiveModel = (&goal).into();
                    active.insert(&db_tx).await?;
                    goal
                }
            };
            tracing::debug!(%category_id, kind = goal.spec.kind_str(), "goal saved");
            Ok(goal)
        })
    }

    /// The goal of a category; `KeyNotFound` when it has none.
    pub async fn goal(&self, category_id: Uuid, user_id: &str) -> ResultEngine<Goal> {
        with_tx!(self, |db_tx| {
            self.require_category(&db_tx, category_id, user_id).await?;
            let model = goals::Entity::find()
                .filter(goals::Column::CategoryId.eq(category_id.to_string()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("goal not exists".to_string()))?;
            Goal::try_from(model)
        })
    }

    pub async fn goal_by_id(&self, goal_id: Uuid, user_id: &str) -> ResultEngine<Goal> {
        with_tx!(self, |db_tx| {
            let budget_id = self.budget_of_goal(&db_tx, goal_id).await?;
            self.require_budget_access(&db_tx, budget_id, user_id)
                .await?;
            let model = goals::Entity::find_by_id(goal_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("goal not exists".to_string()))?;
            Goal::try_from(model)
        })
    }

    /// Removes the goal of a category.
    pub async fn delete_goal(&self, category_id: Uuid, user_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_category(&db_tx, category_id, user_id).await?;
            let deleted = goals::Entity::delete_many()
                .filter(goals::Column::CategoryId.eq(category_id.to_string()))
                .exec(&db_tx)
                .await?;
            if deleted.rows_affected == 0 {
                return Err(EngineError::KeyNotFound("goal not exists".to_string()));
            }
            tracing::debug!(%category_id, "goal deleted");
            Ok(())
        })
    }
}
