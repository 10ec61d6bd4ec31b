//! Ownership resolution.
//!
//! Each entity has one function returning the id of the budget it belongs
//! to. Authorization is then a single call to [`Engine::require_budget_access`]:
//! an absent budget is `NotFound`, someone else's budget is `Forbidden`.

use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, accounts, budgets, categories, category_groups, goals, payees,
    transactions, users, util::parse_uuid,
};

use super::Engine;

/// Generates `budget_of_*` for an entity carrying a `budget_id` column, plus
/// a loader returning the row when it belongs to a given budget.
macro_rules! impl_budget_owned {
    ($budget_of:ident, $require_in_budget:ident, $entity:ident, $label:literal) => {
        pub(super) async fn $budget_of(
            &self,
            db: &DatabaseTransaction,
            id: Uuid,
        ) -> ResultEngine<Uuid> {
            let model = $entity::Entity::find_by_id(id.to_string())
                .one(db)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(concat!($label, " not exists").to_string()))?;
            parse_uuid(&model.budget_id, "budget")
        }

        pub(super) async fn $require_in_budget(
            &self,
            db: &DatabaseTransaction,
            budget_id: Uuid,
            id: Uuid,
        ) -> ResultEngine<$entity::Model> {
            let model = $entity::Entity::find_by_id(id.to_string())
                .one(db)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(concat!($label, " not exists").to_string()))?;
            if model.budget_id != budget_id.to_string() {
                return Err(EngineError::Forbidden(
                    concat!($label, " belongs to another budget").to_string(),
                ));
            }
            Ok(model)
        }
    };
}

impl Engine {
    impl_budget_owned!(
        budget_of_account,
        require_account_in_budget,
        accounts,
        "account"
    );

    impl_budget_owned!(
        budget_of_group,
        require_group_in_budget,
        category_groups,
        "category group"
    );

    impl_budget_owned!(
        budget_of_transaction,
        require_transaction_in_budget,
        transactions,
        "transaction"
    );

    impl_budget_owned!(budget_of_payee, require_payee_in_budget, payees, "payee");

    /// Category → group → budget, in one query.
    pub(super) async fn budget_of_category(
        &self,
        db: &DatabaseTransaction,
        category_id: Uuid,
    ) -> ResultEngine<Uuid> {
        let (_, group) = self.category_with_group(db, category_id).await?;
        parse_uuid(&group.budget_id, "budget")
    }

    pub(super) async fn budget_of_goal(
        &self,
        db: &DatabaseTransaction,
        goal_id: Uuid,
    ) -> ResultEngine<Uuid> {
        let goal = goals::Entity::find_by_id(goal_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("goal not exists".to_string()))?;
        let category_id = parse_uuid(&goal.category_id, "category")?;
        self.budget_of_category(db, category_id).await
    }

    pub(super) async fn category_with_group(
        &self,
        db: &DatabaseTransaction,
        category_id: Uuid,
    ) -> ResultEngine<(categories::Model, category_groups::Model)> {
        let (category, group) = categories::Entity::find_by_id(category_id.to_string())
            .find_also_related(category_groups::Entity)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))?;
        let group = group
            .ok_or_else(|| EngineError::KeyNotFound("category group not exists".to_string()))?;
        Ok((category, group))
    }

    pub(super) async fn require_category_in_budget(
        &self,
        db: &DatabaseTransaction,
        budget_id: Uuid,
        category_id: Uuid,
    ) -> ResultEngine<categories::Model> {
        let (category, group) = self.category_with_group(db, category_id).await?;
        if group.budget_id != budget_id.to_string() {
            return Err(EngineError::Forbidden(
                "category belongs to another budget".to_string(),
            ));
        }
        Ok(category)
    }

    pub(super) async fn require_user_exists(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<()> {
        users::Entity::find_by_id(user_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))?;
        Ok(())
    }

    /// Fails closed: absent budget is `NotFound`, another user's is `Forbidden`.
    pub(super) async fn require_budget_access(
        &self,
        db: &DatabaseTransaction,
        budget_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<budgets::Model> {
        let model = budgets::Entity::find_by_id(budget_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("budget not exists".to_string()))?;
        if model.user_id != user_id {
            return Err(EngineError::Forbidden(
                "budget belongs to another user".to_string(),
            ));
        }
        Ok(model)
    }

    /// Resolves the account's budget and checks the caller owns it.
    pub(super) async fn require_account(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<accounts::Model> {
        let budget_id = self.budget_of_account(db, account_id).await?;
        self.require_budget_access(db, budget_id, user_id).await?;
        self.require_account_in_budget(db, budget_id, account_id)
            .await
    }

    pub(super) async fn require_category(
        &self,
        db: &DatabaseTransaction,
        category_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<(categories::Model, category_groups::Model)> {
        let (category, group) = self.category_with_group(db, category_id).await?;
        let budget_id = parse_uuid(&group.budget_id, "budget")?;
        self.require_budget_access(db, budget_id, user_id).await?;
        Ok((category, group))
    }

    pub(super) async fn require_group(
        &self,
        db: &DatabaseTransaction,
        group_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<category_groups::Model> {
        let budget_id = self.budget_of_group(db, group_id).await?;
        self.require_budget_access(db, budget_id, user_id).await?;
        self.require_group_in_budget(db, budget_id, group_id).await
    }

    pub(super) async fn require_transaction(
        &self,
        db: &DatabaseTransaction,
        transaction_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<transactions::Model> {
        let budget_id = self.budget_of_transaction(db, transaction_id).await?;
        self.require_budget_access(db, budget_id, user_id).await?;
        self.require_transaction_in_budget(db, budget_id, transaction_id)
            .await
    }

    pub(super) async fn require_payee(
        &self,
        db: &DatabaseTransaction,
        payee_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<payees::Model> {
        let budget_id = self.budget_of_payee(db, payee_id).await?;
        self.require_budget_access(db, budget_id, user_id).await?;
        self.require_payee_in_budget(db, budget_id, payee_id).await
    }

    /// Account whose payment category is `category_id`, if any.
    pub(super) async fn card_of_payment_category(
        &self,
        db: &DatabaseTransaction,
        category_id: Uuid,
    ) -> ResultEngine<Option<accounts::Model>> {
        accounts::Entity::find()
            .filter(accounts::Column::PaymentCategoryId.eq(category_id.to_string()))
            .one(db)
            .await
            .map_err(Into::into)
    }

    pub(super) async fn is_payment_category(
        &self,
        db: &DatabaseTransaction,
        category_id: Uuid,
    ) -> ResultEngine<bool> {
        Ok(self
            .card_of_payment_category(db, category_id)
            .await?
            .is_some())
    }
}
