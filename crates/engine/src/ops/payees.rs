use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    EngineError, Payee, PayeeRef, ResultEngine, payees,
    util::{normalize_payee_key, parse_uuid},
};

use super::{Engine, normalize_required_name, with_tx};

impl Engine {
    /// Resolves a payee reference inside `budget_id`, creating the payee when
    /// referenced by an unknown name.
    pub(super) async fn resolve_payee(
        &self,
        db: &DatabaseTransaction,
        budget_id: Uuid,
        payee: &PayeeRef,
    ) -> ResultEngine<Uuid> {
        match payee {
            PayeeRef::Id(id) => {
                self.require_payee_in_budget(db, budget_id, *id).await?;
                Ok(*id)
            }
            PayeeRef::Name(name) => self.find_or_create_payee(db, budget_id, name).await,
        }
    }

    pub(super) async fn find_or_create_payee(
        &self,
        db: &DatabaseTransaction,
        budget_id: Uuid,
        name: &str,
    ) -> ResultEngine<Uuid> {
        let name = normalize_required_name(name, "payee")?;
        let name_norm = normalize_payee_key(&name);
        let existing = payees::Entity::find()
            .filter(payees::Column::BudgetId.eq(budget_id.to_string()))
            .filter(payees::Column::NameNorm.eq(name_norm.clone()))
            .one(db)
            .await?;
        if let Some(model) = existing {
            return parse_uuid(&model.id, "payee");
        }

        let id = Uuid::new_v4();
        payees::ActiveModel {
            id: ActiveValue::Set(id.to_string()),
            budget_id: ActiveValue::Set(budget_id.to_string()),
            name: ActiveValue::Set(name),
            name_norm: ActiveValue::Set(name_norm),
        }
        .insert(db)
        .await?;
        tracing::debug!(%budget_id, payee_id = %id, "created payee");
        Ok(id)
    }

    /// Lists the payees of a budget ordered by name.
    pub async fn list_payees(&self, budget_id: Uuid, user_id: &str) -> ResultEngine<Vec<Payee>> {
        with_tx!(self, |db_tx| {
            self.require_budget_access(&db_tx, budget_id, user_id)
                .await?;
            let models = payees::Entity::find()
                .filter(payees::Column::BudgetId.eq(budget_id.to_string()))
                .order_by_asc(payees::Column::NameNorm)
                .all(&db_tx)
                .await?;
            models.into_iter().map(Payee::try_from).collect()
        })
    }

    /// Renames a payee. Fails with a conflict when another payee of the
    /// budget already uses the (normalized) name.
    pub async fn rename_payee(
        &self,
        payee_id: Uuid,
        name: &str,
        user_id: &str,
    ) -> ResultEngine<Payee> {
        let name = normalize_required_name(name, "payee")?;
        let name_norm = normalize_payee_key(&name);
        with_tx!(self, |db_tx| {
            let model = self.require_payee(&db_tx, payee_id, user_id).await?;

            let clash = payees::Entity::find()
                .filter(payees::Column::BudgetId.eq(model.budget_id.clone()))
                .filter(payees::Column::NameNorm.eq(name_norm.clone()))
                .filter(payees::Column::Id.ne(model.id.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if clash {
                return Err(EngineError::ExistingKey(name));
            }

            let mut active: payees::ActiveModel = model.into();
            active.name = ActiveValue::Set(name);
            active.name_norm = ActiveValue::Set(name_norm);
            let updated = active.update(&db_tx).await?;
            Payee::try_from(updated)
        })
    }
}
