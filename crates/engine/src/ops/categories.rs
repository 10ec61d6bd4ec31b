//! Category groups and categories.
//!
//! Names are unique per parent, compared case-insensitively. The system
//! group and the payment categories it holds are managed by the account
//! flows only.

use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    CARD_PAYMENTS_GROUP, Category, CategoryGroup, EngineError, ResultEngine, budget_entries,
    categories, category_groups, goals, splits, transactions, util::parse_uuid,
};

use super::{Engine, normalize_optional_text, normalize_required_name, with_tx};

/// A group with its categories, both ordered by sort order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryTree {
    pub group: CategoryGroup,
    pub categories: Vec<Category>,
}

fn reject_system_group(group: &category_groups::Model) -> ResultEngine<()> {
    if group.is_system {
        return Err(EngineError::InvalidCategory(
            "the credit card payments group is managed by its accounts".to_string(),
        ));
    }
    Ok(())
}

impl Engine {
    async fn group_name_taken(
        &self,
        db: &DatabaseTransaction,
        budget_id: &str,
        name: &str,
        except: Option<&str>,
    ) -> ResultEngine<bool> {
        let mut query = category_groups::Entity::find()
            .filter(category_groups::Column::BudgetId.eq(budget_id.to_string()))
            .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()));
        if let Some(except) = except {
            query = query.filter(category_groups::Column::Id.ne(except.to_string()));
        }
        Ok(query.one(db).await?.is_some())
    }

    async fn category_name_taken(
        &self,
        db: &DatabaseTransaction,
        group_id: &str,
        name: &str,
        except: Option<&str>,
    ) -> ResultEngine<bool> {
        let mut query = categories::Entity::find()
            .filter(categories::Column::GroupId.eq(group_id.to_string()))
            .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()));
        if let Some(except) = except {
            query = query.filter(categories::Column::Id.ne(except.to_string()));
        }
        Ok(query.one(db).await?.is_some())
    }

    async fn next_group_sort_order(
        &self,
        db: &DatabaseTransaction,
        budget_id: &str,
    ) -> ResultEngine<i32> {
        let last = category_groups::Entity::find()
            .filter(category_groups::Column::BudgetId.eq(budget_id.to_string()))
            .order_by_desc(category_groups::Column::SortOrder)
            .one(db)
            .await?;
        Ok(last.map_or(1, |group| group.sort_order.saturating_add(1)))
    }

    async fn next_category_sort_order(
        &self,
        db: &DatabaseTransaction,
        group_id: &str,
    ) -> ResultEngine<i32> {
        let last = categories::Entity::find()
            .filter(categories::Column::GroupId.eq(group_id.to_string()))
            .order_by_desc(categories::Column::SortOrder)
            .one(db)
            .await?;
        Ok(last.map_or(0, |category| category.sort_order.saturating_add(1)))
    }

    /// The budget's system group, created on first use.
    pub(super) async fn card_payments_group(
        &self,
        db: &DatabaseTransaction,
        budget_id: Uuid,
    ) -> ResultEngine<category_groups::Model> {
        let existing = category_groups::Entity::find()
            .filter(category_groups::Column::BudgetId.eq(budget_id.to_string()))
            .filter(category_groups::Column::IsSystem.eq(true))
            .one(db)
            .await?;
        if let Some(group) = existing {
            return Ok(group);
        }
        let group = category_groups::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4().to_string()),
            budget_id: ActiveValue::Set(budget_id.to_string()),
            name: ActiveValue::Set(CARD_PAYMENTS_GROUP.to_string()),
            sort_order: ActiveValue::Set(0),
            is_system: ActiveValue::Set(true),
            hidden: ActiveValue::Set(false),
        }
        .insert(db)
        .await?;
        tracing::debug!(%budget_id, group_id = %group.id, "created card payments group");
        Ok(group)
    }

    /// Payment category for a card named `name`. An unlinked payment
    /// category left behind by a deleted card of the same name is reused.
    pub(super) async fn payment_category_for(
        &self,
        db: &DatabaseTransaction,
        budget_id: Uuid,
        name: &str,
    ) -> ResultEngine<Uuid> {
        let group = self.card_payments_group(db, budget_id).await?;
        let existing = categories::Entity::find()
            .filter(categories::Column::GroupId.eq(group.id.clone()))
            .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()))
            .one(db)
            .await?;
        if let Some(model) = existing {
            let id = parse_uuid(&model.id, "category")?;
            if self.is_payment_category(db, id).await? {
                return Err(EngineError::ExistingKey(name.to_string()));
            }
            let mut active: categories::ActiveModel = model.into();
            active.hidden = ActiveValue::Set(false);
            active.update(db).await?;
            return Ok(id);
        }

        let id = Uuid::new_v4();
        let sort_order = self.next_category_sort_order(db, &group.id).await?;
        categories::ActiveModel {
            id: ActiveValue::Set(id.to_string()),
            group_id: ActiveValue::Set(group.id),
            name: ActiveValue::Set(name.to_string()),
            sort_order: ActiveValue::Set(sort_order),
            hidden: ActiveValue::Set(false),
            note: ActiveValue::Set(None),
        }
        .insert(db)
        .await?;
        Ok(id)
    }

    /// Creates a category group at the end of the budget's list.
    pub async fn new_category_group(
        &self,
        budget_id: Uuid,
        name: &str,
        user_id: &str,
    ) -> ResultEngine<CategoryGroup> {
        let name = normalize_required_name(name, "category group")?;
        if name.eq_ignore_ascii_case(CARD_PAYMENTS_GROUP) {
            return Err(EngineError::InvalidName(format!(
                "'{name}' is reserved"
            )));
        }
        with_tx!(self, |db_tx| {
            let budget = self
                .require_budget_access(&db_tx, budget_id, user_id)
                .await?;
            if self.group_name_taken(&db_tx, &budget.id, &name, None).await? {
                return Err(EngineError::ExistingKey(name));
            }
            let sort_order = self.next_group_sort_order(&db_tx, &budget.id).await?;
            let model = category_groups::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4().to_string()),
                budget_id: ActiveValue::Set(budget.id),
                name: ActiveValue::Set(name),
                sort_order: ActiveValue::Set(sort_order),
                is_system: ActiveValue::Set(false),
                hidden: ActiveValue::Set(false),
            }
            .insert(&db_tx)
            .await?;
            tracing::debug!(%budget_id, group_id = %model.id, "created category group");
            CategoryGroup::try_from(model)
        })
    }

    pub async fn rename_category_group(
        &self,
        group_id: Uuid,
        name: &str,
        user_id: &str,
    ) -> ResultEngine<CategoryGroup> {
        let name = normalize_required_name(name, "category group")?;
        if name.eq_ignore_ascii_case(CARD_PAYMENTS_GROUP) {
            return Err(EngineError::InvalidName(format!(
                "'{name}' is reserved"
            )));
        }
        with_tx!(self, |db_tx| {
            let group = self.require_group(&db_tx, group_id, user_id).await?;
            reject_system_group(&group)?;
            if self
                .group_name_taken(&db_tx, &group.budget_id, &name, Some(&group.id))
                .await?
            {
                return Err(EngineError::ExistingKey(name));
            }
            let mut active: category_groups::ActiveModel = group.into();
            active.name = ActiveValue::Set(name);
            let updated = active.update(&db_tx).await?;
            CategoryGroup::try_from(updated)
        })
    }

    pub async fn set_category_group_hidden(
        &self,
        group_id: Uuid,
        hidden: bool,
        user_id: &str,
    ) -> ResultEngine<CategoryGroup> {
        with_tx!(self, |db_tx| {
            let group = self.require_group(&db_tx, group_id, user_id).await?;
            let mut active: category_groups::ActiveModel = group.into();
            active.hidden = ActiveValue::Set(hidden);
            let updated = active.update(&db_tx).await?;
            CategoryGroup::try_from(updated)
        })
    }

    /// Deletes an empty, non-system group.
    pub async fn delete_category_group(&self, group_id: Uuid, user_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let group = self.require_group(&db_tx, group_id, user_id).await?;
            reject_system_group(&group)?;
            let has_categories = categories::Entity::find()
                .filter(categories::Column::GroupId.eq(group.id.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if has_categories {
                return Err(EngineError::Conflict(format!(
                    "category group '{}' is not empty",
                    group.name
                )));
            }
            category_groups::Entity::delete_by_id(group.id)
                .exec(&db_tx)
                .await?;
            tracing::debug!(%group_id, "deleted category group");
            Ok(())
        })
    }

    pub async fn category(&self, category_id: Uuid, user_id: &str) -> ResultEngine<Category> {
        with_tx!(self, |db_tx| {
            let (category, _) = self.require_category(&db_tx, category_id, user_id).await?;
            Category::try_from(category)
        })
    }

    /// Creates a category at the end of `group_id`.
    pub async fn new_category(
        &self,
        group_id: Uuid,
        name: &str,
        user_id: &str,
    ) -> ResultEngine<Category> {
        let name = normalize_required_name(name, "category")?;
        with_tx!(self, |db_tx| {
            let group = self.require_group(&db_tx, group_id, user_id).await?;
            reject_system_group(&group)?;
            if self
                .category_name_taken(&db_tx, &group.id, &name, None)
                .await?
            {
                return Err(EngineError::ExistingKey(name));
            }
            let sort_order = self.next_category_sort_order(&db_tx, &group.id).await?;
            let model = categories::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4().to_string()),
                group_id: ActiveValue::Set(group.id),
                name: ActiveValue::Set(name),
                sort_order: ActiveValue::Set(sort_order),
                hidden: ActiveValue::Set(false),
                note: ActiveValue::Set(None),
            }
            .insert(&db_tx)
            .await?;
            tracing::debug!(%group_id, category_id = %model.id, "created category");
            Category::try_from(model)
        })
    }

    pub async fn rename_category(
        &self,
        category_id: Uuid,
        name: &str,
        user_id: &str,
    ) -> ResultEngine<Category> {
        let name = normalize_required_name(name, "category")?;
        with_tx!(self, |db_tx| {
            let (category, group) = self.require_category(&db_tx, category_id, user_id).await?;
            reject_system_group(&group)?;
            if self
                .category_name_taken(&db_tx, &group.id, &name, Some(&category.id))
                .await?
            {
                return Err(EngineError::ExistingKey(name));
            }
            let mut active: categories::ActiveModel = category.into();
            active.name = ActiveValue::Set(name);
            let updated = active.update(&db_tx).await?;
            Category::try_from(updated)
        })
    }

    pub async fn set_category_hidden(
        &self,
        category_id: Uuid,
        hidden: bool,
        user_id: &str,
    ) -> ResultEngine<Category> {
        with_tx!(self, |db_tx| {
            let (category, _) = self.require_category(&db_tx, category_id, user_id).await?;
            let mut active: categories::ActiveModel = category.into();
            active.hidden = ActiveValue::Set(hidden);
            let updated = active.update(&db_tx).await?;
            Category::try_from(updated)
        })
    }

    /// Sets or clears (blank) the note of a category.
    pub async fn set_category_note(
        &self,
        category_id: Uuid,
        note: Option<&str>,
        user_id: &str,
    ) -> ResultEngine<Category> {
        let note = normalize_optional_text(note);
        with_tx!(self, |db_tx| {
            let (category, _) = self.require_category(&db_tx, category_id, user_id).await?;
            let mut active: categories::ActiveModel = category.into();
            active.note = ActiveValue::Set(note);
            let updated = active.update(&db_tx).await?;
            Category::try_from(updated)
        })
    }

    /// Moves a category to another group of the same budget, at the end.
    pub async fn move_category(
        &self,
        category_id: Uuid,
        group_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Category> {
        with_tx!(self, |db_tx| {
            let (category, group) = self.require_category(&db_tx, category_id, user_id).await?;
            reject_system_group(&group)?;
            let budget_id = parse_uuid(&group.budget_id, "budget")?;
            let target = self
                .require_group_in_budget(&db_tx, budget_id, group_id)
                .await?;
            reject_system_group(&target)?;
            if target.id == group.id {
                return Category::try_from(category);
            }
            if self
                .category_name_taken(&db_tx, &target.id, &category.name, None)
                .await?
            {
                return Err(EngineError::ExistingKey(category.name));
            }
            let sort_order = self.next_category_sort_order(&db_tx, &target.id).await?;
            let mut active: categories::ActiveModel = category.into();
            active.group_id = ActiveValue::Set(target.id);
            active.sort_order = ActiveValue::Set(sort_order);
            let updated = active.update(&db_tx).await?;
            tracing::debug!(%category_id, %group_id, "moved category");
            Category::try_from(updated)
        })
    }

    /// Deletes a category that no transaction references and that holds no
    /// assigned money. Its empty entries and its goal go with it.
    pub async fn delete_category(&self, category_id: Uuid, user_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let (category, group) = self.require_category(&db_tx, category_id, user_id).await?;
            reject_system_group(&group)?;

            let in_transactions = transactions::Entity::find()
                .filter(transactions::Column::CategoryId.eq(category.id.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            let in_splits = splits::Entity::find()
                .filter(splits::Column::CategoryId.eq(category.id.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if in_transactions || in_splits {
                return Err(EngineError::Conflict(format!(
                    "category '{}' is used by transactions",
                    category.name
                )));
            }
            let funded = budget_entries::Entity::find()
                .filter(budget_entries::Column::CategoryId.eq(category.id.clone()))
                .filter(budget_entries::Column::AssignedMinor.ne(0))
                .one(&db_tx)
                .await?
                .is_some();
            if funded {
                return Err(EngineError::Conflict(format!(
                    "category '{}' still holds assigned money",
                    category.name
                )));
            }

            budget_entries::Entity::delete_many()
                .filter(budget_entries::Column::CategoryId.eq(category.id.clone()))
                .exec(&db_tx)
                .await?;
            goals::Entity::delete_many()
                .filter(goals::Column::CategoryId.eq(category.id.clone()))
                .exec(&db_tx)
                .await?;
            categories::Entity::delete_by_id(category.id)
                .exec(&db_tx)
                .await?;
            tracing::debug!(%category_id, "deleted category");
            Ok(())
        })
    }

    /// Groups of a budget with their categories, system group included.
    pub async fn list_categories(
        &self,
        budget_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Vec<CategoryTree>> {
        with_tx!(self, |db_tx| {
            self.require_budget_access(&db_tx, budget_id, user_id)
                .await?;
            let rows = category_groups::Entity::find()
                .filter(category_groups::Column::BudgetId.eq(budget_id.to_string()))
                .order_by_asc(category_groups::Column::SortOrder)
                .order_by_asc(category_groups::Column::Name)
                .find_with_related(categories::Entity)
                .all(&db_tx)
                .await?;

            let mut out = Vec::with_capacity(rows.len());
            for (group, mut members) in rows {
                members.sort_by(|a, b| {
                    a.sort_order
                        .cmp(&b.sort_order)
                        .then_with(|| a.name.cmp(&b.name))
                });
                out.push(CategoryTree {
                    group: CategoryGroup::try_from(group)?,
                    categories: members
                        .into_iter()
                        .map(Category::try_from)
                        .collect::<ResultEngine<Vec<_>>>()?,
                });
            }
            Ok(out)
        })
    }
}
