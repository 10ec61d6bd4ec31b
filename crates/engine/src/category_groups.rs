//! First level of the category hierarchy.
//!
//! The system group (`is_system = true`) holds credit-card payment
//! categories and is created on demand.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

pub const CARD_PAYMENTS_GROUP: &str = "Credit Card Payments";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub id: Uuid,
    pub budget_id: Uuid,
    pub name: String,
    pub sort_order: i32,
    pub is_system: bool,
    pub hidden: bool,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "category_groups")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub budget_id: String,
    pub name: String,
    pub sort_order: i32,
    pub is_system: bool,
    pub hidden: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::budgets::Entity",
        from = "Column::BudgetId",
        to = "super::budgets::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Budget,
    #[sea_orm(has_many = "super::categories::Entity")]
    Categories,
}

impl Related<super::budgets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budget.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for CategoryGroup {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "category group")?,
            budget_id: parse_uuid(&model.budget_id, "budget")?,
            name: model.name,
            sort_order: model.sort_order,
            is_system: model.is_system,
            hidden: model.hidden,
        })
    }
}
