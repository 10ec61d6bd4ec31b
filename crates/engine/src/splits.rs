//! Split lines under a split transaction header.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, MoneyCents,
    util::{parse_opt_uuid, parse_uuid},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitTransaction {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub category_id: Option<Uuid>,
    pub amount: MoneyCents,
    pub memo: Option<String>,
    pub card_adjustment: Option<MoneyCents>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "split_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub transaction_id: String,
    pub category_id: Option<String>,
    pub amount_minor: i64,
    pub memo: Option<String>,
    pub card_adjustment_minor: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transactions::Entity",
        from = "Column::TransactionId",
        to = "super::transactions::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Transaction,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transaction.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&SplitTransaction> for ActiveModel {
    fn from(split: &SplitTransaction) -> Self {
        Self {
            id: ActiveValue::Set(split.id.to_string()),
            transaction_id: ActiveValue::Set(split.transaction_id.to_string()),
            category_id: ActiveValue::Set(split.category_id.map(|id| id.to_string())),
            amount_minor: ActiveValue::Set(split.amount.cents()),
            memo: ActiveValue::Set(split.memo.clone()),
            card_adjustment_minor: ActiveValue::Set(
                split.card_adjustment.map(MoneyCents::cents),
            ),
        }
    }
}

impl TryFrom<Model> for SplitTransaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "split")?,
            transaction_id: parse_uuid(&model.transaction_id, "transaction")?,
            category_id: parse_opt_uuid(model.category_id.as_deref(), "category")?,
            amount: MoneyCents::new(model.amount_minor),
            memo: model.memo,
            card_adjustment: model.card_adjustment_minor.map(MoneyCents::new),
        })
    }
}
