//! Ledger rows.
//!
//! A `Transaction` is one signed amount on one account. A transfer is stored
//! as two rows sharing `transfer_group_id`. A split header carries no
//! category; its `SplitTransaction` children do.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, MoneyCents,
    splits::SplitTransaction,
    util::{parse_opt_uuid, parse_uuid},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearedState {
    #[default]
    Uncleared,
    Cleared,
    /// Terminal: the row can no longer be edited or deleted.
    Reconciled,
}

impl ClearedState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uncleared => "uncleared",
            Self::Cleared => "cleared",
            Self::Reconciled => "reconciled",
        }
    }

    /// Counted in the cleared balance.
    pub fn is_cleared(self) -> bool {
        matches!(self, Self::Cleared | Self::Reconciled)
    }
}

impl TryFrom<&str> for ClearedState {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "uncleared" => Ok(Self::Uncleared),
            "cleared" => Ok(Self::Cleared),
            "reconciled" => Ok(Self::Reconciled),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid cleared state: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub budget_id: Uuid,
    pub account_id: Uuid,
    pub payee_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    /// Positive = inflow, negative = outflow.
    pub amount: MoneyCents,
    pub date: NaiveDate,
    pub memo: Option<String>,
    pub cleared: ClearedState,
    pub approved: bool,
    pub is_transfer: bool,
    pub transfer_group_id: Option<Uuid>,
    /// The other account of a transfer pair.
    pub transfer_account_id: Option<Uuid>,
    pub is_split: bool,
    /// Amount moved into (positive) or out of (negative) the card's payment
    /// category when this row was posted.
    pub card_adjustment: Option<MoneyCents>,
    pub import_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub splits: Vec<SplitTransaction>,
}

impl Transaction {
    pub fn is_reconciled(&self) -> bool {
        self.cleared == ClearedState::Reconciled
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub budget_id: String,
    pub account_id: String,
    pub payee_id: Option<String>,
    pub category_id: Option<String>,
    pub amount_minor: i64,
    pub date: Date,
    pub memo: Option<String>,
    pub cleared: String,
    pub approved: bool,
    pub is_transfer: bool,
    pub transfer_group_id: Option<String>,
    pub transfer_account_id: Option<String>,
    pub is_split: bool,
    pub card_adjustment_minor: Option<i64>,
    pub import_id: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Account,
    #[sea_orm(has_many = "super::splits::Entity")]
    Splits,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl Related<super::splits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Splits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            budget_id: ActiveValue::Set(tx.budget_id.to_string()),
            account_id: ActiveValue::Set(tx.account_id.to_string()),
            payee_id: ActiveValue::Set(tx.payee_id.map(|id| id.to_string())),
            category_id: ActiveValue::Set(tx.category_id.map(|id| id.to_string())),
            amount_minor: ActiveValue::Set(tx.amount.cents()),
            date: ActiveValue::Set(tx.date),
            memo: ActiveValue::Set(tx.memo.clone()),
            cleared: ActiveValue::Set(tx.cleared.as_str().to_string()),
            approved: ActiveValue::Set(tx.approved),
            is_transfer: ActiveValue::Set(tx.is_transfer),
            transfer_group_id: ActiveValue::Set(tx.transfer_group_id.map(|id| id.to_string())),
            transfer_account_id: ActiveValue::Set(
                tx.transfer_account_id.map(|id| id.to_string()),
            ),
            is_split: ActiveValue::Set(tx.is_split),
            card_adjustment_minor: ActiveValue::Set(tx.card_adjustment.map(MoneyCents::cents)),
            import_id: ActiveValue::Set(tx.import_id.clone()),
            created_at: ActiveValue::Set(tx.created_at),
            updated_at: ActiveValue::Set(tx.updated_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "transaction")?,
            budget_id: parse_uuid(&model.budget_id, "budget")?,
            account_id: parse_uuid(&model.account_id, "account")?,
            payee_id: parse_opt_uuid(model.payee_id.as_deref(), "payee")?,
            category_id: parse_opt_uuid(model.category_id.as_deref(), "category")?,
            amount: MoneyCents::new(model.amount_minor),
            date: model.date,
            memo: model.memo,
            cleared: ClearedState::try_from(model.cleared.as_str())?,
            approved: model.approved,
            is_transfer: model.is_transfer,
            transfer_group_id: parse_opt_uuid(
                model.transfer_group_id.as_deref(),
                "transfer group",
            )?,
            transfer_account_id: parse_opt_uuid(
                model.transfer_account_id.as_deref(),
                "account",
            )?,
            is_split: model.is_split,
            card_adjustment: model.card_adjustment_minor.map(MoneyCents::new),
            import_id: model.import_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
            splits: Vec::new(),
        })
    }
}
