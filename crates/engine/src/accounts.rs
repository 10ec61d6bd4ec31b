//! The module contains `Account` and its kind.
//!
//! An account is either a *budget* account (`on_budget = true`, its money
//! flows through envelopes) or a *tracking* account (net worth only).
//! On-budget credit cards carry a link to their payment category.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError,
    util::{parse_opt_uuid, parse_uuid},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Checking,
    Savings,
    CreditCard,
    Cash,
    LineOfCredit,
    Investment,
    Mortgage,
    OtherAsset,
    OtherLiability,
}

impl AccountKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Checking => "checking",
            Self::Savings => "savings",
            Self::CreditCard => "credit_card",
            Self::Cash => "cash",
            Self::LineOfCredit => "line_of_credit",
            Self::Investment => "investment",
            Self::Mortgage => "mortgage",
            Self::OtherAsset => "other_asset",
            Self::OtherLiability => "other_liability",
        }
    }

    /// Whether accounts of this kind live on the budget unless told otherwise.
    pub fn default_on_budget(self) -> bool {
        matches!(
            self,
            Self::Checking | Self::Savings | Self::CreditCard | Self::Cash | Self::LineOfCredit
        )
    }
}

impl TryFrom<&str> for AccountKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "checking" => Ok(Self::Checking),
            "savings" => Ok(Self::Savings),
            "credit_card" | "credit-card" => Ok(Self::CreditCard),
            "cash" => Ok(Self::Cash),
            "line_of_credit" | "line-of-credit" => Ok(Self::LineOfCredit),
            "investment" => Ok(Self::Investment),
            "mortgage" => Ok(Self::Mortgage),
            "other_asset" | "other-asset" => Ok(Self::OtherAsset),
            "other_liability" | "other-liability" => Ok(Self::OtherLiability),
            other => Err(EngineError::InvalidAccount(format!(
                "invalid account kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub budget_id: Uuid,
    pub name: String,
    pub kind: AccountKind,
    pub on_budget: bool,
    pub is_closed: bool,
    pub note: Option<String>,
    /// Synthetic payment category, only for on-budget credit cards.
    pub payment_category_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(
        budget_id: Uuid,
        name: String,
        kind: AccountKind,
        on_budget: bool,
        note: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            budget_id,
            name,
            kind,
            on_budget,
            is_closed: false,
            note,
            payment_category_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_credit_card(&self) -> bool {
        self.kind == AccountKind::CreditCard
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub budget_id: String,
    pub name: String,
    pub kind: String,
    pub on_budget: bool,
    pub is_closed: bool,
    pub note: Option<String>,
    pub payment_category_id: Option<String>,
    pub created_at: DateTimeUtc,
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
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::budgets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budget.def()
    }
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(account: &Account) -> Self {
        Self {
            id: ActiveValue::Set(account.id.to_string()),
            budget_id: ActiveValue::Set(account.budget_id.to_string()),
            name: ActiveValue::Set(account.name.clone()),
            kind: ActiveValue::Set(account.kind.as_str().to_string()),
            on_budget: ActiveValue::Set(account.on_budget),
            is_closed: ActiveValue::Set(account.is_closed),
            note: ActiveValue::Set(account.note.clone()),
            payment_category_id: ActiveValue::Set(
                account.payment_category_id.map(|id| id.to_string()),
            ),
            created_at: ActiveValue::Set(account.created_at),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "account")?,
            budget_id: parse_uuid(&model.budget_id, "budget")?,
            name: model.name,
            kind: AccountKind::try_from(model.kind.as_str())?,
            on_budget: model.on_budget,
            is_closed: model.is_closed,
            note: model.note,
            payment_category_id: parse_opt_uuid(
                model.payment_category_id.as_deref(),
                "payment category",
            )?,
            created_at: model.created_at,
        })
    }
}
