//! Funding goals attached to a category.
//!
//! A goal has one of three shapes. Only the columns of the active shape are
//! populated, the others stay `NULL`.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GoalSpec {
    /// Reach `target` available.
    TargetBalance { target: MoneyCents },
    /// Reach `target` available by the month containing `by`.
    TargetBalanceByDate { target: MoneyCents, by: NaiveDate },
    /// Assign `monthly` every month.
    MonthlyFunding { monthly: MoneyCents },
}

impl GoalSpec {
    pub fn kind_str(&self) -> &'static str {
        match self {
            Self::TargetBalance { .. } => "target_balance",
            Self::TargetBalanceByDate { .. } => "target_balance_by_date",
            Self::MonthlyFunding { .. } => "monthly_funding",
        }
    }

    pub fn target(&self) -> Option<MoneyCents> {
        match self {
            Self::TargetBalance { target } | Self::TargetBalanceByDate { target, .. } => {
                Some(*target)
            }
            Self::MonthlyFunding { .. } => None,
        }
    }

    pub(crate) fn validate(&self) -> ResultEngine<()> {
        let amount = match self {
            Self::TargetBalance { target } | Self::TargetBalanceByDate { target, .. } => target,
            Self::MonthlyFunding { monthly } => monthly,
        };
        if !amount.is_positive() {
            return Err(EngineError::InvalidGoal(format!(
                "{} amount must be > 0",
                self.kind_str()
            )));
        }
        Ok(())
    }

    fn from_columns(
        kind: &str,
        target_minor: Option<i64>,
        target_date: Option<NaiveDate>,
        monthly_minor: Option<i64>,
    ) -> ResultEngine<Self> {
        let malformed = || EngineError::InvalidGoal(format!("malformed {kind} goal row"));
        match (kind, target_minor, target_date, monthly_minor) {
            ("target_balance", Some(target), None, None) => Ok(Self::TargetBalance {
                target: MoneyCents::new(target),
            }),
            ("target_balance_by_date", Some(target), Some(by), None) => {
                Ok(Self::TargetBalanceByDate {
                    target: MoneyCents::new(target),
                    by,
                })
            }
            ("monthly_funding", None, None, Some(monthly)) => Ok(Self::MonthlyFunding {
                monthly: MoneyCents::new(monthly),
            }),
            ("target_balance" | "target_balance_by_date" | "monthly_funding", ..) => {
                Err(malformed())
            }
            (other, ..) => Err(EngineError::InvalidGoal(format!(
                "invalid goal kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: Uuid,
    pub category_id: Uuid,
    pub spec: GoalSpec,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "goals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub category_id: String,
    pub kind: String,
    pub target_minor: Option<i64>,
    pub target_date: Option<Date>,
    pub monthly_minor: Option<i64>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Category,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Goal> for ActiveModel {
    fn from(goal: &Goal) -> Self {
        let (target_minor, target_date, monthly_minor) = match goal.spec {
            GoalSpec::TargetBalance { target } => (Some(target.cents()), None, None),
            GoalSpec::TargetBalanceByDate { target, by } => {
                (Some(target.cents()), Some(by), None)
            }
            GoalSpec::MonthlyFunding { monthly } => (None, None, Some(monthly.cents())),
        };
        Self {
            id: ActiveValue::Set(goal.id.to_string()),
            category_id: ActiveValue::Set(goal.category_id.to_string()),
            kind: ActiveValue::Set(goal.spec.kind_str().to_string()),
            target_minor: ActiveValue::Set(target_minor),
            target_date: ActiveValue::Set(target_date),
            monthly_minor: ActiveValue::Set(monthly_minor),
            created_at: ActiveValue::Set(goal.created_at),
        }
    }
}

impl TryFrom<Model> for Goal {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "goal")?,
            category_id: parse_uuid(&model.category_id, "category")?,
            spec: GoalSpec::from_columns(
                &model.kind,
                model.target_minor,
                model.target_date,
                model.monthly_minor,
            )?,
            created_at: model.created_at,
        })
    }
}
