//! Monthly budget view.
//!
//! Nothing here is persisted: income, activity, and To Be Budgeted are
//! recomputed from ledger rows and entries on every read.
//!
//! Rows whose amount was already carried into entries by the credit-card
//! subroutine (a stored card adjustment) are left out of both income and
//! activity, otherwise card spending would count once in the spending
//! category's entry and again as activity.

use std::collections::{HashMap, HashSet};

use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    BudgetMonth, Goal, GoalSpec, MoneyCents, ResultEngine, accounts, budget_entries, categories,
    category_groups, goals, percent, splits, transactions,
    util::{parse_opt_uuid, parse_uuid},
};

use super::{Engine, with_tx};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GoalProgress {
    pub goal: GoalSpec,
    /// `available / target`, for goals with a target amount.
    pub overall_percent: Option<u8>,
    /// `assigned / monthly`, for monthly funding goals.
    pub monthly_percent: Option<u8>,
    /// What still has to be assigned this month to stay on track.
    pub underfunded: MoneyCents,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryView {
    pub category_id: Uuid,
    pub name: String,
    pub hidden: bool,
    pub is_payment_category: bool,
    pub assigned: MoneyCents,
    pub activity: MoneyCents,
    pub available: MoneyCents,
    pub is_overspent: bool,
    pub goal: Option<GoalProgress>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GroupView {
    pub group_id: Uuid,
    pub name: String,
    pub is_system: bool,
    pub hidden: bool,
    pub assigned: MoneyCents,
    pub activity: MoneyCents,
    pub available: MoneyCents,
    pub categories: Vec<CategoryView>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BudgetView {
    pub budget_id: Uuid,
    pub month: BudgetMonth,
    pub total_income: MoneyCents,
    pub total_assigned: MoneyCents,
    pub total_activity: MoneyCents,
    pub to_be_budgeted: MoneyCents,
    pub groups: Vec<GroupView>,
}

fn ceil_div(numerator: i64, denominator: i64) -> i64 {
    let quotient = numerator / denominator;
    if numerator % denominator > 0 {
        quotient + 1
    } else {
        quotient
    }
}

pub(super) fn goal_progress(
    spec: GoalSpec,
    month: BudgetMonth,
    assigned: MoneyCents,
    available: MoneyCents,
) -> ResultEngine<GoalProgress> {
    let shortfall = |target: MoneyCents| -> ResultEngine<MoneyCents> {
        Ok(target.try_sub(available)?.max(MoneyCents::ZERO))
    };
    let (overall_percent, monthly_percent, underfunded) = match spec {
        GoalSpec::TargetBalance { target } => {
            (Some(percent(available, target)), None, shortfall(target)?)
        }
        GoalSpec::TargetBalanceByDate { target, by } => {
            let months_left = month.months_until(BudgetMonth::from_date(by));
            let underfunded = if months_left == 0 {
                shortfall(target)?
            } else {
                let before_this_month = available.try_sub(assigned)?;
                let remaining = target.try_sub(before_this_month)?.cents();
                if remaining <= 0 {
                    MoneyCents::ZERO
                } else {
                    let per_month = MoneyCents::new(ceil_div(remaining, months_left));
                    per_month.try_sub(assigned)?.max(MoneyCents::ZERO)
                }
            };
            (Some(percent(available, target)), None, underfunded)
        }
        GoalSpec::MonthlyFunding { monthly } => (
            None,
            Some(percent(assigned, monthly)),
            monthly.try_sub(assigned)?.max(MoneyCents::ZERO),
        ),
    };
    Ok(GoalProgress {
        goal: spec,
        overall_percent,
        monthly_percent,
        underfunded,
    })
}

/// Adds a posting to income or to its category's activity.
fn record_posting(
    category_id: Option<Uuid>,
    amount: MoneyCents,
    income: &mut MoneyCents,
    activity: &mut HashMap<Uuid, MoneyCents>,
) -> ResultEngine<()> {
    match category_id {
        Some(category_id) => {
            let slot = activity.entry(category_id).or_insert(MoneyCents::ZERO);
            *slot = slot.try_add(amount)?;
        }
        None if amount.is_positive() => {
            *income = income.try_add(amount)?;
        }
        None => {}
    }
    Ok(())
}

impl Engine {
    /// Computes the budget view of `month`.
    ///
    /// - income: uncategorized inflows on budget accounts
    /// - activity: categorized non-transfer postings (split lines included)
    /// - `available = assigned + activity`
    /// - `to_be_budgeted = income - sum(assigned)`
    ///
    /// Tracking accounts never contribute.
    pub async fn budget_view(
        &self,
        budget_id: Uuid,
        month: BudgetMonth,
        user_id: &str,
    ) -> ResultEngine<BudgetView> {
        with_tx!(self, |db_tx| {
            self.require_budget_access(&db_tx, budget_id, user_id)
                .await?;
            let (start, end) = month.date_range()?;

            let tree = category_groups::Entity::find()
                .filter(category_groups::Column::BudgetId.eq(budget_id.to_string()))
                .order_by_asc(category_groups::Column::SortOrder)
                .order_by_asc(category_groups::Column::Name)
                .find_with_related(categories::Entity)
                .all(&db_tx)
                .await?;
            let category_ids: Vec<String> = tree
                .iter()
                .flat_map(|(_, members)| members.iter().map(|c| c.id.clone()))
                .collect();

            let mut assigned: HashMap<Uuid, MoneyCents> = HashMap::new();
            let entries = budget_entries::Entity::find()
                .filter(budget_entries::Column::CategoryId.is_in(category_ids.clone()))
                .filter(budget_entries::Column::Year.eq(month.year()))
                .filter(budget_entries::Column::Month.eq(month.month() as i32))
                .all(&db_tx)
                .await?;
            for entry in entries {
                assigned.insert(
                    parse_uuid(&entry.category_id, "category")?,
                    MoneyCents::new(entry.assigned_minor),
                );
            }

            let mut goals_by_category: HashMap<Uuid, GoalSpec> = HashMap::new();
            let goal_models = goals::Entity::find()
                .filter(goals::Column::CategoryId.is_in(category_ids))
                .all(&db_tx)
                .await?;
            for model in goal_models {
                let goal = Goal::try_from(model)?;
                goals_by_category.insert(goal.category_id, goal.spec);
            }

            let account_models = accounts::Entity::find()
                .filter(accounts::Column::BudgetId.eq(budget_id.to_string()))
                .all(&db_tx)
                .await?;
            let mut payment_categories: HashSet<Uuid> = HashSet::new();
            let mut on_budget_accounts: Vec<String> = Vec::new();
            for account in account_models {
                if let Some(category_id) =
                    parse_opt_uuid(account.payment_category_id.as_deref(), "payment category")?
                {
                    payment_categories.insert(category_id);
                }
                if account.on_budget {
                    on_budget_accounts.push(account.id);
                }
            }

            let rows = transactions::Entity::find()
                .filter(transactions::Column::BudgetId.eq(budget_id.to_string()))
                .filter(transactions::Column::AccountId.is_in(on_budget_accounts))
                .filter(transactions::Column::IsTransfer.eq(false))
                .filter(transactions::Column::CardAdjustmentMinor.is_null())
                .filter(transactions::Column::Date.gte(start))
                .filter(transactions::Column::Date.lt(end))
                .all(&db_tx)
                .await?;

            let mut income = MoneyCents::ZERO;
            let mut activity: HashMap<Uuid, MoneyCents> = HashMap::new();
            let mut split_headers: Vec<String> = Vec::new();
            for row in rows {
                if row.is_split {
                    split_headers.push(row.id);
                    continue;
                }
                record_posting(
                    parse_opt_uuid(row.category_id.as_deref(), "category")?,
                    MoneyCents::new(row.amount_minor),
                    &mut income,
                    &mut activity,
                )?;
            }
            if !split_headers.is_empty() {
                let lines = splits::Entity::find()
                    .filter(splits::Column::TransactionId.is_in(split_headers))
                    .filter(splits::Column::CardAdjustmentMinor.is_null())
                    .all(&db_tx)
                    .await?;
                for line in lines {
                    record_posting(
                        parse_opt_uuid(line.category_id.as_deref(), "category")?,
                        MoneyCents::new(line.amount_minor),
                        &mut income,
                        &mut activity,
                    )?;
                }
            }

            let mut total_assigned = MoneyCents::ZERO;
            let mut total_activity = MoneyCents::ZERO;
            let mut groups = Vec::with_capacity(tree.len());
            for (group, mut members) in tree {
                members.sort_by(|a, b| {
                    a.sort_order
                        .cmp(&b.sort_order)
                        .then_with(|| a.name.cmp(&b.name))
                });

                let mut group_view = GroupView {
                    group_id: parse_uuid(&group.id, "category group")?,
                    name: group.name,
                    is_system: group.is_system,
                    hidden: group.hidden,
                    assigned: MoneyCents::ZERO,
                    activity: MoneyCents::ZERO,
                    available: MoneyCents::ZERO,
                    categories: Vec::with_capacity(members.len()),
                };
                for category in members {
                    let category_id = parse_uuid(&category.id, "category")?;
                    let cat_assigned = assigned
                        .get(&category_id)
                        .copied()
                        .unwrap_or(MoneyCents::ZERO);
                    let cat_activity = activity
                        .get(&category_id)
                        .copied()
                        .unwrap_or(MoneyCents::ZERO);
                    let available = cat_assigned.try_add(cat_activity)?;
                    let goal = goals_by_category
                        .get(&category_id)
                        .map(|spec| goal_progress(*spec, month, cat_assigned, available))
                        .transpose()?;

                    group_view.assigned = group_view.assigned.try_add(cat_assigned)?;
                    group_view.activity = group_view.activity.try_add(cat_activity)?;
                    group_view.available = group_view.available.try_add(available)?;
                    group_view.categories.push(CategoryView {
                        category_id,
                        name: category.name,
                        hidden: category.hidden,
                        is_payment_category: payment_categories.contains(&category_id),
                        assigned: cat_assigned,
                        activity: cat_activity,
                        available,
                        is_overspent: available.is_negative(),
                        goal,
                    });
                }
                total_assigned = total_assigned.try_add(group_view.assigned)?;
                total_activity = total_activity.try_add(group_view.activity)?;
                groups.push(group_view);
            }

            let to_be_budgeted = income.try_sub(total_assigned)?;
            tracing::debug!(
                %budget_id,
                %month,
                %income,
                %total_assigned,
                %to_be_budgeted,
                "computed budget view"
            );
            Ok(BudgetView {
                budget_id,
                month,
                total_income: income,
                total_assigned,
                total_activity,
                to_be_budgeted,
                groups,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn april() -> BudgetMonth {
        BudgetMonth::new(2024, 4).unwrap()
    }

    #[test]
    fn target_balance_progress() {
        let spec = GoalSpec::TargetBalance {
            target: MoneyCents::new(500_00),
        };
        let progress =
            goal_progress(spec, april(), MoneyCents::new(50_00), MoneyCents::new(125_00)).unwrap();
        assert_eq!(progress.overall_percent, Some(25));
        assert_eq!(progress.monthly_percent, None);
        assert_eq!(progress.underfunded, MoneyCents::new(375_00));

        let done = goal_progress(spec, april(), MoneyCents::ZERO, MoneyCents::new(600_00)).unwrap();
        assert_eq!(done.overall_percent, Some(100));
        assert_eq!(done.underfunded, MoneyCents::ZERO);
    }

    #[test]
    fn overspent_category_shows_zero_progress() {
        let spec = GoalSpec::TargetBalance {
            target: MoneyCents::new(100_00),
        };
        let progress =
            goal_progress(spec, april(), MoneyCents::ZERO, MoneyCents::new(-20_00)).unwrap();
        assert_eq!(progress.overall_percent, Some(0));
        assert_eq!(progress.underfunded, MoneyCents::new(120_00));
    }

    #[test]
    fn by_date_goal_spreads_remaining_over_months_left() {
        // April through June: 3 months, 100.00 left -> 33.34 per month.
        let spec = GoalSpec::TargetBalanceByDate {
            target: MoneyCents::new(100_00),
            by: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
        };
        let progress = goal_progress(spec, april(), MoneyCents::ZERO, MoneyCents::ZERO).unwrap();
        assert_eq!(progress.underfunded, MoneyCents::new(33_34));

        let funded =
            goal_progress(spec, april(), MoneyCents::new(40_00), MoneyCents::new(40_00)).unwrap();
        assert_eq!(funded.underfunded, MoneyCents::ZERO);
        assert_eq!(funded.overall_percent, Some(40));
    }

    #[test]
    fn by_date_goal_past_due_needs_full_shortfall() {
        let spec = GoalSpec::TargetBalanceByDate {
            target: MoneyCents::new(100_00),
            by: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        };
        let progress =
            goal_progress(spec, april(), MoneyCents::ZERO, MoneyCents::new(30_00)).unwrap();
        assert_eq!(progress.underfunded, MoneyCents::new(70_00));
    }

    #[test]
    fn monthly_funding_progress() {
        let spec = GoalSpec::MonthlyFunding {
            monthly: MoneyCents::new(80_00),
        };
        let progress =
            goal_progress(spec, april(), MoneyCents::new(20_00), MoneyCents::new(5_00)).unwrap();
        assert_eq!(progress.overall_percent, None);
        assert_eq!(progress.monthly_percent, Some(25));
        assert_eq!(progress.underfunded, MoneyCents::new(60_00));
    }

    #[test]
    fn extreme_balances_report_overflow() {
        let spec = GoalSpec::TargetBalance {
            target: MoneyCents::new(1_00),
        };
        let err = goal_progress(spec, april(), MoneyCents::ZERO, MoneyCents::new(-i64::MAX))
            .unwrap_err();
        assert!(matches!(err, crate::EngineError::InvalidAmount(_)));

        let spec = GoalSpec::MonthlyFunding {
            monthly: MoneyCents::new(1_00),
        };
        let result = goal_progress(spec, april(), MoneyCents::new(i64::MIN), MoneyCents::ZERO);
        assert!(result.is_err());
    }

    #[test]
    fn postings_split_into_income_and_activity() {
        let groceries = Uuid::new_v4();
        let mut income = MoneyCents::ZERO;
        let mut activity = HashMap::new();
        record_posting(None, MoneyCents::new(1000_00), &mut income, &mut activity).unwrap();
        record_posting(None, MoneyCents::new(-5_00), &mut income, &mut activity).unwrap();
        record_posting(Some(groceries), MoneyCents::new(-60_00), &mut income, &mut activity)
            .unwrap();
        record_posting(Some(groceries), MoneyCents::new(10_00), &mut income, &mut activity)
            .unwrap();
        assert_eq!(income, MoneyCents::new(1000_00));
        assert_eq!(activity[&groceries], MoneyCents::new(-50_00));
    }
}
