//! Credit-card adjustment subroutine.
//!
//! Keeps a card's payment category equal to the cash reserved for budgeted
//! spending on that card. Every posting on an on-budget card with a payment
//! category is classified into a [`CardEffect`], applied to budget entries,
//! and the amount actually moved into the payment category is stored on the
//! row (`card_adjustment_minor`). Reversal replays the stored amount, so a
//! create followed by a delete restores every entry exactly.

use sea_orm::DatabaseTransaction;
use uuid::Uuid;

use crate::{BudgetMonth, MoneyCents, ResultEngine};

use super::Engine;

/// Budget-entry effect of one posting against a card.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum CardEffect {
    /// Outflow to a spending category. `amount` is positive.
    Spending { category_id: Uuid, amount: MoneyCents },
    /// Inflow back into a spending category.
    RefundToCategory { category_id: Uuid, amount: MoneyCents },
    /// Uncategorized inflow, or inflow to the card's own payment category.
    RefundToBudget { amount: MoneyCents },
    /// Transfer into the card from an on-budget account.
    Payment { amount: MoneyCents },
}

/// Classifies a non-transfer posting (a row or a split line).
///
/// Returns `None` for zero amounts and uncategorized outflows, which the
/// subroutine leaves alone.
pub(super) fn classify_posting(
    payment_category_id: Uuid,
    category_id: Option<Uuid>,
    amount: MoneyCents,
) -> Option<CardEffect> {
    let spending = category_id.filter(|id| *id != payment_category_id);
    if amount.is_negative() {
        spending.map(|category_id| CardEffect::Spending {
            category_id,
            amount: amount.abs(),
        })
    } else if amount.is_positive() {
        Some(match spending {
            Some(category_id) => CardEffect::RefundToCategory {
                category_id,
                amount,
            },
            None => CardEffect::RefundToBudget { amount },
        })
    } else {
        None
    }
}

/// Classifies the card side of a transfer. `card_amount` is the card row's
/// amount.
pub(super) fn classify_transfer(card_amount: MoneyCents, other_on_budget: bool) -> Option<CardEffect> {
    (card_amount.is_positive() && other_on_budget).then_some(CardEffect::Payment {
        amount: card_amount,
    })
}

/// Portion of a spend that moves to the payment category: what the spending
/// category had assigned before the decrement, capped at the spend.
pub(super) fn covered_amount(spend: MoneyCents, assigned_before: MoneyCents) -> MoneyCents {
    spend.min(assigned_before.max(MoneyCents::ZERO))
}

impl Engine {
    /// Applies `effect` for `month` and returns the signed amount moved into
    /// the payment category.
    pub(super) async fn apply_card_effect(
        &self,
        db: &DatabaseTransaction,
        payment_category_id: Uuid,
        effect: CardEffect,
        month: BudgetMonth,
    ) -> ResultEngine<MoneyCents> {
        let moved = match effect {
            CardEffect::Spending {
                category_id,
                amount,
            } => {
                let assigned_before = self.assigned_amount(db, category_id, month).await?;
                self.adjust_entry(db, category_id, month, -amount).await?;
                covered_amount(amount, assigned_before)
            }
            CardEffect::RefundToCategory {
                category_id,
                amount,
            } => {
                self.adjust_entry(db, category_id, month, amount).await?;
                -amount
            }
            CardEffect::RefundToBudget { amount } | CardEffect::Payment { amount } => -amount,
        };
        self.adjust_entry(db, payment_category_id, month, moved)
            .await?;
        tracing::debug!(
            payment_category_id = %payment_category_id,
            ?effect,
            %month,
            %moved,
            "applied card adjustment"
        );
        Ok(moved)
    }

    /// Exact inverse of [`Engine::apply_card_effect`] given the stored moved
    /// amount.
    pub(super) async fn reverse_card_effect(
        &self,
        db: &DatabaseTransaction,
        payment_category_id: Uuid,
        effect: CardEffect,
        month: BudgetMonth,
        moved: MoneyCents,
    ) -> ResultEngine<()> {
        match effect {
            CardEffect::Spending {
                category_id,
                amount,
            } => {
                self.adjust_entry(db, category_id, month, amount).await?;
            }
            CardEffect::RefundToCategory {
                category_id,
                amount,
            } => {
                self.adjust_entry(db, category_id, month, -amount).await?;
            }
            CardEffect::RefundToBudget { .. } | CardEffect::Payment { .. } => {}
        }
        self.adjust_entry(db, payment_category_id, month, -moved)
            .await?;
        tracing::debug!(
            payment_category_id = %payment_category_id,
            ?effect,
            %month,
            %moved,
            "reversed card adjustment"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (Uuid, Uuid) {
        (Uuid::new_v4(), Uuid::new_v4())
    }

    #[test]
    fn outflow_to_spending_category_is_spending() {
        let (payment, groceries) = ids();
        assert_eq!(
            classify_posting(payment, Some(groceries), MoneyCents::new(-60_00)),
            Some(CardEffect::Spending {
                category_id: groceries,
                amount: MoneyCents::new(60_00),
            })
        );
    }

    #[test]
    fn inflows_are_refunds() {
        let (payment, groceries) = ids();
        assert_eq!(
            classify_posting(payment, Some(groceries), MoneyCents::new(10_00)),
            Some(CardEffect::RefundToCategory {
                category_id: groceries,
                amount: MoneyCents::new(10_00),
            })
        );
        assert_eq!(
            classify_posting(payment, None, MoneyCents::new(10_00)),
            Some(CardEffect::RefundToBudget {
                amount: MoneyCents::new(10_00)
            })
        );
        assert_eq!(
            classify_posting(payment, Some(payment), MoneyCents::new(10_00)),
            Some(CardEffect::RefundToBudget {
                amount: MoneyCents::new(10_00)
            })
        );
    }

    #[test]
    fn uncategorized_outflow_and_zero_are_ignored() {
        let (payment, groceries) = ids();
        assert_eq!(classify_posting(payment, None, MoneyCents::new(-5_00)), None);
        assert_eq!(classify_posting(payment, Some(groceries), MoneyCents::ZERO), None);
    }

    #[test]
    fn transfer_into_card_from_budget_is_payment() {
        assert_eq!(
            classify_transfer(MoneyCents::new(100_00), true),
            Some(CardEffect::Payment {
                amount: MoneyCents::new(100_00)
            })
        );
        assert_eq!(classify_transfer(MoneyCents::new(100_00), false), None);
        assert_eq!(classify_transfer(MoneyCents::new(-100_00), true), None);
    }

    #[test]
    fn coverage_is_capped_by_assigned_before_spend() {
        let spend = MoneyCents::new(60_00);
        assert_eq!(covered_amount(spend, MoneyCents::new(200_00)), spend);
        assert_eq!(
            covered_amount(spend, MoneyCents::new(25_00)),
            MoneyCents::new(25_00)
        );
        assert_eq!(covered_amount(spend, MoneyCents::new(-10_00)), MoneyCents::ZERO);
    }
}
