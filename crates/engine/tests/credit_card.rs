mod common;

use common::{ALICE, Fixture, april, cents};
use engine::{AccountKind, BudgetMonth, NewAccountCmd, SplitLine, UpdateTransactionCmd};

#[tokio::test]
async fn covered_spending_round_trips() {
    let f = Fixture::new().await;
    f.engine
        .assign(f.groceries, april(), cents(100_00), ALICE)
        .await
        .unwrap();

    let rows = f
        .engine
        .create_transaction(f.tx(f.card, -40_00, 3).category(f.groceries))
        .await
        .unwrap();
    assert_eq!(f.assigned(f.groceries).await, cents(60_00));
    assert_eq!(f.assigned(f.card_payment).await, cents(40_00));
    // The card row is already reflected in the entries, not in activity.
    assert_eq!(f.category_view(f.groceries).await.activity, cents(0));

    f.engine.delete_transaction(rows[0].id, ALICE).await.unwrap();
    assert_eq!(f.assigned(f.groceries).await, cents(100_00));
    assert_eq!(f.assigned(f.card_payment).await, cents(0));
}

#[tokio::test]
async fn partially_covered_spending_round_trips() {
    let f = Fixture::new().await;
    f.engine
        .assign(f.groceries, april(), cents(30_00), ALICE)
        .await
        .unwrap();

    let rows = f
        .engine
        .create_transaction(f.tx(f.card, -50_00, 3).category(f.groceries))
        .await
        .unwrap();
    assert_eq!(rows[0].card_adjustment, Some(cents(30_00)));
    assert_eq!(f.assigned(f.groceries).await, cents(-20_00));
    assert_eq!(f.assigned(f.card_payment).await, cents(30_00));

    let groceries = f.category_view(f.groceries).await;
    assert!(groceries.is_overspent);

    // Covering the overspend later must not disturb the stored adjustment.
    f.engine
        .assign(f.groceries, april(), cents(0), ALICE)
        .await
        .unwrap();
    f.engine.delete_transaction(rows[0].id, ALICE).await.unwrap();
    assert_eq!(f.assigned(f.groceries).await, cents(50_00));
    assert_eq!(f.assigned(f.card_payment).await, cents(0));
}

#[tokio::test]
async fn refund_to_category_returns_money_to_it() {
    let f = Fixture::new().await;
    f.engine
        .fund_card_payment(f.card, april(), cents(50_00), ALICE)
        .await
        .unwrap();

    let rows = f
        .engine
        .create_transaction(f.tx(f.card, 20_00, 9).category(f.groceries))
        .await
        .unwrap();
    assert_eq!(rows[0].card_adjustment, Some(cents(-20_00)));
    assert_eq!(f.assigned(f.groceries).await, cents(20_00));
    assert_eq!(f.assigned(f.card_payment).await, cents(30_00));

    f.engine.delete_transaction(rows[0].id, ALICE).await.unwrap();
    assert_eq!(f.assigned(f.groceries).await, cents(0));
    assert_eq!(f.assigned(f.card_payment).await, cents(50_00));
}

#[tokio::test]
async fn uncategorized_refund_goes_back_to_be_budgeted() {
    let f = Fixture::new().await;
    f.engine
        .fund_card_payment(f.card, april(), cents(50_00), ALICE)
        .await
        .unwrap();
    let before = f
        .engine
        .budget_view(f.budget_id, april(), ALICE)
        .await
        .unwrap()
        .to_be_budgeted;

    f.engine
        .create_transaction(f.tx(f.card, 20_00, 9).payee_name("Store refund"))
        .await
        .unwrap();
    assert_eq!(f.assigned(f.card_payment).await, cents(30_00));

    let view = f
        .engine
        .budget_view(f.budget_id, april(), ALICE)
        .await
        .unwrap();
    assert_eq!(view.to_be_budgeted, before + cents(20_00));
    assert_eq!(view.total_income, cents(1000_00));
}

#[tokio::test]
async fn payment_transfer_drains_payment_category() {
    let f = Fixture::new().await;
    f.engine
        .assign(f.groceries, april(), cents(200_00), ALICE)
        .await
        .unwrap();
    f.engine
        .create_transaction(f.tx(f.card, -60_00, 5).category(f.groceries))
        .await
        .unwrap();
    assert_eq!(f.assigned(f.card_payment).await, cents(60_00));

    let rows = f
        .engine
        .create_transaction(f.tx(f.checking, -60_00, 20).transfer_to(f.card))
        .await
        .unwrap();
    assert_eq!(rows[0].card_adjustment, None);
    assert_eq!(rows[1].card_adjustment, Some(cents(-60_00)));
    assert_eq!(f.assigned(f.card_payment).await, cents(0));

    let card = f.engine.account_balances(f.card, ALICE).await.unwrap();
    assert_eq!(card.working, cents(0));
    let checking = f.engine.account_balances(f.checking, ALICE).await.unwrap();
    assert_eq!(checking.working, cents(940_00));

    f.engine.delete_transaction(rows[0].id, ALICE).await.unwrap();
    assert_eq!(f.assigned(f.card_payment).await, cents(60_00));
}

#[tokio::test]
async fn editing_a_card_row_moves_the_adjustment() {
    let f = Fixture::new().await;
    f.engine
        .assign(f.groceries, april(), cents(100_00), ALICE)
        .await
        .unwrap();
    let rows = f
        .engine
        .create_transaction(f.tx(f.card, -50_00, 4).category(f.groceries))
        .await
        .unwrap();
    let id = rows[0].id;

    f.engine
        .update_transaction(UpdateTransactionCmd::new(id, ALICE).amount(cents(-80_00)))
        .await
        .unwrap();
    assert_eq!(f.assigned(f.groceries).await, cents(20_00));
    assert_eq!(f.assigned(f.card_payment).await, cents(80_00));

    let updated = f
        .engine
        .update_transaction(UpdateTransactionCmd::new(id, ALICE).category(f.rent))
        .await
        .unwrap();
    assert_eq!(updated[0].card_adjustment, Some(cents(0)));
    assert_eq!(f.assigned(f.groceries).await, cents(100_00));
    assert_eq!(f.assigned(f.rent).await, cents(-80_00));
    assert_eq!(f.assigned(f.card_payment).await, cents(0));
}

#[tokio::test]
async fn moving_a_card_row_to_another_month_moves_its_entries() {
    let f = Fixture::new().await;
    let may = BudgetMonth::new(2024, 5).unwrap();
    f.engine
        .assign(f.groceries, april(), cents(100_00), ALICE)
        .await
        .unwrap();
    let rows = f
        .engine
        .create_transaction(f.tx(f.card, -30_00, 28).category(f.groceries))
        .await
        .unwrap();

    f.engine
        .update_transaction(
            UpdateTransactionCmd::new(rows[0].id, ALICE).date(common::date(2024, 5, 2)),
        )
        .await
        .unwrap();
    assert_eq!(f.assigned(f.groceries).await, cents(100_00));
    assert_eq!(f.assigned(f.card_payment).await, cents(0));
    let may_groceries = f
        .engine
        .budget_entry(f.groceries, may, ALICE)
        .await
        .unwrap();
    assert_eq!(may_groceries.assigned, cents(-30_00));
}

#[tokio::test]
async fn tracking_card_has_no_subroutine() {
    let f = Fixture::new().await;
    let store_card = f
        .engine
        .new_account(
            NewAccountCmd::new(f.budget_id, ALICE, "Store card", AccountKind::CreditCard)
                .on_budget(false),
        )
        .await
        .unwrap();
    assert_eq!(store_card.payment_category_id, None);

    let rows = f
        .engine
        .create_transaction(f.tx(store_card.id, -15_00, 3))
        .await
        .unwrap();
    assert_eq!(rows[0].card_adjustment, None);
    assert_eq!(f.assigned(f.card_payment).await, cents(0));
}

#[tokio::test]
async fn card_split_lines_are_classified_per_line() {
    let f = Fixture::new().await;
    f.engine
        .assign(f.groceries, april(), cents(100_00), ALICE)
        .await
        .unwrap();
    f.engine
        .assign(f.rent, april(), cents(10_00), ALICE)
        .await
        .unwrap();

    let rows = f
        .engine
        .create_transaction(
            f.tx(f.card, -80_00, 6)
                .split(SplitLine::new(Some(f.groceries), cents(-50_00)))
                .split(SplitLine::new(Some(f.rent), cents(-30_00))),
        )
        .await
        .unwrap();
    let header = &rows[0];
    assert_eq!(header.card_adjustment, None);
    let line_for = |category_id| {
        header
            .splits
            .iter()
            .find(|line| line.category_id == Some(category_id))
            .unwrap()
            .card_adjustment
    };
    assert_eq!(line_for(f.groceries), Some(cents(50_00)));
    assert_eq!(line_for(f.rent), Some(cents(10_00)));
    assert_eq!(f.assigned(f.groceries).await, cents(50_00));
    assert_eq!(f.assigned(f.rent).await, cents(-20_00));
    assert_eq!(f.assigned(f.card_payment).await, cents(60_00));

    let replaced = f
        .engine
        .replace_splits(
            header.id,
            vec![
                SplitLine::new(Some(f.groceries), cents(-20_00)),
                SplitLine::new(Some(f.rent), cents(-60_00)),
            ],
            ALICE,
        )
        .await
        .unwrap();
    assert_eq!(replaced.splits.len(), 2);
    assert_eq!(f.assigned(f.groceries).await, cents(80_00));
    assert_eq!(f.assigned(f.rent).await, cents(-50_00));
    assert_eq!(f.assigned(f.card_payment).await, cents(30_00));

    f.engine.delete_transaction(header.id, ALICE).await.unwrap();
    assert_eq!(f.assigned(f.groceries).await, cents(100_00));
    assert_eq!(f.assigned(f.rent).await, cents(10_00));
    assert_eq!(f.assigned(f.card_payment).await, cents(0));
}
