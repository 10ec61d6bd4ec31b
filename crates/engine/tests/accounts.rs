mod common;

use common::{ALICE, Fixture, april, cents};
use engine::{
    AccountKind, CARD_PAYMENTS_GROUP, ClearedState, EngineError, ErrorKind, NewAccountCmd,
};

#[tokio::test]
async fn credit_card_gets_payment_category_in_system_group() {
    let f = Fixture::new().await;
    let card = f.engine.account(f.card, ALICE).await.unwrap();
    assert!(card.on_budget);
    assert_eq!(card.payment_category_id, Some(f.card_payment));

    let tree = f.engine.list_categories(f.budget_id, ALICE).await.unwrap();
    let system = tree
        .iter()
        .find(|node| node.group.is_system)
        .unwrap();
    assert_eq!(system.group.name, CARD_PAYMENTS_GROUP);
    assert_eq!(system.categories.len(), 1);
    assert_eq!(system.categories[0].id, f.card_payment);
    assert_eq!(system.categories[0].name, "Visa");

    let view = f.category_view(f.card_payment).await;
    assert!(view.is_payment_category);
    assert!(!f.category_view(f.groceries).await.is_payment_category);
}

#[tokio::test]
async fn kind_decides_budget_side() {
    let f = Fixture::new().await;
    let mortgage = f
        .engine
        .new_account(NewAccountCmd::new(
            f.budget_id,
            ALICE,
            "House",
            AccountKind::Mortgage,
        ))
        .await
        .unwrap();
    assert!(!mortgage.on_budget);
    assert_eq!(mortgage.payment_category_id, None);

    let tracked_card = f
        .engine
        .new_account(
            NewAccountCmd::new(f.budget_id, ALICE, "Old card", AccountKind::CreditCard)
                .on_budget(false),
        )
        .await
        .unwrap();
    assert_eq!(tracked_card.payment_category_id, None);

    // Tracking balances never reach income.
    f.engine
        .new_account(
            NewAccountCmd::new(f.budget_id, ALICE, "Brokerage", AccountKind::Investment)
                .opening_balance(cents(5000_00), common::date(2024, 4, 1)),
        )
        .await
        .unwrap();
    let view = f
        .engine
        .budget_view(f.budget_id, april(), ALICE)
        .await
        .unwrap();
    assert_eq!(view.total_income, cents(1000_00));
}

#[tokio::test]
async fn account_names_are_unique_per_budget() {
    let f = Fixture::new().await;
    let err = f
        .engine
        .new_account(NewAccountCmd::new(
            f.budget_id,
            ALICE,
            "checking",
            AccountKind::Savings,
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let err = f
        .engine
        .new_account(NewAccountCmd::new(
            f.budget_id,
            ALICE,
            "   ",
            AccountKind::Cash,
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidName(_)));

    let other = f.engine.new_budget("Side", ALICE).await.unwrap();
    f.engine
        .new_account(NewAccountCmd::new(
            other.id,
            ALICE,
            "Checking",
            AccountKind::Checking,
        ))
        .await
        .unwrap();
}

#[tokio::test]
async fn renaming_a_card_renames_its_payment_category() {
    let f = Fixture::new().await;
    let card = f
        .engine
        .rename_account(f.card, "Visa Gold", ALICE)
        .await
        .unwrap();
    assert_eq!(card.name, "Visa Gold");
    let category = f.engine.category(f.card_payment, ALICE).await.unwrap();
    assert_eq!(category.name, "Visa Gold");

    let err = f
        .engine
        .rename_account(f.card, "Checking", ALICE)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let err = f
        .engine
        .rename_category(f.card_payment, "Something else", ALICE)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidCategory(_)));
}

#[tokio::test]
async fn deleting_accounts() {
    let f = Fixture::new().await;
    let err = f
        .engine
        .delete_account(f.checking, ALICE)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
    assert_eq!(err.kind(), ErrorKind::Conflict);

    f.engine.delete_account(f.card, ALICE).await.unwrap();
    let category = f.engine.category(f.card_payment, ALICE).await.unwrap();
    assert!(category.hidden);
    assert!(
        f.engine
            .list_accounts(f.budget_id, ALICE, true)
            .await
            .unwrap()
            .iter()
            .all(|account| account.id != f.card)
    );

    let card = f
        .engine
        .new_account(NewAccountCmd::new(
            f.budget_id,
            ALICE,
            "Visa",
            AccountKind::CreditCard,
        ))
        .await
        .unwrap();
    assert_eq!(card.payment_category_id, Some(f.card_payment));
    let category = f.engine.category(f.card_payment, ALICE).await.unwrap();
    assert!(!category.hidden);
}

#[tokio::test]
async fn closed_accounts_are_listed_on_request() {
    let f = Fixture::new().await;
    f.engine
        .set_account_closed(f.card, true, ALICE)
        .await
        .unwrap();
    let open = f
        .engine
        .list_accounts(f.budget_id, ALICE, false)
        .await
        .unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, f.checking);

    let all = f
        .engine
        .list_accounts(f.budget_id, ALICE, true)
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().any(|account| account.is_closed));

    let noted = f
        .engine
        .set_account_note(f.checking, Some("  joint  "), ALICE)
        .await
        .unwrap();
    assert_eq!(noted.note.as_deref(), Some("joint"));
}

#[tokio::test]
async fn balances_split_cleared_and_uncleared() {
    let f = Fixture::new().await;
    f.engine
        .create_transaction(f.tx(f.checking, -60_00, 5).category(f.groceries))
        .await
        .unwrap();

    let balances = f.engine.account_balances(f.checking, ALICE).await.unwrap();
    assert_eq!(balances.working, cents(940_00));
    assert_eq!(balances.cleared, cents(1000_00));
    assert_eq!(balances.uncleared, cents(-60_00));

    f.engine
        .create_transaction(
            f.tx(f.checking, -15_00, 6)
                .category(f.groceries)
                .cleared(ClearedState::Cleared),
        )
        .await
        .unwrap();
    let all = f
        .engine
        .budget_account_balances(f.budget_id, ALICE)
        .await
        .unwrap();
    let checking = all
        .iter()
        .find(|balances| balances.account_id == f.checking)
        .unwrap();
    assert_eq!(checking.cleared, cents(985_00));
    assert_eq!(checking.working, cents(925_00));
    let card = all
        .iter()
        .find(|balances| balances.account_id == f.card)
        .unwrap();
    assert_eq!(card.working, cents(0));
}

#[tokio::test]
async fn category_protections() {
    let f = Fixture::new().await;
    let tree = f.engine.list_categories(f.budget_id, ALICE).await.unwrap();
    let system = tree
        .iter()
        .find(|node| node.group.is_system)
        .unwrap()
        .group
        .id;

    let err = f
        .engine
        .new_category(system, "Sneaky", ALICE)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidCategory(_)));
    let err = f
        .engine
        .delete_category_group(system, ALICE)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidCategory(_)));
    let err = f
        .engine
        .new_category_group(f.budget_id, "credit card payments", ALICE)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidName(_)));

    let err = f
        .engine
        .new_category(f.group, "groceries", ALICE)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let err = f
        .engine
        .delete_category_group(f.group, ALICE)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));

    f.engine
        .assign(f.rent, april(), cents(10_00), ALICE)
        .await
        .unwrap();
    let err = f.engine.delete_category(f.rent, ALICE).await.unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
    f.engine
        .assign(f.rent, april(), cents(0), ALICE)
        .await
        .unwrap();
    f.engine.delete_category(f.rent, ALICE).await.unwrap();
    // The zeroed entry rows go with the category.
    let err = f
        .engine
        .budget_entry(f.rent, april(), ALICE)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    f.engine
        .create_transaction(f.tx(f.checking, -2_00, 3).category(f.groceries))
        .await
        .unwrap();
    let err = f
        .engine
        .delete_category(f.groceries, ALICE)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
}

#[tokio::test]
async fn categories_move_between_groups() {
    let f = Fixture::new().await;
    let bills = f
        .engine
        .new_category_group(f.budget_id, "Bills", ALICE)
        .await
        .unwrap();
    let moved = f
        .engine
        .move_category(f.rent, bills.id, ALICE)
        .await
        .unwrap();
    assert_eq!(moved.group_id, bills.id);

    let tree = f.engine.list_categories(f.budget_id, ALICE).await.unwrap();
    let bills_node = tree.iter().find(|node| node.group.id == bills.id).unwrap();
    assert_eq!(bills_node.categories.len(), 1);
    assert_eq!(bills_node.categories[0].name, "Rent");

    let clash = f
        .engine
        .new_category(f.group, "Rent", ALICE)
        .await
        .unwrap();
    let err = f
        .engine
        .move_category(clash.id, bills.id, ALICE)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let noted = f
        .engine
        .set_category_note(f.groceries, Some("weekly"), ALICE)
        .await
        .unwrap();
    assert_eq!(noted.note.as_deref(), Some("weekly"));
    let hidden = f
        .engine
        .set_category_hidden(f.groceries, true, ALICE)
        .await
        .unwrap();
    assert!(hidden.hidden);
}
