mod common;

use common::{ALICE, Fixture, april, cents, date};
use engine::{
    AccountKind, ClearedState, EngineError, ErrorKind, NewAccountCmd, SplitLine,
    TransactionListFilter, UpdateTransactionCmd,
};
use uuid::Uuid;

fn everything() -> TransactionListFilter {
    TransactionListFilter {
        include_transfers: true,
        ..TransactionListFilter::default()
    }
}

#[tokio::test]
async fn transfer_creates_mirrored_pair() {
    let f = Fixture::new().await;
    let savings = f
        .engine
        .new_account(NewAccountCmd::new(
            f.budget_id,
            ALICE,
            "Savings",
            AccountKind::Savings,
        ))
        .await
        .unwrap();

    let rows = f
        .engine
        .create_transaction(f.tx(f.checking, -250_00, 10).transfer_to(savings.id))
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    let (source, sibling) = (&rows[0], &rows[1]);
    assert!(source.is_transfer && sibling.is_transfer);
    assert_eq!(source.transfer_group_id, sibling.transfer_group_id);
    assert_eq!(source.amount, -sibling.amount);
    assert_eq!(source.transfer_account_id, Some(savings.id));
    assert_eq!(sibling.transfer_account_id, Some(f.checking));
    assert_eq!(sibling.account_id, savings.id);

    let balances = f.engine.account_balances(savings.id, ALICE).await.unwrap();
    assert_eq!(balances.working, cents(250_00));

    // Transfers between budget accounts leave the budget untouched.
    let view = f
        .engine
        .budget_view(f.budget_id, april(), ALICE)
        .await
        .unwrap();
    assert_eq!(view.total_income, cents(1000_00));
    assert_eq!(view.total_activity, cents(0));

    let deleted = f.engine.delete_transaction(sibling.id, ALICE).await.unwrap();
    assert_eq!(deleted.len(), 2);
    assert!(deleted.contains(&source.id));
    let err = f.engine.transaction(source.id, ALICE).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let balances = f.engine.account_balances(savings.id, ALICE).await.unwrap();
    assert_eq!(balances.working, cents(0));
}

#[tokio::test]
async fn transfer_category_depends_on_budget_side() {
    let f = Fixture::new().await;
    let mortgage = f
        .engine
        .new_account(NewAccountCmd::new(
            f.budget_id,
            ALICE,
            "Mortgage",
            AccountKind::Mortgage,
        ))
        .await
        .unwrap();
    assert!(!mortgage.on_budget);

    let err = f
        .engine
        .create_transaction(f.tx(f.checking, -500_00, 2).transfer_to(mortgage.id))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidCategory(_)));

    let rows = f
        .engine
        .create_transaction(
            f.tx(f.checking, -500_00, 2)
                .transfer_to(mortgage.id)
                .category(f.rent),
        )
        .await
        .unwrap();
    assert_eq!(rows[0].category_id, Some(f.rent));
    assert_eq!(rows[1].category_id, None);

    // Transfers never count as activity, categorized or not.
    let rent = f.category_view(f.rent).await;
    assert_eq!(rent.activity, cents(0));

    let savings = f
        .engine
        .new_account(NewAccountCmd::new(
            f.budget_id,
            ALICE,
            "Savings",
            AccountKind::Savings,
        ))
        .await
        .unwrap();
    let err = f
        .engine
        .create_transaction(
            f.tx(f.checking, -10_00, 2)
                .transfer_to(savings.id)
                .category(f.rent),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidCategory(_)));

    let err = f
        .engine
        .create_transaction(f.tx(f.checking, -10_00, 2).transfer_to(f.checking))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransfer(_)));
}

#[tokio::test]
async fn split_with_wrong_total_persists_nothing() {
    let f = Fixture::new().await;
    let err = f
        .engine
        .create_transaction(
            f.tx(f.checking, -100_00, 8)
                .payee_name("Supermarket")
                .split(SplitLine::new(Some(f.groceries), cents(-70_00)))
                .split(SplitLine::new(Some(f.rent), cents(-20_00))),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidSplit(_)));

    let (rows, _) = f
        .engine
        .list_transactions(f.budget_id, ALICE, 50, None, &everything())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1, "only the opening balance should exist");
    assert!(
        f.engine
            .list_payees(f.budget_id, ALICE)
            .await
            .unwrap()
            .iter()
            .all(|payee| payee.name != "Supermarket")
    );

    let err = f
        .engine
        .create_transaction(
            f.tx(f.checking, -100_00, 8).split(SplitLine::new(Some(f.groceries), cents(-100_00))),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidSplit(_)));
}

#[tokio::test]
async fn split_lines_feed_category_activity() {
    let f = Fixture::new().await;
    let rows = f
        .engine
        .create_transaction(
            f.tx(f.checking, -100_00, 8)
                .split(SplitLine::new(Some(f.groceries), cents(-70_00)).memo("food"))
                .split(SplitLine::new(Some(f.rent), cents(-30_00))),
        )
        .await
        .unwrap();
    let header = &rows[0];
    assert!(header.is_split);
    assert_eq!(header.category_id, None);
    assert_eq!(header.splits.len(), 2);

    assert_eq!(f.category_view(f.groceries).await.activity, cents(-70_00));
    assert_eq!(f.category_view(f.rent).await.activity, cents(-30_00));

    let filter = TransactionListFilter {
        category_id: Some(f.rent),
        ..TransactionListFilter::default()
    };
    let (rows, _) = f
        .engine
        .list_transactions(f.budget_id, ALICE, 10, None, &filter)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, header.id);

    let replaced = f
        .engine
        .replace_splits(
            header.id,
            vec![
                SplitLine::new(Some(f.groceries), cents(-40_00)),
                SplitLine::new(Some(f.rent), cents(-60_00)),
            ],
            ALICE,
        )
        .await
        .unwrap();
    assert_eq!(replaced.splits.len(), 2);
    assert_eq!(f.category_view(f.groceries).await.activity, cents(-40_00));
    assert_eq!(f.category_view(f.rent).await.activity, cents(-60_00));

    let err = f
        .engine
        .update_transaction(UpdateTransactionCmd::new(header.id, ALICE).amount(cents(-90_00)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidSplit(_)));
}

#[tokio::test]
async fn closed_account_rejects_new_rows() {
    let f = Fixture::new().await;
    f.engine
        .set_account_closed(f.checking, true, ALICE)
        .await
        .unwrap();
    let err = f
        .engine
        .create_transaction(f.tx(f.checking, -5_00, 9))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAccount(_)));

    // History and balances survive the close.
    let balances = f.engine.account_balances(f.checking, ALICE).await.unwrap();
    assert_eq!(balances.working, cents(1000_00));
}

#[tokio::test]
async fn reconciled_rows_are_locked() {
    let f = Fixture::new().await;
    let rows = f
        .engine
        .create_transaction(
            f.tx(f.checking, -12_00, 11)
                .category(f.groceries)
                .cleared(ClearedState::Reconciled),
        )
        .await
        .unwrap();
    let id = rows[0].id;

    let err = f
        .engine
        .update_transaction(UpdateTransactionCmd::new(id, ALICE).memo("late note"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Locked(_)));
    let err = f.engine.delete_transaction(id, ALICE).await.unwrap_err();
    assert!(matches!(err, EngineError::Locked(_)));
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn pagination_walks_newest_first() {
    let f = Fixture::new().await;
    for day in 10..15 {
        f.engine
            .create_transaction(f.tx(f.checking, -1_00, day).category(f.groceries))
            .await
            .unwrap();
    }

    let mut seen = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let (page, next) = f
            .engine
            .list_transactions(f.budget_id, ALICE, 2, cursor.as_deref(), &everything())
            .await
            .unwrap();
        assert!(page.len() <= 2);
        seen.extend(page);
        match next {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }
    assert_eq!(seen.len(), 6);
    assert!(seen.windows(2).all(|pair| pair[0].date >= pair[1].date));
    assert_eq!(seen[0].date, date(2024, 4, 14));
    assert_eq!(seen[5].date, date(2024, 4, 1));

    let filter = TransactionListFilter {
        from: Some(date(2024, 4, 11)),
        to: Some(date(2024, 4, 13)),
        ..TransactionListFilter::default()
    };
    let (page, next) = f
        .engine
        .list_transactions(f.budget_id, ALICE, 10, None, &filter)
        .await
        .unwrap();
    assert_eq!(page.len(), 2);
    assert!(next.is_none());

    let err = f
        .engine
        .list_transactions(f.budget_id, ALICE, 2, Some("not-a-cursor"), &everything())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidCursor(_)));

    let err = f
        .engine
        .list_transactions(f.budget_id, ALICE, 0, None, &everything())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn import_id_is_unique_per_account() {
    let f = Fixture::new().await;
    f.engine
        .create_transaction(f.tx(f.checking, -9_99, 12).import_id("bank:123"))
        .await
        .unwrap();
    let err = f
        .engine
        .create_transaction(f.tx(f.checking, -9_99, 12).import_id("bank:123"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
    assert_eq!(err.kind(), ErrorKind::Conflict);

    f.engine
        .create_transaction(f.tx(f.card, -9_99, 12).import_id("bank:123"))
        .await
        .unwrap();
}

#[tokio::test]
async fn payees_are_matched_by_normalized_name() {
    let f = Fixture::new().await;
    let first = f
        .engine
        .create_transaction(f.tx(f.checking, -3_00, 5).payee_name("Corner Shop"))
        .await
        .unwrap();
    let second = f
        .engine
        .create_transaction(f.tx(f.checking, -4_00, 6).payee_name("  corner   SHOP "))
        .await
        .unwrap();
    assert!(first[0].payee_id.is_some());
    assert_eq!(first[0].payee_id, second[0].payee_id);

    let payees = f.engine.list_payees(f.budget_id, ALICE).await.unwrap();
    let shops: Vec<_> = payees
        .iter()
        .filter(|payee| payee.name.eq_ignore_ascii_case("corner shop"))
        .collect();
    assert_eq!(shops.len(), 1);
    assert_eq!(shops[0].name, "Corner Shop");
}

#[tokio::test]
async fn memo_edit_leaves_entries_alone() {
    let f = Fixture::new().await;
    f.engine
        .assign(f.groceries, april(), cents(100_00), ALICE)
        .await
        .unwrap();
    let rows = f
        .engine
        .create_transaction(f.tx(f.card, -25_00, 7).category(f.groceries))
        .await
        .unwrap();
    let groceries_before = f.assigned(f.groceries).await;
    let payment_before = f.assigned(f.card_payment).await;

    let updated = f
        .engine
        .update_transaction(
            UpdateTransactionCmd::new(rows[0].id, ALICE)
                .memo("weekly shop")
                .cleared(ClearedState::Cleared),
        )
        .await
        .unwrap();
    assert_eq!(updated[0].memo.as_deref(), Some("weekly shop"));
    assert_eq!(updated[0].card_adjustment, rows[0].card_adjustment);
    assert_eq!(f.assigned(f.groceries).await, groceries_before);
    assert_eq!(f.assigned(f.card_payment).await, payment_before);
}

#[tokio::test]
async fn unknown_transaction_is_not_found() {
    let f = Fixture::new().await;
    let err = f
        .engine
        .delete_transaction(Uuid::new_v4(), ALICE)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn transfer_edits_are_mirrored() {
    let f = Fixture::new().await;
    let rows = f
        .engine
        .create_transaction(f.tx(f.checking, -60_00, 20).transfer_to(f.card))
        .await
        .unwrap();
    assert_eq!(f.assigned(f.card_payment).await, cents(-60_00));

    let updated = f
        .engine
        .update_transaction(
            UpdateTransactionCmd::new(rows[0].id, ALICE)
                .amount(cents(-45_00))
                .memo("april bill"),
        )
        .await
        .unwrap();
    assert_eq!(updated[0].amount, cents(-45_00));
    assert_eq!(updated[1].amount, cents(45_00));
    assert_eq!(updated[0].memo.as_deref(), Some("april bill"));
    assert_eq!(updated[1].memo, None);
    assert_eq!(f.assigned(f.card_payment).await, cents(-45_00));

    let err = f
        .engine
        .update_transaction(UpdateTransactionCmd::new(rows[0].id, ALICE).category(f.rent))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransfer(_)));
    let err = f
        .engine
        .update_transaction(UpdateTransactionCmd::new(rows[0].id, ALICE).amount(cents(45_00)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransfer(_)));
}
