#![allow(dead_code)]

use chrono::NaiveDate;
use sea_orm::{Database, DatabaseConnection};

use engine::{
    AccountKind, BudgetMonth, CategoryView, Engine, MoneyCents, NewAccountCmd, NewTransactionCmd,
};
use migration::MigratorTrait;
use uuid::Uuid;

pub const ALICE: &str = "alice";
pub const BOB: &str = "bob";

pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    engine.new_user(ALICE).await.unwrap();
    (engine, db)
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn april() -> BudgetMonth {
    BudgetMonth::new(2024, 4).unwrap()
}

pub fn cents(value: i64) -> MoneyCents {
    MoneyCents::new(value)
}

/// Alice's budget: a checking account opened with 1000.00 on 2024-04-01, an
/// on-budget Visa card, and an "Everyday" group with Groceries and Rent.
pub struct Fixture {
    pub engine: Engine,
    pub db: DatabaseConnection,
    pub budget_id: Uuid,
    pub checking: Uuid,
    pub card: Uuid,
    pub card_payment: Uuid,
    pub group: Uuid,
    pub groceries: Uuid,
    pub rent: Uuid,
}

impl Fixture {
    pub async fn new() -> Self {
        let (engine, db) = engine_with_db().await;
        let budget = engine.new_budget("Home", ALICE).await.unwrap();

        let checking = engine
            .new_account(
                NewAccountCmd::new(budget.id, ALICE, "Checking", AccountKind::Checking)
                    .opening_balance(cents(1000_00), date(2024, 4, 1)),
            )
            .await
            .unwrap();
        let card = engine
            .new_account(NewAccountCmd::new(
                budget.id,
                ALICE,
                "Visa",
                AccountKind::CreditCard,
            ))
            .await
            .unwrap();
        let group = engine
            .new_category_group(budget.id, "Everyday", ALICE)
            .await
            .unwrap();
        let groceries = engine
            .new_category(group.id, "Groceries", ALICE)
            .await
            .unwrap();
        let rent = engine.new_category(group.id, "Rent", ALICE).await.unwrap();

        Self {
            engine,
            db,
            budget_id: budget.id,
            checking: checking.id,
            card: card.id,
            card_payment: card.payment_category_id.unwrap(),
            group: group.id,
            groceries: groceries.id,
            rent: rent.id,
        }
    }

    pub fn tx(&self, account_id: Uuid, amount: i64, day: u32) -> NewTransactionCmd {
        NewTransactionCmd::new(
            self.budget_id,
            ALICE,
            account_id,
            cents(amount),
            date(2024, 4, day),
        )
    }

    pub async fn assigned(&self, category_id: Uuid) -> MoneyCents {
        self.engine
            .budget_entry(category_id, april(), ALICE)
            .await
            .unwrap()
            .assigned
    }

    pub async fn category_view(&self, category_id: Uuid) -> CategoryView {
        self.engine
            .budget_view(self.budget_id, april(), ALICE)
            .await
            .unwrap()
            .groups
            .into_iter()
            .flat_map(|group| group.categories)
            .find(|category| category.category_id == category_id)
            .unwrap()
    }
}
