//! Initial schema migration.
//!
//! Creates the complete ledger schema:
//!
//! - `users`: identities supplied by the authentication layer
//! - `budgets`: root of isolation, owned by a user
//! - `category_groups` / `categories`: two-level envelope hierarchy
//! - `accounts`: budget and tracking accounts, optionally linked to a card
//!   payment category
//! - `payees`: per-budget payee registry
//! - `budget_entries`: assigned amount per (category, year, month)
//! - `goals`: optional funding goal per category
//! - `transactions` / `split_transactions`: the ledger

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Username,
    CreatedAt,
}

#[derive(Iden)]
enum Budgets {
    Table,
    Id,
    Name,
    UserId,
    CreatedAt,
}

#[derive(Iden)]
enum CategoryGroups {
    Table,
    Id,
    BudgetId,
    Name,
    SortOrder,
    IsSystem,
    Hidden,
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    GroupId,
    Name,
    SortOrder,
    Hidden,
    Note,
}

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    BudgetId,
    Name,
    Kind,
    OnBudget,
    IsClosed,
    Note,
    PaymentCategoryId,
    CreatedAt,
}

#[derive(Iden)]
enum Payees {
    Table,
    Id,
    BudgetId,
    Name,
    NameNorm,
}

#[derive(Iden)]
enum BudgetEntries {
    Table,
    Id,
    CategoryId,
    Year,
    Month,
    AssignedMinor,
    UpdatedAt,
}

#[derive(Iden)]
enum Goals {
    Table,
    Id,
    CategoryId,
    Kind,
    TargetMinor,
    TargetDate,
    MonthlyMinor,
    CreatedAt,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    BudgetId,
    AccountId,
    PayeeId,
    CategoryId,
    AmountMinor,
    Date,
    Memo,
    Cleared,
    Approved,
    IsTransfer,
    TransferGroupId,
    TransferAccountId,
    IsSplit,
    CardAdjustmentMinor,
    ImportId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum SplitTransactions {
    Table,
    Id,
    TransactionId,
    CategoryId,
    AmountMinor,
    Memo,
    CardAdjustmentMinor,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Budgets
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Budgets::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Budgets::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Budgets::Name).string().not_null())
                    .col(ColumnDef::new(Budgets::UserId).string().not_null())
                    .col(ColumnDef::new(Budgets::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budgets-user_id")
                            .from(Budgets::Table, Budgets::UserId)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-budgets-user_id")
                    .table(Budgets::Table)
                    .col(Budgets::UserId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Category groups
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(CategoryGroups::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CategoryGroups::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CategoryGroups::BudgetId).string().not_null())
                    .col(ColumnDef::new(CategoryGroups::Name).string().not_null())
                    .col(
                        ColumnDef::new(CategoryGroups::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(CategoryGroups::IsSystem)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(CategoryGroups::Hidden)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-category_groups-budget_id")
                            .from(CategoryGroups::Table, CategoryGroups::BudgetId)
                            .to(Budgets::Table, Budgets::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-category_groups-budget_id-name-unique")
                    .table(CategoryGroups::Table)
                    .col(CategoryGroups::BudgetId)
                    .col(CategoryGroups::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Categories
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Categories::GroupId).string().not_null())
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(
                        ColumnDef::new(Categories::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Categories::Hidden)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Categories::Note).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-categories-group_id")
                            .from(Categories::Table, Categories::GroupId)
                            .to(CategoryGroups::Table, CategoryGroups::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-categories-group_id-name-unique")
                    .table(Categories::Table)
                    .col(Categories::GroupId)
                    .col(Categories::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Accounts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Accounts::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Accounts::BudgetId).string().not_null())
                    .col(ColumnDef::new(Accounts::Name).string().not_null())
                    .col(ColumnDef::new(Accounts::Kind).string().not_null())
                    .col(ColumnDef::new(Accounts::OnBudget).boolean().not_null())
                    .col(
                        ColumnDef::new(Accounts::IsClosed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Accounts::Note).string())
                    .col(ColumnDef::new(Accounts::PaymentCategoryId).string())
                    .col(ColumnDef::new(Accounts::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-accounts-budget_id")
                            .from(Accounts::Table, Accounts::BudgetId)
                            .to(Budgets::Table, Budgets::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-accounts-payment_category_id")
                            .from(Accounts::Table, Accounts::PaymentCategoryId)
                            .to(Categories::Table, Categories::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-payment_category_id-unique")
                    .table(Accounts::Table)
                    .col(Accounts::PaymentCategoryId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-budget_id")
                    .table(Accounts::Table)
                    .col(Accounts::BudgetId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Payees
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Payees::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Payees::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Payees::BudgetId).string().not_null())
                    .col(ColumnDef::new(Payees::Name).string().not_null())
                    .col(ColumnDef::new(Payees::NameNorm).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-payees-budget_id")
                            .from(Payees::Table, Payees::BudgetId)
                            .to(Budgets::Table, Budgets::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-payees-budget_id-name_norm-unique")
                    .table(Payees::Table)
                    .col(Payees::BudgetId)
                    .col(Payees::NameNorm)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Budget entries
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(BudgetEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BudgetEntries::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BudgetEntries::CategoryId).string().not_null())
                    .col(ColumnDef::new(BudgetEntries::Year).integer().not_null())
                    .col(ColumnDef::new(BudgetEntries::Month).integer().not_null())
                    .col(
                        ColumnDef::new(BudgetEntries::AssignedMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(BudgetEntries::UpdatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budget_entries-category_id")
                            .from(BudgetEntries::Table, BudgetEntries::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-budget_entries-category_id-year-month-unique")
                    .table(BudgetEntries::Table)
                    .col(BudgetEntries::CategoryId)
                    .col(BudgetEntries::Year)
                    .col(BudgetEntries::Month)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 8. Goals
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Goals::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Goals::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Goals::CategoryId).string().not_null())
                    .col(ColumnDef::new(Goals::Kind).string().not_null())
                    .col(ColumnDef::new(Goals::TargetMinor).big_integer())
                    .col(ColumnDef::new(Goals::TargetDate).date())
                    .col(ColumnDef::new(Goals::MonthlyMinor).big_integer())
                    .col(ColumnDef::new(Goals::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-goals-category_id")
                            .from(Goals::Table, Goals::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-goals-category_id-unique")
                    .table(Goals::Table)
                    .col(Goals::CategoryId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 9. Transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::BudgetId).string().not_null())
                    .col(ColumnDef::new(Transactions::AccountId).string().not_null())
                    .col(ColumnDef::new(Transactions::PayeeId).string())
                    .col(ColumnDef::new(Transactions::CategoryId).string())
                    .col(
                        ColumnDef::new(Transactions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Date).date().not_null())
                    .col(ColumnDef::new(Transactions::Memo).string())
                    .col(
                        ColumnDef::new(Transactions::Cleared)
                            .string()
                            .not_null()
                            .default("uncleared"),
                    )
                    .col(
                        ColumnDef::new(Transactions::Approved)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Transactions::IsTransfer)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Transactions::TransferGroupId).string())
                    .col(ColumnDef::new(Transactions::TransferAccountId).string())
                    .col(
                        ColumnDef::new(Transactions::IsSplit)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Transactions::CardAdjustmentMinor).big_integer())
                    .col(ColumnDef::new(Transactions::ImportId).string())
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::UpdatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-budget_id")
                            .from(Transactions::Table, Transactions::BudgetId)
                            .to(Budgets::Table, Budgets::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-account_id")
                            .from(Transactions::Table, Transactions::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-payee_id")
                            .from(Transactions::Table, Transactions::PayeeId)
                            .to(Payees::Table, Payees::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-category_id")
                            .from(Transactions::Table, Transactions::CategoryId)
                            .to(Categories::Table, Categories::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-budget_id-date")
                    .table(Transactions::Table)
                    .col(Transactions::BudgetId)
                    .col(Transactions::Date)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-account_id")
                    .table(Transactions::Table)
                    .col(Transactions::AccountId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-transfer_group_id")
                    .table(Transactions::Table)
                    .col(Transactions::TransferGroupId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-account_id-import_id-unique")
                    .table(Transactions::Table)
                    .col(Transactions::AccountId)
                    .col(Transactions::ImportId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 10. Split transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(SplitTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SplitTransactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SplitTransactions::TransactionId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SplitTransactions::CategoryId).string())
                    .col(
                        ColumnDef::new(SplitTransactions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SplitTransactions::Memo).string())
                    .col(ColumnDef::new(SplitTransactions::CardAdjustmentMinor).big_integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-split_transactions-transaction_id")
                            .from(SplitTransactions::Table, SplitTransactions::TransactionId)
                            .to(Transactions::Table, Transactions::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-split_transactions-category_id")
                            .from(SplitTransactions::Table, SplitTransactions::CategoryId)
                            .to(Categories::Table, Categories::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-split_transactions-transaction_id")
                    .table(SplitTransactions::Table)
                    .col(SplitTransactions::TransactionId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(SplitTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Goals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BudgetEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Payees::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CategoryGroups::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Budgets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
