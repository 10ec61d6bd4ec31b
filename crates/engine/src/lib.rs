//! Envelope budgeting ledger and budget engine.
//!
//! The engine persists budgets, accounts, categories, and the transaction
//! ledger through `sea-orm`, and derives everything else (category activity,
//! To Be Budgeted, account balances) from those rows on read.
//!
//! Every mutating operation runs as one database transaction: either all of
//! its writes commit or none do.

pub use accounts::{Account, AccountKind};
pub use budget_entries::BudgetEntry;
pub use budgets::Budget;
pub use categories::Category;
pub use category_groups::{CARD_PAYMENTS_GROUP, CategoryGroup};
pub use commands::{
    MoveMoneyCmd, NewAccountCmd, NewTransactionCmd, PayeeRef, SplitLine, UpdateTransactionCmd,
};
pub use error::{EngineError, ErrorKind};
pub use goals::{Goal, GoalSpec};
pub use money::MoneyCents;
pub use month::{BudgetMonth, percent};
pub use ops::{
    AccountBalances, BudgetView, CategoryTree, CategoryView, Engine, EngineBuilder, GoalProgress,
    GroupView, TransactionListFilter,
};
pub use payees::Payee;
pub use splits::SplitTransaction;
pub use transactions::{ClearedState, Transaction};

mod accounts;
mod budget_entries;
mod budgets;
mod categories;
mod category_groups;
mod commands;
mod error;
mod goals;
mod money;
mod month;
mod ops;
mod payees;
mod splits;
mod transactions;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
