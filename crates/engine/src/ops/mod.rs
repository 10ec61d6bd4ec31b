use sea_orm::DatabaseConnection;

use crate::{EngineError, ResultEngine};

mod access;
mod accounts;
mod balances;
mod budget_view;
mod budgets;
mod categories;
mod credit_card;
mod entries;
mod goals;
mod payees;
mod transactions;
mod users;

pub use balances::AccountBalances;
pub use budget_view::{BudgetView, CategoryView, GoalProgress, GroupView};
pub use categories::CategoryTree;
pub use transactions::TransactionListFilter;

/// Runs `$body` as one atomic unit of work.
///
/// The body receives the open transaction by name and must evaluate to a
/// `ResultEngine<T>`. Dropping the transaction on `Err` rolls it back.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Starts configuring an engine over an existing connection.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidName(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Configuration for [`Engine`]. The connection must already be migrated.
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Connection the engine reads and writes through.
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_name_is_trimmed() {
        assert_eq!(
            normalize_required_name("  Groceries ", "category").unwrap(),
            "Groceries"
        );
        assert_eq!(
            normalize_required_name("   ", "category").unwrap_err(),
            EngineError::InvalidName("category name must not be empty".to_string())
        );
    }

    #[test]
    fn optional_text_drops_blank() {
        assert_eq!(normalize_optional_text(Some("  ")), None);
        assert_eq!(
            normalize_optional_text(Some(" rent ")),
            Some("rent".to_string())
        );
        assert_eq!(normalize_optional_text(None), None);
    }
}
