use std::error::Error;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use engine::{
    AccountKind, BudgetMonth, ClearedState, Engine, GoalSpec, MoneyCents, MoveMoneyCmd,
    NewAccountCmd, NewTransactionCmd, SplitLine, TransactionListFilter,
};
use migration::{Migrator, MigratorTrait};
use serde::Serialize;
use uuid::Uuid;

mod settings;

#[derive(Parser, Debug)]
#[command(name = "envelope")]
#[command(about = "Envelope budgeting ledger: operator commands")]
struct Cli {
    /// Settings file, without extension.
    #[arg(long, default_value = "settings")]
    config: String,

    /// Database connection string; overrides the settings file.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// User the command acts as.
    #[arg(long, short, env = "ENVELOPE_USER", global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending migrations and exit.
    Migrate,
    User(UserArgs),
    Budget(BudgetArgs),
    Account(AccountArgs),
    Category(CategoryArgs),
    Tx(TxArgs),
    /// Set the assigned amount of a category for a month.
    Assign {
        #[arg(long)]
        category: Uuid,
        #[arg(long, value_parser = parse_month)]
        month: BudgetMonth,
        #[arg(long, value_parser = parse_money)]
        amount: MoneyCents,
    },
    /// Move assigned money between two categories.
    Move {
        #[arg(long)]
        from: Uuid,
        #[arg(long)]
        to: Uuid,
        #[arg(long, value_parser = parse_month)]
        month: BudgetMonth,
        #[arg(long, value_parser = parse_money)]
        amount: MoneyCents,
    },
    /// Show the budget view of a month.
    View {
        #[arg(long)]
        budget: Uuid,
        #[arg(long, value_parser = parse_month)]
        month: BudgetMonth,
    },
    Goal(GoalArgs),
}

#[derive(Args, Debug)]
struct UserArgs {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create {
        #[arg(long)]
        username: String,
    },
}

#[derive(Args, Debug)]
struct BudgetArgs {
    #[command(subcommand)]
    command: BudgetCommand,
}

#[derive(Subcommand, Debug)]
enum BudgetCommand {
    Create {
        #[arg(long)]
        name: String,
    },
    List,
}

#[derive(Args, Debug)]
struct AccountArgs {
    #[command(subcommand)]
    command: AccountCommand,
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    Create {
        #[arg(long)]
        budget: Uuid,
        #[arg(long)]
        name: String,
        #[arg(long, value_parser = parse_kind)]
        kind: AccountKind,
        /// Override the kind's default (on budget vs tracking).
        #[arg(long)]
        on_budget: Option<bool>,
        #[arg(long, value_parser = parse_money)]
        opening_balance: Option<MoneyCents>,
        #[arg(long)]
        opening_date: Option<NaiveDate>,
    },
    List {
        #[arg(long)]
        budget: Uuid,
        #[arg(long)]
        include_closed: bool,
    },
    Balances {
        #[arg(long)]
        budget: Uuid,
    },
    Close {
        #[arg(long)]
        account: Uuid,
    },
}

#[derive(Args, Debug)]
struct CategoryArgs {
    #[command(subcommand)]
    command: CategoryCommand,
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    CreateGroup {
        #[arg(long)]
        budget: Uuid,
        #[arg(long)]
        name: String,
    },
    Create {
        #[arg(long)]
        group: Uuid,
        #[arg(long)]
        name: String,
    },
    List {
        #[arg(long)]
        budget: Uuid,
    },
}

#[derive(Args, Debug)]
struct TxArgs {
    #[command(subcommand)]
    command: TxCommand,
}

#[derive(Subcommand, Debug)]
enum TxCommand {
    /// Record a transaction, a transfer (`--transfer-to`), or a split
    /// (`--split CATEGORY:AMOUNT`, repeated).
    Add {
        #[arg(long)]
        budget: Uuid,
        #[arg(long)]
        account: Uuid,
        /// Signed: negative is an outflow.
        #[arg(long, value_parser = parse_money, allow_hyphen_values = true)]
        amount: MoneyCents,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        payee: Option<String>,
        #[arg(long)]
        category: Option<Uuid>,
        #[arg(long)]
        memo: Option<String>,
        #[arg(long)]
        cleared: bool,
        #[arg(long)]
        transfer_to: Option<Uuid>,
        #[arg(long, value_parser = parse_split, allow_hyphen_values = true)]
        split: Vec<SplitLine>,
    },
    List {
        #[arg(long)]
        budget: Uuid,
        #[arg(long)]
        account: Option<Uuid>,
        #[arg(long, default_value_t = 50)]
        limit: u64,
        #[arg(long)]
        cursor: Option<String>,
        #[arg(long)]
        include_transfers: bool,
    },
    Delete {
        #[arg(long)]
        id: Uuid,
    },
}

#[derive(Args, Debug)]
struct GoalArgs {
    #[command(subcommand)]
    command: GoalCommand,
}

#[derive(Subcommand, Debug)]
enum GoalCommand {
    /// Target balance, optionally by a date.
    Target {
        #[arg(long)]
        category: Uuid,
        #[arg(long, value_parser = parse_money)]
        amount: MoneyCents,
        #[arg(long)]
        by: Option<NaiveDate>,
    },
    Monthly {
        #[arg(long)]
        category: Uuid,
        #[arg(long, value_parser = parse_money)]
        amount: MoneyCents,
    },
    Delete {
        #[arg(long)]
        category: Uuid,
    },
}

fn parse_money(raw: &str) -> Result<MoneyCents, String> {
    raw.parse::<MoneyCents>().map_err(|err| err.to_string())
}

fn parse_month(raw: &str) -> Result<BudgetMonth, String> {
    let (year, month) = raw
        .split_once('-')
        .ok_or_else(|| format!("expected YYYY-MM, got {raw}"))?;
    let year = year.parse::<i32>().map_err(|err| err.to_string())?;
    let month = month.parse::<u32>().map_err(|err| err.to_string())?;
    BudgetMonth::new(year, month).map_err(|err| err.to_string())
}

fn parse_kind(raw: &str) -> Result<AccountKind, String> {
    AccountKind::try_from(raw).map_err(|err| err.to_string())
}

fn parse_split(raw: &str) -> Result<SplitLine, String> {
    let (category, amount) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected CATEGORY:AMOUNT, got {raw}"))?;
    let category = if category.is_empty() {
        None
    } else {
        Some(Uuid::parse_str(category).map_err(|err| err.to_string())?)
    };
    Ok(SplitLine::new(category, parse_money(amount)?))
}

fn require_user(user: Option<&str>) -> Result<&str, Box<dyn Error + Send + Sync>> {
    user.ok_or_else(|| "--user (or ENVELOPE_USER) is required".into())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error + Send + Sync>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();
    let settings = settings::Settings::new(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "envelope={level},engine={level},migration={level}",
            level = settings.app.level
        ))
        .init();

    let url = cli
        .database_url
        .clone()
        .unwrap_or_else(|| settings.database.url());
    let db = sea_orm::Database::connect(url).await?;
    Migrator::up(&db, None).await?;
    tracing::debug!("database ready");

    let engine = Engine::builder().database(db).build().await?;
    let user = cli.user.as_deref();

    match cli.command {
        Command::Migrate => println!("migrations applied"),
        Command::User(UserArgs {
            command: UserCommand::Create { username },
        }) => {
            let username = engine.new_user(&username).await?;
            println!("created user: {username}");
        }
        Command::Budget(BudgetArgs { command }) => match command {
            BudgetCommand::Create { name } => {
                let budget = engine.new_budget(&name, require_user(user)?).await?;
                println!("created budget: {} ({})", budget.name, budget.id);
            }
            BudgetCommand::List => {
                print_json(&engine.list_budgets(require_user(user)?).await?)?;
            }
        },
        Command::Account(AccountArgs { command }) => match command {
            AccountCommand::Create {
                budget,
                name,
                kind,
                on_budget,
                opening_balance,
                opening_date,
            } => {
                let mut cmd = NewAccountCmd::new(budget, require_user(user)?, name, kind);
                if let Some(on_budget) = on_budget {
                    cmd = cmd.on_budget(on_budget);
                }
                if let Some(amount) = opening_balance {
                    cmd.opening_balance = amount;
                    cmd.opening_date = opening_date;
                }
                let account = engine.new_account(cmd).await?;
                println!("created account: {} ({})", account.name, account.id);
            }
            AccountCommand::List {
                budget,
                include_closed,
            } => {
                print_json(
                    &engine
                        .list_accounts(budget, require_user(user)?, include_closed)
                        .await?,
                )?;
            }
            AccountCommand::Balances { budget } => {
                print_json(
                    &engine
                        .budget_account_balances(budget, require_user(user)?)
                        .await?,
                )?;
            }
            AccountCommand::Close { account } => {
                engine
                    .set_account_closed(account, true, require_user(user)?)
                    .await?;
                println!("closed account: {account}");
            }
        },
        Command::Category(CategoryArgs { command }) => match command {
            CategoryCommand::CreateGroup { budget, name } => {
                let group = engine
                    .new_category_group(budget, &name, require_user(user)?)
                    .await?;
                println!("created group: {} ({})", group.name, group.id);
            }
            CategoryCommand::Create { group, name } => {
                let category = engine
                    .new_category(group, &name, require_user(user)?)
                    .await?;
                println!("created category: {} ({})", category.name, category.id);
            }
            CategoryCommand::List { budget } => {
                print_json(&engine.list_categories(budget, require_user(user)?).await?)?;
            }
        },
        Command::Tx(TxArgs { command }) => match command {
            TxCommand::Add {
                budget,
                account,
                amount,
                date,
                payee,
                category,
                memo,
                cleared,
                transfer_to,
                split,
            } => {
                let mut cmd =
                    NewTransactionCmd::new(budget, require_user(user)?, account, amount, date);
                if let Some(payee) = payee {
                    cmd = cmd.payee_name(payee);
                }
                if let Some(category) = category {
                    cmd = cmd.category(category);
                }
                if let Some(memo) = memo {
                    cmd = cmd.memo(memo);
                }
                if cleared {
                    cmd = cmd.cleared(ClearedState::Cleared);
                }
                if let Some(other) = transfer_to {
                    cmd = cmd.transfer_to(other);
                }
                for line in split {
                    cmd = cmd.split(line);
                }
                print_json(&engine.create_transaction(cmd).await?)?;
            }
            TxCommand::List {
                budget,
                account,
                limit,
                cursor,
                include_transfers,
            } => {
                let filter = TransactionListFilter {
                    account_id: account,
                    include_transfers,
                    ..Default::default()
                };
                let (items, next) = engine
                    .list_transactions(
                        budget,
                        require_user(user)?,
                        limit,
                        cursor.as_deref(),
                        &filter,
                    )
                    .await?;
                print_json(&items)?;
                if let Some(next) = next {
                    eprintln!("next cursor: {next}");
                }
            }
            TxCommand::Delete { id } => {
                let deleted = engine.delete_transaction(id, require_user(user)?).await?;
                println!("deleted {} row(s)", deleted.len());
            }
        },
        Command::Assign {
            category,
            month,
            amount,
        } => {
            print_json(
                &engine
                    .assign(category, month, amount, require_user(user)?)
                    .await?,
            )?;
        }
        Command::Move {
            from,
            to,
            month,
            amount,
        } => {
            let cmd = MoveMoneyCmd::new(require_user(user)?, from, to, month, amount);
            print_json(&engine.move_money(cmd).await?)?;
        }
        Command::View { budget, month } => {
            print_json(&engine.budget_view(budget, month, require_user(user)?).await?)?;
        }
        Command::Goal(GoalArgs { command }) => match command {
            GoalCommand::Target {
                category,
                amount,
                by,
            } => {
                let spec = match by {
                    Some(by) => GoalSpec::TargetBalanceByDate { target: amount, by },
                    None => GoalSpec::TargetBalance { target: amount },
                };
                print_json(
                    &engine
                        .upsert_goal(category, spec, require_user(user)?)
                        .await?,
                )?;
            }
            GoalCommand::Monthly { category, amount } => {
                let spec = GoalSpec::MonthlyFunding { monthly: amount };
                print_json(
                    &engine
                        .upsert_goal(category, spec, require_user(user)?)
                        .await?,
                )?;
            }
            GoalCommand::Delete { category } => {
                engine.delete_goal(category, require_user(user)?).await?;
                println!("deleted goal of category {category}");
            }
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_months() {
        assert_eq!(
            parse_month("2024-04").unwrap(),
            BudgetMonth::new(2024, 4).unwrap()
        );
        assert!(parse_month("2024/04").is_err());
        assert!(parse_month("2024-13").is_err());
    }

    #[test]
    fn parses_split_lines() {
        let category = Uuid::new_v4();
        let line = parse_split(&format!("{category}:-12.50")).unwrap();
        assert_eq!(line.category_id, Some(category));
        assert_eq!(line.amount, MoneyCents::new(-12_50));

        let uncategorized = parse_split(":5").unwrap();
        assert_eq!(uncategorized.category_id, None);
        assert!(parse_split("nope").is_err());
    }
}
