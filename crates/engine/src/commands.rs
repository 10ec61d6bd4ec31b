//! Command structs for engine operations.
//!
//! These types group parameters for write operations (accounts,
//! transactions, money moves), keeping call sites readable and avoiding long
//! argument lists.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{AccountKind, BudgetMonth, ClearedState, MoneyCents};

/// Payee of a transaction: an existing row or a name to find-or-create.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PayeeRef {
    Id(Uuid),
    Name(String),
}

/// One line of a split transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitLine {
    pub category_id: Option<Uuid>,
    pub amount: MoneyCents,
    pub memo: Option<String>,
}

impl SplitLine {
    #[must_use]
    pub fn new(category_id: Option<Uuid>, amount: MoneyCents) -> Self {
        Self {
            category_id,
            amount,
            memo: None,
        }
    }

    #[must_use]
    pub fn memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }
}

/// Create an account.
#[derive(Clone, Debug)]
pub struct NewAccountCmd {
    pub budget_id: Uuid,
    pub user_id: String,
    pub name: String,
    pub kind: AccountKind,
    /// Defaults to [`AccountKind::default_on_budget`].
    pub on_budget: Option<bool>,
    pub opening_balance: MoneyCents,
    /// Date of the opening balance transaction (defaults to today).
    pub opening_date: Option<NaiveDate>,
    pub note: Option<String>,
}

impl NewAccountCmd {
    #[must_use]
    pub fn new(
        budget_id: Uuid,
        user_id: impl Into<String>,
        name: impl Into<String>,
        kind: AccountKind,
    ) -> Self {
        Self {
            budget_id,
            user_id: user_id.into(),
            name: name.into(),
            kind,
            on_budget: None,
            opening_balance: MoneyCents::ZERO,
            opening_date: None,
            note: None,
        }
    }

    #[must_use]
    pub fn on_budget(mut self, on_budget: bool) -> Self {
        self.on_budget = Some(on_budget);
        self
    }

    #[must_use]
    pub fn opening_balance(mut self, amount: MoneyCents, date: NaiveDate) -> Self {
        self.opening_balance = amount;
        self.opening_date = Some(date);
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Create a transaction, a transfer pair, or a split transaction.
///
/// `amount` is signed relative to `account_id`: negative is an outflow from
/// that account. For transfers the sibling row on `transfer_account_id`
/// carries the negated amount.
#[derive(Clone, Debug)]
pub struct NewTransactionCmd {
    pub budget_id: Uuid,
    pub user_id: String,
    pub account_id: Uuid,
    pub amount: MoneyCents,
    pub date: NaiveDate,
    pub payee: Option<PayeeRef>,
    pub category_id: Option<Uuid>,
    pub memo: Option<String>,
    pub cleared: ClearedState,
    pub approved: bool,
    pub transfer_account_id: Option<Uuid>,
    pub splits: Vec<SplitLine>,
    pub import_id: Option<String>,
}

impl NewTransactionCmd {
    #[must_use]
    pub fn new(
        budget_id: Uuid,
        user_id: impl Into<String>,
        account_id: Uuid,
        amount: MoneyCents,
        date: NaiveDate,
    ) -> Self {
        Self {
            budget_id,
            user_id: user_id.into(),
            account_id,
            amount,
            date,
            payee: None,
            category_id: None,
            memo: None,
            cleared: ClearedState::Uncleared,
            approved: true,
            transfer_account_id: None,
            splits: Vec::new(),
            import_id: None,
        }
    }

    #[must_use]
    pub fn payee_id(mut self, payee_id: Uuid) -> Self {
        self.payee = Some(PayeeRef::Id(payee_id));
        self
    }

    #[must_use]
    pub fn payee_name(mut self, name: impl Into<String>) -> Self {
        self.payee = Some(PayeeRef::Name(name.into()));
        self
    }

    #[must_use]
    pub fn category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    #[must_use]
    pub fn cleared(mut self, cleared: ClearedState) -> Self {
        self.cleared = cleared;
        self
    }

    #[must_use]
    pub fn approved(mut self, approved: bool) -> Self {
        self.approved = approved;
        self
    }

    #[must_use]
    pub fn transfer_to(mut self, account_id: Uuid) -> Self {
        self.transfer_account_id = Some(account_id);
        self
    }

    #[must_use]
    pub fn split(mut self, line: SplitLine) -> Self {
        self.splits.push(line);
        self
    }

    #[must_use]
    pub fn import_id(mut self, import_id: impl Into<String>) -> Self {
        self.import_id = Some(import_id.into());
        self
    }
}

/// Update an existing transaction.
///
/// `None` leaves a field untouched. For `category` and `payee`,
/// `Some(None)` clears the field. An empty `memo` clears it.
#[derive(Clone, Debug)]
pub struct UpdateTransactionCmd {
    pub transaction_id: Uuid,
    pub user_id: String,
    pub account_id: Option<Uuid>,
    pub amount: Option<MoneyCents>,
    pub date: Option<NaiveDate>,
    pub category: Option<Option<Uuid>>,
    pub payee: Option<Option<PayeeRef>>,
    pub memo: Option<String>,
    pub cleared: Option<ClearedState>,
    pub approved: Option<bool>,
}

impl UpdateTransactionCmd {
    #[must_use]
    pub fn new(transaction_id: Uuid, user_id: impl Into<String>) -> Self {
        Self {
            transaction_id,
            user_id: user_id.into(),
            account_id: None,
            amount: None,
            date: None,
            category: None,
            payee: None,
            memo: None,
            cleared: None,
            approved: None,
        }
    }

    #[must_use]
    pub fn account(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }

    #[must_use]
    pub fn amount(mut self, amount: MoneyCents) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn category(mut self, category_id: Uuid) -> Self {
        self.category = Some(Some(category_id));
        self
    }

    #[must_use]
    pub fn clear_category(mut self) -> Self {
        self.category = Some(None);
        self
    }

    #[must_use]
    pub fn payee_name(mut self, name: impl Into<String>) -> Self {
        self.payee = Some(Some(PayeeRef::Name(name.into())));
        self
    }

    #[must_use]
    pub fn payee_id(mut self, payee_id: Uuid) -> Self {
        self.payee = Some(Some(PayeeRef::Id(payee_id)));
        self
    }

    #[must_use]
    pub fn clear_payee(mut self) -> Self {
        self.payee = Some(None);
        self
    }

    #[must_use]
    pub fn memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    #[must_use]
    pub fn cleared(mut self, cleared: ClearedState) -> Self {
        self.cleared = Some(cleared);
        self
    }

    #[must_use]
    pub fn approved(mut self, approved: bool) -> Self {
        self.approved = Some(approved);
        self
    }
}

/// Move assigned money between two categories within one month.
#[derive(Clone, Debug)]
pub struct MoveMoneyCmd {
    pub user_id: String,
    pub from_category_id: Uuid,
    pub to_category_id: Uuid,
    pub month: BudgetMonth,
    pub amount: MoneyCents,
}

impl MoveMoneyCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        from_category_id: Uuid,
        to_category_id: Uuid,
        month: BudgetMonth,
        amount: MoneyCents,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            from_category_id,
            to_category_id,
            month,
            amount,
        }
    }
}
