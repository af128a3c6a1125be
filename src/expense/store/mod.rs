mod memory;
mod pg;

pub use memory::MemoryExpenseStore;
pub use pg::PgExpenseStore;
pub(crate) use pg::EXPENSE_COLUMNS;

use rust_decimal::Decimal;

use super::filter::{ExpensePredicate, ExpenseSort, PageWindow};
use super::models::Expense;
use crate::errors::AppError;

/// Grouping applied by [`ExpenseStore::aggregate_by_group`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Category,
    /// Calendar month (1-12) of the expense date
    Month,
    /// A single group over every matching record
    Nothing,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum GroupKey {
    Category(String),
    Month(u32),
    All,
}

/// Sum of `amount` and record count for one group
#[derive(Debug, Clone, PartialEq)]
pub struct GroupTotal {
    pub key: GroupKey,
    pub total: Decimal,
    pub count: i64,
}

/// Read access to persisted expenses.
///
/// Every call is scoped by the predicate's owner. Implementations must agree with
/// [`ExpensePredicate::matches`] and [`ExpenseSort::compare`]; groups with no
/// matching records are never returned.
///
/// Text matching folds case with Rust `to_lowercase` in memory and with `ILIKE` in
/// Postgres. Both agree on ASCII; some non-ASCII letters (e.g. `ß`, Turkish dotted
/// `İ`) may fold differently depending on the database collation.
#[allow(async_fn_in_trait)]
pub trait ExpenseStore {
    async fn find(
        &self,
        predicate: &ExpensePredicate,
        sort: ExpenseSort,
        window: PageWindow,
    ) -> Result<Vec<Expense>, AppError>;

    async fn count(&self, predicate: &ExpensePredicate) -> Result<i64, AppError>;

    async fn aggregate_by_group(
        &self,
        predicate: &ExpensePredicate,
        group_by: GroupBy,
    ) -> Result<Vec<GroupTotal>, AppError>;
}
