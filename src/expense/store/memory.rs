use std::collections::BTreeMap;

use chrono::Datelike;
use rust_decimal::Decimal;

use super::{ExpenseStore, GroupBy, GroupKey, GroupTotal};
use crate::errors::AppError;
use crate::expense::filter::{ExpensePredicate, ExpenseSort, PageWindow};
use crate::expense::models::Expense;

/// Linear-scan store over an owned snapshot of records.
#[derive(Debug, Clone, Default)]
pub struct MemoryExpenseStore {
    records: Vec<Expense>,
}

impl MemoryExpenseStore {
    pub fn new(records: Vec<Expense>) -> Self {
        Self { records }
    }

    fn matching<'a>(
        &'a self,
        predicate: &'a ExpensePredicate,
    ) -> impl Iterator<Item = &'a Expense> + 'a {
        self.records.iter().filter(move |e| predicate.matches(e))
    }
}

impl ExpenseStore for MemoryExpenseStore {
    async fn find(
        &self,
        predicate: &ExpensePredicate,
        sort: ExpenseSort,
        window: PageWindow,
    ) -> Result<Vec<Expense>, AppError> {
        let mut rows: Vec<&Expense> = self.matching(predicate).collect();
        rows.sort_by(|a, b| sort.compare(a, b));

        let offset = usize::try_from(window.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(window.limit()).unwrap_or(0);

        Ok(rows.into_iter().skip(offset).take(limit).cloned().collect())
    }

    async fn count(&self, predicate: &ExpensePredicate) -> Result<i64, AppError> {
        Ok(self.matching(predicate).count() as i64)
    }

    async fn aggregate_by_group(
        &self,
        predicate: &ExpensePredicate,
        group_by: GroupBy,
    ) -> Result<Vec<GroupTotal>, AppError> {
        let mut groups: BTreeMap<GroupKey, (Decimal, i64)> = BTreeMap::new();

        for expense in self.matching(predicate) {
            let key = match group_by {
                GroupBy::Category => GroupKey::Category(expense.category.clone()),
                GroupBy::Month => GroupKey::Month(expense.expense_date.month()),
                GroupBy::Nothing => GroupKey::All,
            };
            let entry = groups.entry(key).or_insert((Decimal::ZERO, 0));
            entry.0 += expense.amount;
            entry.1 += 1;
        }

        Ok(groups
            .into_iter()
            .map(|(key, (total, count))| GroupTotal { key, total, count })
            .collect())
    }
}
