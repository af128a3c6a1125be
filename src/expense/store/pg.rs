use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{ExpenseStore, GroupBy, GroupKey, GroupTotal};
use crate::errors::AppError;
use crate::expense::filter::{Clause, ExpensePredicate, ExpenseSort, PageWindow};
use crate::expense::models::Expense;

pub(crate) const EXPENSE_COLUMNS: &str = "id, owner_id, title, amount, category, description, \
     expense_date, payment_method, is_recurring, recurring_type, tags, created_at, updated_at";

/// PostgreSQL-backed expense reads
#[derive(Debug, Clone)]
pub struct PgExpenseStore {
    pool: PgPool,
}

impl PgExpenseStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Escape LIKE metacharacters so the needle matches literally
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Append `WHERE ...` for the predicate
fn push_where(qb: &mut QueryBuilder<'_, Postgres>, predicate: &ExpensePredicate) {
    qb.push(" WHERE owner_id = ");
    qb.push_bind(predicate.owner());

    for clause in predicate.clauses() {
        match clause {
            Clause::CategoryEquals(category) => {
                qb.push(" AND category = ");
                qb.push_bind(category.clone());
            }
            Clause::DateInRange { from, to } => {
                if let Some(from) = from {
                    qb.push(" AND expense_date >= ");
                    qb.push_bind(*from);
                }
                if let Some(to) = to {
                    qb.push(" AND expense_date <= ");
                    qb.push_bind(*to);
                }
            }
            Clause::TextMatchAny { needle, fields } => {
                let pattern = like_pattern(needle);
                qb.push(" AND (");
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        qb.push(" OR ");
                    }
                    qb.push(field.column());
                    qb.push(" ILIKE ");
                    qb.push_bind(pattern.clone());
                }
                // An empty field list matches nothing
                if fields.is_empty() {
                    qb.push("FALSE");
                }
                qb.push(")");
            }
        }
    }
}

fn find_query(
    predicate: &ExpensePredicate,
    sort: ExpenseSort,
    window: PageWindow,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {EXPENSE_COLUMNS} FROM expenses"));
    push_where(&mut qb, predicate);
    qb.push(sort.order_by_sql());
    qb.push(" LIMIT ");
    qb.push_bind(window.limit());
    qb.push(" OFFSET ");
    qb.push_bind(window.offset());
    qb
}

fn aggregate_query(
    predicate: &ExpensePredicate,
    group_by: GroupBy,
) -> QueryBuilder<'static, Postgres> {
    let select = match group_by {
        GroupBy::Category => "SELECT category, SUM(amount), COUNT(*) FROM expenses",
        GroupBy::Month => {
            "SELECT EXTRACT(MONTH FROM expense_date)::INT4, SUM(amount), COUNT(*) FROM expenses"
        }
        GroupBy::Nothing => "SELECT COALESCE(SUM(amount), 0), COUNT(*) FROM expenses",
    };
    let mut qb = QueryBuilder::new(select);
    push_where(&mut qb, predicate);
    match group_by {
        GroupBy::Category => {
            qb.push(" GROUP BY category");
        }
        GroupBy::Month => {
            qb.push(" GROUP BY 1");
        }
        GroupBy::Nothing => {}
    }
    qb
}

impl ExpenseStore for PgExpenseStore {
    async fn find(
        &self,
        predicate: &ExpensePredicate,
        sort: ExpenseSort,
        window: PageWindow,
    ) -> Result<Vec<Expense>, AppError> {
        let mut qb = find_query(predicate, sort, window);

        qb.build_query_as::<Expense>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))
    }

    async fn count(&self, predicate: &ExpensePredicate) -> Result<i64, AppError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM expenses");
        push_where(&mut qb, predicate);

        qb.build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))
    }

    async fn aggregate_by_group(
        &self,
        predicate: &ExpensePredicate,
        group_by: GroupBy,
    ) -> Result<Vec<GroupTotal>, AppError> {
        let mut qb = aggregate_query(predicate, group_by);

        let groups = match group_by {
            GroupBy::Category => qb
                .build_query_as::<(String, Decimal, i64)>()
                .fetch_all(&self.pool)
                .await
                .map_err(|e| AppError::InternalError(e.to_string()))?
                .into_iter()
                .map(|(category, total, count)| GroupTotal {
                    key: GroupKey::Category(category),
                    total,
                    count,
                })
                .collect(),
            GroupBy::Month => qb
                .build_query_as::<(i32, Decimal, i64)>()
                .fetch_all(&self.pool)
                .await
                .map_err(|e| AppError::InternalError(e.to_string()))?
                .into_iter()
                .map(|(month, total, count)| GroupTotal {
                    key: GroupKey::Month(month as u32),
                    total,
                    count,
                })
                .collect(),
            GroupBy::Nothing => {
                let (total, count) = qb
                    .build_query_as::<(Decimal, i64)>()
                    .fetch_one(&self.pool)
                    .await
                    .map_err(|e| AppError::InternalError(e.to_string()))?;
                if count == 0 {
                    Vec::new()
                } else {
                    vec![GroupTotal {
                        key: GroupKey::All,
                        total,
                        count,
                    }]
                }
            }
        };

        Ok(groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expense::filter::TextField;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn full_predicate() -> ExpensePredicate {
        ExpensePredicate::for_owner(Uuid::nil())
            .with(Clause::CategoryEquals("Travel".to_string()))
            .with(Clause::DateInRange {
                from: NaiveDate::from_ymd_opt(2024, 1, 1),
                to: NaiveDate::from_ymd_opt(2024, 1, 31),
            })
            .with(Clause::text_match_any(
                "Coffee",
                vec![TextField::Title, TextField::Description],
            ))
    }

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("coffee"), "%coffee%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_owner_only_where_clause() {
        let qb = find_query(
            &ExpensePredicate::for_owner(Uuid::nil()),
            ExpenseSort::DateDesc,
            PageWindow::default(),
        );

        assert_eq!(
            qb.sql(),
            format!(
                "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE owner_id = $1 \
                 ORDER BY expense_date DESC, created_at ASC, id ASC LIMIT $2 OFFSET $3"
            )
        );
    }

    #[test]
    fn test_every_clause_is_rendered_with_binds() {
        let qb = find_query(&full_predicate(), ExpenseSort::DateDesc, PageWindow::default());

        assert_eq!(
            qb.sql(),
            format!(
                "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE owner_id = $1 \
                 AND category = $2 AND expense_date >= $3 AND expense_date <= $4 \
                 AND (title ILIKE $5 OR description ILIKE $6) \
                 ORDER BY expense_date DESC, created_at ASC, id ASC LIMIT $7 OFFSET $8"
            )
        );
    }

    #[test]
    fn test_open_ended_range_renders_one_bound() {
        let predicate = ExpensePredicate::for_owner(Uuid::nil()).with(Clause::DateInRange {
            from: None,
            to: NaiveDate::from_ymd_opt(2024, 1, 31),
        });
        let qb = aggregate_query(&predicate, GroupBy::Nothing);

        assert_eq!(
            qb.sql(),
            "SELECT COALESCE(SUM(amount), 0), COUNT(*) FROM expenses \
             WHERE owner_id = $1 AND expense_date <= $2"
        );
    }

    #[test]
    fn test_grouped_aggregates() {
        let predicate = ExpensePredicate::for_owner(Uuid::nil());

        assert_eq!(
            aggregate_query(&predicate, GroupBy::Category).sql(),
            "SELECT category, SUM(amount), COUNT(*) FROM expenses \
             WHERE owner_id = $1 GROUP BY category"
        );
        assert_eq!(
            aggregate_query(&predicate, GroupBy::Month).sql(),
            "SELECT EXTRACT(MONTH FROM expense_date)::INT4, SUM(amount), COUNT(*) FROM expenses \
             WHERE owner_id = $1 GROUP BY 1"
        );
    }
}
