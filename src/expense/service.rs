use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use super::filter::{self, Clause, ExpensePredicate, InputPolicy, QueryPolicy};
use super::models::{
    Expense, ExpenseDto, ExpenseListResponse, ExpenseQuery, ExpenseStatsResponse, StatsQuery,
};
use super::stats;
use super::store::{ExpenseStore, GroupBy, EXPENSE_COLUMNS};
use crate::errors::AppError;

/// Service layer for expense queries and record management.
pub struct ExpenseService;

impl ExpenseService {
    /// List one page of the owner's expenses matching the raw filters.
    pub async fn list_expenses<S: ExpenseStore>(
        store: &S,
        owner_id: Uuid,
        query: &ExpenseQuery,
        policy: QueryPolicy,
    ) -> Result<ExpenseListResponse, AppError> {
        let compiled = filter::compile(owner_id, query, policy)?;
        debug!(
            owner_id = %owner_id,
            clauses = compiled.predicate.clauses().len(),
            page = compiled.window.page,
            page_size = compiled.window.page_size,
            "Listing expenses"
        );

        let (expenses, total) = futures::try_join!(
            store.find(&compiled.predicate, compiled.sort, compiled.window),
            store.count(&compiled.predicate),
        )?;

        Ok(ExpenseListResponse {
            expenses: expenses.into_iter().map(Into::into).collect(),
            total,
            total_pages: compiled.window.total_pages(total),
            current_page: compiled.window.page,
            page_size: compiled.window.page_size,
        })
    }

    /// Category, monthly and total stats for a year or one month of it.
    ///
    /// Monthly stats always cover the whole year, even when a month is selected.
    pub async fn compute_stats<S: ExpenseStore>(
        store: &S,
        owner_id: Uuid,
        query: &StatsQuery,
        policy: InputPolicy,
        today: NaiveDate,
    ) -> Result<ExpenseStatsResponse, AppError> {
        let windows = stats::resolve_windows(query, policy, today)?;
        debug!(
            owner_id = %owner_id,
            year = windows.year,
            month = ?windows.month,
            "Computing expense stats"
        );

        let narrowed = ExpensePredicate::for_owner(owner_id).with(Clause::DateInRange {
            from: Some(windows.narrowed.start_date),
            to: Some(windows.narrowed.end_date),
        });
        let full_year = ExpensePredicate::for_owner(owner_id).with(Clause::DateInRange {
            from: Some(windows.full_year.start_date),
            to: Some(windows.full_year.end_date),
        });

        let (by_category, by_month, overall) = futures::try_join!(
            store.aggregate_by_group(&narrowed, GroupBy::Category),
            store.aggregate_by_group(&full_year, GroupBy::Month),
            store.aggregate_by_group(&narrowed, GroupBy::Nothing),
        )?;

        Ok(ExpenseStatsResponse {
            category_stats: stats::category_stats(by_category),
            monthly_stats: stats::monthly_stats(by_month),
            total_expenses: stats::total_stat(overall),
            period: windows.narrowed,
        })
    }

    /// Create an expense owned by `owner_id`. The DTO must already be validated.
    pub async fn create_expense(
        pool: &PgPool,
        owner_id: Uuid,
        dto: ExpenseDto,
    ) -> Result<Expense, AppError> {
        let expense = sqlx::query_as::<_, Expense>(&format!(
            r#"
            INSERT INTO expenses
                (owner_id, title, amount, category, description, expense_date,
                 payment_method, is_recurring, recurring_type, tags)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {EXPENSE_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(&dto.title)
        .bind(dto.amount)
        .bind(dto.category.as_str())
        .bind(&dto.description)
        .bind(dto.date)
        .bind(dto.payment_method.as_str())
        .bind(dto.is_recurring)
        .bind(dto.recurring_type.map(|r| r.as_str()))
        .bind(&dto.tags)
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        info!(expense_id = %expense.id, owner_id = %owner_id, "Expense created");
        Ok(expense)
    }

    /// Get a single expense, hidden unless `owner_id` owns it
    pub async fn get_expense(
        pool: &PgPool,
        owner_id: Uuid,
        expense_id: Uuid,
    ) -> Result<Expense, AppError> {
        sqlx::query_as::<_, Expense>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = $1 AND owner_id = $2"
        ))
        .bind(expense_id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Expense not found".to_string()))
    }

    /// Replace every mutable field of an owned expense
    pub async fn update_expense(
        pool: &PgPool,
        owner_id: Uuid,
        expense_id: Uuid,
        dto: ExpenseDto,
    ) -> Result<Expense, AppError> {
        let expense = sqlx::query_as::<_, Expense>(&format!(
            r#"
            UPDATE expenses SET
                title = $3,
                amount = $4,
                category = $5,
                description = $6,
                expense_date = $7,
                payment_method = $8,
                is_recurring = $9,
                recurring_type = $10,
                tags = $11,
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING {EXPENSE_COLUMNS}
            "#
        ))
        .bind(expense_id)
        .bind(owner_id)
        .bind(&dto.title)
        .bind(dto.amount)
        .bind(dto.category.as_str())
        .bind(&dto.description)
        .bind(dto.date)
        .bind(dto.payment_method.as_str())
        .bind(dto.is_recurring)
        .bind(dto.recurring_type.map(|r| r.as_str()))
        .bind(&dto.tags)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Expense not found".to_string()))?;

        info!(expense_id = %expense_id, owner_id = %owner_id, "Expense updated");
        Ok(expense)
    }

    /// Delete an owned expense
    pub async fn delete_expense(
        pool: &PgPool,
        owner_id: Uuid,
        expense_id: Uuid,
    ) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = $1 AND owner_id = $2")
            .bind(expense_id)
            .bind(owner_id)
            .execute(pool)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Expense not found".to_string()));
        }

        info!(expense_id = %expense_id, owner_id = %owner_id, "Expense deleted");
        Ok(())
    }
}
