use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::Utc;
use sqlx::PgPool;
use validator::Validate;

use crate::errors::{AppError, ErrorResponse};
use crate::extractors::AuthenticatedUser;

use super::filter::QueryPolicy;
use super::models::{
    ExpenseDto, ExpenseIdPath, ExpenseListResponse, ExpenseQuery, ExpenseResponse,
    ExpenseStatsResponse, StatsQuery,
};
use super::service::ExpenseService;
use super::store::PgExpenseStore;

/// Normalize and validate a create/update body
fn validated(body: web::Json<ExpenseDto>) -> Result<ExpenseDto, AppError> {
    let dto = body.into_inner().normalized();
    dto.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;
    Ok(dto)
}

/// GET /expenses - List expenses with optional filters
#[utoipa::path(
    get,
    path = "/expenses",
    tag = "Expenses",
    params(ExpenseQuery),
    responses(
        (status = 200, description = "Paginated list of expenses, newest first", body = ExpenseListResponse),
        (status = 400, description = "Malformed filter (strict input policy only)", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/expenses")]
pub async fn list_expenses(
    store: web::Data<PgExpenseStore>,
    policy: web::Data<QueryPolicy>,
    auth: AuthenticatedUser,
    query: web::Query<ExpenseQuery>,
) -> Result<HttpResponse, AppError> {
    let page =
        ExpenseService::list_expenses(store.get_ref(), auth.user_id, &query, **policy).await?;

    Ok(HttpResponse::Ok().json(page))
}

/// GET /expenses/stats - Spending statistics for a year or month
#[utoipa::path(
    get,
    path = "/expenses/stats",
    tag = "Expenses",
    params(StatsQuery),
    responses(
        (status = 200, description = "Category, monthly and total statistics", body = ExpenseStatsResponse),
        (status = 400, description = "Malformed period (strict input policy only)", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/expenses/stats")]
pub async fn get_stats(
    store: web::Data<PgExpenseStore>,
    policy: web::Data<QueryPolicy>,
    auth: AuthenticatedUser,
    query: web::Query<StatsQuery>,
) -> Result<HttpResponse, AppError> {
    let today = Utc::now().date_naive();
    let stats =
        ExpenseService::compute_stats(store.get_ref(), auth.user_id, &query, policy.input, today)
            .await?;

    Ok(HttpResponse::Ok().json(stats))
}

/// GET /expenses/{id} - Get a specific expense
#[utoipa::path(
    get,
    path = "/expenses/{id}",
    tag = "Expenses",
    params(ExpenseIdPath),
    responses(
        (status = 200, description = "Expense details", body = ExpenseResponse),
        (status = 404, description = "Expense not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/expenses/{id}")]
pub async fn get_expense(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    path: web::Path<ExpenseIdPath>,
) -> Result<HttpResponse, AppError> {
    let expense = ExpenseService::get_expense(pool.get_ref(), auth.user_id, path.id).await?;

    Ok(HttpResponse::Ok().json(ExpenseResponse::from(expense)))
}

/// POST /expenses - Record a new expense
#[utoipa::path(
    post,
    path = "/expenses",
    tag = "Expenses",
    request_body = ExpenseDto,
    responses(
        (status = 201, description = "Expense created", body = ExpenseResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[post("/expenses")]
pub async fn create_expense(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    body: web::Json<ExpenseDto>,
) -> Result<HttpResponse, AppError> {
    let dto = validated(body)?;
    let expense = ExpenseService::create_expense(pool.get_ref(), auth.user_id, dto).await?;

    Ok(HttpResponse::Created().json(ExpenseResponse::from(expense)))
}

/// PUT /expenses/{id} - Replace an expense
#[utoipa::path(
    put,
    path = "/expenses/{id}",
    tag = "Expenses",
    params(ExpenseIdPath),
    request_body = ExpenseDto,
    responses(
        (status = 200, description = "Expense updated", body = ExpenseResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "Expense not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[put("/expenses/{id}")]
pub async fn update_expense(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    path: web::Path<ExpenseIdPath>,
    body: web::Json<ExpenseDto>,
) -> Result<HttpResponse, AppError> {
    let dto = validated(body)?;
    let expense =
        ExpenseService::update_expense(pool.get_ref(), auth.user_id, path.id, dto).await?;

    Ok(HttpResponse::Ok().json(ExpenseResponse::from(expense)))
}

/// DELETE /expenses/{id} - Delete an expense
#[utoipa::path(
    delete,
    path = "/expenses/{id}",
    tag = "Expenses",
    params(ExpenseIdPath),
    responses(
        (status = 204, description = "Expense deleted"),
        (status = 404, description = "Expense not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[delete("/expenses/{id}")]
pub async fn delete_expense(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    path: web::Path<ExpenseIdPath>,
) -> Result<HttpResponse, AppError> {
    ExpenseService::delete_expense(pool.get_ref(), auth.user_id, path.id).await?;

    Ok(HttpResponse::NoContent().finish())
}
