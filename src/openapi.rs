use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::auth::models::{
    AuthTokenResponse, CreateUserDto, GoogleLoginDto, LoginDto, RefreshTokenDto,
    Theme, UpdateProfileDto, UserPreferences, UserResponseDto,
};
use crate::errors::ErrorResponse;
use crate::expense::models::{
    CategoryStat, ExpenseCategory, ExpenseDto, ExpenseListResponse, ExpenseResponse,
    ExpenseStatsResponse, MonthlyStat, PaymentMethod, RecurringType, StatsPeriod, TotalStat,
};

/// Security scheme modifier for Bearer token authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT access token"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation configuration
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Expense Tracker API",
        version = "1.0.0",
        description = "Personal expense tracking with filtered listing and spending statistics",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:5000", description = "Development server"),
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Auth", description = "Authentication and user profile"),
        (name = "Expenses", description = "Expense records, filtered listing and statistics")
    ),
    paths(
        // Auth endpoints
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::google_login,
        crate::auth::handlers::refresh,
        crate::auth::handlers::logout,
        crate::auth::handlers::me,
        crate::auth::handlers::update_profile,
        // Expense endpoints
        crate::expense::handlers::list_expenses,
        crate::expense::handlers::get_stats,
        crate::expense::handlers::get_expense,
        crate::expense::handlers::create_expense,
        crate::expense::handlers::update_expense,
        crate::expense::handlers::delete_expense,
    ),
    components(
        schemas(
            // Error response
            ErrorResponse,
            // Auth schemas
            CreateUserDto,
            LoginDto,
            GoogleLoginDto,
            RefreshTokenDto,
            UpdateProfileDto,
            UserResponseDto,
            UserPreferences,
            Theme,
            AuthTokenResponse,
            // Expense schemas
            ExpenseCategory,
            PaymentMethod,
            RecurringType,
            ExpenseDto,
            ExpenseResponse,
            ExpenseListResponse,
            CategoryStat,
            MonthlyStat,
            TotalStat,
            StatsPeriod,
            ExpenseStatsResponse,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_expense_routes() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        for path in [
            "/expenses",
            "/expenses/stats",
            "/expenses/{id}",
            "/auth/register",
            "/user/profile",
        ] {
            assert!(paths.contains_key(path), "missing path {path}");
        }
    }

    #[test]
    fn test_openapi_has_bearer_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
