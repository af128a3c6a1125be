use secrecy::Secret;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;

use super::jwt::{create_access_token, create_refresh_token};
use super::models::{
    AuthTokenResponse, CreateUserDto, GoogleTokenInfo, UpdateProfileDto, User, USER_COLUMNS,
};
use super::password::{hash_password, random_password, verify_password};

/// Google token verification endpoint
const GOOGLE_TOKEN_INFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Authentication service handling registration, login and profile updates
pub struct AuthService;

impl AuthService {
    /// Register a new user and return auth tokens
    pub async fn register(
        pool: &PgPool,
        jwt_secret: &Secret<String>,
        dto: &CreateUserDto,
    ) -> Result<AuthTokenResponse, AppError> {
        let email = dto.email.trim().to_lowercase();

        let existing_user =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = $1")
                .bind(&email)
                .fetch_one(pool)
                .await
                .map_err(|e| AppError::InternalError(e.to_string()))?;

        if existing_user > 0 {
            return Err(AppError::Conflict(
                "User already exists with this email".to_string(),
            ));
        }

        let password_hash = hash_password(&dto.password)?;
        let user = Self::insert_user(pool, &email, &password_hash, dto.name.trim(), None).await?;
        info!(user_id = %user.id, "User registered");

        Self::issue_tokens(pool, jwt_secret, &user).await
    }

    /// Authenticate a user by email and password, return auth tokens
    pub async fn login(
        pool: &PgPool,
        jwt_secret: &Secret<String>,
        email: &str,
        password: &str,
    ) -> Result<AuthTokenResponse, AppError> {
        let user = Self::find_by_email(pool, &email.trim().to_lowercase())
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

        if !verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.id, "Failed login attempt");
            return Err(AppError::Unauthorized(
                "Invalid email or password".to_string(),
            ));
        }

        Self::issue_tokens(pool, jwt_secret, &user).await
    }

    /// Get user by ID
    pub async fn get_user_by_id(pool: &PgPool, user_id: Uuid) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(pool)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?
            .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))
    }

    /// Update the display name, avatar and preferences of the current user
    pub async fn update_profile(
        pool: &PgPool,
        user_id: Uuid,
        dto: &UpdateProfileDto,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name = $2, avatar_url = $3,
                currency = COALESCE($4, currency), theme = COALESCE($5, theme),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(dto.name.trim())
        .bind(&dto.avatar_url)
        .bind(dto.preferences.as_ref().map(|p| p.currency.as_str()))
        .bind(dto.preferences.as_ref().map(|p| p.theme.as_str()))
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        info!(user_id = %user_id, "Profile updated");
        Ok(user)
    }

    /// Authenticate with Google OAuth ID token
    pub async fn login_with_google(
        pool: &PgPool,
        jwt_secret: &Secret<String>,
        id_token: &str,
    ) -> Result<AuthTokenResponse, AppError> {
        let google_user = Self::verify_google_token(id_token).await?;

        if google_user.email_verified != "true" {
            return Err(AppError::Unauthorized(
                "Google account email is not verified".to_string(),
            ));
        }

        let user = Self::find_or_create_google_user(pool, &google_user).await?;

        Self::issue_tokens(pool, jwt_secret, &user).await
    }

    async fn issue_tokens(
        pool: &PgPool,
        jwt_secret: &Secret<String>,
        user: &User,
    ) -> Result<AuthTokenResponse, AppError> {
        let access_token = create_access_token(user, jwt_secret)?;
        let refresh_token = create_refresh_token(pool, user.id).await?;

        Ok(AuthTokenResponse::new(access_token, refresh_token, user))
    }

    async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(pool)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))
    }

    async fn insert_user(
        pool: &PgPool,
        email: &str,
        password_hash: &str,
        name: &str,
        avatar_url: Option<&str>,
    ) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password_hash, name, avatar_url)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(email)
        .bind(password_hash)
        .bind(name)
        .bind(avatar_url)
        .fetch_one(pool)
        .await
        .map_err(AppError::from)
    }

    /// Verify Google ID token with Google's tokeninfo endpoint
    async fn verify_google_token(id_token: &str) -> Result<GoogleTokenInfo, AppError> {
        let response = reqwest::Client::new()
            .get(GOOGLE_TOKEN_INFO_URL)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| AppError::InternalError(format!("Failed to verify Google token: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Unauthorized(
                "Invalid Google ID token".to_string(),
            ));
        }

        response
            .json::<GoogleTokenInfo>()
            .await
            .map_err(|e| AppError::InternalError(format!("Failed to parse Google response: {e}")))
    }

    /// Find existing user by email or create a new one for Google OAuth
    async fn find_or_create_google_user(
        pool: &PgPool,
        google_user: &GoogleTokenInfo,
    ) -> Result<User, AppError> {
        let email = google_user.email.to_lowercase();
        if let Some(user) = Self::find_by_email(pool, &email).await? {
            return Ok(user);
        }

        let name = google_user
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| email.split('@').next().unwrap_or("User"));
        let password_hash = hash_password(&random_password())?;

        let user = Self::insert_user(
            pool,
            &email,
            &password_hash,
            name,
            google_user.picture.as_deref(),
        )
        .await?;
        info!(user_id = %user.id, "User registered via Google");

        Ok(user)
    }
}
