use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::jwt::ACCESS_TOKEN_EXPIRY_MINUTES;

// ============================================================================
// User Models
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub currency: String,
    pub theme: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub(crate) const USER_COLUMNS: &str =
    "id, email, password_hash, name, avatar_url, currency, theme, created_at, updated_at";

// ============================================================================
// Preferences
// ============================================================================

pub const DEFAULT_CURRENCY: &str = "INR";

/// ISO 4217 codes offered for display
pub const SUPPORTED_CURRENCIES: [&str; 9] =
    ["INR", "USD", "EUR", "GBP", "JPY", "CAD", "AUD", "CHF", "CNY"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Falls back to the default for labels the column should never hold
    pub fn from_label(label: &str) -> Self {
        match label {
            "dark" => Theme::Dark,
            _ => Theme::Light,
        }
    }
}

fn validate_currency(code: &str) -> Result<(), ValidationError> {
    if !SUPPORTED_CURRENCIES.contains(&code) {
        return Err(ValidationError::new("unsupported_currency"));
    }
    Ok(())
}

/// Display preferences stored on the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct UserPreferences {
    #[validate(custom(function = "validate_currency", message = "Unsupported currency"))]
    #[schema(example = "INR")]
    pub currency: String,
    pub theme: Theme,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            currency: DEFAULT_CURRENCY.to_string(),
            theme: Theme::default(),
        }
    }
}

/// Request body for user registration
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserDto {
    /// Display name
    #[validate(length(min = 1, max = 50, message = "Name must be between 1 and 50 characters"))]
    #[schema(example = "Jane Doe")]
    pub name: String,
    /// User's email address
    #[validate(email(message = "Please provide a valid email"))]
    #[schema(example = "user@example.com")]
    pub email: String,
    /// Password (min 6 chars)
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    #[schema(example = "secret123")]
    pub password: String,
}

/// Request body for user login
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginDto {
    #[schema(example = "user@example.com")]
    pub email: String,
    #[schema(example = "secret123")]
    pub password: String,
}

/// Request body for Google OAuth login
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GoogleLoginDto {
    /// Google ID token from Google Sign-In
    #[schema(example = "eyJhbGciOiJSUzI1NiIsInR5cCI6...")]
    pub id_token: String,
}

/// Google tokeninfo response
#[derive(Debug, Deserialize)]
pub struct GoogleTokenInfo {
    pub email: String,
    pub email_verified: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Request body for updating the current user's profile
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileDto {
    #[validate(length(min = 1, max = 50, message = "Name must be between 1 and 50 characters"))]
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[validate(url(message = "Avatar must be a valid URL"))]
    pub avatar_url: Option<String>,
    /// Left unchanged when omitted
    #[validate(nested)]
    pub preferences: Option<UserPreferences>,
}

/// User information returned in responses
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponseDto {
    pub id: Uuid,
    #[schema(example = "user@example.com")]
    pub email: String,
    #[schema(example = "Jane Doe")]
    pub name: String,
    pub avatar_url: Option<String>,
    pub preferences: UserPreferences,
    pub created_at: DateTime<Utc>,
}

impl UserResponseDto {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            avatar_url: user.avatar_url.clone(),
            preferences: UserPreferences {
                currency: user.currency.clone(),
                theme: Theme::from_label(&user.theme),
            },
            created_at: user.created_at,
        }
    }
}

// ============================================================================
// Token Models
// ============================================================================

/// JWT access token claims
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: Uuid,     // User ID
    pub email: String, // User email
    pub name: String,  // Display name
    pub iat: usize,    // Issued at
    pub exp: usize,    // Expiration
}

/// Refresh token stored in database
#[derive(Debug, FromRow)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

/// Request body to refresh an access token
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenDto {
    #[schema(example = "a1b2c3d4e5f6...")]
    pub refresh_token: String,
}

/// Response containing both access and refresh tokens
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokenResponse {
    /// JWT access token
    pub access_token: String,
    /// Opaque refresh token
    pub refresh_token: String,
    #[schema(example = "Bearer")]
    pub token_type: &'static str,
    /// Access token lifetime in seconds
    #[schema(example = 900)]
    pub expires_in: u64,
    pub user: UserResponseDto,
}

impl AuthTokenResponse {
    pub fn new(access_token: String, refresh_token: String, user: &User) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "Bearer",
            expires_in: (ACCESS_TOKEN_EXPIRY_MINUTES * 60) as u64,
            user: UserResponseDto::from_user(user),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(currency: &str, theme: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: "jane@example.com".to_string(),
            password_hash: "hash".to_string(),
            name: "Jane".to_string(),
            avatar_url: None,
            currency: currency.to_string(),
            theme: theme.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_default_preferences() {
        let prefs = UserPreferences::default();
        assert_eq!(prefs.currency, "INR");
        assert_eq!(prefs.theme, Theme::Light);
    }

    #[test]
    fn test_user_response_carries_preferences() {
        let response = UserResponseDto::from_user(&user("EUR", "dark"));
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["preferences"]["currency"], "EUR");
        assert_eq!(json["preferences"]["theme"], "dark");
        assert!(json.get("passwordHash").is_none());
    }

    #[test]
    fn test_update_profile_accepts_preferences() {
        let dto: UpdateProfileDto = serde_json::from_value(serde_json::json!({
            "name": "Jane",
            "preferences": { "currency": "USD", "theme": "dark" }
        }))
        .unwrap();

        assert!(dto.validate().is_ok());
        assert_eq!(
            dto.preferences,
            Some(UserPreferences {
                currency: "USD".to_string(),
                theme: Theme::Dark,
            })
        );
    }

    #[test]
    fn test_update_profile_rejects_unsupported_currency() {
        let dto = UpdateProfileDto {
            name: "Jane".to_string(),
            avatar_url: None,
            preferences: Some(UserPreferences {
                currency: "usd".to_string(),
                theme: Theme::Light,
            }),
        };

        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_unknown_theme_label_reads_as_light() {
        assert_eq!(Theme::from_label("dark"), Theme::Dark);
        assert_eq!(Theme::from_label("sepia"), Theme::Light);
        assert_eq!(Theme::Dark.as_str(), "dark");
    }
}
