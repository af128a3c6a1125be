use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use futures::future::{err, ok, Ready};
use secrecy::Secret;
use uuid::Uuid;

use crate::auth::decode_token;
use crate::errors::AppError;

/// Extractor that validates the bearer JWT and yields the caller's identity.
///
/// `user_id` is the owner every expense query is scoped to.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let jwt_secret = match req.app_data::<web::Data<Secret<String>>>() {
            Some(secret) => secret,
            None => {
                return err(AppError::InternalError(
                    "JWT secret not configured".to_string(),
                ))
            }
        };

        let token = match req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
        {
            Some(t) => t,
            None => {
                return err(AppError::Unauthorized(
                    "No token, authorization denied".to_string(),
                ))
            }
        };

        match decode_token(token, jwt_secret.get_ref()) {
            Ok(claims) => ok(AuthenticatedUser {
                user_id: claims.sub,
                email: claims.email,
            }),
            Err(e) => err(e),
        }
    }
}
