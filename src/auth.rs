use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    models::Role,
    repository::RepositoryState,
};

/// Claims
///
/// The payload structure expected inside a JSON Web Token. Claims are signed
/// by the auth provider's secret and validated on every authenticated request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the UUID of the user, used to fetch the user's record
    /// and role from the `public.users` table.
    pub sub: Uuid,
    /// Expiration time (exp): timestamp after which the JWT must be rejected.
    pub exp: usize,
    /// Issued at (iat): timestamp when the JWT was issued.
    pub iat: usize,
}

/// AuthUser
///
/// The resolved identity of an authenticated request: the authorization
/// principal. Every permission decision in the access module is a function of
/// this struct (and, for ownership rules, of the target row).
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The unique identifier of the user, mapped to `public.users.id`.
    pub id: Uuid,
    /// The user's role, used for all role-based access control decisions.
    pub role: Role,
}

/// AuthUser Extractor Implementation
///
/// Implements axum's FromRequestParts trait, making AuthUser usable as a
/// function argument in any authenticated handler:
/// 1. Dependency resolution: repository and config from the application state.
/// 2. Local bypass: development-time access using the `x-user-id` header,
///    only honored when running with `Env::Local`.
/// 3. Token validation: Bearer token extraction and JWT decoding.
/// 4. DB lookup: fetching the user's current role and existence.
///
/// Rejection: returns StatusCode::UNAUTHORIZED (401) on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        // Local development bypass: authenticate by providing a known user
        // UUID in the 'x-user-id' header. Guarded by the Env check, and the
        // UUID must still map to an actual user so roles are loaded correctly.
        if config.env == Env::Local {
            if let Some(user_id_header) = parts.headers.get("x-user-id") {
                if let Ok(id_str) = user_id_header.to_str() {
                    if let Ok(user_id) = Uuid::parse_str(id_str) {
                        if let Some(user) = repo.get_user(user_id).await {
                            return Ok(AuthUser {
                                id: user.id,
                                role: user.role,
                            });
                        }
                    }
                }
            }
        }
        // In Production, or if the bypass failed, execution falls through to
        // the standard JWT validation flow.

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::default();
        // Ensure expiration time validation is always active.
        validation.validate_exp = true;

        let token_data = match decode::<Claims>(token, &decoding_key, &validation) {
            Ok(data) => data,
            Err(e) => {
                match e.kind() {
                    // Token expired: the most common failure for a
                    // valid-but-old token.
                    ErrorKind::ExpiredSignature => return Err(StatusCode::UNAUTHORIZED),
                    // All other failure kinds (bad signature, malformed token).
                    _ => return Err(StatusCode::UNAUTHORIZED),
                }
            }
        };

        // Final verification against the database. This rejects tokens for
        // users deleted after the token was issued, and picks up role changes
        // immediately.
        let user = repo
            .get_user(token_data.claims.sub)
            .await
            .ok_or(StatusCode::UNAUTHORIZED)?;

        Ok(AuthUser {
            id: user.id,
            role: user.role,
        })
    }
}
