use crate::errors::AppError;
use crate::schema::{sessions::dsl as sessions_dsl, users::dsl as users_dsl};
use argon2::password_hash::rand_core::OsRng;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use deadpool_diesel::sqlite::Pool;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// The three account roles. Stored in the `users.role` column as lowercase
/// text; a user's role is fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

/// Hashes a password with a fresh random salt (argon2, PHC string format).
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::InternalServerError(anyhow::anyhow!("Password hashing failed: {e}")))
}

/// Checks a candidate password against a stored PHC hash string.
pub fn verify_password(candidate: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        warn!("Stored password hash could not be parsed");
        return false;
    };
    Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .is_ok()
}

/// The authenticated caller of a request, resolved from the bearer session
/// token. Extracting this successfully is the "authenticated, any role"
/// check; route handlers narrow it with [`AuthUser::require_role`].
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub token: String,
}

impl AuthUser {
    /// Requires the caller to hold exactly `role`. The rejection is a 403,
    /// distinct from authentication failure (401) and missing data (404),
    /// and is meant to run before any domain operation touches the store.
    pub fn require_role(&self, role: Role) -> Result<(), AppError> {
        if self.role == role {
            Ok(())
        } else {
            warn!(
                "User {} (role {}) denied access to a {}-only route",
                self.username, self.role, role
            );
            Err(AppError::Forbidden(format!("Access denied. {role}s only.")))
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Pool: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?.to_string();
        let pool = Pool::from_ref(state);

        let lookup_token = token.clone();
        let row = crate::api::helper::run_query(&pool, move |conn| {
            sessions_dsl::sessions
                .inner_join(users_dsl::users.on(sessions_dsl::user_id.eq(users_dsl::id)))
                .filter(sessions_dsl::token.eq(lookup_token))
                .select((users_dsl::id, users_dsl::username, users_dsl::role))
                .first::<(i64, String, String)>(conn)
                .optional()
        })
        .await?;

        let Some((id, username, role_str)) = row else {
            debug!("Bearer token did not match any session");
            return Err(AppError::Unauthorized(
                "Invalid or expired session token".to_string(),
            ));
        };

        let role = Role::from_str(&role_str).map_err(|e| {
            AppError::InternalServerError(anyhow::anyhow!("Corrupt role in users table: {e}"))
        })?;

        Ok(AuthUser {
            id,
            username,
            role,
            token,
        })
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;
    let value = header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Malformed Authorization header".to_string()))?;
    value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Expected a bearer token".to_string()))
}
