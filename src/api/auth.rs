use super::helper;
use crate::auth::{self, AuthUser, Role};
use crate::model::auth::{LoginResponse, NewSession, RegisterResponse};
use crate::payloads::auth::{LoginPayload, RegisterPayload, UpdateProfilePayload};
use crate::{
    AppState,
    errors::AppError,
    model::admin::NewUser,
    response::ApiResponse,
    schema::{sessions::dsl as sessions_dsl, users::dsl as users_dsl},
};
use axum::extract::State;
use axum::response::Json;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::log::warn;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Creates a new account with the requested role.
///
/// Request Body: `RegisterPayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `RegisterResponse`: The new user ID and role (200 OK).
/// * `409 Conflict`: If the username is already taken.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<ApiResponse<RegisterResponse>, AppError> {
    info!(
        "Attempting to register user '{}' with role {}",
        payload.username, payload.role
    );

    let role = payload.role;
    let new_user = NewUser {
        username: payload.username.clone(),
        password_hash: auth::hash_password(&payload.password)?,
        role: role.as_str().to_string(),
        display_name: None,
    };

    let insert_result = helper::run_query(&state.pool, move |conn| {
        diesel::insert_into(users_dsl::users)
            .values(&new_user)
            .returning(crate::schema::users::id)
            .get_result::<i64>(conn)
    })
    .await;

    match insert_result {
        Ok(user_id) => {
            info!(
                "Successfully registered user '{}' with id {}",
                payload.username, user_id
            );
            Ok(ApiResponse::ok(RegisterResponse {
                user_id,
                role: role.as_str().to_string(),
            }))
        }
        Err(AppError::InternalServerError(ref err)) => {
            if let Some(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)) =
                err.downcast_ref::<DieselError>()
            {
                warn!(
                    "Registration failed, username '{}' already taken. Details: {}",
                    payload.username,
                    info.message()
                );
                return Err(AppError::Conflict(
                    "Error: That username is already taken. Please choose another.".to_string(),
                ));
            }
            Err(insert_result.unwrap_err())
        }
        Err(e) => Err(e),
    }
}

/// Authenticates an admin account and opens a session.
#[instrument(skip(state, payload))]
pub async fn admin_login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<ApiResponse<LoginResponse>, AppError> {
    login(&state, payload, Role::Admin).await
}

/// Authenticates a teacher account and opens a session.
#[instrument(skip(state, payload))]
pub async fn teacher_login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<ApiResponse<LoginResponse>, AppError> {
    login(&state, payload, Role::Teacher).await
}

/// Authenticates a student account and opens a session.
#[instrument(skip(state, payload))]
pub async fn student_login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<ApiResponse<LoginResponse>, AppError> {
    login(&state, payload, Role::Student).await
}

/// Shared credential check for the per-role login routes.
///
/// A wrong password and a role mismatch are deliberately indistinguishable:
/// both surface as the same 401 rejection.
async fn login(
    state: &AppState,
    payload: LoginPayload,
    role: Role,
) -> Result<ApiResponse<LoginResponse>, AppError> {
    info!(
        "Login attempt for username '{}' on the {} login route",
        payload.username, role
    );

    let username = payload.username.clone();
    let user_row = helper::run_query(&state.pool, move |conn| {
        users_dsl::users
            .filter(users_dsl::username.eq(username))
            .filter(users_dsl::role.eq(role.as_str()))
            .select((
                users_dsl::id,
                users_dsl::password_hash,
                users_dsl::display_name,
            ))
            .first::<(i64, String, Option<String>)>(conn)
            .optional()
    })
    .await?;

    let rejection = || {
        warn!("Invalid {} credentials for '{}'", role, payload.username);
        AppError::Unauthorized(format!("Invalid {} Credentials!", title_case(role)))
    };

    let Some((user_id, stored_hash, display_name)) = user_row else {
        return Err(rejection());
    };
    if !auth::verify_password(&payload.password, &stored_hash) {
        return Err(rejection());
    }

    let session = NewSession {
        token: Uuid::new_v4().to_string(),
        user_id,
    };
    let token = session.token.clone();

    helper::run_query(&state.pool, move |conn| {
        diesel::insert_into(sessions_dsl::sessions)
            .values(&session)
            .execute(conn)
    })
    .await?;

    info!(
        "User '{}' logged in as {} (user_id {})",
        payload.username, role, user_id
    );
    Ok(ApiResponse::ok(LoginResponse {
        token,
        user_id,
        role: role.as_str().to_string(),
        display_name,
    }))
}

/// Ends the caller's session.
///
/// Returns (wrapped in `ApiResponse`)
/// * `()`: Empty success response (200 OK).
/// * `401 Unauthorized`: If no valid session token was presented.
#[instrument(skip(state, user))]
pub async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<()>, AppError> {
    info!("Logging out user '{}'", user.username);

    let token = user.token.clone();
    helper::run_query(&state.pool, move |conn| {
        diesel::delete(sessions_dsl::sessions.filter(sessions_dsl::token.eq(token)))
            .execute(conn)
    })
    .await?;

    Ok(ApiResponse::ok(()))
}

/// Updates the caller's password and/or display name. Available to every
/// authenticated role, but the current password must verify first.
///
/// Request Body: `UpdateProfilePayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `bool`: true indicating success (200 OK).
/// * `401 Unauthorized`: If the submitted current password is wrong.
/// * `422 Unprocessable Entity`: If the payload contains nothing to change.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(state, user, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateProfilePayload>,
) -> Result<ApiResponse<bool>, AppError> {
    info!("Profile update requested by '{}'", user.username);
    debug!(
        "Profile update changes password: {}, display name: {}",
        payload.new_password.is_some(),
        payload.display_name.is_some()
    );

    if payload.new_password.is_none() && payload.display_name.is_none() {
        return Err(AppError::UnprocessableEntity(
            "Nothing to update".to_string(),
        ));
    }

    let user_id = user.id;
    let stored_hash = helper::run_query(&state.pool, move |conn| {
        users_dsl::users
            .find(user_id)
            .select(users_dsl::password_hash)
            .first::<String>(conn)
    })
    .await?;

    if !auth::verify_password(&payload.current_password, &stored_hash) {
        warn!(
            "Profile update rejected for '{}': current password did not verify",
            user.username
        );
        return Err(AppError::Unauthorized(
            "Invalid current password".to_string(),
        ));
    }

    let new_hash = payload
        .new_password
        .as_deref()
        .map(auth::hash_password)
        .transpose()?;
    let display_name = payload.display_name.clone();

    helper::run_query(&state.pool, move |conn| {
        if let Some(hash) = new_hash {
            diesel::update(users_dsl::users.find(user_id))
                .set(users_dsl::password_hash.eq(hash))
                .execute(conn)?;
        }
        if let Some(name) = display_name {
            diesel::update(users_dsl::users.find(user_id))
                .set(users_dsl::display_name.eq(name))
                .execute(conn)?;
        }
        Ok(())
    })
    .await?;

    info!("Profile updated for '{}'", user.username);
    Ok(ApiResponse::ok(true))
}

fn title_case(role: Role) -> &'static str {
    match role {
        Role::Admin => "Admin",
        Role::Teacher => "Teacher",
        Role::Student => "Student",
    }
}
