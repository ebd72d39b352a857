use super::helper;
use crate::auth::{self, AuthUser, Role};
use crate::model::admin::{AdminDashboardResponse, CourseRow, NewCourse, NewUser};
use crate::payloads::admin::{
    AssignCoursePayload, CreateCoursePayload, CreateUserPayload, EditCoursePayload,
};
use crate::{
    AppState,
    errors::AppError,
    response::ApiResponse,
    schema::{
        courses::dsl as courses_dsl, enrollments::dsl as enrollments_dsl,
        users::dsl as users_dsl,
    },
};
use axum::extract::{Path, State};
use axum::response::Json;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::log::warn;
use tracing::{info, instrument};

/// Admin dashboard: row counts across the main relations.
///
/// Returns (wrapped in `ApiResponse`)
/// * `AdminDashboardResponse` (200 OK).
/// * `403 Forbidden`: If the caller is not an admin.
#[instrument(skip(state, user))]
pub async fn dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<AdminDashboardResponse>, AppError> {
    user.require_role(Role::Admin)?;

    let counts = helper::run_query(&state.pool, |conn| {
        let user_count: i64 = users_dsl::users.count().get_result(conn)?;
        let course_count: i64 = courses_dsl::courses.count().get_result(conn)?;
        let enrollment_count: i64 = enrollments_dsl::enrollments.count().get_result(conn)?;
        Ok((user_count, course_count, enrollment_count))
    })
    .await?;

    Ok(ApiResponse::ok(AdminDashboardResponse {
        user_count: counts.0,
        course_count: counts.1,
        enrollment_count: counts.2,
    }))
}

/// Lists every course.
#[instrument(skip(state, user))]
pub async fn list_courses(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<Vec<CourseRow>>, AppError> {
    user.require_role(Role::Admin)?;
    info!("Admin '{}' listing courses", user.username);

    let courses = helper::run_query(&state.pool, |conn| {
        courses_dsl::courses
            .select((
                courses_dsl::id,
                courses_dsl::name,
                courses_dsl::semester,
                courses_dsl::teacher_id,
            ))
            .load::<CourseRow>(conn)
    })
    .await?;

    info!("Fetched {} courses", courses.len());
    Ok(ApiResponse::ok(courses))
}

/// Creates a new course.
///
/// Request Body: `CreateCoursePayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `i64`: The new course ID (200 OK).
/// * `403 Forbidden`: If the caller is not an admin.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(state, user, payload))]
pub async fn create_course(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateCoursePayload>,
) -> Result<ApiResponse<i64>, AppError> {
    user.require_role(Role::Admin)?;
    info!(
        "Admin '{}' creating course '{}' ({})",
        user.username, payload.course_name, payload.semester
    );

    let new_course = NewCourse {
        name: payload.course_name,
        semester: payload.semester,
    };

    let course_id = helper::run_query(&state.pool, move |conn| {
        diesel::insert_into(courses_dsl::courses)
            .values(&new_course)
            .returning(crate::schema::courses::id)
            .get_result::<i64>(conn)
    })
    .await?;

    info!("Created course with id {}", course_id);
    Ok(ApiResponse::ok(course_id))
}

/// Updates a course's name and semester.
///
/// Returns (wrapped in `ApiResponse`)
/// * `bool`: true indicating success (200 OK).
/// * `403 Forbidden`: If the caller is not an admin.
/// * `404 Not Found`: If the course does not exist.
#[instrument(skip(state, user, payload))]
pub async fn edit_course(
    State(state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<i64>,
    Json(payload): Json<EditCoursePayload>,
) -> Result<ApiResponse<bool>, AppError> {
    user.require_role(Role::Admin)?;
    info!("Admin '{}' editing course {}", user.username, course_id);

    let rows_affected = helper::run_query(&state.pool, move |conn| {
        diesel::update(courses_dsl::courses.find(course_id))
            .set((
                courses_dsl::name.eq(payload.course_name),
                courses_dsl::semester.eq(payload.semester),
            ))
            .execute(conn)
    })
    .await?;

    if rows_affected == 0 {
        return Err(AppError::NotFound(format!(
            "Course with ID {course_id} not found"
        )));
    }

    info!("Course {} updated", course_id);
    Ok(ApiResponse::ok(true))
}

/// Deletes a course row. Dependent enrollment, attendance, grade and
/// resource rows are NOT removed; there is no cascade.
///
/// Returns (wrapped in `ApiResponse`)
/// * `bool`: true indicating success (200 OK).
/// * `403 Forbidden`: If the caller is not an admin.
/// * `404 Not Found`: If the course does not exist.
#[instrument(skip(state, user))]
pub async fn delete_course(
    State(state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<i64>,
) -> Result<ApiResponse<bool>, AppError> {
    user.require_role(Role::Admin)?;
    info!("Admin '{}' deleting course {}", user.username, course_id);

    let rows_affected = helper::run_query(&state.pool, move |conn| {
        diesel::delete(courses_dsl::courses.find(course_id)).execute(conn)
    })
    .await?;

    if rows_affected == 0 {
        return Err(AppError::NotFound(format!(
            "Course with ID {course_id} not found"
        )));
    }

    info!("Course {} deleted", course_id);
    Ok(ApiResponse::ok(true))
}

/// Creates an account with any role (admin-driven counterpart to
/// self-service registration).
///
/// Request Body: `CreateUserPayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `i64`: The new user ID (200 OK).
/// * `403 Forbidden`: If the caller is not an admin.
/// * `409 Conflict`: If the username is already taken.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(state, user, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateUserPayload>,
) -> Result<ApiResponse<i64>, AppError> {
    user.require_role(Role::Admin)?;
    info!(
        "Admin '{}' creating user '{}' with role {}",
        user.username, payload.username, payload.role
    );

    let username = payload.username.clone();
    let new_user = NewUser {
        username: payload.username,
        password_hash: auth::hash_password(&payload.password)?,
        role: payload.role.as_str().to_string(),
        display_name: payload.display_name,
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
            info!("Created user '{}' with id {}", username, user_id);
            Ok(ApiResponse::ok(user_id))
        }
        Err(AppError::InternalServerError(ref err)) => {
            if let Some(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)) =
                err.downcast_ref::<DieselError>()
            {
                warn!(
                    "User creation failed, username '{}' already taken. Details: {}",
                    username,
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

/// Assigns a teacher to a course.
///
/// Request Body: `AssignCoursePayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `bool`: true indicating success (200 OK).
/// * `403 Forbidden`: If the caller is not an admin.
/// * `404 Not Found`: If the course or the user does not exist.
/// * `422 Unprocessable Entity`: If the target user is not a teacher.
#[instrument(skip(state, user, payload))]
pub async fn assign_course(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AssignCoursePayload>,
) -> Result<ApiResponse<bool>, AppError> {
    user.require_role(Role::Admin)?;
    info!(
        "Admin '{}' assigning teacher {} to course {}",
        user.username, payload.teacher_id, payload.course_id
    );

    let teacher_id = payload.teacher_id;
    let target_role = helper::run_query(&state.pool, move |conn| {
        users_dsl::users
            .find(teacher_id)
            .select(users_dsl::role)
            .first::<String>(conn)
            .optional()
    })
    .await?;

    match target_role.as_deref() {
        None => {
            return Err(AppError::NotFound(format!(
                "User with ID {teacher_id} not found"
            )));
        }
        Some("teacher") => {}
        Some(other) => {
            warn!(
                "Refusing to assign user {} (role {}) as a course teacher",
                teacher_id, other
            );
            return Err(AppError::UnprocessableEntity(format!(
                "User with ID {teacher_id} is not a teacher"
            )));
        }
    }

    let course_id = payload.course_id;
    let rows_affected = helper::run_query(&state.pool, move |conn| {
        diesel::update(courses_dsl::courses.find(course_id))
            .set(courses_dsl::teacher_id.eq(Some(teacher_id)))
            .execute(conn)
    })
    .await?;

    if rows_affected == 0 {
        return Err(AppError::NotFound(format!(
            "Course with ID {course_id} not found"
        )));
    }

    info!("Teacher {} assigned to course {}", teacher_id, course_id);
    Ok(ApiResponse::ok(true))
}
