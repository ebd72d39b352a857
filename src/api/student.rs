use super::helper;
use crate::auth::{AuthUser, Role};
use crate::model::admin::CourseRow;
use crate::model::student::{
    EnrollmentRow, MyAttendanceRow, MyGradeRow, NewEnrollment, StudentDashboardResponse,
};
use crate::model::teacher::ResourceRow;
use crate::{
    AppState,
    errors::AppError,
    response::ApiResponse,
    schema::{
        attendance::dsl as attendance_dsl, course_resources::dsl as resources_dsl,
        courses::dsl as courses_dsl, enrollments::dsl as enrollments_dsl,
        grades::dsl as grades_dsl,
    },
};
use anyhow::anyhow;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use diesel::dsl::{exists, select};
use diesel::prelude::*;
use tracing::{error, info, instrument};

/// Lists every course. The one route open to any authenticated role:
/// extraction of `AuthUser` is the only guard.
#[instrument(skip(state, user))]
pub async fn list_courses(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<Vec<CourseRow>>, AppError> {
    info!(
        "User '{}' ({}) listing available courses",
        user.username, user.role
    );

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

/// Student dashboard: how many courses the caller is enrolled in.
#[instrument(skip(state, user))]
pub async fn dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<StudentDashboardResponse>, AppError> {
    user.require_role(Role::Student)?;

    let user_id = user.id;
    let enrollment_count = helper::run_query(&state.pool, move |conn| {
        enrollments_dsl::enrollments
            .filter(enrollments_dsl::user_id.eq(user_id))
            .count()
            .get_result::<i64>(conn)
    })
    .await?;

    Ok(ApiResponse::ok(StudentDashboardResponse {
        enrollment_count,
    }))
}

/// Enrolls the caller in a course.
///
/// There is no uniqueness constraint on (user, course): enrolling twice
/// creates a second enrollment row.
///
/// Returns (wrapped in `ApiResponse`)
/// * `i64`: The new enrollment ID (200 OK).
/// * `403 Forbidden`: If the caller is not a student.
/// * `404 Not Found`: If the course does not exist.
#[instrument(skip(state, user))]
pub async fn enroll(
    State(state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<i64>,
) -> Result<ApiResponse<i64>, AppError> {
    user.require_role(Role::Student)?;
    info!(
        "Student '{}' enrolling in course {}",
        user.username, course_id
    );

    let course_exists = helper::run_query(&state.pool, move |conn| {
        select(exists(courses_dsl::courses.find(course_id))).get_result::<bool>(conn)
    })
    .await?;
    if !course_exists {
        error!("Course with ID {} not found.", course_id);
        return Err(AppError::NotFound(format!(
            "Course with ID {course_id} not found"
        )));
    }

    let new_enrollment = NewEnrollment {
        user_id: user.id,
        course_id,
    };
    let enrollment_id = helper::run_query(&state.pool, move |conn| {
        diesel::insert_into(enrollments_dsl::enrollments)
            .values(&new_enrollment)
            .returning(crate::schema::enrollments::id)
            .get_result::<i64>(conn)
    })
    .await?;

    info!(
        "Student '{}' enrolled in course {} (enrollment_id {})",
        user.username, course_id, enrollment_id
    );
    Ok(ApiResponse::ok(enrollment_id))
}

/// Lists the caller's enrollments with course name and semester.
#[instrument(skip(state, user))]
pub async fn my_enrollments(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<Vec<EnrollmentRow>>, AppError> {
    user.require_role(Role::Student)?;
    info!("Student '{}' listing enrollments", user.username);

    let user_id = user.id;
    let enrollments = helper::run_query(&state.pool, move |conn| {
        enrollments_dsl::enrollments
            .inner_join(courses_dsl::courses.on(enrollments_dsl::course_id.eq(courses_dsl::id)))
            .filter(enrollments_dsl::user_id.eq(user_id))
            .select((
                enrollments_dsl::id,
                courses_dsl::name,
                courses_dsl::semester,
            ))
            .load::<EnrollmentRow>(conn)
    })
    .await?;

    Ok(ApiResponse::ok(enrollments))
}

/// Lists the caller's attendance records across all enrollments.
#[instrument(skip(state, user))]
pub async fn my_attendance(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<Vec<MyAttendanceRow>>, AppError> {
    user.require_role(Role::Student)?;
    info!("Student '{}' listing attendance", user.username);

    let user_id = user.id;
    let rows = helper::run_query(&state.pool, move |conn| {
        attendance_dsl::attendance
            .inner_join(
                enrollments_dsl::enrollments
                    .on(attendance_dsl::enrollment_id.eq(enrollments_dsl::id)),
            )
            .inner_join(courses_dsl::courses.on(enrollments_dsl::course_id.eq(courses_dsl::id)))
            .filter(enrollments_dsl::user_id.eq(user_id))
            .select((
                courses_dsl::name,
                attendance_dsl::date,
                attendance_dsl::status,
            ))
            .load::<MyAttendanceRow>(conn)
    })
    .await?;

    Ok(ApiResponse::ok(rows))
}

/// Lists the caller's grades across all enrollments.
#[instrument(skip(state, user))]
pub async fn my_grades(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<Vec<MyGradeRow>>, AppError> {
    user.require_role(Role::Student)?;
    info!("Student '{}' listing grades", user.username);

    let user_id = user.id;
    let rows = helper::run_query(&state.pool, move |conn| {
        grades_dsl::grades
            .inner_join(
                enrollments_dsl::enrollments.on(grades_dsl::enrollment_id.eq(enrollments_dsl::id)),
            )
            .inner_join(courses_dsl::courses.on(enrollments_dsl::course_id.eq(courses_dsl::id)))
            .filter(enrollments_dsl::user_id.eq(user_id))
            .select((
                courses_dsl::name,
                grades_dsl::category,
                grades_dsl::grade_value,
            ))
            .load::<MyGradeRow>(conn)
    })
    .await?;

    Ok(ApiResponse::ok(rows))
}

/// Lists a course's resources for an enrolled student.
///
/// Returns (wrapped in `ApiResponse`)
/// * `Vec<ResourceRow>` (200 OK).
/// * `403 Forbidden`: If the caller is not a student or not enrolled.
/// * `404 Not Found`: If the course does not exist.
#[instrument(skip(state, user))]
pub async fn course_resources(
    State(state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<i64>,
) -> Result<ApiResponse<Vec<ResourceRow>>, AppError> {
    user.require_role(Role::Student)?;
    info!(
        "Student '{}' listing resources for course {}",
        user.username, course_id
    );

    ensure_course_exists(&state, course_id).await?;
    ensure_enrolled(&state, user.id, course_id).await?;

    let resources = helper::run_query(&state.pool, move |conn| {
        resources_dsl::course_resources
            .filter(resources_dsl::course_id.eq(course_id))
            .select((
                resources_dsl::id,
                resources_dsl::course_id,
                resources_dsl::file_name,
            ))
            .load::<ResourceRow>(conn)
    })
    .await?;

    Ok(ApiResponse::ok(resources))
}

/// Serves the raw bytes of an uploaded resource to an enrolled student.
///
/// Returns
/// * The file content with a content-disposition header (200 OK).
/// * `403 Forbidden`: If the caller is not a student or not enrolled.
/// * `404 Not Found`: If the resource does not exist.
#[instrument(skip(state, user))]
pub async fn download_resource(
    State(state): State<AppState>,
    user: AuthUser,
    Path(resource_id): Path<i64>,
) -> Result<Response, AppError> {
    user.require_role(Role::Student)?;
    info!(
        "Student '{}' downloading resource {}",
        user.username, resource_id
    );

    let row = helper::run_query(&state.pool, move |conn| {
        resources_dsl::course_resources
            .find(resource_id)
            .select((
                resources_dsl::course_id,
                resources_dsl::file_name,
                resources_dsl::file_path,
            ))
            .first::<(i64, String, String)>(conn)
            .optional()
    })
    .await?;

    let Some((course_id, file_name, file_path)) = row else {
        return Err(AppError::NotFound(format!(
            "Resource with ID {resource_id} not found"
        )));
    };

    ensure_enrolled(&state, user.id, course_id).await?;

    let content = tokio::fs::read(&file_path).await.map_err(|e| {
        error!("Failed to read resource file {}: {}", file_path, e);
        AppError::InternalServerError(anyhow!("Failed to read resource file: {e}"))
    })?;

    let response = (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        content,
    )
        .into_response();
    Ok(response)
}

async fn ensure_course_exists(state: &AppState, course_id: i64) -> Result<(), AppError> {
    let course_exists = helper::run_query(&state.pool, move |conn| {
        select(exists(courses_dsl::courses.find(course_id))).get_result::<bool>(conn)
    })
    .await?;
    if !course_exists {
        error!("Course with ID {} not found.", course_id);
        return Err(AppError::NotFound(format!(
            "Course with ID {course_id} not found"
        )));
    }
    Ok(())
}

/// Resource routes are only open to students enrolled in the course.
async fn ensure_enrolled(state: &AppState, user_id: i64, course_id: i64) -> Result<(), AppError> {
    let enrolled = helper::run_query(&state.pool, move |conn| {
        select(exists(
            enrollments_dsl::enrollments
                .filter(enrollments_dsl::user_id.eq(user_id))
                .filter(enrollments_dsl::course_id.eq(course_id)),
        ))
        .get_result::<bool>(conn)
    })
    .await?;

    if !enrolled {
        return Err(AppError::Forbidden(format!(
            "Access denied. You are not enrolled in course {course_id}."
        )));
    }
    Ok(())
}
