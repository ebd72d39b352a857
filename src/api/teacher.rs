use super::helper;
use crate::auth::{AuthUser, Role};
use crate::model::admin::CourseRow;
use crate::model::teacher::{
    AttendanceRow, CourseAttendanceResponse, CourseGradesResponse, GradeRow, NewAttendance,
    NewCourseResource, NewGrade, ProcessAttendanceResponse, ResourceRow, RosterEntry,
    SubmitGradesResponse, TeacherDashboardResponse,
};
use crate::payloads::teacher::{
    ProcessAttendancePayload, SubmitGradesPayload, UpdateAttendancePayload,
    UpdateResourcePayload, UploadResourcePayload,
};
use crate::{
    AppState,
    errors::AppError,
    response::ApiResponse,
    schema::{
        attendance::dsl as attendance_dsl, course_resources::dsl as resources_dsl,
        courses::dsl as courses_dsl, enrollments::dsl as enrollments_dsl,
        grades::dsl as grades_dsl, users::dsl as users_dsl,
    },
};
use anyhow::anyhow;
use axum::extract::{Path, State};
use axum::response::Json;
use diesel::prelude::*;
use std::path::PathBuf;
use tracing::log::warn;
use tracing::{debug, error, info, instrument};

/// Teacher dashboard: the courses currently assigned to the caller.
#[instrument(skip(state, user))]
pub async fn dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<TeacherDashboardResponse>, AppError> {
    user.require_role(Role::Teacher)?;

    let teacher_id = user.id;
    let assigned_course_ids = helper::run_query(&state.pool, move |conn| {
        courses_dsl::courses
            .filter(courses_dsl::teacher_id.eq(Some(teacher_id)))
            .select(courses_dsl::id)
            .load::<i64>(conn)
    })
    .await?;

    let course_count = assigned_course_ids.len() as i64;
    Ok(ApiResponse::ok(TeacherDashboardResponse {
        assigned_course_ids,
        course_count,
    }))
}

/// Lists every course. A teacher sees all courses, not only the ones
/// assigned to them.
#[instrument(skip(state, user))]
pub async fn list_courses(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<Vec<CourseRow>>, AppError> {
    user.require_role(Role::Teacher)?;
    info!("Teacher '{}' listing courses", user.username);

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

    Ok(ApiResponse::ok(courses))
}

/// Fetches the enrollment roster of a course so attendance can be marked.
///
/// Returns (wrapped in `ApiResponse`)
/// * `CourseAttendanceResponse`: Course info plus (enrollment_id, student_name) pairs (200 OK).
/// * `403 Forbidden`: If the caller is not a teacher.
/// * `404 Not Found`: If the course does not exist.
#[instrument(skip(state, user))]
pub async fn course_attendance(
    State(state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<i64>,
) -> Result<ApiResponse<CourseAttendanceResponse>, AppError> {
    user.require_role(Role::Teacher)?;
    info!(
        "Teacher '{}' fetching attendance roster for course {}",
        user.username, course_id
    );

    let course_name = fetch_course_name(&state, course_id).await?;

    let roster = helper::run_query(&state.pool, move |conn| {
        enrollments_dsl::enrollments
            .inner_join(users_dsl::users.on(enrollments_dsl::user_id.eq(users_dsl::id)))
            .filter(enrollments_dsl::course_id.eq(course_id))
            .select((enrollments_dsl::id, users_dsl::username))
            .load::<RosterEntry>(conn)
    })
    .await?;

    info!(
        "Roster for course {} contains {} enrollments",
        course_id,
        roster.len()
    );
    Ok(ApiResponse::ok(CourseAttendanceResponse {
        course_id,
        course_name,
        roster,
    }))
}

/// Records attendance for multiple enrollments at once.
///
/// One attendance row is inserted per entry. Nothing verifies that an
/// enrollment belongs to the course in the path, and marking the same date
/// twice produces duplicate rows for that date.
///
/// Request Body: `ProcessAttendancePayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `ProcessAttendanceResponse`: Number of rows recorded (200 OK).
/// * `403 Forbidden`: If the caller is not a teacher.
/// * `404 Not Found`: If the course does not exist.
#[instrument(skip(state, user, payload))]
pub async fn process_attendance(
    State(state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<i64>,
    Json(payload): Json<ProcessAttendancePayload>,
) -> Result<ApiResponse<ProcessAttendanceResponse>, AppError> {
    user.require_role(Role::Teacher)?;
    info!(
        "Teacher '{}' recording attendance for course {} on '{}' ({} entries)",
        user.username,
        course_id,
        payload.date,
        payload.entries.len()
    );
    debug!("Process attendance payload: {:?}", payload);

    fetch_course_name(&state, course_id).await?;

    let rows: Vec<NewAttendance> = payload
        .entries
        .iter()
        .map(|entry| NewAttendance {
            enrollment_id: entry.enrollment_id,
            date: payload.date.clone(),
            status: entry.status.as_str().to_string(),
        })
        .collect();

    let recorded = helper::run_query(&state.pool, move |conn| {
        diesel::insert_into(attendance_dsl::attendance)
            .values(&rows)
            .execute(conn)
    })
    .await?;

    info!(
        "Recorded {} attendance rows for course {}",
        recorded, course_id
    );
    Ok(ApiResponse::ok(ProcessAttendanceResponse { recorded }))
}

/// Lists every attendance row with student and course names.
#[instrument(skip(state, user))]
pub async fn all_attendance(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<Vec<AttendanceRow>>, AppError> {
    user.require_role(Role::Teacher)?;
    info!("Teacher '{}' listing all attendance", user.username);

    let rows = helper::run_query(&state.pool, |conn| {
        attendance_dsl::attendance
            .inner_join(
                enrollments_dsl::enrollments
                    .on(attendance_dsl::enrollment_id.eq(enrollments_dsl::id)),
            )
            .inner_join(users_dsl::users.on(enrollments_dsl::user_id.eq(users_dsl::id)))
            .inner_join(courses_dsl::courses.on(enrollments_dsl::course_id.eq(courses_dsl::id)))
            .select((
                attendance_dsl::id,
                users_dsl::username,
                courses_dsl::name,
                attendance_dsl::date,
                attendance_dsl::status,
            ))
            .order(attendance_dsl::id.asc())
            .load::<AttendanceRow>(conn)
    })
    .await?;

    info!("Fetched {} attendance rows", rows.len());
    Ok(ApiResponse::ok(rows))
}

/// Corrects the status of an existing attendance row.
///
/// Request Body: `UpdateAttendancePayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `bool`: true indicating success (200 OK).
/// * `403 Forbidden`: If the caller is not a teacher.
/// * `404 Not Found`: If the attendance row does not exist.
#[instrument(skip(state, user, payload))]
pub async fn update_attendance(
    State(state): State<AppState>,
    user: AuthUser,
    Path(attendance_id): Path<i64>,
    Json(payload): Json<UpdateAttendancePayload>,
) -> Result<ApiResponse<bool>, AppError> {
    user.require_role(Role::Teacher)?;
    info!(
        "Teacher '{}' correcting attendance row {} to '{}'",
        user.username, attendance_id, payload.status
    );

    let status = payload.status.as_str().to_string();
    let rows_affected = helper::run_query(&state.pool, move |conn| {
        diesel::update(attendance_dsl::attendance.find(attendance_id))
            .set(attendance_dsl::status.eq(status))
            .execute(conn)
    })
    .await?;

    if rows_affected == 0 {
        return Err(AppError::NotFound(format!(
            "Attendance record with ID {attendance_id} not found"
        )));
    }

    Ok(ApiResponse::ok(true))
}

/// Fetches the roster and all existing grade rows for a course.
///
/// Returns (wrapped in `ApiResponse`)
/// * `CourseGradesResponse` (200 OK).
/// * `403 Forbidden`: If the caller is not a teacher.
/// * `404 Not Found`: If the course does not exist.
#[instrument(skip(state, user))]
pub async fn course_grades(
    State(state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<i64>,
) -> Result<ApiResponse<CourseGradesResponse>, AppError> {
    user.require_role(Role::Teacher)?;
    info!(
        "Teacher '{}' fetching grades for course {}",
        user.username, course_id
    );

    fetch_course_name(&state, course_id).await?;

    let (roster, grades) = helper::run_query(&state.pool, move |conn| {
        let roster = enrollments_dsl::enrollments
            .inner_join(users_dsl::users.on(enrollments_dsl::user_id.eq(users_dsl::id)))
            .filter(enrollments_dsl::course_id.eq(course_id))
            .select((enrollments_dsl::id, users_dsl::username))
            .load::<RosterEntry>(conn)?;

        let grades = grades_dsl::grades
            .inner_join(
                enrollments_dsl::enrollments.on(grades_dsl::enrollment_id.eq(enrollments_dsl::id)),
            )
            .inner_join(users_dsl::users.on(enrollments_dsl::user_id.eq(users_dsl::id)))
            .filter(enrollments_dsl::course_id.eq(course_id))
            .select((
                grades_dsl::enrollment_id,
                users_dsl::username,
                grades_dsl::category,
                grades_dsl::grade_value,
            ))
            .load::<GradeRow>(conn)?;

        Ok((roster, grades))
    })
    .await?;

    Ok(ApiResponse::ok(CourseGradesResponse {
        course_id,
        roster,
        grades,
    }))
}

/// Upserts a batch of grades.
///
/// Each (enrollment_id, category, value) triple is written independently
/// with an atomic conditional insert: a conflict on the unique
/// (enrollment_id, category) pair updates grade_value in place. A failing
/// triple does not roll back the others.
///
/// Request Body: `SubmitGradesPayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `SubmitGradesResponse`: Applied and failed counts (200 OK).
/// * `403 Forbidden`: If the caller is not a teacher.
/// * `404 Not Found`: If the course does not exist.
#[instrument(skip(state, user, payload))]
pub async fn submit_grades(
    State(state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<i64>,
    Json(payload): Json<SubmitGradesPayload>,
) -> Result<ApiResponse<SubmitGradesResponse>, AppError> {
    user.require_role(Role::Teacher)?;
    info!(
        "Teacher '{}' submitting {} grades for course {}",
        user.username,
        payload.grades.len(),
        course_id
    );
    debug!("Submit grades payload: {:?}", payload);

    fetch_course_name(&state, course_id).await?;

    let entries = payload.grades;
    let (applied, failed) = helper::run_query(&state.pool, move |conn| {
        let mut applied = 0usize;
        let mut failed = 0usize;
        for entry in entries {
            let new_grade = NewGrade {
                enrollment_id: entry.enrollment_id,
                category: entry.category.clone(),
                grade_value: entry.grade_value.clone(),
            };
            let result = diesel::insert_into(grades_dsl::grades)
                .values(&new_grade)
                .on_conflict((grades_dsl::enrollment_id, grades_dsl::category))
                .do_update()
                .set(grades_dsl::grade_value.eq(entry.grade_value))
                .execute(conn);
            match result {
                Ok(_) => applied += 1,
                Err(e) => {
                    error!(
                        "Grade upsert failed for enrollment {} category '{}': {:?}",
                        entry.enrollment_id, entry.category, e
                    );
                    failed += 1;
                }
            }
        }
        Ok((applied, failed))
    })
    .await?;

    info!(
        "Grade batch for course {}: {} applied, {} failed",
        course_id, applied, failed
    );
    Ok(ApiResponse::ok(SubmitGradesResponse { applied, failed }))
}

/// Lists the uploaded resources of a course.
#[instrument(skip(state, user))]
pub async fn course_resources(
    State(state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<i64>,
) -> Result<ApiResponse<Vec<ResourceRow>>, AppError> {
    user.require_role(Role::Teacher)?;

    fetch_course_name(&state, course_id).await?;

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

/// Stores a course document and records it.
///
/// The file is written to the resource directory first; the row is only
/// inserted once the write succeeded, and is compensated away again if the
/// insert fails.
///
/// Request Body: `UploadResourcePayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `i64`: The new resource ID (200 OK).
/// * `403 Forbidden`: If the caller is not a teacher.
/// * `404 Not Found`: If the course does not exist.
/// * `422 Unprocessable Entity`: If the file name contains path separators.
#[instrument(skip(state, user, payload))]
pub async fn upload_resource(
    State(state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<i64>,
    Json(payload): Json<UploadResourcePayload>,
) -> Result<ApiResponse<i64>, AppError> {
    user.require_role(Role::Teacher)?;
    info!(
        "Teacher '{}' uploading resource '{}' to course {}",
        user.username, payload.file_name, course_id
    );

    fetch_course_name(&state, course_id).await?;
    let file_path = resource_path(&state, course_id, &payload.file_name)?;

    tokio::fs::write(&file_path, payload.content.as_bytes())
        .await
        .map_err(|e| {
            error!("Failed to write resource file {:?}: {}", file_path, e);
            AppError::InternalServerError(anyhow!("Failed to store resource file: {e}"))
        })?;

    let new_resource = NewCourseResource {
        course_id,
        file_name: payload.file_name.clone(),
        file_path: file_path.to_string_lossy().into_owned(),
    };

    let insert_result = helper::run_query(&state.pool, move |conn| {
        diesel::insert_into(resources_dsl::course_resources)
            .values(&new_resource)
            .returning(crate::schema::course_resources::id)
            .get_result::<i64>(conn)
    })
    .await;

    match insert_result {
        Ok(resource_id) => {
            info!(
                "Resource '{}' stored for course {} with id {}",
                payload.file_name, course_id, resource_id
            );
            Ok(ApiResponse::ok(resource_id))
        }
        Err(e) => {
            // the row never existed, so take the file with it
            if let Err(cleanup_err) = tokio::fs::remove_file(&file_path).await {
                warn!(
                    "Failed to clean up resource file {:?} after insert error: {}",
                    file_path, cleanup_err
                );
            }
            Err(e)
        }
    }
}

/// Renames an uploaded resource. The file is moved on disk first; the row
/// is only updated after the move succeeded.
///
/// Request Body: `UpdateResourcePayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `bool`: true indicating success (200 OK).
/// * `403 Forbidden`: If the caller is not a teacher.
/// * `404 Not Found`: If the resource does not exist.
/// * `422 Unprocessable Entity`: If the file name contains path separators.
#[instrument(skip(state, user, payload))]
pub async fn update_resource(
    State(state): State<AppState>,
    user: AuthUser,
    Path(resource_id): Path<i64>,
    Json(payload): Json<UpdateResourcePayload>,
) -> Result<ApiResponse<bool>, AppError> {
    user.require_role(Role::Teacher)?;
    info!(
        "Teacher '{}' renaming resource {} to '{}'",
        user.username, resource_id, payload.file_name
    );

    let row = helper::run_query(&state.pool, move |conn| {
        resources_dsl::course_resources
            .find(resource_id)
            .select((resources_dsl::course_id, resources_dsl::file_path))
            .first::<(i64, String)>(conn)
            .optional()
    })
    .await?;

    let Some((course_id, old_path)) = row else {
        return Err(AppError::NotFound(format!(
            "Resource with ID {resource_id} not found"
        )));
    };

    let new_path = resource_path(&state, course_id, &payload.file_name)?;
    tokio::fs::rename(&old_path, &new_path).await.map_err(|e| {
        error!(
            "Failed to move resource file {:?} to {:?}: {}",
            old_path, new_path, e
        );
        AppError::InternalServerError(anyhow!("Failed to move resource file: {e}"))
    })?;

    let file_name = payload.file_name;
    let new_path_str = new_path.to_string_lossy().into_owned();
    helper::run_query(&state.pool, move |conn| {
        diesel::update(resources_dsl::course_resources.find(resource_id))
            .set((
                resources_dsl::file_name.eq(file_name),
                resources_dsl::file_path.eq(new_path_str),
            ))
            .execute(conn)
    })
    .await?;

    Ok(ApiResponse::ok(true))
}

/// Deletes an uploaded resource: the file is removed first, the row second,
/// so a failed file removal leaves the row in place rather than orphaning
/// the file. A file that is already gone counts as removed.
///
/// Returns (wrapped in `ApiResponse`)
/// * `bool`: true indicating success (200 OK).
/// * `403 Forbidden`: If the caller is not a teacher.
/// * `404 Not Found`: If the resource does not exist.
#[instrument(skip(state, user))]
pub async fn delete_resource(
    State(state): State<AppState>,
    user: AuthUser,
    Path(resource_id): Path<i64>,
) -> Result<ApiResponse<bool>, AppError> {
    user.require_role(Role::Teacher)?;
    info!(
        "Teacher '{}' deleting resource {}",
        user.username, resource_id
    );

    let row = helper::run_query(&state.pool, move |conn| {
        resources_dsl::course_resources
            .find(resource_id)
            .select(resources_dsl::file_path)
            .first::<String>(conn)
            .optional()
    })
    .await?;

    let Some(file_path) = row else {
        return Err(AppError::NotFound(format!(
            "Resource with ID {resource_id} not found"
        )));
    };

    match tokio::fs::remove_file(&file_path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(
                "Resource file {} was already missing, removing the row anyway",
                file_path
            );
        }
        Err(e) => {
            error!("Failed to remove resource file {}: {}", file_path, e);
            return Err(AppError::InternalServerError(anyhow!(
                "Failed to remove resource file: {e}"
            )));
        }
    }

    helper::run_query(&state.pool, move |conn| {
        diesel::delete(resources_dsl::course_resources.find(resource_id)).execute(conn)
    })
    .await?;

    info!("Resource {} deleted", resource_id);
    Ok(ApiResponse::ok(true))
}

/// Looks a course up by id, mapping absence to 404.
async fn fetch_course_name(state: &AppState, course_id: i64) -> Result<String, AppError> {
    let name = helper::run_query(&state.pool, move |conn| {
        courses_dsl::courses
            .find(course_id)
            .select(courses_dsl::name)
            .first::<String>(conn)
            .optional()
    })
    .await?;

    name.ok_or_else(|| {
        error!("Course with ID {} not found.", course_id);
        AppError::NotFound(format!("Course with ID {course_id} not found"))
    })
}

/// Builds the on-disk path for a course resource, rejecting file names that
/// would escape the resource directory.
fn resource_path(
    state: &AppState,
    course_id: i64,
    file_name: &str,
) -> Result<PathBuf, AppError> {
    if file_name.is_empty()
        || file_name.contains('/')
        || file_name.contains('\\')
        || file_name.contains("..")
    {
        return Err(AppError::UnprocessableEntity(format!(
            "Invalid file name: '{file_name}'"
        )));
    }
    Ok(state
        .resource_dir
        .join(format!("course{course_id}_{file_name}")))
}
