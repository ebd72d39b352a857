use academy_server::model::admin::{NewCourse, NewUser};
use academy_server::model::auth::NewSession;
use academy_server::model::student::NewEnrollment;
use academy_server::model::teacher::{NewAttendance, NewGrade};
use academy_server::{AppState, auth, db, init_pool, init_router, schema};
pub(crate) use axum_test::TestServer;
pub(crate) use deadpool_diesel::sqlite::Pool;
use diesel::dsl::count_star;
use diesel::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

// test infra setup

/// Spins up a fresh throwaway SQLite database and resource directory, runs
/// schema initialization (including the default admin seed) and wraps the
/// router in a TestServer.
pub async fn setup_test_environment() -> (TestServer, AppState) {
    let run_id = Uuid::new_v4();
    let db_path = std::env::temp_dir().join(format!("academy-test-{run_id}.db"));
    let resource_dir = std::env::temp_dir().join(format!("academy-test-res-{run_id}"));
    std::fs::create_dir_all(&resource_dir).expect("Failed to create test resource dir");

    let pool = init_pool(db_path.to_str().expect("temp path is not utf-8"), 5)
        .expect("Failed to create test database pool");
    db::init_schema(&pool)
        .await
        .expect("Failed to initialize test schema");

    let state = AppState {
        pool,
        resource_dir: Arc::new(resource_dir),
    };
    let server = init_router(state.clone());
    let server = TestServer::new(server).expect("Failed to create TestServer");
    (server, state)
}

pub fn test_resource_path(state: &AppState, course_id: i64, file_name: &str) -> PathBuf {
    state
        .resource_dir
        .join(format!("course{course_id}_{file_name}"))
}

// row factories

pub async fn create_test_user(pool: &Pool, username: &str, password: &str, role: &str) -> i64 {
    let new_user = NewUser {
        username: username.to_string(),
        password_hash: auth::hash_password(password).expect("Failed to hash test password"),
        role: role.to_string(),
        display_name: None,
    };
    let conn = pool.get().await.expect("Failed to get conn for user insert");
    conn.interact(move |conn| {
        diesel::insert_into(schema::users::table)
            .values(&new_user)
            .returning(schema::users::id)
            .get_result::<i64>(conn)
    })
    .await
    .expect("Interact failed")
    .expect("Failed to insert test user")
}

/// Opens a session for a user directly, bypassing the login endpoint.
pub async fn create_test_session(pool: &Pool, user_id: i64) -> String {
    let session = NewSession {
        token: Uuid::new_v4().to_string(),
        user_id,
    };
    let token = session.token.clone();
    let conn = pool
        .get()
        .await
        .expect("Failed to get conn for session insert");
    conn.interact(move |conn| {
        diesel::insert_into(schema::sessions::table)
            .values(&session)
            .execute(conn)
    })
    .await
    .expect("Interact failed")
    .expect("Failed to insert test session");
    token
}

pub async fn create_test_course(pool: &Pool, name: &str, semester: &str) -> i64 {
    let new_course = NewCourse {
        name: name.to_string(),
        semester: semester.to_string(),
    };
    let conn = pool
        .get()
        .await
        .expect("Failed to get conn for course insert");
    conn.interact(move |conn| {
        diesel::insert_into(schema::courses::table)
            .values(&new_course)
            .returning(schema::courses::id)
            .get_result::<i64>(conn)
    })
    .await
    .expect("Interact failed")
    .expect("Failed to insert test course")
}

pub async fn create_test_enrollment(pool: &Pool, user_id: i64, course_id: i64) -> i64 {
    let new_enrollment = NewEnrollment { user_id, course_id };
    let conn = pool
        .get()
        .await
        .expect("Failed to get conn for enrollment insert");
    conn.interact(move |conn| {
        diesel::insert_into(schema::enrollments::table)
            .values(&new_enrollment)
            .returning(schema::enrollments::id)
            .get_result::<i64>(conn)
    })
    .await
    .expect("Interact failed")
    .expect("Failed to insert test enrollment")
}

pub async fn create_test_attendance(
    pool: &Pool,
    enrollment_id: i64,
    date: &str,
    status: &str,
) -> i64 {
    let new_attendance = NewAttendance {
        enrollment_id,
        date: date.to_string(),
        status: status.to_string(),
    };
    let conn = pool
        .get()
        .await
        .expect("Failed to get conn for attendance insert");
    conn.interact(move |conn| {
        diesel::insert_into(schema::attendance::table)
            .values(&new_attendance)
            .returning(schema::attendance::id)
            .get_result::<i64>(conn)
    })
    .await
    .expect("Interact failed")
    .expect("Failed to insert test attendance")
}

pub async fn create_test_grade(
    pool: &Pool,
    enrollment_id: i64,
    category: &str,
    grade_value: &str,
) -> i64 {
    let new_grade = NewGrade {
        enrollment_id,
        category: category.to_string(),
        grade_value: grade_value.to_string(),
    };
    let conn = pool
        .get()
        .await
        .expect("Failed to get conn for grade insert");
    conn.interact(move |conn| {
        diesel::insert_into(schema::grades::table)
            .values(&new_grade)
            .returning(schema::grades::id)
            .get_result::<i64>(conn)
    })
    .await
    .expect("Interact failed")
    .expect("Failed to insert test grade")
}

// state probes

pub async fn count_courses(pool: &Pool) -> i64 {
    let conn = pool.get().await.expect("Failed to get conn for count");
    conn.interact(|conn| {
        schema::courses::table
            .select(count_star())
            .get_result::<i64>(conn)
    })
    .await
    .expect("Interact failed")
    .expect("Failed to count courses")
}

pub async fn count_users(pool: &Pool) -> i64 {
    let conn = pool.get().await.expect("Failed to get conn for count");
    conn.interact(|conn| {
        schema::users::table
            .select(count_star())
            .get_result::<i64>(conn)
    })
    .await
    .expect("Interact failed")
    .expect("Failed to count users")
}

pub async fn count_enrollments(pool: &Pool) -> i64 {
    let conn = pool.get().await.expect("Failed to get conn for count");
    conn.interact(|conn| {
        schema::enrollments::table
            .select(count_star())
            .get_result::<i64>(conn)
    })
    .await
    .expect("Interact failed")
    .expect("Failed to count enrollments")
}

pub async fn count_attendance(pool: &Pool) -> i64 {
    let conn = pool.get().await.expect("Failed to get conn for count");
    conn.interact(|conn| {
        schema::attendance::table
            .select(count_star())
            .get_result::<i64>(conn)
    })
    .await
    .expect("Interact failed")
    .expect("Failed to count attendance")
}

/// Grade values for one (enrollment, category) pair; the unique constraint
/// should keep this at one element or fewer.
pub async fn grade_values_for(pool: &Pool, enrollment_id: i64, category: &str) -> Vec<String> {
    let category = category.to_string();
    let conn = pool
        .get()
        .await
        .expect("Failed to get conn for grade lookup");
    conn.interact(move |conn| {
        schema::grades::table
            .filter(schema::grades::enrollment_id.eq(enrollment_id))
            .filter(schema::grades::category.eq(category))
            .select(schema::grades::grade_value)
            .load::<String>(conn)
    })
    .await
    .expect("Interact failed")
    .expect("Failed to load grades")
}

pub async fn get_course(pool: &Pool, course_id: i64) -> Option<(String, String, Option<i64>)> {
    let conn = pool
        .get()
        .await
        .expect("Failed to get conn for course lookup");
    conn.interact(move |conn| {
        schema::courses::table
            .find(course_id)
            .select((
                schema::courses::name,
                schema::courses::semester,
                schema::courses::teacher_id,
            ))
            .first::<(String, String, Option<i64>)>(conn)
            .optional()
    })
    .await
    .expect("Interact failed")
    .expect("Failed to load course")
}

pub async fn get_attendance_status(pool: &Pool, attendance_id: i64) -> Option<String> {
    let conn = pool
        .get()
        .await
        .expect("Failed to get conn for attendance lookup");
    conn.interact(move |conn| {
        schema::attendance::table
            .find(attendance_id)
            .select(schema::attendance::status)
            .first::<String>(conn)
            .optional()
    })
    .await
    .expect("Interact failed")
    .expect("Failed to load attendance status")
}
