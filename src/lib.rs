use crate::cli::Args;
use anyhow::Context;
use axum::Router;
use axum::extract::FromRef;
use axum::routing::{get, post};
use deadpool_diesel::Runtime;
use deadpool_diesel::sqlite::{Manager, Pool};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::log::info;

pub mod auth;
pub mod cli;
pub mod db;
pub mod errors;
pub mod model;
pub mod payloads;
pub mod response;
pub mod schema;

mod api;

/// Shared application state: the connection pool plus the directory course
/// resources are written to.
#[derive(Clone)]
pub struct AppState {
    pub pool: Pool,
    pub resource_dir: Arc<PathBuf>,
}

impl FromRef<AppState> for Pool {
    fn from_ref(state: &AppState) -> Pool {
        state.pool.clone()
    }
}

pub async fn init_state(args: &Args) -> anyhow::Result<AppState> {
    info!("Initializing database pool...");
    let pool = init_pool(&args.database_path, args.db_pool_max_size)
        .context("Failed to initialize database pool")?;

    info!("Initializing database schema...");
    db::init_schema(&pool)
        .await
        .context("Failed to initialize database schema")?;

    std::fs::create_dir_all(&args.resource_dir).with_context(|| {
        format!(
            "Failed to create resource directory {}",
            args.resource_dir.display()
        )
    })?;

    Ok(AppState {
        pool,
        resource_dir: Arc::new(args.resource_dir.clone()),
    })
}

pub fn init_router(state: AppState) -> Router {
    info!("Initializing router...");
    Router::new()
        .merge(auth_routes())
        .merge(student_routes())
        .nest("/admin", admin_routes())
        .nest("/teacher", teacher_routes())
        .with_state(state)
}

pub fn init_pool(database_path: &str, max_size: u32) -> anyhow::Result<Pool> {
    let manager = Manager::new(database_path, Runtime::Tokio1);
    let pool = Pool::builder(manager).max_size(max_size as usize).build()?;
    Ok(pool)
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        // public routes go here
        .route("/register", post(api::auth::register))
        .route("/login/admin", post(api::auth::admin_login))
        .route("/login/teacher", post(api::auth::teacher_login))
        .route("/login/student", post(api::auth::student_login))
        // protected routes go here
        .route("/logout", post(api::auth::logout))
        .route("/update_profile", post(api::auth::update_profile))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(api::admin::dashboard))
        .route("/manage_courses", get(api::admin::list_courses))
        .route("/manage_courses", post(api::admin::create_course))
        .route("/edit_course/{course_id}", post(api::admin::edit_course))
        .route(
            "/delete_course/{course_id}",
            post(api::admin::delete_course),
        )
        .route("/create_user", post(api::admin::create_user))
        .route("/assign_course", post(api::admin::assign_course))
}

fn teacher_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(api::teacher::dashboard))
        .route("/courses", get(api::teacher::list_courses))
        .route(
            "/course_attendance/{course_id}",
            get(api::teacher::course_attendance),
        )
        .route(
            "/process_attendance/{course_id}",
            post(api::teacher::process_attendance),
        )
        .route("/all_attendance", get(api::teacher::all_attendance))
        .route(
            "/update_attendance/{attendance_id}",
            post(api::teacher::update_attendance),
        )
        .route(
            "/course_grades/{course_id}",
            get(api::teacher::course_grades),
        )
        .route(
            "/submit_grades/{course_id}",
            post(api::teacher::submit_grades),
        )
        .route(
            "/course_resources/{course_id}",
            get(api::teacher::course_resources),
        )
        .route(
            "/upload_resource/{course_id}",
            post(api::teacher::upload_resource),
        )
        .route(
            "/update_resource/{resource_id}",
            post(api::teacher::update_resource),
        )
        .route(
            "/delete_resource/{resource_id}",
            post(api::teacher::delete_resource),
        )
}

fn student_routes() -> Router<AppState> {
    Router::new()
        // any authenticated role may list courses
        .route("/courses", get(api::student::list_courses))
        .route("/enroll/{course_id}", post(api::student::enroll))
        .route("/my_enrollments", get(api::student::my_enrollments))
        .route("/student/dashboard", get(api::student::dashboard))
        .route("/student/my_attendance", get(api::student::my_attendance))
        .route("/student/my_grades", get(api::student::my_grades))
        .route(
            "/student/resources/{course_id}",
            get(api::student::course_resources),
        )
        .route(
            "/student/download/{resource_id}",
            get(api::student::download_resource),
        )
}
