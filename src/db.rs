use crate::auth;
use crate::schema::users::dsl as users_dsl;
use anyhow::{Context, anyhow};
use deadpool_diesel::sqlite::Pool;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use tracing::info;

/// Default administrator account seeded on first initialization.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin";

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL,
    display_name TEXT
);

CREATE TABLE IF NOT EXISTS courses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    semester TEXT NOT NULL,
    teacher_id INTEGER REFERENCES users(id)
);

CREATE TABLE IF NOT EXISTS enrollments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id),
    course_id INTEGER NOT NULL REFERENCES courses(id)
);

CREATE TABLE IF NOT EXISTS attendance (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    enrollment_id INTEGER NOT NULL REFERENCES enrollments(id),
    date TEXT NOT NULL,
    status TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS grades (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    enrollment_id INTEGER NOT NULL REFERENCES enrollments(id),
    category TEXT NOT NULL,
    grade_value TEXT NOT NULL,
    UNIQUE (enrollment_id, category)
);

CREATE TABLE IF NOT EXISTS course_resources (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    course_id INTEGER NOT NULL REFERENCES courses(id),
    file_name TEXT NOT NULL,
    file_path TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    token TEXT NOT NULL UNIQUE,
    user_id INTEGER NOT NULL REFERENCES users(id),
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);
";

#[derive(Insertable)]
#[diesel(table_name = crate::schema::users)]
struct SeedAdmin {
    username: String,
    password_hash: String,
    role: String,
}

/// Creates all tables if they don't exist and guarantees a default admin
/// account is present afterwards.
pub async fn init_schema(pool: &Pool) -> anyhow::Result<()> {
    let admin_hash = auth::hash_password(DEFAULT_ADMIN_PASSWORD)
        .map_err(|e| anyhow!("Failed to hash default admin password: {e}"))?;

    let conn = pool
        .get()
        .await
        .context("Failed to get a connection for schema initialization")?;

    let seeded = conn
        .interact(move |conn| -> QueryResult<bool> {
            conn.batch_execute(SCHEMA_SQL)?;

            let admin_count: i64 = users_dsl::users
                .filter(users_dsl::role.eq("admin"))
                .count()
                .get_result(conn)?;
            if admin_count > 0 {
                return Ok(false);
            }

            diesel::insert_into(users_dsl::users)
                .values(&SeedAdmin {
                    username: DEFAULT_ADMIN_USERNAME.to_string(),
                    password_hash: admin_hash,
                    role: "admin".to_string(),
                })
                .execute(conn)?;
            Ok(true)
        })
        .await
        .map_err(|e| anyhow!("Schema initialization interaction failed: {e}"))?
        .context("Schema initialization failed")?;

    if seeded {
        info!(
            "Seeded default administrator account '{}'",
            DEFAULT_ADMIN_USERNAME
        );
    }
    Ok(())
}
