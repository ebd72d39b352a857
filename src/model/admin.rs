use crate::schema::{courses, users};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Insertable, Debug)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub display_name: Option<String>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = courses)]
pub struct NewCourse {
    pub name: String,
    pub semester: String,
    // teacher_id stays NULL until an admin assigns one
}

#[derive(Queryable, Deserialize, Serialize, Debug)]
pub struct CourseRow {
    pub id: i64,
    pub name: String,
    pub semester: String,
    pub teacher_id: Option<i64>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct AdminDashboardResponse {
    pub user_count: i64,
    pub course_count: i64,
    pub enrollment_count: i64,
}
