use crate::schema::enrollments;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Insertable, Debug)]
#[diesel(table_name = enrollments)]
pub struct NewEnrollment {
    pub user_id: i64,
    pub course_id: i64,
}

#[derive(Queryable, Deserialize, Serialize, Debug)]
pub struct EnrollmentRow {
    pub enrollment_id: i64,
    pub course_name: String,
    pub semester: String,
}

#[derive(Queryable, Deserialize, Serialize, Debug)]
pub struct MyAttendanceRow {
    pub course_name: String,
    pub date: String,
    pub status: String,
}

#[derive(Queryable, Deserialize, Serialize, Debug)]
pub struct MyGradeRow {
    pub course_name: String,
    pub category: String,
    pub grade_value: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct StudentDashboardResponse {
    pub enrollment_count: i64,
}
