use crate::schema::{attendance, course_resources, grades};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Attendance status values accepted on the wire and stored as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = attendance)]
pub struct NewAttendance {
    pub enrollment_id: i64,
    pub date: String,
    pub status: String,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = grades)]
pub struct NewGrade {
    pub enrollment_id: i64,
    pub category: String,
    pub grade_value: String,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = course_resources)]
pub struct NewCourseResource {
    pub course_id: i64,
    pub file_name: String,
    pub file_path: String,
}

/// One enrolled student on a course roster.
#[derive(Queryable, Deserialize, Serialize, Debug)]
pub struct RosterEntry {
    pub enrollment_id: i64,
    pub student_name: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct CourseAttendanceResponse {
    pub course_id: i64,
    pub course_name: String,
    pub roster: Vec<RosterEntry>,
}

#[derive(Queryable, Deserialize, Serialize, Debug)]
pub struct AttendanceRow {
    pub id: i64,
    pub student_name: String,
    pub course_name: String,
    pub date: String,
    pub status: String,
}

#[derive(Queryable, Deserialize, Serialize, Debug)]
pub struct GradeRow {
    pub enrollment_id: i64,
    pub student_name: String,
    pub category: String,
    pub grade_value: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct CourseGradesResponse {
    pub course_id: i64,
    pub roster: Vec<RosterEntry>,
    pub grades: Vec<GradeRow>,
}

/// Outcome of a grade batch: triples are independent, so a batch can
/// partially succeed.
#[derive(Deserialize, Serialize, Debug)]
pub struct SubmitGradesResponse {
    pub applied: usize,
    pub failed: usize,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct ProcessAttendanceResponse {
    pub recorded: usize,
}

#[derive(Queryable, Deserialize, Serialize, Debug)]
pub struct ResourceRow {
    pub id: i64,
    pub course_id: i64,
    pub file_name: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct TeacherDashboardResponse {
    pub assigned_course_ids: Vec<i64>,
    pub course_count: i64,
}
