use crate::model::teacher::AttendanceStatus;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct AttendanceEntry {
    pub enrollment_id: i64,
    pub status: AttendanceStatus,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ProcessAttendancePayload {
    /// Free-text date label, recorded as submitted.
    pub date: String,
    pub entries: Vec<AttendanceEntry>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UpdateAttendancePayload {
    pub status: AttendanceStatus,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct GradeEntry {
    pub enrollment_id: i64,
    pub category: String,
    pub grade_value: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SubmitGradesPayload {
    pub grades: Vec<GradeEntry>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UploadResourcePayload {
    pub file_name: String,
    pub content: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UpdateResourcePayload {
    pub file_name: String,
}
