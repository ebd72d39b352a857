use crate::auth::Role;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct CreateCoursePayload {
    pub course_name: String,
    pub semester: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct EditCoursePayload {
    pub course_name: String,
    pub semester: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CreateUserPayload {
    pub username: String,
    pub password: String,
    pub role: Role,
    pub display_name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AssignCoursePayload {
    pub course_id: i64,
    pub teacher_id: i64,
}
