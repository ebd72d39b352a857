use crate::schema::sessions;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Insertable, Debug)]
#[diesel(table_name = sessions)]
pub struct NewSession {
    pub token: String,
    pub user_id: i64,
    // created_at has a DB default (datetime('now'))
}

#[derive(Deserialize, Serialize, Debug)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: i64,
    pub role: String,
    pub display_name: Option<String>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct RegisterResponse {
    pub user_id: i64,
    pub role: String,
}
