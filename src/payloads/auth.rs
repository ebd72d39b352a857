use crate::auth::Role;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct RegisterPayload {
    pub username: String,
    pub password: String,
    pub role: Role,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LoginPayload {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UpdateProfilePayload {
    /// The caller must re-submit their current password before any change
    /// is accepted.
    pub current_password: String,
    pub new_password: Option<String>,
    pub display_name: Option<String>,
}
