use academy_server::auth::Role;
use academy_server::db::{DEFAULT_ADMIN_PASSWORD, DEFAULT_ADMIN_USERNAME};
use academy_server::model::auth::{LoginResponse, RegisterResponse};
use academy_server::payloads::auth::{LoginPayload, RegisterPayload, UpdateProfilePayload};
use academy_server::response::ApiResponse;
use axum::http::StatusCode;
use serde_json::Value;

mod helpers;
use helpers::{count_users, create_test_user, setup_test_environment};

// register

#[tokio::test]
async fn test_register_success() {
    let (server, state) = setup_test_environment().await;

    let payload = RegisterPayload {
        username: "s1".to_string(),
        password: "pw1".to_string(),
        role: Role::Student,
    };
    let response = server.post("/register").json(&payload).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: ApiResponse<RegisterResponse> = response.json();
    assert_eq!(body.status_code, 200);
    let data = body.data.unwrap();
    assert!(data.user_id > 0);
    assert_eq!(data.role, "student");

    // default admin + the new account
    assert_eq!(count_users(&state.pool).await, 2);
}

#[tokio::test]
async fn test_register_duplicate_username_conflict() {
    let (server, state) = setup_test_environment().await;
    create_test_user(&state.pool, "taken", "pw1", "student").await;
    let users_before = count_users(&state.pool).await;

    let payload = RegisterPayload {
        username: "taken".to_string(),
        password: "pw2".to_string(),
        role: Role::Teacher,
    };
    let response = server.post("/register").json(&payload).await;

    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    let body: ApiResponse<Value> = response.json();
    assert_eq!(body.status_code, 409);
    assert!(body.status_message.contains("already taken"));
    assert_eq!(count_users(&state.pool).await, users_before);
}

// login

#[tokio::test]
async fn test_login_success_per_role() {
    let (server, state) = setup_test_environment().await;
    create_test_user(&state.pool, "t1", "pw1", "teacher").await;
    create_test_user(&state.pool, "s1", "pw2", "student").await;

    for (path, username, password, role) in [
        ("/login/admin", DEFAULT_ADMIN_USERNAME, DEFAULT_ADMIN_PASSWORD, "admin"),
        ("/login/teacher", "t1", "pw1", "teacher"),
        ("/login/student", "s1", "pw2", "student"),
    ] {
        let payload = LoginPayload {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response = server.post(path).json(&payload).await;

        assert_eq!(response.status_code(), StatusCode::OK, "login via {path}");
        let body: ApiResponse<LoginResponse> = response.json();
        let data = body.data.unwrap();
        assert_eq!(data.role, role);
        assert!(!data.token.is_empty());
    }
}

#[tokio::test]
async fn test_login_wrong_password_unauthorized() {
    let (server, state) = setup_test_environment().await;
    create_test_user(&state.pool, "t1", "pw1", "teacher").await;

    let payload = LoginPayload {
        username: "t1".to_string(),
        password: "wrong".to_string(),
    };
    let response = server.post("/login/teacher").json(&payload).await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: ApiResponse<Value> = response.json();
    assert_eq!(body.status_message, "Invalid Teacher Credentials!");
}

#[tokio::test]
async fn test_login_role_mismatch_looks_like_bad_credentials() {
    let (server, state) = setup_test_environment().await;
    create_test_user(&state.pool, "s1", "pw1", "student").await;

    // correct password, wrong login route for the role
    let payload = LoginPayload {
        username: "s1".to_string(),
        password: "pw1".to_string(),
    };
    let response = server.post("/login/admin").json(&payload).await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: ApiResponse<Value> = response.json();
    assert_eq!(body.status_message, "Invalid Admin Credentials!");
}

// logout

#[tokio::test]
async fn test_logout_invalidates_session() {
    let (server, _state) = setup_test_environment().await;

    let payload = LoginPayload {
        username: DEFAULT_ADMIN_USERNAME.to_string(),
        password: DEFAULT_ADMIN_PASSWORD.to_string(),
    };
    let response = server.post("/login/admin").json(&payload).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let token = response
        .json::<ApiResponse<LoginResponse>>()
        .data
        .unwrap()
        .token;

    let response = server
        .get("/admin/dashboard")
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = server.post("/logout").authorization_bearer(&token).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = server
        .get("/admin/dashboard")
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_without_token_unauthorized() {
    let (server, _state) = setup_test_environment().await;

    let response = server.get("/courses").await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: ApiResponse<Value> = response.json();
    assert_eq!(body.status_code, 401);
}

// update_profile

#[tokio::test]
async fn test_update_profile_changes_password() {
    let (server, state) = setup_test_environment().await;
    create_test_user(&state.pool, "s1", "old-pw", "student").await;

    let login = LoginPayload {
        username: "s1".to_string(),
        password: "old-pw".to_string(),
    };
    let token = server
        .post("/login/student")
        .json(&login)
        .await
        .json::<ApiResponse<LoginResponse>>()
        .data
        .unwrap()
        .token;

    let payload = UpdateProfilePayload {
        current_password: "old-pw".to_string(),
        new_password: Some("new-pw".to_string()),
        display_name: Some("Student One".to_string()),
    };
    let response = server
        .post("/update_profile")
        .authorization_bearer(&token)
        .json(&payload)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    // old password no longer works, new one does
    let response = server.post("/login/student").json(&login).await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let relogin = LoginPayload {
        username: "s1".to_string(),
        password: "new-pw".to_string(),
    };
    let response = server.post("/login/student").json(&relogin).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: ApiResponse<LoginResponse> = response.json();
    assert_eq!(
        body.data.unwrap().display_name,
        Some("Student One".to_string())
    );
}

#[tokio::test]
async fn test_update_profile_wrong_current_password() {
    let (server, state) = setup_test_environment().await;
    create_test_user(&state.pool, "s1", "pw1", "student").await;

    let login = LoginPayload {
        username: "s1".to_string(),
        password: "pw1".to_string(),
    };
    let token = server
        .post("/login/student")
        .json(&login)
        .await
        .json::<ApiResponse<LoginResponse>>()
        .data
        .unwrap()
        .token;

    let payload = UpdateProfilePayload {
        current_password: "wrong".to_string(),
        new_password: Some("new-pw".to_string()),
        display_name: None,
    };
    let response = server
        .post("/update_profile")
        .authorization_bearer(&token)
        .json(&payload)
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    // password unchanged
    let response = server.post("/login/student").json(&login).await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_update_profile_nothing_to_change() {
    let (server, state) = setup_test_environment().await;
    let user_id = create_test_user(&state.pool, "s1", "pw1", "student").await;
    let token = helpers::create_test_session(&state.pool, user_id).await;

    let payload = UpdateProfilePayload {
        current_password: "pw1".to_string(),
        new_password: None,
        display_name: None,
    };
    let response = server
        .post("/update_profile")
        .authorization_bearer(&token)
        .json(&payload)
        .await;

    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
}
