mod common;

use axum::http::StatusCode;
use review_backend::db::UserExt;
use review_backend::utils::confirmation;
use serde_json::json;

#[tokio::test]
async fn signup_echoes_identity_fields() {
    let app = common::spawn_app().await;

    let response = app
        .server
        .post("/api/v1/auth/signup")
        .json(&json!({ "username": "reader", "email": "reader@example.com" }))
        .await;

    response.assert_status_ok();
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["username"], "reader");
    assert_eq!(body["email"], "reader@example.com");
}

#[tokio::test]
async fn signup_is_idempotent_for_the_same_pair() {
    let app = common::spawn_app().await;
    let payload = json!({ "username": "reader", "email": "reader@example.com" });

    app.server
        .post("/api/v1/auth/signup")
        .json(&payload)
        .await
        .assert_status_ok();

    // Same (username, email) pair again: success, code re-issued, no
    // duplicate row.
    app.server
        .post("/api/v1/auth/signup")
        .json(&payload)
        .await
        .assert_status_ok();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn signup_rejects_username_taken_under_other_email() {
    let app = common::spawn_app().await;

    app.server
        .post("/api/v1/auth/signup")
        .json(&json!({ "username": "reader", "email": "reader@example.com" }))
        .await
        .assert_status_ok();

    app.server
        .post("/api/v1/auth/signup")
        .json(&json!({ "username": "reader", "email": "other@example.com" }))
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn signup_rejects_email_taken_under_other_username() {
    let app = common::spawn_app().await;

    app.server
        .post("/api/v1/auth/signup")
        .json(&json!({ "username": "reader", "email": "reader@example.com" }))
        .await
        .assert_status_ok();

    app.server
        .post("/api/v1/auth/signup")
        .json(&json!({ "username": "other", "email": "reader@example.com" }))
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn signup_rejects_reserved_and_malformed_usernames() {
    let app = common::spawn_app().await;

    app.server
        .post("/api/v1/auth/signup")
        .json(&json!({ "username": "me", "email": "me@example.com" }))
        .await
        .assert_status_bad_request();

    app.server
        .post("/api/v1/auth/signup")
        .json(&json!({ "username": "bad name!", "email": "bad@example.com" }))
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn signup_rejects_invalid_email() {
    let app = common::spawn_app().await;

    let response = app
        .server
        .post("/api/v1/auth/signup")
        .json(&json!({ "username": "reader", "email": "not-an-email" }))
        .await;

    response.assert_status_bad_request();
    let body = response.json::<serde_json::Value>();
    assert!(body["errors"].get("email").is_some());
}

#[tokio::test]
async fn token_for_unknown_username_is_not_found() {
    let app = common::spawn_app().await;

    app.server
        .post("/api/v1/auth/token")
        .json(&json!({ "username": "ghost", "confirmation_code": "deadbeef" }))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn token_with_wrong_code_is_rejected() {
    let app = common::spawn_app().await;

    app.server
        .post("/api/v1/auth/signup")
        .json(&json!({ "username": "reader", "email": "reader@example.com" }))
        .await
        .assert_status_ok();

    app.server
        .post("/api/v1/auth/token")
        .json(&json!({ "username": "reader", "confirmation_code": "deadbeef" }))
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn signup_then_token_then_me_flow() {
    let app = common::spawn_app().await;

    app.server
        .post("/api/v1/auth/signup")
        .json(&json!({ "username": "reader", "email": "reader@example.com" }))
        .await
        .assert_status_ok();

    // The code is derived from user state, so the test can derive it too.
    let user = app
        .db
        .get_user(None, Some("reader"), None)
        .await
        .unwrap()
        .unwrap();
    let code = confirmation::make_code(&user, common::TEST_SECRET.as_bytes());

    let response = app
        .server
        .post("/api/v1/auth/token")
        .json(&json!({ "username": "reader", "confirmation_code": code }))
        .await;
    response.assert_status_ok();

    let access = response.json::<serde_json::Value>()["access"]
        .as_str()
        .unwrap()
        .to_string();

    let me = app
        .server
        .get("/api/v1/users/me")
        .add_header("Authorization", format!("Bearer {}", access))
        .await;
    me.assert_status_ok();
    assert_eq!(me.json::<serde_json::Value>()["data"]["username"], "reader");
}

#[tokio::test]
async fn user_state_change_invalidates_confirmation_code() {
    let app = common::spawn_app().await;

    app.server
        .post("/api/v1/auth/signup")
        .json(&json!({ "username": "reader", "email": "reader@example.com" }))
        .await
        .assert_status_ok();

    let user = app
        .db
        .get_user(None, Some("reader"), None)
        .await
        .unwrap()
        .unwrap();
    let code = confirmation::make_code(&user, common::TEST_SECRET.as_bytes());

    // Any change to the user row invalidates codes issued before it.
    app.db
        .update_user(
            user.id,
            None,
            Some("moved@example.com"),
            None,
            None,
            None,
            None,
        )
        .await
        .unwrap();

    app.server
        .post("/api/v1/auth/token")
        .json(&json!({ "username": "reader", "confirmation_code": code }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}
