mod common;

use axum::http::StatusCode;
use review_backend::db::CommentExt;
use review_backend::models::UserRole;
use serde_json::json;

#[tokio::test]
async fn list_under_unknown_title_is_not_found() {
    let app = common::spawn_app().await;

    app.server
        .get("/api/v1/titles/999/reviews")
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn anonymous_list_is_public_and_newest_first() {
    let app = common::spawn_app().await;
    let title_id = common::create_title(&app.db, "Dune", 1965, None, &[]).await;
    let alice = common::create_user(&app.db, "alice", UserRole::User).await;
    let bob = common::create_user(&app.db, "bob", UserRole::User).await;
    common::create_review(&app.db, title_id, alice.id, 7).await;
    common::create_review(&app.db, title_id, bob.id, 9).await;

    let response = app
        .server
        .get(&format!("/api/v1/titles/{}/reviews", title_id))
        .await;

    response.assert_status_ok();
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    // pub_date descending: bob's review was inserted last.
    assert_eq!(body["data"][0]["author"], "bob");
}

#[tokio::test]
async fn anonymous_create_is_unauthorized() {
    let app = common::spawn_app().await;
    let title_id = common::create_title(&app.db, "Dune", 1965, None, &[]).await;

    app.server
        .post(&format!("/api/v1/titles/{}/reviews", title_id))
        .json(&json!({ "text": "great", "score": 8 }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_sets_author_from_caller() {
    let app = common::spawn_app().await;
    let title_id = common::create_title(&app.db, "Dune", 1965, None, &[]).await;
    let alice = common::create_user(&app.db, "alice", UserRole::User).await;

    let response = app
        .server
        .post(&format!("/api/v1/titles/{}/reviews", title_id))
        .add_header("Authorization", format!("Bearer {}", common::token_for(&alice)))
        .json(&json!({ "text": "great", "score": 8 }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["author"], "alice");
    assert_eq!(body["score"], 8);
}

#[tokio::test]
async fn second_review_by_same_author_is_a_conflict() {
    let app = common::spawn_app().await;
    let title_id = common::create_title(&app.db, "Dune", 1965, None, &[]).await;
    let alice = common::create_user(&app.db, "alice", UserRole::User).await;

    app.server
        .post(&format!("/api/v1/titles/{}/reviews", title_id))
        .add_header("Authorization", format!("Bearer {}", common::token_for(&alice)))
        .json(&json!({ "text": "great", "score": 7 }))
        .await
        .assert_status(StatusCode::CREATED);

    app.server
        .post(&format!("/api/v1/titles/{}/reviews", title_id))
        .add_header("Authorization", format!("Bearer {}", common::token_for(&alice)))
        .json(&json!({ "text": "changed my mind", "score": 3 }))
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn same_author_may_review_different_titles() {
    let app = common::spawn_app().await;
    let first = common::create_title(&app.db, "Dune", 1965, None, &[]).await;
    let second = common::create_title(&app.db, "Emma", 1815, None, &[]).await;
    let alice = common::create_user(&app.db, "alice", UserRole::User).await;

    for title_id in [first, second] {
        app.server
            .post(&format!("/api/v1/titles/{}/reviews", title_id))
            .add_header("Authorization", format!("Bearer {}", common::token_for(&alice)))
            .json(&json!({ "text": "fine", "score": 6 }))
            .await
            .assert_status(StatusCode::CREATED);
    }
}

#[tokio::test]
async fn score_out_of_range_is_rejected() {
    let app = common::spawn_app().await;
    let title_id = common::create_title(&app.db, "Dune", 1965, None, &[]).await;
    let alice = common::create_user(&app.db, "alice", UserRole::User).await;

    for score in [0, 11] {
        let response = app
            .server
            .post(&format!("/api/v1/titles/{}/reviews", title_id))
            .add_header("Authorization", format!("Bearer {}", common::token_for(&alice)))
            .json(&json!({ "text": "broken", "score": score }))
            .await;

        response.assert_status_bad_request();
        let body = response.json::<serde_json::Value>();
        assert!(body["errors"].get("score").is_some());
    }
}

#[tokio::test]
async fn author_updates_own_review() {
    let app = common::spawn_app().await;
    let title_id = common::create_title(&app.db, "Dune", 1965, None, &[]).await;
    let alice = common::create_user(&app.db, "alice", UserRole::User).await;
    let review_id = common::create_review(&app.db, title_id, alice.id, 5).await;

    let response = app
        .server
        .patch(&format!("/api/v1/titles/{}/reviews/{}", title_id, review_id))
        .add_header("Authorization", format!("Bearer {}", common::token_for(&alice)))
        .json(&json!({ "score": 9 }))
        .await;

    response.assert_status_ok();
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["score"], 9);
    assert_eq!(body["text"], "a review");
}

#[tokio::test]
async fn other_user_cannot_update_review() {
    let app = common::spawn_app().await;
    let title_id = common::create_title(&app.db, "Dune", 1965, None, &[]).await;
    let alice = common::create_user(&app.db, "alice", UserRole::User).await;
    let mallory = common::create_user(&app.db, "mallory", UserRole::User).await;
    let review_id = common::create_review(&app.db, title_id, alice.id, 5).await;

    app.server
        .patch(&format!("/api/v1/titles/{}/reviews/{}", title_id, review_id))
        .add_header("Authorization", format!("Bearer {}", common::token_for(&mallory)))
        .json(&json!({ "score": 1 }))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn moderator_manages_any_review() {
    let app = common::spawn_app().await;
    let title_id = common::create_title(&app.db, "Dune", 1965, None, &[]).await;
    let alice = common::create_user(&app.db, "alice", UserRole::User).await;
    let moderator = common::create_user(&app.db, "mod", UserRole::Moderator).await;
    let review_id = common::create_review(&app.db, title_id, alice.id, 5).await;

    app.server
        .patch(&format!("/api/v1/titles/{}/reviews/{}", title_id, review_id))
        .add_header("Authorization", format!("Bearer {}", common::token_for(&moderator)))
        .json(&json!({ "text": "cleaned up" }))
        .await
        .assert_status_ok();

    app.server
        .delete(&format!("/api/v1/titles/{}/reviews/{}", title_id, review_id))
        .add_header("Authorization", format!("Bearer {}", common::token_for(&moderator)))
        .await
        .assert_status(StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn deleting_review_cascades_comments() {
    let app = common::spawn_app().await;
    let title_id = common::create_title(&app.db, "Dune", 1965, None, &[]).await;
    let alice = common::create_user(&app.db, "alice", UserRole::User).await;
    let bob = common::create_user(&app.db, "bob", UserRole::User).await;
    let review_id = common::create_review(&app.db, title_id, alice.id, 5).await;
    common::create_comment(&app.db, review_id, bob.id).await;
    common::create_comment(&app.db, review_id, alice.id).await;

    app.server
        .delete(&format!("/api/v1/titles/{}/reviews/{}", title_id, review_id))
        .add_header("Authorization", format!("Bearer {}", common::token_for(&alice)))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    assert_eq!(app.db.get_comment_count(review_id).await.unwrap(), 0);
}

#[tokio::test]
async fn review_id_is_scoped_to_its_title() {
    let app = common::spawn_app().await;
    let dune = common::create_title(&app.db, "Dune", 1965, None, &[]).await;
    let emma = common::create_title(&app.db, "Emma", 1815, None, &[]).await;
    let alice = common::create_user(&app.db, "alice", UserRole::User).await;
    let review_id = common::create_review(&app.db, dune, alice.id, 5).await;

    // The review exists, but not under this title.
    app.server
        .get(&format!("/api/v1/titles/{}/reviews/{}", emma, review_id))
        .await
        .assert_status_not_found();
}
