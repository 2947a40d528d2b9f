mod common;

use axum::http::StatusCode;
use review_backend::models::UserRole;
use serde_json::json;

#[tokio::test]
async fn anonymous_list_is_public() {
    let app = common::spawn_app().await;
    common::create_title(&app.db, "Dune", 1965, None, &[]).await;

    let response = app.server.get("/api/v1/titles").await;

    response.assert_status_ok();
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["pagination"]["total"], 1);
}

#[tokio::test]
async fn anonymous_create_is_unauthorized() {
    let app = common::spawn_app().await;

    app.server
        .post("/api/v1/titles")
        .json(&json!({ "name": "Dune", "year": 1965 }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn moderator_create_is_forbidden() {
    let app = common::spawn_app().await;
    let moderator = common::create_user(&app.db, "mod", UserRole::Moderator).await;

    app.server
        .post("/api/v1/titles")
        .add_header("Authorization", format!("Bearer {}", common::token_for(&moderator)))
        .json(&json!({ "name": "Dune", "year": 1965 }))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_creates_title_with_associations() {
    let app = common::spawn_app().await;
    let admin = common::create_user(&app.db, "boss", UserRole::Admin).await;
    common::create_category(&app.db, "Books", "books").await;
    common::create_genre(&app.db, "Science Fiction", "sci-fi").await;
    common::create_genre(&app.db, "Adventure", "adventure").await;

    let response = app
        .server
        .post("/api/v1/titles")
        .add_header("Authorization", format!("Bearer {}", common::token_for(&admin)))
        .json(&json!({
            "name": "Dune",
            "year": 1965,
            "description": "Spice and sand",
            "category": "books",
            "genre": ["sci-fi", "adventure"]
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["name"], "Dune");
    assert_eq!(body["category"]["slug"], "books");
    assert_eq!(body["genre"].as_array().unwrap().len(), 2);
    assert!(body["rating"].is_null());
}

#[tokio::test]
async fn future_year_is_rejected() {
    let app = common::spawn_app().await;
    let admin = common::create_user(&app.db, "boss", UserRole::Admin).await;

    let response = app
        .server
        .post("/api/v1/titles")
        .add_header("Authorization", format!("Bearer {}", common::token_for(&admin)))
        .json(&json!({ "name": "X", "year": 3000 }))
        .await;

    response.assert_status_bad_request();
    let body = response.json::<serde_json::Value>();
    assert!(body["errors"].get("year").is_some());
}

#[tokio::test]
async fn unknown_category_slug_is_rejected() {
    let app = common::spawn_app().await;
    let admin = common::create_user(&app.db, "boss", UserRole::Admin).await;

    app.server
        .post("/api/v1/titles")
        .add_header("Authorization", format!("Bearer {}", common::token_for(&admin)))
        .json(&json!({ "name": "Dune", "year": 1965, "category": "ghost" }))
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn rating_is_the_mean_of_review_scores() {
    let app = common::spawn_app().await;
    let title_id = common::create_title(&app.db, "Dune", 1965, None, &[]).await;
    let alice = common::create_user(&app.db, "alice", UserRole::User).await;
    let bob = common::create_user(&app.db, "bob", UserRole::User).await;

    common::create_review(&app.db, title_id, alice.id, 7).await;
    common::create_review(&app.db, title_id, bob.id, 9).await;

    let response = app
        .server
        .get(&format!("/api/v1/titles/{}", title_id))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<serde_json::Value>()["rating"], json!(8.0));
}

#[tokio::test]
async fn rating_tracks_review_deletion() {
    let app = common::spawn_app().await;
    let title_id = common::create_title(&app.db, "Dune", 1965, None, &[]).await;
    let alice = common::create_user(&app.db, "alice", UserRole::User).await;
    let bob = common::create_user(&app.db, "bob", UserRole::User).await;
    common::create_review(&app.db, title_id, alice.id, 4).await;
    let bob_review = common::create_review(&app.db, title_id, bob.id, 10).await;

    // Recomputed on every read, so a deletion shows up immediately.
    app.server
        .delete(&format!("/api/v1/titles/{}/reviews/{}", title_id, bob_review))
        .add_header("Authorization", format!("Bearer {}", common::token_for(&bob)))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let body = app
        .server
        .get(&format!("/api/v1/titles/{}", title_id))
        .await
        .json::<serde_json::Value>();
    assert_eq!(body["rating"], json!(4.0));
}

#[tokio::test]
async fn list_filters_combine() {
    let app = common::spawn_app().await;
    let books = common::create_category(&app.db, "Books", "books").await;
    let movies = common::create_category(&app.db, "Movies", "movies").await;
    let scifi = common::create_genre(&app.db, "Science Fiction", "sci-fi").await;

    common::create_title(&app.db, "Dune", 1965, Some(books.id), &[scifi.id]).await;
    common::create_title(&app.db, "Dune", 2021, Some(movies.id), &[scifi.id]).await;
    common::create_title(&app.db, "Emma", 1815, Some(books.id), &[]).await;

    let by_category = app
        .server
        .get("/api/v1/titles?category=books")
        .await
        .json::<serde_json::Value>();
    assert_eq!(by_category["data"].as_array().unwrap().len(), 2);

    let by_genre = app
        .server
        .get("/api/v1/titles?genre=sci-fi")
        .await
        .json::<serde_json::Value>();
    assert_eq!(by_genre["data"].as_array().unwrap().len(), 2);

    let by_name = app
        .server
        .get("/api/v1/titles?name=mm")
        .await
        .json::<serde_json::Value>();
    assert_eq!(by_name["data"].as_array().unwrap().len(), 1);
    assert_eq!(by_name["data"][0]["name"], "Emma");

    let combined = app
        .server
        .get("/api/v1/titles?genre=sci-fi&year=2021")
        .await
        .json::<serde_json::Value>();
    assert_eq!(combined["data"].as_array().unwrap().len(), 1);
    assert_eq!(combined["data"][0]["category"]["slug"], "movies");
}

#[tokio::test]
async fn admin_patch_updates_fields_and_replaces_genres() {
    let app = common::spawn_app().await;
    let admin = common::create_user(&app.db, "boss", UserRole::Admin).await;
    let scifi = common::create_genre(&app.db, "Science Fiction", "sci-fi").await;
    common::create_genre(&app.db, "Drama", "drama").await;
    let title_id = common::create_title(&app.db, "Dun", 1965, None, &[scifi.id]).await;

    let response = app
        .server
        .patch(&format!("/api/v1/titles/{}", title_id))
        .add_header("Authorization", format!("Bearer {}", common::token_for(&admin)))
        .json(&json!({ "name": "Dune", "genre": ["drama"] }))
        .await;

    response.assert_status_ok();
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["name"], "Dune");
    assert_eq!(body["year"], 1965);
    let genres = body["genre"].as_array().unwrap();
    assert_eq!(genres.len(), 1);
    assert_eq!(genres[0]["slug"], "drama");
}

#[tokio::test]
async fn admin_deletes_title() {
    let app = common::spawn_app().await;
    let admin = common::create_user(&app.db, "boss", UserRole::Admin).await;
    let title_id = common::create_title(&app.db, "Dune", 1965, None, &[]).await;

    app.server
        .delete(&format!("/api/v1/titles/{}", title_id))
        .add_header("Authorization", format!("Bearer {}", common::token_for(&admin)))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    app.server
        .get(&format!("/api/v1/titles/{}", title_id))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn unknown_title_is_not_found() {
    let app = common::spawn_app().await;

    app.server.get("/api/v1/titles/999").await.assert_status_not_found();
}
