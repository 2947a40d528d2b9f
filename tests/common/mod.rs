#![allow(dead_code)]

use axum_test::TestServer;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use std::sync::Arc;

use review_backend::config::Config;
use review_backend::db::{
    CategoryExt, CommentExt, DBClient, GenreExt, ReviewExt, TitleExt, UserExt,
};
use review_backend::models::{Category, Genre, User, UserRole};
use review_backend::routes::create_router;
use review_backend::utils::token;
use review_backend::{AppState, MIGRATOR};

pub const TEST_SECRET: &str = "test-signing-secret";

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        secret_key: TEST_SECRET.to_string(),
        jwt_maxage: 3600,
        port: 0,
        from_email: "noreply@reviewdb.test".to_string(),
        smtp: None,
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub db: DBClient,
    pub pool: Pool<Sqlite>,
    pub env: Arc<Config>,
}

/// Boot the full router against a fresh in-memory database with the schema
/// migrated and foreign keys on. One connection keeps the in-memory database
/// alive for the whole test.
pub async fn spawn_app() -> TestApp {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();

    MIGRATOR.run(&pool).await.unwrap();

    let env = Arc::new(test_config());
    let db = DBClient::new(pool.clone());

    let state = AppState {
        env: env.clone(),
        db_client: db.clone(),
    };

    let server = TestServer::new(create_router(state)).unwrap();

    TestApp {
        server,
        db,
        pool,
        env,
    }
}

pub async fn create_user(db: &DBClient, username: &str, role: UserRole) -> User {
    db.save_user(
        username,
        &format!("{}@example.com", username),
        None,
        None,
        None,
        role,
    )
    .await
    .unwrap()
}

/// Flip the system-level superuser bit; there is no API surface for it.
pub async fn make_superuser(pool: &Pool<Sqlite>, user_id: i64) {
    sqlx::query("UPDATE users SET is_superuser = 1 WHERE id = ?")
        .bind(user_id)
        .execute(pool)
        .await
        .unwrap();
}

pub fn token_for(user: &User) -> String {
    token::create_token(&user.id.to_string(), TEST_SECRET.as_bytes(), 3600).unwrap()
}

pub async fn create_category(db: &DBClient, name: &str, slug: &str) -> Category {
    db.save_category(name, slug).await.unwrap()
}

pub async fn create_genre(db: &DBClient, name: &str, slug: &str) -> Genre {
    db.save_genre(name, slug).await.unwrap()
}

pub async fn create_title(
    db: &DBClient,
    name: &str,
    year: i64,
    category_id: Option<i64>,
    genre_ids: &[i64],
) -> i64 {
    db.save_title(name, year, None, category_id, genre_ids)
        .await
        .unwrap()
}

pub async fn create_review(db: &DBClient, title_id: i64, author_id: i64, score: i64) -> i64 {
    db.save_review(title_id, author_id, "a review", score)
        .await
        .unwrap()
        .id
}

pub async fn create_comment(db: &DBClient, review_id: i64, author_id: i64) -> i64 {
    db.save_comment(review_id, author_id, "a comment")
        .await
        .unwrap()
        .id
}
