use chrono::prelude::*;
use serde::{Deserialize, Serialize};

/// User role for role-based access control.
///
/// Stored as lowercase text in the `role` column. The superuser bit is a
/// separate column (`users.is_superuser`), deliberately not a variant here:
/// a superuser keeps whatever role the row carries.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,      // Standard permissions: own reviews and comments
    Moderator, // May edit or delete any review/comment
    Admin,     // Full access to every resource
}

impl UserRole {
    pub fn to_str(&self) -> &str {
        match self {
            UserRole::User => "user",
            UserRole::Moderator => "moderator",
            UserRole::Admin => "admin",
        }
    }
}

/// User row. No password column: identity is proven by the emailed
/// confirmation code, sessions by JWT.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: UserRole,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
}

/// Reference table for title categories. Identity key is the slug.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// Reference table for title genres. Same shape and deletion contract as
/// Category, except join rows cascade instead of nulling.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Genre {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// A reviewable work. `category_id` is nullable and nulled when the category
/// is deleted; genres hang off the `genre_title` join table. The average
/// rating is computed per read and never stored on this row.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Title {
    pub id: i64,
    pub name: String,
    pub year: i64,
    pub description: Option<String>,
    pub category_id: Option<i64>,
}

/// Review of a title. At most one per (title_id, author_id) — enforced by a
/// unique constraint, so a duplicate insert is a conflict, not a validation
/// failure.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Review {
    pub id: i64,
    pub title_id: i64,
    pub author_id: i64,
    pub text: String,
    pub score: i64,
    pub pub_date: DateTime<Utc>,
}

/// Comment on a review. Cascade-deletes with its review.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Comment {
    pub id: i64,
    pub review_id: i64,
    pub author_id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
}
