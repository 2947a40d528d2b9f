use crate::models::{Category, Genre, User, UserRole};
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

// DTOs define the structure of data exchanged with clients. They are separate
// from the row models so the API surface controls exactly what is exposed
// (e.g. author usernames instead of ids, no is_superuser flag).

// ============================================================================
// Field checks that need runtime context (current year, reserved names)
// ============================================================================

/// Username rules: letters, digits and @ . + - _ only, max 150 chars, and the
/// literal `me` is reserved for the self-service endpoint.
pub fn check_username(username: &str) -> Result<(), crate::error::HttpError> {
    if username == "me" {
        return Err(field_error("username", "\"me\" is not a valid username"));
    }
    if username.is_empty() || username.len() > 150 {
        return Err(field_error(
            "username",
            "username must be between 1 and 150 characters",
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(field_error(
            "username",
            "username may contain only letters, digits and @/./+/-/_",
        ));
    }
    Ok(())
}

/// Slug rules for the Category/Genre identity key.
pub fn check_slug(slug: &str) -> Result<(), crate::error::HttpError> {
    if slug.is_empty() || slug.len() > 50 {
        return Err(field_error("slug", "slug must be between 1 and 50 characters"));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(field_error(
            "slug",
            "slug may contain only letters, digits, hyphens and underscores",
        ));
    }
    Ok(())
}

/// A title's year must not lie in the future.
pub fn check_year(year: i64) -> Result<(), crate::error::HttpError> {
    if year > Utc::now().year() as i64 {
        return Err(field_error(
            "year",
            "year must not be greater than the current year",
        ));
    }
    Ok(())
}

fn field_error(field: &str, message: &str) -> crate::error::HttpError {
    crate::error::HttpError {
        message: "Validation failed".to_string(),
        status: axum::http::StatusCode::BAD_REQUEST,
        errors: Some(serde_json::json!({ field: [message] })),
    }
}

// ============================================================================
// Registration / token DTOs
// ============================================================================

/// Signup request: no password, the emailed confirmation code proves identity.
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct SignupDto {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(
        length(min = 1, max = 254, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct TokenRequestDto {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Confirmation code is required"))]
    pub confirmation_code: String,
}

/// Token response: the single `access` field the original contract exposes.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponseDto {
    pub access: String,
}

// ============================================================================
// Pagination & query DTOs
// ============================================================================

#[derive(Serialize, Deserialize, Validate, Debug, Default)]
pub struct PageQueryDto {
    #[validate(range(min = 1))]
    pub page: Option<u32>,

    #[validate(range(min = 1, max = 50))]
    pub limit: Option<u32>,

    /// Substring search; the searched column depends on the resource
    /// (name for categories/genres, username for users).
    pub search: Option<String>,
}

impl PageQueryDto {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(10)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaginationDto {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
}

impl PaginationDto {
    pub fn new(page: u32, limit: u32, total: i64) -> Self {
        PaginationDto {
            page,
            limit,
            total,
            total_pages: (total as f64 / limit as f64).ceil() as i64,
        }
    }
}

/// List envelope shared by every collection endpoint.
#[derive(Debug, Serialize)]
pub struct ListResponseDto<T> {
    pub status: String,
    pub data: Vec<T>,
    pub pagination: PaginationDto,
}

// ============================================================================
// Category / Genre DTOs
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CategoryDto {
    pub name: String,
    pub slug: String,
}

impl From<Category> for CategoryDto {
    fn from(c: Category) -> Self {
        CategoryDto {
            name: c.name,
            slug: c.slug,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GenreDto {
    pub name: String,
    pub slug: String,
}

impl From<Genre> for GenreDto {
    fn from(g: Genre) -> Self {
        GenreDto {
            name: g.name,
            slug: g.slug,
        }
    }
}

/// Create payload shared by both reference tables; slug charset is checked
/// with `check_slug` in the handler.
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct CreateSlugDto {
    #[validate(length(min = 1, max = 256, message = "Name is required"))]
    pub name: String,

    #[validate(length(min = 1, message = "Slug is required"))]
    pub slug: String,
}

// ============================================================================
// Title DTOs
// ============================================================================

/// Title representation with the read-time aggregate rating and embedded
/// category/genre objects.
#[derive(Debug, Serialize, Deserialize)]
pub struct TitleDto {
    pub id: i64,
    pub name: String,
    pub year: i64,
    /// Arithmetic mean of review scores; absent while the title has none.
    pub rating: Option<f64>,
    pub description: Option<String>,
    pub category: Option<CategoryDto>,
    pub genre: Vec<GenreDto>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct CreateTitleDto {
    #[validate(length(min = 1, max = 256, message = "Name is required"))]
    pub name: String,

    pub year: i64,

    pub description: Option<String>,

    /// Category slug; the title is created uncategorized when omitted.
    pub category: Option<String>,

    /// Genre slugs; unknown slugs fail with 400.
    pub genre: Option<Vec<String>>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateTitleDto {
    #[validate(length(min = 1, max = 256, message = "Name must not be empty"))]
    pub name: Option<String>,

    pub year: Option<i64>,

    pub description: Option<String>,

    pub category: Option<String>,

    pub genre: Option<Vec<String>>,
}

/// Title list filters, combinable.
#[derive(Debug, Deserialize, Validate, Default)]
pub struct TitleQueryDto {
    #[validate(range(min = 1))]
    pub page: Option<u32>,

    #[validate(range(min = 1, max = 50))]
    pub limit: Option<u32>,

    /// Category slug.
    pub category: Option<String>,

    /// Genre slug.
    pub genre: Option<String>,

    /// Name substring.
    pub name: Option<String>,

    pub year: Option<i64>,
}

// ============================================================================
// Review / Comment DTOs
// ============================================================================

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReviewDto {
    pub id: i64,
    /// Author's username, resolved by join.
    pub author: String,
    pub text: String,
    pub score: i64,
    pub pub_date: DateTime<Utc>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct CreateReviewDto {
    #[validate(length(min = 1, message = "Text is required"))]
    pub text: String,

    #[validate(range(min = 1, max = 10, message = "Score must be between 1 and 10"))]
    pub score: i64,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateReviewDto {
    #[validate(length(min = 1, message = "Text must not be empty"))]
    pub text: Option<String>,

    #[validate(range(min = 1, max = 10, message = "Score must be between 1 and 10"))]
    pub score: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommentDto {
    pub id: i64,
    pub author: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct CreateCommentDto {
    #[validate(length(min = 1, message = "Text is required"))]
    pub text: String,
}

// ============================================================================
// User DTOs
// ============================================================================

/// Client-safe user representation; the superuser flag stays internal.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserDto {
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: String,
}

impl UserDto {
    pub fn filter_user(user: &User) -> Self {
        UserDto {
            username: user.username.to_owned(),
            email: user.email.to_owned(),
            first_name: user.first_name.to_owned(),
            last_name: user.last_name.to_owned(),
            bio: user.bio.to_owned(),
            role: user.role.to_str().to_string(),
        }
    }

    pub fn filter_users(users: &[User]) -> Vec<UserDto> {
        users.iter().map(UserDto::filter_user).collect()
    }
}

/// Admin create payload: the full field set including role.
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct CreateUserDto {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(
        length(min = 1, max = 254, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(length(max = 150))]
    pub first_name: Option<String>,

    #[validate(length(max = 150))]
    pub last_name: Option<String>,

    pub bio: Option<String>,

    pub role: Option<UserRole>,
}

/// Admin partial update; every field optional.
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateUserDto {
    #[validate(length(min = 1, message = "Username must not be empty"))]
    pub username: Option<String>,

    #[validate(email(message = "Email is invalid"))]
    pub email: Option<String>,

    #[validate(length(max = 150))]
    pub first_name: Option<String>,

    #[validate(length(max = 150))]
    pub last_name: Option<String>,

    pub bio: Option<String>,

    pub role: Option<UserRole>,
}

/// Self-service partial update. No role field: a role key in the payload is
/// ignored, matching the original's read-only handling.
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateMeDto {
    #[validate(length(min = 1, message = "Username must not be empty"))]
    pub username: Option<String>,

    #[validate(email(message = "Email is invalid"))]
    pub email: Option<String>,

    #[validate(length(max = 150))]
    pub first_name: Option<String>,

    #[validate(length(max = 150))]
    pub last_name: Option<String>,

    pub bio: Option<String>,
}

/// Single user envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponseDto {
    pub status: String,
    pub data: UserDto,
}
