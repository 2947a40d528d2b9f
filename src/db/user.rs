use super::DBClient;
use crate::models::{User, UserRole};
use chrono::Utc;

const USER_COLUMNS: &str =
    "id, username, email, first_name, last_name, bio, role, is_superuser, created_at";

/// User database operations.
pub trait UserExt {
    /// Get a single user by id, username or email, whichever key is given.
    async fn get_user(
        &self,
        user_id: Option<i64>,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error>;

    /// Paginated user list, optionally filtered by username substring.
    async fn get_users(
        &self,
        search: Option<&str>,
        page: u32,
        limit: u32,
    ) -> Result<Vec<User>, sqlx::Error>;

    /// Total user count under the same filter as `get_users`.
    async fn get_user_count(&self, search: Option<&str>) -> Result<i64, sqlx::Error>;

    /// Insert a new user row.
    async fn save_user(
        &self,
        username: &str,
        email: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
        bio: Option<&str>,
        role: UserRole,
    ) -> Result<User, sqlx::Error>;

    /// Partial update; None fields keep their current value.
    #[allow(clippy::too_many_arguments)]
    async fn update_user(
        &self,
        user_id: i64,
        username: Option<&str>,
        email: Option<&str>,
        first_name: Option<&str>,
        last_name: Option<&str>,
        bio: Option<&str>,
        role: Option<UserRole>,
    ) -> Result<User, sqlx::Error>;

    /// Delete by username. Reviews and comments cascade with the row.
    async fn delete_user(&self, username: &str) -> Result<(), sqlx::Error>;
}

impl UserExt for DBClient {
    async fn get_user(
        &self,
        user_id: Option<i64>,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut user: Option<User> = None;

        if let Some(user_id) = user_id {
            user = sqlx::query_as::<_, User>(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
            ))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        } else if let Some(username) = username {
            user = sqlx::query_as::<_, User>(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
            ))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        } else if let Some(email) = email {
            user = sqlx::query_as::<_, User>(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
            ))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        }

        Ok(user)
    }

    async fn get_users(
        &self,
        search: Option<&str>,
        page: u32,
        limit: u32,
    ) -> Result<Vec<User>, sqlx::Error> {
        let offset = (page - 1) * limit;
        let pattern = format!("%{}%", search.unwrap_or(""));

        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username LIKE ? \
             ORDER BY username LIMIT ? OFFSET ?"
        ))
        .bind(pattern)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn get_user_count(&self, search: Option<&str>) -> Result<i64, sqlx::Error> {
        let pattern = format!("%{}%", search.unwrap_or(""));

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username LIKE ?")
                .bind(pattern)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    async fn save_user(
        &self,
        username: &str,
        email: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
        bio: Option<&str>,
        role: UserRole,
    ) -> Result<User, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, email, first_name, last_name, bio, role, is_superuser, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, 0, ?) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(username)
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .bind(bio)
        .bind(role)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_user(
        &self,
        user_id: i64,
        username: Option<&str>,
        email: Option<&str>,
        first_name: Option<&str>,
        last_name: Option<&str>,
        bio: Option<&str>,
        role: Option<UserRole>,
    ) -> Result<User, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET \
                username = COALESCE(?, username), \
                email = COALESCE(?, email), \
                first_name = COALESCE(?, first_name), \
                last_name = COALESCE(?, last_name), \
                bio = COALESCE(?, bio), \
                role = COALESCE(?, role) \
             WHERE id = ? \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(username)
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .bind(bio)
        .bind(role)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn delete_user(&self, username: &str) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE username = ?")
            .bind(username)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }
}
