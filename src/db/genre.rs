use super::DBClient;
use crate::models::Genre;

/// Genre database operations. Same surface as categories; deleting a genre
/// removes its join rows (ON DELETE CASCADE) and leaves titles intact.
pub trait GenreExt {
    async fn get_genre(&self, slug: &str) -> Result<Option<Genre>, sqlx::Error>;

    async fn get_genres(
        &self,
        search: Option<&str>,
        page: u32,
        limit: u32,
    ) -> Result<Vec<Genre>, sqlx::Error>;

    async fn get_genre_count(&self, search: Option<&str>) -> Result<i64, sqlx::Error>;

    async fn save_genre(&self, name: &str, slug: &str) -> Result<Genre, sqlx::Error>;

    async fn delete_genre(&self, slug: &str) -> Result<(), sqlx::Error>;
}

impl GenreExt for DBClient {
    async fn get_genre(&self, slug: &str) -> Result<Option<Genre>, sqlx::Error> {
        sqlx::query_as::<_, Genre>("SELECT id, name, slug FROM genres WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_genres(
        &self,
        search: Option<&str>,
        page: u32,
        limit: u32,
    ) -> Result<Vec<Genre>, sqlx::Error> {
        let offset = (page - 1) * limit;
        let pattern = format!("%{}%", search.unwrap_or(""));

        sqlx::query_as::<_, Genre>(
            "SELECT id, name, slug FROM genres WHERE name LIKE ? \
             ORDER BY name LIMIT ? OFFSET ?",
        )
        .bind(pattern)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_genre_count(&self, search: Option<&str>) -> Result<i64, sqlx::Error> {
        let pattern = format!("%{}%", search.unwrap_or(""));

        sqlx::query_scalar("SELECT COUNT(*) FROM genres WHERE name LIKE ?")
            .bind(pattern)
            .fetch_one(&self.pool)
            .await
    }

    async fn save_genre(&self, name: &str, slug: &str) -> Result<Genre, sqlx::Error> {
        sqlx::query_as::<_, Genre>(
            "INSERT INTO genres (name, slug) VALUES (?, ?) RETURNING id, name, slug",
        )
        .bind(name)
        .bind(slug)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_genre(&self, slug: &str) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM genres WHERE slug = ?")
            .bind(slug)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }
}
