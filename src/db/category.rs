use super::DBClient;
use crate::models::Category;

/// Category database operations. List + create + delete only: the reference
/// table has no update path.
pub trait CategoryExt {
    async fn get_category(&self, slug: &str) -> Result<Option<Category>, sqlx::Error>;

    /// Paginated list ordered by name, optionally filtered by name substring.
    async fn get_categories(
        &self,
        search: Option<&str>,
        page: u32,
        limit: u32,
    ) -> Result<Vec<Category>, sqlx::Error>;

    async fn get_category_count(&self, search: Option<&str>) -> Result<i64, sqlx::Error>;

    async fn save_category(&self, name: &str, slug: &str) -> Result<Category, sqlx::Error>;

    /// Delete by slug. Dependent titles keep their row with a nulled
    /// category (ON DELETE SET NULL).
    async fn delete_category(&self, slug: &str) -> Result<(), sqlx::Error>;
}

impl CategoryExt for DBClient {
    async fn get_category(&self, slug: &str) -> Result<Option<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>("SELECT id, name, slug FROM categories WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_categories(
        &self,
        search: Option<&str>,
        page: u32,
        limit: u32,
    ) -> Result<Vec<Category>, sqlx::Error> {
        let offset = (page - 1) * limit;
        let pattern = format!("%{}%", search.unwrap_or(""));

        sqlx::query_as::<_, Category>(
            "SELECT id, name, slug FROM categories WHERE name LIKE ? \
             ORDER BY name LIMIT ? OFFSET ?",
        )
        .bind(pattern)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_category_count(&self, search: Option<&str>) -> Result<i64, sqlx::Error> {
        let pattern = format!("%{}%", search.unwrap_or(""));

        sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE name LIKE ?")
            .bind(pattern)
            .fetch_one(&self.pool)
            .await
    }

    async fn save_category(&self, name: &str, slug: &str) -> Result<Category, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, slug) VALUES (?, ?) RETURNING id, name, slug",
        )
        .bind(name)
        .bind(slug)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_category(&self, slug: &str) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM categories WHERE slug = ?")
            .bind(slug)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }
}
