use super::DBClient;
use crate::dtos::ReviewDto;
use crate::models::Review;
use chrono::Utc;

/// Review database operations, always scoped to a parent title.
pub trait ReviewExt {
    /// Paginated reviews for one title, newest first.
    async fn get_reviews(
        &self,
        title_id: i64,
        page: u32,
        limit: u32,
    ) -> Result<Vec<ReviewDto>, sqlx::Error>;

    async fn get_review_count(&self, title_id: i64) -> Result<i64, sqlx::Error>;

    /// Raw row, used for ownership checks. None when the review does not
    /// exist or belongs to another title.
    async fn get_review(
        &self,
        title_id: i64,
        review_id: i64,
    ) -> Result<Option<Review>, sqlx::Error>;

    /// Client representation with the author's username resolved.
    async fn get_review_dto(
        &self,
        title_id: i64,
        review_id: i64,
    ) -> Result<Option<ReviewDto>, sqlx::Error>;

    /// Insert a review. A second review by the same author on the same title
    /// violates the unique constraint and surfaces as a database error.
    async fn save_review(
        &self,
        title_id: i64,
        author_id: i64,
        text: &str,
        score: i64,
    ) -> Result<ReviewDto, sqlx::Error>;

    /// Partial update; None fields keep their current value.
    async fn update_review(
        &self,
        review_id: i64,
        text: Option<&str>,
        score: Option<i64>,
    ) -> Result<(), sqlx::Error>;

    /// Delete a review. Its comments cascade with it.
    async fn delete_review(&self, review_id: i64) -> Result<(), sqlx::Error>;
}

const REVIEW_DTO_SELECT: &str = "SELECT r.id, u.username AS author, r.text, r.score, r.pub_date \
    FROM reviews r JOIN users u ON u.id = r.author_id";

impl ReviewExt for DBClient {
    async fn get_reviews(
        &self,
        title_id: i64,
        page: u32,
        limit: u32,
    ) -> Result<Vec<ReviewDto>, sqlx::Error> {
        let offset = (page - 1) * limit;

        sqlx::query_as::<_, ReviewDto>(&format!(
            "{REVIEW_DTO_SELECT} WHERE r.title_id = ? \
             ORDER BY r.pub_date DESC, r.id DESC LIMIT ? OFFSET ?"
        ))
        .bind(title_id)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_review_count(&self, title_id: i64) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE title_id = ?")
            .bind(title_id)
            .fetch_one(&self.pool)
            .await
    }

    async fn get_review(
        &self,
        title_id: i64,
        review_id: i64,
    ) -> Result<Option<Review>, sqlx::Error> {
        sqlx::query_as::<_, Review>(
            "SELECT id, title_id, author_id, text, score, pub_date \
             FROM reviews WHERE id = ? AND title_id = ?",
        )
        .bind(review_id)
        .bind(title_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_review_dto(
        &self,
        title_id: i64,
        review_id: i64,
    ) -> Result<Option<ReviewDto>, sqlx::Error> {
        sqlx::query_as::<_, ReviewDto>(&format!(
            "{REVIEW_DTO_SELECT} WHERE r.id = ? AND r.title_id = ?"
        ))
        .bind(review_id)
        .bind(title_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn save_review(
        &self,
        title_id: i64,
        author_id: i64,
        text: &str,
        score: i64,
    ) -> Result<ReviewDto, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO reviews (title_id, author_id, text, score, pub_date) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(title_id)
        .bind(author_id)
        .bind(text)
        .bind(score)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let review_id = result.last_insert_rowid();

        let review = sqlx::query_as::<_, ReviewDto>(&format!(
            "{REVIEW_DTO_SELECT} WHERE r.id = ?"
        ))
        .bind(review_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(review)
    }

    async fn update_review(
        &self,
        review_id: i64,
        text: Option<&str>,
        score: Option<i64>,
    ) -> Result<(), sqlx::Error> {
        let result = sqlx::query(
            "UPDATE reviews SET text = COALESCE(?, text), score = COALESCE(?, score) \
             WHERE id = ?",
        )
        .bind(text)
        .bind(score)
        .bind(review_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }

    async fn delete_review(&self, review_id: i64) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = ?")
            .bind(review_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }
}
