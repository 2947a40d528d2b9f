use super::DBClient;
use crate::dtos::CommentDto;
use crate::models::Comment;
use chrono::Utc;

/// Comment database operations, always scoped to a parent review.
pub trait CommentExt {
    /// Paginated comments for one review, newest first.
    async fn get_comments(
        &self,
        review_id: i64,
        page: u32,
        limit: u32,
    ) -> Result<Vec<CommentDto>, sqlx::Error>;

    async fn get_comment_count(&self, review_id: i64) -> Result<i64, sqlx::Error>;

    /// Raw row for ownership checks; None when absent or attached to a
    /// different review.
    async fn get_comment(
        &self,
        review_id: i64,
        comment_id: i64,
    ) -> Result<Option<Comment>, sqlx::Error>;

    async fn get_comment_dto(
        &self,
        review_id: i64,
        comment_id: i64,
    ) -> Result<Option<CommentDto>, sqlx::Error>;

    async fn save_comment(
        &self,
        review_id: i64,
        author_id: i64,
        text: &str,
    ) -> Result<CommentDto, sqlx::Error>;

    async fn update_comment(&self, comment_id: i64, text: &str) -> Result<(), sqlx::Error>;

    async fn delete_comment(&self, comment_id: i64) -> Result<(), sqlx::Error>;
}

const COMMENT_DTO_SELECT: &str = "SELECT cm.id, u.username AS author, cm.text, cm.pub_date \
    FROM comments cm JOIN users u ON u.id = cm.author_id";

impl CommentExt for DBClient {
    async fn get_comments(
        &self,
        review_id: i64,
        page: u32,
        limit: u32,
    ) -> Result<Vec<CommentDto>, sqlx::Error> {
        let offset = (page - 1) * limit;

        sqlx::query_as::<_, CommentDto>(&format!(
            "{COMMENT_DTO_SELECT} WHERE cm.review_id = ? \
             ORDER BY cm.pub_date DESC, cm.id DESC LIMIT ? OFFSET ?"
        ))
        .bind(review_id)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_comment_count(&self, review_id: i64) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE review_id = ?")
            .bind(review_id)
            .fetch_one(&self.pool)
            .await
    }

    async fn get_comment(
        &self,
        review_id: i64,
        comment_id: i64,
    ) -> Result<Option<Comment>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            "SELECT id, review_id, author_id, text, pub_date \
             FROM comments WHERE id = ? AND review_id = ?",
        )
        .bind(comment_id)
        .bind(review_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_comment_dto(
        &self,
        review_id: i64,
        comment_id: i64,
    ) -> Result<Option<CommentDto>, sqlx::Error> {
        sqlx::query_as::<_, CommentDto>(&format!(
            "{COMMENT_DTO_SELECT} WHERE cm.id = ? AND cm.review_id = ?"
        ))
        .bind(comment_id)
        .bind(review_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn save_comment(
        &self,
        review_id: i64,
        author_id: i64,
        text: &str,
    ) -> Result<CommentDto, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO comments (review_id, author_id, text, pub_date) VALUES (?, ?, ?, ?)",
        )
        .bind(review_id)
        .bind(author_id)
        .bind(text)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let comment_id = result.last_insert_rowid();

        let comment = sqlx::query_as::<_, CommentDto>(&format!(
            "{COMMENT_DTO_SELECT} WHERE cm.id = ?"
        ))
        .bind(comment_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn update_comment(&self, comment_id: i64, text: &str) -> Result<(), sqlx::Error> {
        let result = sqlx::query("UPDATE comments SET text = ? WHERE id = ?")
            .bind(text)
            .bind(comment_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }

    async fn delete_comment(&self, comment_id: i64) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(comment_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }
}
