use super::DBClient;
use crate::dtos::{CategoryDto, GenreDto, TitleDto};
use crate::models::{Genre, Title};
use sqlx::{QueryBuilder, Sqlite};

/// Combinable title list filters; all of them may be active at once.
#[derive(Debug, Default, Clone)]
pub struct TitleFilter {
    pub category: Option<String>,
    pub genre: Option<String>,
    pub name: Option<String>,
    pub year: Option<i64>,
}

/// One row of the title query: title columns, the joined category and the
/// read-time AVG over review scores (NULL while no reviews exist).
#[derive(Debug, sqlx::FromRow)]
struct TitleRow {
    id: i64,
    name: String,
    year: i64,
    description: Option<String>,
    category_name: Option<String>,
    category_slug: Option<String>,
    rating: Option<f64>,
}

const TITLE_SELECT: &str = "SELECT t.id, t.name, t.year, t.description, \
    c.name AS category_name, c.slug AS category_slug, \
    (SELECT AVG(r.score) FROM reviews r WHERE r.title_id = t.id) AS rating \
    FROM titles t LEFT JOIN categories c ON c.id = t.category_id WHERE 1=1";

fn push_filters<'a>(qb: &mut QueryBuilder<'a, Sqlite>, filter: &'a TitleFilter) {
    if let Some(category) = &filter.category {
        qb.push(" AND c.slug = ").push_bind(category.as_str());
    }
    if let Some(genre) = &filter.genre {
        qb.push(
            " AND EXISTS (SELECT 1 FROM genre_title gt \
             JOIN genres g ON g.id = gt.genre_id \
             WHERE gt.title_id = t.id AND g.slug = ",
        )
        .push_bind(genre.as_str())
        .push(")");
    }
    if let Some(name) = &filter.name {
        qb.push(" AND t.name LIKE ").push_bind(format!("%{}%", name));
    }
    if let Some(year) = filter.year {
        qb.push(" AND t.year = ").push_bind(year);
    }
}

/// Title database operations.
pub trait TitleExt {
    async fn get_title(&self, title_id: i64) -> Result<Option<TitleDto>, sqlx::Error>;

    /// Bare row lookup, for when only existence matters (parent checks on
    /// nested routes) — skips the rating aggregate and genre join.
    async fn get_title_row(&self, title_id: i64) -> Result<Option<Title>, sqlx::Error>;

    async fn get_titles(
        &self,
        filter: &TitleFilter,
        page: u32,
        limit: u32,
    ) -> Result<Vec<TitleDto>, sqlx::Error>;

    async fn get_title_count(&self, filter: &TitleFilter) -> Result<i64, sqlx::Error>;

    /// Insert a title and its genre join rows in one transaction; returns the
    /// new id.
    async fn save_title(
        &self,
        name: &str,
        year: i64,
        description: Option<&str>,
        category_id: Option<i64>,
        genre_ids: &[i64],
    ) -> Result<i64, sqlx::Error>;

    /// Partial update. `genre_ids = Some(..)` replaces the whole join set.
    async fn update_title(
        &self,
        title_id: i64,
        name: Option<&str>,
        year: Option<i64>,
        description: Option<&str>,
        category_id: Option<i64>,
        genre_ids: Option<&[i64]>,
    ) -> Result<(), sqlx::Error>;

    async fn delete_title(&self, title_id: i64) -> Result<(), sqlx::Error>;

    /// Genres linked to one title, ordered by name.
    async fn get_title_genres(&self, title_id: i64) -> Result<Vec<Genre>, sqlx::Error>;
}

impl DBClient {
    async fn assemble_title(&self, row: TitleRow) -> Result<TitleDto, sqlx::Error> {
        let genres = self.get_title_genres(row.id).await?;

        let category = match (row.category_name, row.category_slug) {
            (Some(name), Some(slug)) => Some(CategoryDto { name, slug }),
            _ => None,
        };

        Ok(TitleDto {
            id: row.id,
            name: row.name,
            year: row.year,
            rating: row.rating,
            description: row.description,
            category,
            genre: genres.into_iter().map(GenreDto::from).collect(),
        })
    }
}

impl TitleExt for DBClient {
    async fn get_title(&self, title_id: i64) -> Result<Option<TitleDto>, sqlx::Error> {
        let row = sqlx::query_as::<_, TitleRow>(&format!("{TITLE_SELECT} AND t.id = ?"))
            .bind(title_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.assemble_title(row).await?)),
            None => Ok(None),
        }
    }

    async fn get_title_row(&self, title_id: i64) -> Result<Option<Title>, sqlx::Error> {
        sqlx::query_as::<_, Title>(
            "SELECT id, name, year, description, category_id FROM titles WHERE id = ?",
        )
        .bind(title_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_titles(
        &self,
        filter: &TitleFilter,
        page: u32,
        limit: u32,
    ) -> Result<Vec<TitleDto>, sqlx::Error> {
        let offset = (page - 1) * limit;

        let mut qb = QueryBuilder::<Sqlite>::new(TITLE_SELECT);
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY t.name LIMIT ")
            .push_bind(limit as i64)
            .push(" OFFSET ")
            .push_bind(offset as i64);

        let rows: Vec<TitleRow> = qb.build_query_as().fetch_all(&self.pool).await?;

        let mut titles = Vec::with_capacity(rows.len());
        for row in rows {
            titles.push(self.assemble_title(row).await?);
        }

        Ok(titles)
    }

    async fn get_title_count(&self, filter: &TitleFilter) -> Result<i64, sqlx::Error> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT COUNT(*) FROM titles t \
             LEFT JOIN categories c ON c.id = t.category_id WHERE 1=1",
        );
        push_filters(&mut qb, filter);

        qb.build_query_scalar().fetch_one(&self.pool).await
    }

    async fn save_title(
        &self,
        name: &str,
        year: i64,
        description: Option<&str>,
        category_id: Option<i64>,
        genre_ids: &[i64],
    ) -> Result<i64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO titles (name, year, description, category_id) VALUES (?, ?, ?, ?)",
        )
        .bind(name)
        .bind(year)
        .bind(description)
        .bind(category_id)
        .execute(&mut *tx)
        .await?;

        let title_id = result.last_insert_rowid();

        for genre_id in genre_ids {
            sqlx::query("INSERT INTO genre_title (title_id, genre_id) VALUES (?, ?)")
                .bind(title_id)
                .bind(genre_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(title_id)
    }

    async fn update_title(
        &self,
        title_id: i64,
        name: Option<&str>,
        year: Option<i64>,
        description: Option<&str>,
        category_id: Option<i64>,
        genre_ids: Option<&[i64]>,
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE titles SET \
                name = COALESCE(?, name), \
                year = COALESCE(?, year), \
                description = COALESCE(?, description), \
                category_id = COALESCE(?, category_id) \
             WHERE id = ?",
        )
        .bind(name)
        .bind(year)
        .bind(description)
        .bind(category_id)
        .bind(title_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        if let Some(genre_ids) = genre_ids {
            sqlx::query("DELETE FROM genre_title WHERE title_id = ?")
                .bind(title_id)
                .execute(&mut *tx)
                .await?;

            for genre_id in genre_ids {
                sqlx::query("INSERT INTO genre_title (title_id, genre_id) VALUES (?, ?)")
                    .bind(title_id)
                    .bind(genre_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;

        Ok(())
    }

    async fn delete_title(&self, title_id: i64) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM titles WHERE id = ?")
            .bind(title_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }

    async fn get_title_genres(&self, title_id: i64) -> Result<Vec<Genre>, sqlx::Error> {
        sqlx::query_as::<_, Genre>(
            "SELECT g.id, g.name, g.slug FROM genre_title gt \
             JOIN genres g ON g.id = gt.genre_id \
             WHERE gt.title_id = ? ORDER BY g.name",
        )
        .bind(title_id)
        .fetch_all(&self.pool)
        .await
    }
}
