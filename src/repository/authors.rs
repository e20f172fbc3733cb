//! Authors repository

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{is_unique_violation, AppError, AppResult},
    models::author::{Author, NewAuthor},
};

use super::contains_pattern;

const AUTHOR_COLUMNS: &str = "id, name, bio, dob, profile_pic";

#[derive(Clone)]
pub struct AuthorsRepository {
    pool: Pool<Postgres>,
}

impl AuthorsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Find an author by exact name
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<Author>> {
        let query = format!("SELECT {} FROM authors WHERE name = $1", AUTHOR_COLUMNS);
        let author = sqlx::query_as::<_, Author>(&query)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(author)
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Author>> {
        let query = format!("SELECT {} FROM authors WHERE id = $1", AUTHOR_COLUMNS);
        let author = sqlx::query_as::<_, Author>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(author)
    }

    /// Load every author whose id is in `ids` (missing ids are skipped)
    pub async fn get_many(&self, ids: &[Uuid]) -> AppResult<Vec<Author>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!("SELECT {} FROM authors WHERE id = ANY($1)", AUTHOR_COLUMNS);
        let authors = sqlx::query_as::<_, Author>(&query)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(authors)
    }

    /// List authors in insertion order, optionally filtered by a
    /// case-insensitive substring of the name
    pub async fn search(&self, term: Option<&str>) -> AppResult<Vec<Author>> {
        let authors = match term {
            Some(term) => {
                let query = format!(
                    "SELECT {} FROM authors WHERE name ILIKE $1 ORDER BY created_at, id",
                    AUTHOR_COLUMNS
                );
                sqlx::query_as::<_, Author>(&query)
                    .bind(contains_pattern(term))
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let query = format!(
                    "SELECT {} FROM authors ORDER BY created_at, id",
                    AUTHOR_COLUMNS
                );
                sqlx::query_as::<_, Author>(&query)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(authors)
    }

    /// Ids of authors whose name contains `term`, case-insensitively
    pub async fn ids_matching_name(&self, term: &str) -> AppResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>("SELECT id FROM authors WHERE name ILIKE $1")
            .bind(contains_pattern(term))
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    /// Insert an author. A concurrent insert of the same name surfaces as a
    /// conflict through the unique index.
    pub async fn create(&self, data: &NewAuthor) -> AppResult<Author> {
        let query = format!(
            "INSERT INTO authors (id, name, bio, dob, profile_pic) VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            AUTHOR_COLUMNS
        );
        sqlx::query_as::<_, Author>(&query)
            .bind(Uuid::new_v4())
            .bind(&data.name)
            .bind(&data.bio)
            .bind(&data.dob)
            .bind(&data.profile_pic)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict("Author name already exists".to_string())
                } else {
                    AppError::Database(e)
                }
            })
    }
}
