//! Books repository

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{is_unique_violation, AppError, AppResult},
    models::{book::BookRecord, pagination::PageRequest},
};

use super::contains_pattern;

const BOOK_COLUMNS: &str = "id, title, genre, published_at, author_id";

/// Fields persisted for a new book
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub genre: String,
    pub published_at: String,
    pub author_id: Uuid,
}

/// Field replacements for an update; `None` leaves the column unchanged
#[derive(Debug, Clone, Default)]
pub struct BookChanges {
    pub title: Option<String>,
    pub genre: Option<String>,
    pub published_at: Option<String>,
    pub author_id: Option<Uuid>,
}

impl BookChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.genre.is_none()
            && self.published_at.is_none()
            && self.author_id.is_none()
    }
}

/// List filter. Conditions that are present are combined with OR.
#[derive(Debug, Clone, Default)]
pub struct BookFilter {
    /// Case-insensitive title substring
    pub title: Option<String>,
    /// Books written by any of these authors
    pub author_ids: Option<Vec<Uuid>>,
}

impl BookFilter {
    /// WHERE clause with positional parameters starting at `$1`
    fn where_clause(&self) -> String {
        let mut conditions = Vec::new();
        let mut idx = 1;

        if self.title.is_some() {
            conditions.push(format!("title ILIKE ${}", idx));
            idx += 1;
        }
        if self.author_ids.is_some() {
            conditions.push(format!("author_id = ANY(${})", idx));
        }

        if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" OR "))
        }
    }

    fn param_count(&self) -> usize {
        usize::from(self.title.is_some()) + usize::from(self.author_ids.is_some())
    }
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Option<BookRecord>> {
        let query = format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS);
        let book = sqlx::query_as::<_, BookRecord>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    /// Find a book by exact title, ignoring the book `excluding`
    pub async fn find_by_title(
        &self,
        title: &str,
        excluding: Option<Uuid>,
    ) -> AppResult<Option<BookRecord>> {
        let book = match excluding {
            Some(id) => {
                let query = format!(
                    "SELECT {} FROM books WHERE title = $1 AND id <> $2",
                    BOOK_COLUMNS
                );
                sqlx::query_as::<_, BookRecord>(&query)
                    .bind(title)
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?
            }
            None => {
                let query = format!("SELECT {} FROM books WHERE title = $1", BOOK_COLUMNS);
                sqlx::query_as::<_, BookRecord>(&query)
                    .bind(title)
                    .fetch_optional(&self.pool)
                    .await?
            }
        };
        Ok(book)
    }

    /// Count matching books and fetch one page, ordered by title
    pub async fn list(
        &self,
        filter: &BookFilter,
        page: PageRequest,
    ) -> AppResult<(Vec<BookRecord>, i64)> {
        let where_clause = filter.where_clause();
        let title_pattern = filter.title.as_deref().map(contains_pattern);

        // Count total
        let count_q = format!("SELECT COUNT(*) FROM books {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_q);
        if let Some(ref pattern) = title_pattern {
            count_builder = count_builder.bind(pattern);
        }
        if let Some(ref ids) = filter.author_ids {
            count_builder = count_builder.bind(ids);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        // Fetch rows, byte-wise title order
        let next = filter.param_count() + 1;
        let select_q = format!(
            r#"SELECT {} FROM books {} ORDER BY title COLLATE "C" ASC, id LIMIT ${} OFFSET ${}"#,
            BOOK_COLUMNS,
            where_clause,
            next,
            next + 1
        );
        let mut builder = sqlx::query_as::<_, BookRecord>(&select_q);
        if let Some(ref pattern) = title_pattern {
            builder = builder.bind(pattern);
        }
        if let Some(ref ids) = filter.author_ids {
            builder = builder.bind(ids);
        }
        let rows = builder
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((rows, total))
    }

    /// Insert a book. A concurrent insert of the same title surfaces as a
    /// conflict through the unique index.
    pub async fn create(&self, data: &NewBook) -> AppResult<BookRecord> {
        let query = format!(
            "INSERT INTO books (id, title, genre, published_at, author_id) VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            BOOK_COLUMNS
        );
        sqlx::query_as::<_, BookRecord>(&query)
            .bind(Uuid::new_v4())
            .bind(&data.title)
            .bind(&data.genre)
            .bind(&data.published_at)
            .bind(data.author_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_title_conflict)
    }

    /// Apply `changes` and return the updated row, `None` if no book has `id`
    pub async fn update(&self, id: Uuid, changes: &BookChanges) -> AppResult<Option<BookRecord>> {
        if changes.is_empty() {
            return self.get_by_id(id).await;
        }

        let mut sets = Vec::new();
        let mut idx = 1;

        macro_rules! add_f {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, idx));
                    idx += 1;
                }
            };
        }

        add_f!(changes.title, "title");
        add_f!(changes.genre, "genre");
        add_f!(changes.published_at, "published_at");
        add_f!(changes.author_id, "author_id");

        let query = format!(
            "UPDATE books SET {} WHERE id = ${} RETURNING {}",
            sets.join(", "),
            idx,
            BOOK_COLUMNS
        );

        let mut builder = sqlx::query_as::<_, BookRecord>(&query);

        macro_rules! bind_f {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_f!(changes.title);
        bind_f!(changes.genre);
        bind_f!(changes.published_at);
        bind_f!(changes.author_id);

        builder
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_title_conflict)
    }

    /// Delete a book, returning whether it existed
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn map_title_conflict(e: sqlx::Error) -> AppError {
    if is_unique_violation(&e) {
        AppError::Conflict("Book title already exists".to_string())
    } else {
        AppError::Database(e)
    }
}
