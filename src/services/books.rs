//! Books service

use std::collections::HashMap;

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        author::Author,
        book::{Book, BookQuery, BookRecord, CreateBook, UpdateBook},
        date::normalize_date,
        pagination::Pagination,
    },
    repository::{
        books::{BookChanges, BookFilter, NewBook},
        Repository,
    },
};

const TITLE_EXISTS: &str = "Book title already exists";
const INVALID_AUTHOR: &str = "Invalid author id";
const INVALID_PUBLISHED_AT: &str = "publishedAt must be in YYYY-MM-DD format";
const NOT_FOUND: &str = "Book not found";

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Create a book referencing an existing author
    pub async fn create(&self, data: CreateBook) -> AppResult<Book> {
        self.create_inner(data)
            .await
            .map_err(AppError::reject_store_failure)
    }

    async fn create_inner(&self, data: CreateBook) -> AppResult<Book> {
        let title = data.title.trim().to_string();
        if self.repository.books.find_by_title(&title, None).await?.is_some() {
            return Err(AppError::Conflict(TITLE_EXISTS.to_string()));
        }

        let author = self.resolve_author(&data.author).await?;

        let published_at = normalize_date(&data.published_at)
            .ok_or_else(|| AppError::Validation(INVALID_PUBLISHED_AT.to_string()))?;

        let genre = data.genre.trim().to_string();
        if title.is_empty() || genre.is_empty() {
            let field = if title.is_empty() { "title" } else { "genre" };
            return Err(AppError::Validation(format!("\"{}\" is required", field)));
        }

        let record = self
            .repository
            .books
            .create(&NewBook {
                title,
                genre,
                published_at,
                author_id: author.id,
            })
            .await?;

        tracing::info!(book_id = %record.id, title = %record.title, "book created");
        Ok(Book::populate(record, Some(author)))
    }

    /// Search books by title and/or author name with pagination
    pub async fn list(&self, query: &BookQuery) -> AppResult<(Vec<Book>, Pagination)> {
        self.list_inner(query)
            .await
            .map_err(AppError::reject_store_failure)
    }

    async fn list_inner(&self, query: &BookQuery) -> AppResult<(Vec<Book>, Pagination)> {
        let page = query.page_request();
        let mut filter = BookFilter {
            title: non_blank(query.title.as_deref()),
            author_ids: None,
        };

        if let Some(term) = non_blank(query.author.as_deref()) {
            let ids = self.repository.authors.ids_matching_name(&term).await?;
            if ids.is_empty() {
                return Ok((Vec::new(), page.pagination(0)));
            }
            filter.author_ids = Some(ids);
        }

        let (records, total) = self.repository.books.list(&filter, page).await?;
        let books = self.populate(records).await?;
        Ok((books, page.pagination(total)))
    }

    /// Partially update a book. Only fields present in `data` are touched.
    pub async fn update(&self, id: &str, data: UpdateBook) -> AppResult<Book> {
        self.update_inner(id, data)
            .await
            .map_err(AppError::reject_store_failure)
    }

    async fn update_inner(&self, id: &str, data: UpdateBook) -> AppResult<Book> {
        let id = parse_book_id(id)?;
        let mut changes = BookChanges::default();

        if let Some(title) = data.title {
            let trimmed = title.trim().to_string();
            // A blank title is stored as "" without the uniqueness check
            if !trimmed.is_empty()
                && self
                    .repository
                    .books
                    .find_by_title(&trimmed, Some(id))
                    .await?
                    .is_some()
            {
                return Err(AppError::Conflict(TITLE_EXISTS.to_string()));
            }
            changes.title = Some(trimmed);
        }

        if let Some(genre) = data.genre {
            changes.genre = Some(genre.trim().to_string());
        }

        if let Some(published_at) = data.published_at.filter(|s| !s.is_empty()) {
            let normalized = normalize_date(&published_at)
                .ok_or_else(|| AppError::Validation(INVALID_PUBLISHED_AT.to_string()))?;
            changes.published_at = Some(normalized);
        }

        let mut author = None;
        if let Some(author_id) = data.author.filter(|s| !s.is_empty()) {
            let resolved = self.resolve_author(&author_id).await?;
            changes.author_id = Some(resolved.id);
            author = Some(resolved);
        }

        let record = self
            .repository
            .books
            .update(id, &changes)
            .await?
            .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;

        let author = match author {
            Some(author) => Some(author),
            None => self.repository.authors.get_by_id(record.author_id).await?,
        };

        tracing::info!(book_id = %record.id, "book updated");
        Ok(Book::populate(record, author))
    }

    /// Delete a book
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let id = parse_book_id(id)?;
        let deleted = self
            .repository
            .books
            .delete(id)
            .await
            .map_err(AppError::reject_store_failure)?;
        if !deleted {
            return Err(AppError::NotFound(NOT_FOUND.to_string()));
        }
        tracing::info!(book_id = %id, "book deleted");
        Ok(())
    }

    async fn resolve_author(&self, raw_id: &str) -> AppResult<Author> {
        let id = Uuid::parse_str(raw_id.trim())
            .map_err(|_| AppError::InvalidReference(INVALID_AUTHOR.to_string()))?;
        self.repository
            .authors
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::InvalidReference(INVALID_AUTHOR.to_string()))
    }

    /// Embed the referenced authors, one lookup for the whole page
    async fn populate(&self, records: Vec<BookRecord>) -> AppResult<Vec<Book>> {
        let mut ids: Vec<Uuid> = records.iter().map(|r| r.author_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let authors: HashMap<Uuid, Author> = self
            .repository
            .authors
            .get_many(&ids)
            .await?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();

        Ok(records
            .into_iter()
            .map(|record| {
                let author = authors.get(&record.author_id).cloned();
                Book::populate(record, author)
            })
            .collect())
    }
}

/// A path id that is not a UUID cannot name an existing book
fn parse_book_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(NOT_FOUND.to_string()))
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(Some(" great ")), Some("great".to_string()));
    }

    #[test]
    fn test_malformed_book_id_is_not_found() {
        let err = parse_book_id("not-a-uuid").unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(err.to_string(), "Book not found");

        let id = Uuid::new_v4();
        assert_eq!(parse_book_id(&id.to_string()).unwrap(), id);
    }
}
