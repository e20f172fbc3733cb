//! Book model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::{
    author::Author,
    pagination::{parse_positive, PageRequest, MAX_LIMIT},
};

/// Book row as stored, with the bare author reference
#[derive(Debug, Clone, FromRow)]
pub struct BookRecord {
    pub id: Uuid,
    pub title: String,
    pub genre: String,
    pub published_at: String,
    pub author_id: Uuid,
}

/// Book as returned, with its author embedded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub genre: String,
    /// Publication date (YYYY-MM-DD)
    pub published_at: String,
    /// Referenced author, null if it no longer resolves
    pub author: Option<Author>,
}

impl Book {
    pub fn populate(record: BookRecord, author: Option<Author>) -> Self {
        Self {
            id: record.id,
            title: record.title,
            genre: record.genre,
            published_at: record.published_at,
            author,
        }
    }
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "\"title\" is not allowed to be empty"))]
    pub title: String,
    #[validate(length(min = 1, message = "\"genre\" is not allowed to be empty"))]
    pub genre: String,
    /// Publication date (YYYY-MM-DD, a time suffix is dropped)
    #[validate(length(min = 1, message = "\"publishedAt\" is not allowed to be empty"))]
    pub published_at: String,
    /// Author id
    #[validate(length(min = 1, message = "\"author\" is not allowed to be empty"))]
    pub author: String,
}

/// Partial book update; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateBook {
    pub title: Option<String>,
    pub genre: Option<String>,
    /// Empty string leaves the date unchanged
    pub published_at: Option<String>,
    /// Empty string leaves the author unchanged
    pub author: Option<String>,
}

/// Book list query
#[derive(Debug, Default, Deserialize, Validate, IntoParams, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct BookQuery {
    /// Case-insensitive substring of the title
    pub title: Option<String>,
    /// Case-insensitive substring of the author name
    pub author: Option<String>,
    /// Page number (1-based, default 1)
    pub page: Option<String>,
    /// Page size (1-50, default 10)
    #[validate(custom(function = "validate_limit"))]
    pub limit: Option<String>,
}

impl BookQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::from_raw(self.page.as_deref(), self.limit.as_deref())
    }
}

fn validate_limit(limit: &str) -> Result<(), ValidationError> {
    match parse_positive(Some(limit)) {
        Some(value) if value > MAX_LIMIT => {
            let mut err = ValidationError::new("range");
            err.message = Some("\"limit\" must be less than or equal to 50".into());
            Err(err)
        }
        _ => Ok(()),
    }
}
