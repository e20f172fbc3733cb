//! Author model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Author record as stored and returned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub bio: String,
    /// Date of birth (YYYY-MM-DD)
    pub dob: String,
    /// URL of the uploaded profile picture, empty when none was given
    pub profile_pic: String,
}

/// Create author request (multipart form fields or JSON body)
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateAuthor {
    #[validate(
        required(message = "\"name\" is required"),
        length(min = 1, message = "\"name\" is not allowed to be empty")
    )]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "\"bio\" is not allowed to be empty"))]
    pub bio: Option<String>,
    /// Date of birth (YYYY-MM-DD, a time suffix is dropped)
    #[validate(
        required(message = "\"dob\" is required"),
        length(min = 1, message = "\"dob\" is not allowed to be empty")
    )]
    pub dob: Option<String>,
    /// Accepted for form compatibility; the stored value comes from the uploaded file
    pub profile_pic: Option<String>,
}

/// Author list query
#[derive(Debug, Default, Deserialize, Validate, IntoParams, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct AuthorQuery {
    /// Case-insensitive substring of the author name
    pub search: Option<String>,
}

/// Fields persisted for a new author
#[derive(Debug, Clone)]
pub struct NewAuthor {
    pub name: String,
    pub bio: String,
    pub dob: String,
    pub profile_pic: String,
}
