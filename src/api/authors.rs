//! Author endpoints

use axum::{
    async_trait,
    extract::{FromRequest, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::Multipart;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::author::{Author, AuthorQuery, CreateAuthor},
    services::images::ImageUpload,
    AppState,
};

use super::{ValidatedQuery, ValidationRejection};

const PICTURE_FIELD: &str = "profilePic";

/// Author creation input: text fields plus an optional picture file.
/// Accepts `multipart/form-data` or a JSON body without a file.
pub struct AuthorSubmission {
    pub data: CreateAuthor,
    pub picture: Option<ImageUpload>,
}

#[async_trait]
impl FromRequest<AppState> for AuthorSubmission {
    type Rejection = Response;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        let submission = if is_multipart {
            read_form(req, state).await?
        } else {
            let Json(data) = Json::<CreateAuthor>::from_request(req, state)
                .await
                .map_err(|e| ValidationRejection::from_serde("body", e.body_text()).into_response())?;
            Self {
                data,
                picture: None,
            }
        };

        submission
            .data
            .validate()
            .map_err(|e| ValidationRejection::from_errors("body", &e).into_response())?;
        Ok(submission)
    }
}

async fn read_form(req: Request, state: &AppState) -> Result<AuthorSubmission, Response> {
    let too_large = || {
        AppError::Upload(format!(
            "File size should not exceed {}MB!",
            state.config.storage.max_file_size / (1024 * 1024)
        ))
        .into_response()
    };
    let malformed = |message: String| {
        ValidationRejection::new("body", Vec::new(), message).into_response()
    };

    let mut multipart = Multipart::from_request(req, state)
        .await
        .map_err(|e| malformed(e.body_text()))?;

    let mut data = CreateAuthor::default();
    let mut picture = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            too_large()
        } else {
            malformed(e.body_text())
        }
    })? {
        let name = field.name().unwrap_or_default().to_string();

        if name == PICTURE_FIELD && field.file_name().is_some() {
            if picture.is_some() {
                return Err(ValidationRejection::new(
                    "body",
                    vec![name],
                    "\"profilePic\" accepts a single file",
                )
                .into_response());
            }
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await.map_err(|e| {
                if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    too_large()
                } else {
                    malformed(e.body_text())
                }
            })?;
            picture = Some(ImageUpload {
                file_name,
                content_type,
                data: bytes.to_vec(),
            });
            continue;
        }

        let value = field.text().await.map_err(|e| malformed(e.body_text()))?;
        match name.as_str() {
            "name" => data.name = Some(value),
            "bio" => data.bio = Some(value),
            "dob" => data.dob = Some(value),
            PICTURE_FIELD => data.profile_pic = Some(value),
            _ => {
                let message = format!("\"{}\" is not allowed", name);
                return Err(ValidationRejection::new("body", vec![name.clone()], message).into_response());
            }
        }
    }

    Ok(AuthorSubmission { data, picture })
}

/// Create an author
#[utoipa::path(
    post,
    path = "/newAuthor",
    tag = "authors",
    request_body(content = CreateAuthor, content_type = "multipart/form-data",
        description = "Author fields, with an optional `profilePic` image file"),
    responses(
        (status = 201, description = "Author created", body = Author),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 409, description = "Author name already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_author(
    State(state): State<AppState>,
    submission: AuthorSubmission,
) -> AppResult<(StatusCode, Json<Author>)> {
    let author = state
        .services
        .authors
        .create(submission.data, submission.picture)
        .await?;
    Ok((StatusCode::CREATED, Json(author)))
}

/// List authors, optionally searching by name
#[utoipa::path(
    get,
    path = "/authors",
    tag = "authors",
    params(AuthorQuery),
    responses(
        (status = 200, description = "Matching authors", body = Vec<Author>),
        (status = 500, description = "Datastore failure", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_authors(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<AuthorQuery>,
) -> AppResult<Json<Vec<Author>>> {
    let authors = state.services.authors.list(query.search.as_deref()).await?;
    Ok(Json(authors))
}
