//! HTTP surface: router, request validation and handlers

pub mod authors;
pub mod books;
pub mod health;
pub mod openapi;

use axum::{
    async_trait,
    extract::{DefaultBodyLimit, FromRequest, FromRequestParts, Query, Request},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{de::DeserializeOwned, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::AppState;

/// Plain-text banner served at `/`
pub const BANNER: &str = "🚀 Welcome to LibraryMangement BE APIS 🚀";

/// Slack on top of the file size cap for the other multipart fields
const FORM_OVERHEAD: usize = 1024 * 1024;

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = state.config.storage.max_file_size + FORM_OVERHEAD;

    let routes = Router::new()
        .route("/", get(root))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authors
        .route(
            "/newAuthor",
            post(authors::create_author).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/authors", get(authors::list_authors))
        // Books
        .route("/newBook", post(books::create_book))
        .route("/getBooks", get(books::list_books))
        .route("/editBook/:id", put(books::update_book))
        .route("/removeBook/:id", delete(books::delete_book))
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn root() -> &'static str {
    BANNER
}

/// Body of a schema validation failure
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationErrorResponse {
    pub status_code: u16,
    pub error: String,
    pub message: String,
    pub validation: ValidationDetails,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ValidationDetails {
    /// `body`, `query` or `params`
    pub source: String,
    pub keys: Vec<String>,
    pub message: String,
}

/// Request rejected before reaching its handler
#[derive(Debug)]
pub struct ValidationRejection {
    source: &'static str,
    keys: Vec<String>,
    message: String,
}

impl ValidationRejection {
    pub fn new(source: &'static str, keys: Vec<String>, message: impl Into<String>) -> Self {
        Self {
            source,
            keys,
            message: message.into(),
        }
    }

    pub fn from_errors(source: &'static str, errors: &ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let keys: Vec<String> = fields.iter().map(|(name, _)| camel_case(name)).collect();
        let message = fields
            .iter()
            .flat_map(|(name, errs)| {
                errs.iter().map(move |e| match e.message {
                    Some(ref m) => m.to_string(),
                    None => format!("\"{}\" is invalid ({})", camel_case(name), e.code),
                })
            })
            .collect::<Vec<_>>()
            .join(". ");

        Self::new(source, keys, message)
    }

    /// Rejection for input serde could not deserialize. Unknown and missing
    /// fields name the offending key.
    pub fn from_serde(source: &'static str, body_text: String) -> Self {
        if let Some(key) = quoted_field(&body_text, "unknown field `") {
            let message = format!("\"{}\" is not allowed", key);
            return Self::new(source, vec![key], message);
        }
        if let Some(key) = quoted_field(&body_text, "missing field `") {
            let message = format!("\"{}\" is required", key);
            return Self::new(source, vec![key], message);
        }
        Self::new(source, Vec::new(), body_text)
    }
}

/// Field name serde quotes after `marker`, e.g. ``unknown field `isbn` ``
fn quoted_field(text: &str, marker: &str) -> Option<String> {
    let rest = &text[text.find(marker)? + marker.len()..];
    let name = &rest[..rest.find('`')?];
    (!name.is_empty()).then(|| name.to_string())
}

impl IntoResponse for ValidationRejection {
    fn into_response(self) -> Response {
        tracing::warn!(
            source = self.source,
            keys = ?self.keys,
            message = %self.message,
            "request failed validation"
        );

        let status = StatusCode::BAD_REQUEST;
        let body = ValidationErrorResponse {
            status_code: status.as_u16(),
            error: "Bad Request".to_string(),
            message: self.message.clone(),
            validation: ValidationDetails {
                source: self.source.to_string(),
                keys: self.keys,
                message: self.message,
            },
        };
        (status, Json(body)).into_response()
    }
}

/// JSON body that has been deserialized and validated
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidationRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ValidationRejection::from_serde("body", e.body_text()))?;
        value
            .validate()
            .map_err(|e| ValidationRejection::from_errors("body", &e))?;
        Ok(Self(value))
    }
}

/// Query string that has been deserialized and validated
pub struct ValidatedQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidationRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| ValidationRejection::from_serde("query", e.body_text()))?;
        value
            .validate()
            .map_err(|e| ValidationRejection::from_errors("query", &e))?;
        Ok(Self(value))
    }
}

/// `published_at` -> `publishedAt`, matching the wire names
fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::book::BookQuery;

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("published_at"), "publishedAt");
        assert_eq!(camel_case("profile_pic"), "profilePic");
        assert_eq!(camel_case("title"), "title");
    }

    #[test]
    fn test_rejection_from_errors() {
        let query = BookQuery {
            limit: Some("80".to_string()),
            ..BookQuery::default()
        };
        let errors = query.validate().unwrap_err();
        let rejection = ValidationRejection::from_errors("query", &errors);
        assert_eq!(rejection.keys, vec!["limit".to_string()]);
        assert_eq!(rejection.message, "\"limit\" must be less than or equal to 50");
    }

    #[test]
    fn test_rejection_names_serde_fields() {
        let text = "Failed to deserialize the JSON body into the target type: \
                    unknown field `isbn`, expected one of `title`, `genre` at line 1 column 7";
        let rejection = ValidationRejection::from_serde("body", text.to_string());
        assert_eq!(rejection.keys, vec!["isbn".to_string()]);
        assert_eq!(rejection.message, "\"isbn\" is not allowed");

        let text = "Failed to deserialize the JSON body into the target type: \
                    missing field `publishedAt` at line 1 column 17";
        let rejection = ValidationRejection::from_serde("body", text.to_string());
        assert_eq!(rejection.keys, vec!["publishedAt".to_string()]);
        assert_eq!(rejection.message, "\"publishedAt\" is required");

        let rejection = ValidationRejection::from_serde("body", "EOF while parsing".to_string());
        assert!(rejection.keys.is_empty());
        assert_eq!(rejection.message, "EOF while parsing");
    }
}
