//! Book endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppResult, MessageResponse},
    models::{
        book::{Book, BookQuery, CreateBook, UpdateBook},
        pagination::Pagination,
    },
    AppState,
};

use super::{ValidatedJson, ValidatedQuery};

/// Paginated books response
#[derive(Serialize, ToSchema)]
pub struct BookListResponse {
    pub data: Vec<Book>,
    pub pagination: Pagination,
}

/// Updated book with confirmation message
#[derive(Serialize, ToSchema)]
pub struct UpdateBookResponse {
    pub message: String,
    pub data: Book,
}

/// Create a book
#[utoipa::path(
    post,
    path = "/newBook",
    tag = "books",
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created with its author", body = Book),
        (status = 400, description = "Invalid fields or unknown author", body = crate::error::ErrorResponse),
        (status = 409, description = "Book title already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    ValidatedJson(data): ValidatedJson<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let book = state.services.books.create(data).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Search books by title or author name, paginated and sorted by title
#[utoipa::path(
    get,
    path = "/getBooks",
    tag = "books",
    params(BookQuery),
    responses(
        (status = 200, description = "One page of books", body = BookListResponse),
        (status = 400, description = "Malformed query", body = crate::api::ValidationErrorResponse)
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<BookQuery>,
) -> AppResult<Json<BookListResponse>> {
    let (data, pagination) = state.services.books.list(&query).await?;
    Ok(Json(BookListResponse { data, pagination }))
}

/// Update some fields of a book
#[utoipa::path(
    put,
    path = "/editBook/{id}",
    tag = "books",
    params(("id" = String, Path, description = "Book ID")),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = UpdateBookResponse),
        (status = 400, description = "Invalid field", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Book title already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(data): ValidatedJson<UpdateBook>,
) -> AppResult<Json<UpdateBookResponse>> {
    let book = state.services.books.update(&id, data).await?;
    Ok(Json(UpdateBookResponse {
        message: "Book updated successfully".to_string(),
        data: book,
    }))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/removeBook/{id}",
    tag = "books",
    params(("id" = String, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book deleted", body = MessageResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.services.books.delete(&id).await?;
    Ok(Json(MessageResponse {
        message: "Book deleted successfully".to_string(),
    }))
}
