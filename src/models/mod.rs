//! Data models for the catalog

pub mod author;
pub mod book;
pub mod date;
pub mod pagination;

// Re-export commonly used types
pub use author::{Author, AuthorQuery, CreateAuthor};
pub use book::{Book, BookQuery, BookRecord, CreateBook, UpdateBook};
pub use pagination::{PageRequest, Pagination};
