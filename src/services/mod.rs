//! Business logic services

pub mod authors;
pub mod books;
pub mod images;

use std::sync::Arc;

use crate::{config::StorageConfig, repository::Repository};

use self::images::ImageStore;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub authors: authors::AuthorsService,
    pub books: books::BooksService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository and image store
    pub fn new(
        repository: Repository,
        images: Arc<dyn ImageStore>,
        storage_config: StorageConfig,
    ) -> Self {
        Self {
            authors: authors::AuthorsService::new(repository.clone(), images, storage_config),
            books: books::BooksService::new(repository.clone()),
            repository,
        }
    }

    /// Check that the datastore answers
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        self.repository.ping().await
    }
}
