//! Authors service

use std::sync::Arc;

use crate::{
    config::StorageConfig,
    error::{AppError, AppResult},
    models::{
        author::{Author, CreateAuthor, NewAuthor},
        date::normalize_date,
    },
    repository::Repository,
};

use super::images::{check_upload, store_profile_picture, ImageStore, ImageUpload};

#[derive(Clone)]
pub struct AuthorsService {
    repository: Repository,
    images: Arc<dyn ImageStore>,
    storage_config: StorageConfig,
}

impl AuthorsService {
    pub fn new(
        repository: Repository,
        images: Arc<dyn ImageStore>,
        storage_config: StorageConfig,
    ) -> Self {
        Self {
            repository,
            images,
            storage_config,
        }
    }

    /// Create an author, uploading the profile picture if one was sent.
    ///
    /// The name check and the insert are separate statements; two concurrent
    /// requests for the same name both pass the check and the unique index
    /// turns the second insert into the same conflict.
    pub async fn create(
        &self,
        data: CreateAuthor,
        picture: Option<ImageUpload>,
    ) -> AppResult<Author> {
        self.create_inner(data, picture)
            .await
            .map_err(AppError::reject_store_failure)
    }

    async fn create_inner(
        &self,
        data: CreateAuthor,
        picture: Option<ImageUpload>,
    ) -> AppResult<Author> {
        let dob = data.dob.as_deref().ok_or_else(|| {
            AppError::Validation("Date of birth is required in YYYY-MM-DD format".to_string())
        })?;
        let dob = normalize_date(dob).ok_or_else(|| {
            AppError::Validation("Date of birth must be in YYYY-MM-DD format".to_string())
        })?;

        let name = data.name.as_deref().unwrap_or_default().trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation("\"name\" is required".to_string()));
        }

        if self.repository.authors.find_by_name(&name).await?.is_some() {
            return Err(AppError::Conflict("Author name already exists".to_string()));
        }

        if let Some(ref upload) = picture {
            check_upload(upload, &self.storage_config)?;
        }
        let profile_pic = store_profile_picture(self.images.as_ref(), picture).await?;

        let author = self
            .repository
            .authors
            .create(&NewAuthor {
                name,
                bio: data.bio.unwrap_or_default(),
                dob,
                profile_pic,
            })
            .await?;

        tracing::info!(author_id = %author.id, name = %author.name, "author created");
        Ok(author)
    }

    /// List authors, filtered by a case-insensitive name substring when
    /// `search` is non-blank
    pub async fn list(&self, search: Option<&str>) -> AppResult<Vec<Author>> {
        let term = search.map(str::trim).filter(|s| !s.is_empty());
        self.repository.authors.search(term).await
    }
}
