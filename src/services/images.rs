//! Remote storage for author profile pictures

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::{Digest, Sha1};

use crate::{
    config::StorageConfig,
    error::{AppError, AppResult},
};

/// A file received with a request, not yet stored
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl ImageUpload {
    /// Lowercased file extension, if any
    pub fn extension(&self) -> Option<String> {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
    }

    /// Format derived from the extension, falling back to the content type
    /// (`image/svg+xml` -> `svg`)
    pub fn format(&self) -> Option<String> {
        self.extension().or_else(|| {
            self.content_type.as_deref().and_then(|ct| {
                ct.strip_prefix("image/")
                    .map(|sub| sub.split('+').next().unwrap_or(sub).to_ascii_lowercase())
            })
        })
    }
}

/// Reject uploads the remote store would not accept
pub fn check_upload(upload: &ImageUpload, config: &StorageConfig) -> AppResult<()> {
    if upload.data.len() > config.max_file_size {
        return Err(AppError::Upload(format!(
            "File size should not exceed {}MB!",
            config.max_file_size / (1024 * 1024)
        )));
    }

    let allowed = upload
        .format()
        .is_some_and(|f| config.allowed_formats.iter().any(|a| a.eq_ignore_ascii_case(&f)));
    if !allowed {
        return Err(AppError::Upload(format!(
            "Image format not allowed, expected one of: {}",
            config.allowed_formats.join(", ")
        )));
    }

    Ok(())
}

/// Store for uploaded images, returning a durable reference URL
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn upload(&self, upload: ImageUpload) -> AppResult<String>;
}

/// Cloudinary signed uploads
#[derive(Clone)]
pub struct CloudinaryStore {
    client: reqwest::Client,
    config: StorageConfig,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Deserialize)]
struct UploadErrorResponse {
    error: UploadErrorMessage,
}

#[derive(Deserialize)]
struct UploadErrorMessage {
    message: String,
}

impl CloudinaryStore {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl ImageStore for CloudinaryStore {
    async fn upload(&self, upload: ImageUpload) -> AppResult<String> {
        let (Some(cloud_name), Some(api_key), Some(api_secret)) = (
            self.config.cloud_name.as_deref(),
            self.config.api_key.as_deref(),
            self.config.api_secret.as_deref(),
        ) else {
            return Err(AppError::Internal("Image storage is not configured".to_string()));
        };

        let timestamp = chrono::Utc::now().timestamp().to_string();
        let allowed_formats = self.config.allowed_formats.join(",");
        let params = [
            ("allowed_formats", allowed_formats.as_str()),
            ("folder", self.config.folder.as_str()),
            ("timestamp", timestamp.as_str()),
        ];
        let signature = sign_params(&params, api_secret);

        let mut part = Part::bytes(upload.data).file_name(upload.file_name.clone());
        if let Some(ref content_type) = upload.content_type {
            part = part
                .mime_str(content_type)
                .map_err(|e| AppError::Upload(format!("Invalid content type: {}", e)))?;
        }

        let mut form = Form::new()
            .part("file", part)
            .text("api_key", api_key.to_string())
            .text("signature", signature);
        for (key, value) in params {
            form = form.text(key, value.to_string());
        }

        let url = format!(
            "{}/{}/auto/upload",
            self.config.upload_url.trim_end_matches('/'),
            cloud_name
        );
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Image upload failed: {}", e)))?;

        let status = response.status();
        if status.is_client_error() {
            // The store rejected the file itself (format, corruption)
            let message = response
                .json::<UploadErrorResponse>()
                .await
                .map(|body| body.error.message)
                .unwrap_or_else(|_| format!("Image upload rejected ({})", status));
            return Err(AppError::Upload(message));
        }
        if !status.is_success() {
            return Err(AppError::Internal(format!("Image upload failed with status {}", status)));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("Invalid image upload response: {}", e)))?;

        tracing::info!(file = %upload.file_name, url = %body.secure_url, "profile picture uploaded");
        Ok(body.secure_url)
    }
}

/// Signature of an upload request: parameters sorted by name, joined as
/// `k=v` with `&`, secret appended, SHA-1 in lowercase hex.
pub fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Upload the picture if one was sent, the stored reference is empty otherwise
pub async fn store_profile_picture(
    store: &dyn ImageStore,
    upload: Option<ImageUpload>,
) -> AppResult<String> {
    match upload {
        Some(upload) => store.upload(upload).await,
        None => Ok(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, content_type: Option<&str>, size: usize) -> ImageUpload {
        ImageUpload {
            file_name: name.to_string(),
            content_type: content_type.map(str::to_string),
            data: vec![0; size],
        }
    }

    #[test]
    fn test_sign_params() {
        // Reference values from the Cloudinary signing documentation
        let signature = sign_params(
            &[
                ("timestamp", "1315060510"),
                ("public_id", "sample_image"),
                ("eager", "w_400,h_300,c_pad|w_260,h_200,c_crop"),
            ],
            "abcd",
        );
        assert_eq!(signature, "bfd09f95f331f558cbd1320e67aa8d488770583e");
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(upload("me.PNG", None, 1).format().as_deref(), Some("png"));
        assert_eq!(
            upload("blob", Some("image/svg+xml"), 1).format().as_deref(),
            Some("svg")
        );
        assert_eq!(upload("blob", None, 1).format(), None);
        assert_eq!(upload("trailing.", None, 1).format(), None);
    }

    #[test]
    fn test_check_upload() {
        let config = StorageConfig::default();
        assert!(check_upload(&upload("me.jpg", None, 10), &config).is_ok());
        assert!(check_upload(&upload("me.jpeg", Some("image/jpeg"), 10), &config).is_ok());

        let err = check_upload(&upload("me.gif", None, 10), &config).unwrap_err();
        assert!(matches!(err, AppError::Upload(_)));
    }

    #[test]
    fn test_check_upload_size() {
        let config = StorageConfig {
            max_file_size: 24 * 1024 * 1024,
            ..StorageConfig::default()
        };
        let err = check_upload(&upload("me.png", None, 24 * 1024 * 1024 + 1), &config).unwrap_err();
        assert_eq!(err.to_string(), "File size should not exceed 24MB!");
    }

    #[tokio::test]
    async fn test_no_file_skips_store() {
        let mut store = MockImageStore::new();
        store.expect_upload().never();
        let reference = store_profile_picture(&store, None).await.unwrap();
        assert_eq!(reference, "");
    }

    #[tokio::test]
    async fn test_file_is_uploaded() {
        let mut store = MockImageStore::new();
        store
            .expect_upload()
            .withf(|u| u.file_name == "me.png")
            .times(1)
            .returning(|_| Ok("https://res.example.com/me.png".to_string()));
        let reference = store_profile_picture(&store, Some(upload("me.png", None, 4)))
            .await
            .unwrap();
        assert_eq!(reference, "https://res.example.com/me.png");
    }

    #[tokio::test]
    async fn test_unconfigured_store_fails() {
        let store = CloudinaryStore::new(StorageConfig::default());
        let err = store.upload(upload("me.png", None, 4)).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
