//! Media service: uploads and releases assets on the storage backend.

use std::sync::Arc;

use tracing::{debug, warn};
use vidtube_common::{
    AppError, AppResult, MediaKind, StorageBackend, UploadedFile, generate_storage_key,
};

/// A file received from a client.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Media service.
#[derive(Clone)]
pub struct MediaService {
    storage: Arc<dyn StorageBackend>,
}

impl MediaService {
    /// Create a new media service.
    #[must_use]
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    /// Store `file` as an asset of `kind` owned by `owner_id`.
    pub async fn upload(
        &self,
        kind: MediaKind,
        owner_id: &str,
        file: &MediaUpload,
    ) -> AppResult<UploadedFile> {
        if !kind.accepts(&file.content_type) {
            return Err(AppError::invalid(format!(
                "{}: unsupported content type {}",
                kind.field_name(),
                file.content_type
            )));
        }
        if file.data.is_empty() {
            return Err(AppError::invalid(format!(
                "{}: file is empty",
                kind.field_name()
            )));
        }

        let key = generate_storage_key(kind, owner_id, &file.file_name);
        let uploaded = self
            .storage
            .upload(&key, &file.data, &file.content_type)
            .await?;

        debug!(key = %uploaded.key, size = uploaded.size, "Stored media asset");
        Ok(uploaded)
    }

    /// Delete the asset behind `url`.
    ///
    /// URLs this backend did not produce are skipped.
    pub async fn delete_url(&self, url: &str) -> AppResult<()> {
        let Some(key) = self.storage.key_from_url(url) else {
            warn!(url, "Media URL does not belong to the storage backend");
            return Ok(());
        };
        self.storage.delete(&key).await
    }

    /// Delete the asset behind `url`, logging instead of failing.
    pub async fn discard(&self, url: &str) {
        if let Err(e) = self.delete_url(url).await {
            warn!(url, error = %e, "Failed to discard media asset");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use vidtube_common::{MemoryStorage, StorageOp};

    fn png() -> MediaUpload {
        MediaUpload {
            file_name: "thumb.PNG".to_string(),
            content_type: "image/png".to_string(),
            data: vec![1, 2, 3],
        }
    }

    #[tokio::test]
    async fn test_upload_and_delete() {
        let storage = Arc::new(MemoryStorage::default());
        let service = MediaService::new(storage.clone());

        let uploaded = service
            .upload(MediaKind::Thumbnail, "u1", &png())
            .await
            .unwrap();
        assert!(uploaded.key.starts_with("thumbnails/u1/"));
        assert!(uploaded.key.ends_with(".png"));

        service.delete_url(&uploaded.url).await.unwrap();
        assert_eq!(
            storage.ops(),
            vec![
                StorageOp::Upload(uploaded.key.clone()),
                StorageOp::Delete(uploaded.key),
            ]
        );
    }

    #[tokio::test]
    async fn test_upload_rejects_wrong_content_type() {
        let storage = Arc::new(MemoryStorage::default());
        let service = MediaService::new(storage.clone());

        let err = service
            .upload(MediaKind::Video, "u1", &png())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(storage.upload_count(), 0);
    }

    #[tokio::test]
    async fn test_upload_rejects_empty_file() {
        let service = MediaService::new(Arc::new(MemoryStorage::default()));
        let mut file = png();
        file.data.clear();

        let err = service
            .upload(MediaKind::Avatar, "u1", &file)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete_foreign_url_is_skipped() {
        let storage = Arc::new(MemoryStorage::default());
        let service = MediaService::new(storage.clone());

        service
            .delete_url("https://elsewhere.example/a.png")
            .await
            .unwrap();
        assert!(storage.ops().is_empty());
    }
}
