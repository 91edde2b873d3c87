//! Object storage abstraction for media uploads.
//!
//! Supports local filesystem, in-memory and S3-compatible object storage.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Deserialize;

use crate::{AppError, AppResult};

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Local filesystem storage.
    Local {
        /// Base path for stored files.
        base_path: PathBuf,
        /// Base URL for serving files.
        base_url: String,
    },
    /// Process memory. Contents are lost on restart.
    Memory {
        /// Base URL reported for stored files.
        #[serde(default = "default_memory_url")]
        base_url: String,
    },
    /// S3-compatible object storage.
    S3 {
        /// S3 endpoint URL (e.g., "<https://s3.amazonaws.com>" or `MinIO` URL).
        endpoint: String,
        /// S3 bucket name.
        bucket: String,
        /// AWS region.
        region: String,
        /// Access key ID.
        access_key_id: String,
        /// Secret access key.
        secret_access_key: String,
        /// Public URL prefix for serving files.
        #[serde(default)]
        public_url: Option<String>,
        /// Path prefix within the bucket.
        #[serde(default)]
        prefix: Option<String>,
    },
}

fn default_memory_url() -> String {
    "memory://media".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Local {
            base_path: PathBuf::from("./media"),
            base_url: "/media".to_string(),
        }
    }
}

/// Kind of media asset. Decides the key prefix and accepted content types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// Video file.
    Video,
    /// Video thumbnail.
    Thumbnail,
    /// User avatar.
    Avatar,
    /// Channel cover image.
    CoverImage,
}

impl MediaKind {
    /// Key prefix for this kind of asset.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Video => "videos",
            Self::Thumbnail => "thumbnails",
            Self::Avatar => "avatars",
            Self::CoverImage => "covers",
        }
    }

    /// Multipart field name this asset is uploaded under.
    #[must_use]
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::Video => "videoFile",
            Self::Thumbnail => "thumbnail",
            Self::Avatar => "avatar",
            Self::CoverImage => "coverImage",
        }
    }

    /// Whether a file of `content_type` may be stored as this kind.
    #[must_use]
    pub fn accepts(self, content_type: &str) -> bool {
        let content_type = content_type.trim().to_ascii_lowercase();
        match self {
            Self::Video => content_type.starts_with("video/"),
            Self::Thumbnail | Self::Avatar | Self::CoverImage => {
                content_type.starts_with("image/")
            }
        }
    }
}

/// Uploaded file metadata.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Storage key (path or object key).
    pub key: String,
    /// Public URL to access the file.
    pub url: String,
    /// File size in bytes.
    pub size: u64,
    /// MIME content type.
    pub content_type: String,
    /// MD5 hash of the file.
    pub md5: String,
}

/// Storage backend trait.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Upload a file.
    async fn upload(&self, key: &str, data: &[u8], content_type: &str)
    -> AppResult<UploadedFile>;

    /// Delete a file. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Get the public URL for a key.
    fn public_url(&self, key: &str) -> String;

    /// Recover the key from a URL produced by [`StorageBackend::public_url`].
    fn key_from_url(&self, url: &str) -> Option<String>;

    /// Check if a file exists.
    async fn exists(&self, key: &str) -> AppResult<bool>;
}

/// Strips `base` and the joining slash from `url`.
fn strip_base(url: &str, base: &str) -> Option<String> {
    url.strip_prefix(base.trim_end_matches('/'))
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|key| !key.is_empty())
        .map(ToString::to_string)
}

fn md5_hex(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}

/// Local filesystem storage backend.
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new local storage backend.
    #[must_use]
    pub const fn new(base_path: PathBuf, base_url: String) -> Self {
        Self {
            base_path,
            base_url,
        }
    }

    fn path_for(&self, key: &str) -> AppResult<PathBuf> {
        if key.split('/').any(|part| part.is_empty() || part == "..") {
            return Err(AppError::Storage(format!("Invalid storage key: {key}")));
        }
        Ok(self.base_path.join(key))
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn upload(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> AppResult<UploadedFile> {
        let path = self.path_for(key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create directory: {e}")))?;
        }

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write file: {e}")))?;

        Ok(UploadedFile {
            key: key.to_string(),
            url: self.public_url(key),
            size: data.len() as u64,
            content_type: content_type.to_string(),
            md5: md5_hex(data),
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!("Failed to delete file: {e}"))),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    fn key_from_url(&self, url: &str) -> Option<String> {
        strip_base(url, &self.base_url)
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let path = self.path_for(key)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to stat file: {e}")))
    }
}

/// A storage operation recorded by [`MemoryStorage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageOp {
    /// A file was uploaded under this key.
    Upload(String),
    /// This key was deleted.
    Delete(String),
}

#[derive(Default)]
struct MemoryState {
    files: BTreeMap<String, Vec<u8>>,
    ops: Vec<StorageOp>,
    fail_uploads: bool,
}

/// In-memory storage backend that records every operation.
pub struct MemoryStorage {
    base_url: String,
    state: Mutex<MemoryState>,
}

impl MemoryStorage {
    /// Create an empty in-memory backend.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            state: Mutex::new(MemoryState::default()),
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MemoryState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Make every following upload fail with a storage error.
    pub fn fail_uploads(&self, fail: bool) {
        self.with_state(|state| state.fail_uploads = fail);
    }

    /// Operations performed so far, oldest first.
    #[must_use]
    pub fn ops(&self) -> Vec<StorageOp> {
        self.with_state(|state| state.ops.clone())
    }

    /// Number of uploads performed so far.
    #[must_use]
    pub fn upload_count(&self) -> usize {
        self.ops()
            .iter()
            .filter(|op| matches!(op, StorageOp::Upload(_)))
            .count()
    }

    /// Keys deleted so far, oldest first.
    #[must_use]
    pub fn deleted_keys(&self) -> Vec<String> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                StorageOp::Delete(key) => Some(key),
                StorageOp::Upload(_) => None,
            })
            .collect()
    }

    /// Store a file directly, without recording an upload.
    pub fn insert(&self, key: &str, data: &[u8]) -> String {
        self.with_state(|state| state.files.insert(key.to_string(), data.to_vec()));
        self.public_url(key)
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new(default_memory_url())
    }
}

#[async_trait::async_trait]
impl StorageBackend for MemoryStorage {
    async fn upload(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> AppResult<UploadedFile> {
        self.with_state(|state| {
            if state.fail_uploads {
                return Err(AppError::Storage("Upload rejected".to_string()));
            }
            state.files.insert(key.to_string(), data.to_vec());
            state.ops.push(StorageOp::Upload(key.to_string()));
            Ok(())
        })?;

        Ok(UploadedFile {
            key: key.to_string(),
            url: self.public_url(key),
            size: data.len() as u64,
            content_type: content_type.to_string(),
            md5: md5_hex(data),
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.with_state(|state| {
            state.files.remove(key);
            state.ops.push(StorageOp::Delete(key.to_string()));
        });
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    fn key_from_url(&self, url: &str) -> Option<String> {
        strip_base(url, &self.base_url)
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.with_state(|state| state.files.contains_key(key)))
    }
}

/// S3-compatible object storage backend.
#[cfg(feature = "s3")]
pub struct S3Storage {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_url: Option<String>,
    prefix: Option<String>,
}

#[cfg(feature = "s3")]
impl S3Storage {
    /// Create a new S3 storage backend.
    #[must_use]
    pub fn new(
        endpoint: &str,
        bucket: String,
        region: &str,
        access_key_id: &str,
        secret_access_key: &str,
        public_url: Option<String>,
        prefix: Option<String>,
    ) -> Self {
        use aws_config::Region;
        use aws_sdk_s3::config::Credentials;

        let credentials =
            Credentials::new(access_key_id, secret_access_key, None, None, "vidtube");

        let config = aws_sdk_s3::Config::builder()
            .endpoint_url(endpoint)
            .region(Region::new(region.to_string()))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: aws_sdk_s3::Client::from_conf(config),
            bucket,
            public_url,
            prefix,
        }
    }

    fn full_key(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}/{}", prefix.trim_end_matches('/'), key),
            None => key.to_string(),
        }
    }

    fn url_base(&self) -> String {
        match &self.public_url {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!("https://{}.s3.amazonaws.com", self.bucket),
        }
    }
}

#[cfg(feature = "s3")]
#[async_trait::async_trait]
impl StorageBackend for S3Storage {
    async fn upload(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> AppResult<UploadedFile> {
        use aws_sdk_s3::primitives::ByteStream;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(self.full_key(key))
            .body(ByteStream::from(data.to_vec()))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 upload failed: {e}")))?;

        Ok(UploadedFile {
            key: key.to_string(),
            url: self.public_url(key),
            size: data.len() as u64,
            content_type: content_type.to_string(),
            md5: md5_hex(data),
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(self.full_key(key))
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 delete failed: {e}")))?;

        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.url_base(), self.full_key(key))
    }

    fn key_from_url(&self, url: &str) -> Option<String> {
        let full_key = strip_base(url, &self.url_base())?;
        match &self.prefix {
            Some(prefix) => strip_base(&full_key, prefix),
            None => Some(full_key),
        }
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(self.full_key(key))
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                let not_found = e
                    .as_service_error()
                    .is_some_and(aws_sdk_s3::operation::head_object::HeadObjectError::is_not_found);
                if not_found {
                    Ok(false)
                } else {
                    Err(AppError::Storage(format!("S3 head_object failed: {e}")))
                }
            }
        }
    }
}

/// Build the storage backend selected by `config`.
pub fn build_storage(config: &StorageConfig) -> AppResult<Arc<dyn StorageBackend>> {
    match config {
        StorageConfig::Local {
            base_path,
            base_url,
        } => Ok(Arc::new(LocalStorage::new(
            base_path.clone(),
            base_url.clone(),
        ))),
        StorageConfig::Memory { base_url } => Ok(Arc::new(MemoryStorage::new(base_url.clone()))),
        #[cfg(feature = "s3")]
        StorageConfig::S3 {
            endpoint,
            bucket,
            region,
            access_key_id,
            secret_access_key,
            public_url,
            prefix,
        } => Ok(Arc::new(S3Storage::new(
            endpoint,
            bucket.clone(),
            region,
            access_key_id,
            secret_access_key,
            public_url.clone(),
            prefix.clone(),
        ))),
        #[cfg(not(feature = "s3"))]
        StorageConfig::S3 { .. } => Err(AppError::Config(
            "S3 storage backend not available (s3 feature not enabled)".to_string(),
        )),
    }
}

/// Generate a unique storage key for an asset.
///
/// Keys look like `videos/{owner_id}/2026/01/31/{millis}_{uuid}.mp4`.
#[must_use]
pub fn generate_storage_key(kind: MediaKind, owner_id: &str, original_name: &str) -> String {
    use chrono::Utc;

    let now = Utc::now();
    let date_path = now.format("%Y/%m/%d").to_string();
    let timestamp = now.timestamp_millis();

    let extension = original_name
        .rfind('.')
        .filter(|&pos| pos > 0 && pos < original_name.len() - 1)
        .map(|pos| &original_name[pos + 1..])
        .filter(|ext| ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map_or_else(|| "bin".to_string(), str::to_ascii_lowercase);

    format!(
        "{}/{}/{}/{}_{}.{}",
        kind.prefix(),
        owner_id,
        date_path,
        timestamp,
        uuid::Uuid::new_v4().simple(),
        extension
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_storage_key() {
        let key = generate_storage_key(MediaKind::Video, "user123", "Holiday.MP4");
        assert!(key.starts_with("videos/user123/"));
        assert!(key.ends_with(".mp4"));
    }

    #[test]
    fn test_generate_storage_key_no_extension() {
        let key = generate_storage_key(MediaKind::Avatar, "user123", "file");
        assert!(key.starts_with("avatars/"));
        assert!(key.ends_with(".bin"));
    }

    #[test]
    fn test_media_kind_content_types() {
        assert!(MediaKind::Video.accepts("video/mp4"));
        assert!(!MediaKind::Video.accepts("image/png"));
        assert!(MediaKind::Thumbnail.accepts("image/jpeg"));
        assert!(MediaKind::CoverImage.accepts("IMAGE/WEBP"));
        assert!(!MediaKind::Avatar.accepts("application/octet-stream"));
    }

    #[tokio::test]
    async fn test_local_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(
            dir.path().to_path_buf(),
            "http://localhost:8000/media/".to_string(),
        );

        let uploaded = storage
            .upload("thumbnails/u1/a.png", b"png-bytes", "image/png")
            .await
            .unwrap();
        assert_eq!(uploaded.url, "http://localhost:8000/media/thumbnails/u1/a.png");
        assert_eq!(uploaded.size, 9);
        assert!(storage.exists("thumbnails/u1/a.png").await.unwrap());

        let key = storage.key_from_url(&uploaded.url).unwrap();
        assert_eq!(key, "thumbnails/u1/a.png");

        storage.delete(&key).await.unwrap();
        assert!(!storage.exists(&key).await.unwrap());
        // Deleting again is not an error.
        storage.delete(&key).await.unwrap();
    }

    #[tokio::test]
    async fn test_local_storage_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().to_path_buf(), "/media".to_string());

        let err = storage
            .upload("../escape.txt", b"x", "text/plain")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
    }

    #[tokio::test]
    async fn test_memory_storage_records_operations() {
        let storage = MemoryStorage::default();
        let uploaded = storage.upload("videos/u1/a.mp4", b"v", "video/mp4").await.unwrap();
        storage.delete("videos/u1/a.mp4").await.unwrap();

        assert_eq!(uploaded.url, "memory://media/videos/u1/a.mp4");
        assert_eq!(storage.upload_count(), 1);
        assert_eq!(storage.deleted_keys(), vec!["videos/u1/a.mp4".to_string()]);
    }

    #[test]
    fn test_key_from_foreign_url() {
        let storage = MemoryStorage::default();
        assert_eq!(storage.key_from_url("https://elsewhere.example/a.png"), None);
        assert_eq!(storage.key_from_url("memory://media/"), None);
    }

    #[test]
    fn test_build_storage_from_config() {
        let config = StorageConfig::Memory {
            base_url: "memory://test".to_string(),
        };
        let storage = build_storage(&config).unwrap();
        assert_eq!(storage.public_url("a/b.png"), "memory://test/a/b.png");
    }
}
