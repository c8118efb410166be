//! Blob storage for evidence photos.
//!
//! Objects are written under a bucket directory and never overwritten: a
//! second upload to an existing key is rejected by the backend.

use std::path::{Path, PathBuf};

use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{AppError, AppResult, StorageSettings};

/// Uploaded file metadata.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Storage key inside the bucket.
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
    /// Upload a new object. Fails with [`AppError::UploadError`] if the key
    /// is already taken or the backend rejects the write.
    async fn upload(&self, key: &str, data: &[u8], content_type: &str)
    -> AppResult<UploadedFile>;

    /// Get the public URL for a key.
    fn public_url(&self, key: &str) -> String;

    /// Check if an object exists.
    async fn exists(&self, key: &str) -> AppResult<bool>;

    /// Read an object, refusing anything larger than `max_bytes`.
    async fn read(&self, key: &str, max_bytes: usize) -> AppResult<Vec<u8>>;

    /// The key behind one of this backend's public URLs.
    ///
    /// Returns `None` for foreign URLs and for keys that could escape the
    /// bucket.
    fn key_for_url(&self, url: &str) -> Option<String> {
        let key = url.strip_prefix(&self.public_url(""))?;
        let well_formed = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '/'))
            && key.split('/').all(|seg| !seg.is_empty() && seg != "." && seg != "..");
        well_formed.then(|| key.to_string())
    }
}

/// Local filesystem storage backend.
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
    bucket: String,
}

impl LocalStorage {
    /// Create a new local storage backend.
    #[must_use]
    pub const fn new(base_path: PathBuf, base_url: String, bucket: String) -> Self {
        Self {
            base_path,
            base_url,
            bucket,
        }
    }

    /// Create a backend from configuration.
    #[must_use]
    pub fn from_settings(settings: &StorageSettings) -> Self {
        Self::new(
            settings.base_path.clone(),
            settings.base_url.clone(),
            settings.bucket.clone(),
        )
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base_path.join(&self.bucket).join(key)
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
        let path = self.path_for(key);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::UploadError(format!("Failed to create directory: {e}")))?;
        }

        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::AlreadyExists {
                    AppError::UploadError(format!("Object already exists: {key}"))
                } else {
                    AppError::UploadError(format!("Failed to open object: {e}"))
                }
            })?;

        write_object(file, &path, data).await?;

        let md5 = format!("{:x}", md5::compute(data));

        tracing::debug!(key = %key, size = data.len(), "Stored object");

        Ok(UploadedFile {
            key: key.to_string(),
            url: self.public_url(key),
            size: data.len() as u64,
            content_type: content_type.to_string(),
            md5,
        })
    }

    fn public_url(&self, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.bucket,
            key
        )
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        tokio::fs::try_exists(self.path_for(key))
            .await
            .map_err(|e| AppError::BackendError(format!("Failed to stat object: {e}")))
    }

    async fn read(&self, key: &str, max_bytes: usize) -> AppResult<Vec<u8>> {
        let file = tokio::fs::File::open(self.path_for(key))
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    AppError::NotFound(format!("Object {key}"))
                } else {
                    AppError::BackendError(format!("Failed to open object: {e}"))
                }
            })?;

        let mut data = Vec::new();
        file.take(max_bytes as u64 + 1)
            .read_to_end(&mut data)
            .await
            .map_err(|e| AppError::BackendError(format!("Failed to read object: {e}")))?;
        if data.len() > max_bytes {
            return Err(AppError::ValidationFailed(format!(
                "Object {key} exceeds {max_bytes} bytes"
            )));
        }
        Ok(data)
    }
}

/// Write `data` into a freshly created object, removing it again if the
/// write does not complete.
async fn write_object<W: AsyncWrite + Unpin>(
    mut writer: W,
    path: &Path,
    data: &[u8],
) -> AppResult<()> {
    let written = match writer.write_all(data).await {
        Ok(()) => writer.flush().await,
        Err(e) => Err(e),
    };
    let Err(e) = written else {
        return Ok(());
    };

    drop(writer);
    if let Err(cleanup) = tokio::fs::remove_file(path).await {
        tracing::warn!(path = %path.display(), error = %cleanup, "Failed to remove partial object");
    }
    Err(AppError::UploadError(format!("Failed to write object: {e}")))
}

/// Build the storage key for a resolution photo:
/// `resolved/{report_id}_{timestamp_ms}_{file_name}`.
#[must_use]
pub fn evidence_key(report_id: &str, timestamp_ms: i64, file_name: &str) -> String {
    format!(
        "resolved/{}_{}_{}",
        sanitize_file_name(report_id),
        timestamp_ms,
        sanitize_file_name(file_name)
    )
}

/// Reduce a client-supplied name to a single safe path segment.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}
