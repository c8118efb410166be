//! Evidence photo uploads.

use std::sync::Arc;

use ripple_common::{AppError, AppResult, StorageBackend, UploadedFile, evidence_key};
use ripple_db::repositories::ReportRepository;

/// Uploads resolution photos into blob storage.
#[derive(Clone)]
pub struct EvidenceService {
    storage: Arc<dyn StorageBackend>,
    report_repo: ReportRepository,
    max_upload_bytes: usize,
}

impl EvidenceService {
    #[must_use]
    pub fn new(
        storage: Arc<dyn StorageBackend>,
        report_repo: ReportRepository,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            storage,
            report_repo,
            max_upload_bytes,
        }
    }

    /// Store a photo for a report and return its public URL.
    ///
    /// Keys never repeat for a given millisecond and name; a collision is an
    /// upload error rather than an overwrite.
    pub async fn upload_evidence_photo(
        &self,
        report_id: &str,
        file_name: &str,
        content_type: &str,
        data: &[u8],
    ) -> AppResult<UploadedFile> {
        self.validate(content_type, data)?;
        self.report_repo.get_by_id(report_id).await?;

        let key = evidence_key(report_id, chrono::Utc::now().timestamp_millis(), file_name);
        let uploaded = self.storage.upload(&key, data, content_type).await?;

        let public = url::Url::parse(&uploaded.url)
            .map_err(|e| AppError::UploadError(format!("Storage returned an invalid URL: {e}")))?;
        if !matches!(public.scheme(), "http" | "https") {
            return Err(AppError::UploadError(format!(
                "Storage returned a non-HTTP URL: {}",
                uploaded.url
            )));
        }

        tracing::info!(report_id = %report_id, key = %uploaded.key, size = uploaded.size, "Evidence photo uploaded");
        Ok(uploaded)
    }

    fn validate(&self, content_type: &str, data: &[u8]) -> AppResult<()> {
        if !content_type.starts_with("image/") {
            return Err(AppError::ValidationFailed(format!(
                "Evidence must be an image, got {content_type}"
            )));
        }
        if data.is_empty() {
            return Err(AppError::ValidationFailed("Evidence file is empty".to_string()));
        }
        if data.len() > self.max_upload_bytes {
            return Err(AppError::ValidationFailed(format!(
                "Evidence exceeds {} bytes",
                self.max_upload_bytes
            )));
        }
        image::guess_format(data).map_err(|_| {
            AppError::ValidationFailed("Evidence is not a recognised image".to_string())
        })?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use ripple_common::LocalStorage;
    use ripple_db::entities::report::ReportStatus;
    use ripple_db::test_utils::report_fixture;
    use sea_orm::{DatabaseBackend, MockDatabase};

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];

    fn service(dir: &std::path::Path, report_rows: usize) -> EvidenceService {
        let mut mock = MockDatabase::new(DatabaseBackend::Postgres);
        for _ in 0..report_rows {
            mock = mock.append_query_results([[report_fixture("r1", ReportStatus::InProgress)]]);
        }
        let storage = LocalStorage::new(
            dir.to_path_buf(),
            "http://localhost:3000/files".to_string(),
            "reports".to_string(),
        );
        EvidenceService::new(
            Arc::new(storage),
            ReportRepository::new(Arc::new(mock.into_connection())),
            1024,
        )
    }

    #[tokio::test]
    async fn test_upload_stores_under_resolved_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), 1);

        let uploaded = svc
            .upload_evidence_photo("r1", "after.png", "image/png", PNG_HEADER)
            .await
            .unwrap();

        assert!(uploaded.key.starts_with("resolved/r1_"));
        assert!(uploaded.key.ends_with("_after.png"));
        assert!(uploaded.url.starts_with("http://localhost:3000/files/reports/resolved/r1_"));
    }

    #[tokio::test]
    async fn test_non_image_rejected_before_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), 0);

        let wrong_type = svc
            .upload_evidence_photo("r1", "notes.txt", "text/plain", b"hello")
            .await;
        let wrong_bytes = svc
            .upload_evidence_photo("r1", "fake.png", "image/png", b"not an image")
            .await;

        assert!(matches!(wrong_type, Err(AppError::ValidationFailed(_))));
        assert!(matches!(wrong_bytes, Err(AppError::ValidationFailed(_))));
    }

    #[tokio::test]
    async fn test_oversized_upload_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), 0);
        let mut big = PNG_HEADER.to_vec();
        big.resize(2048, 0);

        let result = svc
            .upload_evidence_photo("r1", "big.png", "image/png", &big)
            .await;

        assert!(matches!(result, Err(AppError::ValidationFailed(_))));
    }
}
