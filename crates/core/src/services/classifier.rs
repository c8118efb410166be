//! Resolution photo classifier client.

use std::sync::Arc;
use std::time::Duration;

use ripple_common::{AppError, AppResult, ClassifierConfig, StorageBackend};
use serde::Serialize;

/// Labels that confirm an issue is fixed.
pub const RESOLVED_CLASSES: [&str; 3] = ["NoPotHole", "GarbageNotOverflow", "NotBrokenStreetLight"];

/// Storage prefix of evidence photos.
const EVIDENCE_PREFIX: &str = "resolved/";

/// Whether a predicted label counts as resolved.
#[must_use]
pub fn is_resolved_class(label: &str) -> bool {
    RESOLVED_CLASSES.contains(&label)
}

/// Human-readable description of a label. Unknown labels are echoed back.
#[must_use]
pub fn describe_class(label: &str) -> String {
    match label {
        "BrokenStreetLight" => "Broken Street Light",
        "DrainageOverFlow" => "Drainage Overflow",
        "GarbageNotOverflow" => "Garbage Not Overflowing (Resolved)",
        "GarbageOverflow" => "Garbage Overflowing",
        "NoPotHole" => "No Pothole (Resolved)",
        "NotBrokenStreetLight" => "Street Light Working (Resolved)",
        "PotHole" => "Pothole",
        other => other,
    }
    .to_string()
}

/// A classifier verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub predicted_class: String,
    pub confidence: f64,
}

impl Classification {
    /// Whether this verdict resolves the report at the given minimum confidence.
    #[must_use]
    pub fn confirms_resolution(&self, min_confidence: f64) -> bool {
        is_resolved_class(&self.predicted_class) && self.confidence >= min_confidence
    }
}

/// Image classifier.
#[async_trait::async_trait]
pub trait Classifier: Send + Sync {
    /// Refuse an image before any report is read or written.
    async fn check_source(&self, _image_url: &str) -> AppResult<()> {
        Ok(())
    }

    /// Classify the image at `image_url`.
    async fn classify(&self, image_url: &str) -> AppResult<Classification>;
}

/// HTTP classifier: reads an evidence photo from storage and posts it to
/// `{url}/predict`.
///
/// Only photos stored under this service's `resolved/` prefix are accepted;
/// the image URL is never fetched over the network.
pub struct HttpClassifier {
    http_client: reqwest::Client,
    endpoint: String,
    storage: Arc<dyn StorageBackend>,
    max_image_bytes: usize,
}

impl HttpClassifier {
    /// Create a classifier client from configuration.
    pub fn new(
        config: &ClassifierConfig,
        storage: Arc<dyn StorageBackend>,
        max_image_bytes: usize,
    ) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build classifier client: {e}")))?;

        Ok(Self {
            http_client,
            endpoint: format!("{}/predict", config.url.trim_end_matches('/')),
            storage,
            max_image_bytes,
        })
    }

    fn evidence_key(&self, image_url: &str) -> AppResult<String> {
        self.storage
            .key_for_url(image_url)
            .filter(|key| key.starts_with(EVIDENCE_PREFIX))
            .ok_or_else(|| {
                AppError::ValidationFailed(
                    "The evidence photo must be uploaded to this service first".to_string(),
                )
            })
    }

    async fn load(&self, image_url: &str) -> AppResult<(Vec<u8>, String)> {
        let key = self.evidence_key(image_url)?;
        let bytes = self
            .storage
            .read(&key, self.max_image_bytes)
            .await
            .map_err(|e| match e {
                AppError::ValidationFailed(_) => e,
                other => AppError::ClassificationError(format!("Evidence unavailable: {other}")),
            })?;

        let content_type = image::guess_format(&bytes)
            .map_or("application/octet-stream", |format| format.to_mime_type())
            .to_string();
        Ok((bytes, content_type))
    }
}

#[async_trait::async_trait]
impl Classifier for HttpClassifier {
    async fn check_source(&self, image_url: &str) -> AppResult<()> {
        let key = self.evidence_key(image_url)?;
        if self.storage.exists(&key).await? {
            Ok(())
        } else {
            Err(AppError::ValidationFailed(format!(
                "Evidence photo {key} does not exist"
            )))
        }
    }

    async fn classify(&self, image_url: &str) -> AppResult<Classification> {
        let (bytes, content_type) = self.load(image_url).await?;

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name("evidence")
            .mime_str(&content_type)
            .map_err(|e| AppError::ClassificationError(format!("Invalid image type: {e}")))?;
        let form = reqwest::multipart::Form::new().part("image", part);

        let response = self
            .http_client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::ClassificationError(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ClassificationError(format!(
                "HTTP {status}: {body}"
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::ClassificationError(format!("Invalid response: {e}")))?;

        let predicted_class = body
            .get("predicted_class")
            .and_then(serde_json::Value::as_str)
            .filter(|s| !s.is_empty());
        let confidence = body.get("confidence").and_then(serde_json::Value::as_f64);

        match (predicted_class, confidence) {
            (Some(predicted_class), Some(confidence)) => {
                tracing::info!(class = %predicted_class, confidence, "Classified evidence photo");
                Ok(Classification {
                    predicted_class: predicted_class.to_string(),
                    confidence,
                })
            }
            _ => Err(AppError::ClassificationError(
                "Invalid response format from classifier".to_string(),
            )),
        }
    }
}
