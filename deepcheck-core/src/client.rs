//! Client for the external deepfake-analysis backend
//!
//! Two endpoints, one request each, no retries. The backend answers both
//! with the same envelope; [`AnalysisClient`] turns that envelope into an
//! [`AnalysisResult`] or a [`DeepCheckError`].

use crate::datauri::DataUri;
use crate::error::{DeepCheckError, DeepCheckResult};
use crate::model::{AnalysisResult, ImageInfo, Label, MediaInfo};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default still-image analysis path
pub const ANALYZE_PATH: &str = "/api/analyze";
/// Default arbitrary-media verification path
pub const VERIFY_PATH: &str = "/api/verify";

const ANALYZE_FAILED: &str = "Analysis failed";
const VERIFY_FAILED: &str = "Verification failed";

/// Anything that can classify media
///
/// The capture controller only depends on this trait, so tests and
/// alternative transports can stand in for the HTTP client.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Submit a still image for analysis
    async fn analyze_image(&self, image: &DataUri) -> DeepCheckResult<AnalysisResult>;

    /// Submit arbitrary media for verification
    async fn verify_media(&self, media: &DataUri) -> DeepCheckResult<AnalysisResult>;
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    image: String,
    timestamp: &'a str,
}

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    media: String,
    #[serde(rename = "type")]
    media_type: &'a str,
    timestamp: &'a str,
}

/// Response envelope shared by both endpoints
#[derive(Debug, Deserialize)]
struct ServiceResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    label: Option<Label>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default, deserialize_with = "lenient_descriptor")]
    image_info: Option<ImageInfo>,
    #[serde(default, deserialize_with = "lenient_descriptor")]
    media_info: Option<MediaInfo>,
    #[serde(default)]
    message: Option<String>,
}

/// Descriptors are informational; a malformed one is dropped rather than
/// failing an otherwise valid verdict
fn lenient_descriptor<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| match serde_json::from_value(value) {
        Ok(descriptor) => Some(descriptor),
        Err(e) => {
            warn!(error = %e, "Ignoring malformed media descriptor");
            None
        }
    }))
}

impl ServiceResponse {
    fn into_result(self, default_failure: &str, sent_at: &str) -> DeepCheckResult<AnalysisResult> {
        if !self.success {
            return Err(DeepCheckError::backend(self.message, default_failure));
        }

        let label = self.label.ok_or_else(|| DeepCheckError::InvalidResponse {
            reason: "missing label".to_string(),
        })?;
        let confidence = self
            .confidence
            .ok_or_else(|| DeepCheckError::InvalidResponse {
                reason: "missing confidence".to_string(),
            })?;

        Ok(AnalysisResult {
            label,
            confidence,
            timestamp: self.timestamp.unwrap_or_else(|| sent_at.to_string()),
            image_info: self.image_info,
            media_info: self.media_info,
        })
    }
}

/// HTTP client for the analysis backend
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    base_url: String,
    analyze_path: String,
    verify_path: String,
    http: Client,
}

impl AnalysisClient {
    /// Create a client for `base_url` with the default endpoint paths and no
    /// request timeout
    pub fn new(base_url: impl Into<String>) -> DeepCheckResult<Self> {
        Self::builder(base_url).build()
    }

    /// Start configuring a client
    pub fn builder(base_url: impl Into<String>) -> AnalysisClientBuilder {
        AnalysisClientBuilder {
            base_url: base_url.into(),
            analyze_path: ANALYZE_PATH.to_string(),
            verify_path: VERIFY_PATH.to_string(),
            timeout: None,
        }
    }

    /// Backend base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        default_failure: &str,
        sent_at: &str,
    ) -> DeepCheckResult<AnalysisResult> {
        let url = self.endpoint(path);
        debug!(%url, "Posting media to analysis service");

        let response = self.http.post(&url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%url, status = status.as_u16(), "Analysis service returned error status");
            return Err(DeepCheckError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: ServiceResponse =
            response
                .json()
                .await
                .map_err(|e| DeepCheckError::InvalidResponse {
                    reason: e.to_string(),
                })?;
        let result = envelope.into_result(default_failure, sent_at)?;
        info!(
            label = %result.label,
            confidence = result.confidence,
            "Analysis service classified media"
        );
        Ok(result)
    }
}

#[async_trait]
impl AnalysisService for AnalysisClient {
    async fn analyze_image(&self, image: &DataUri) -> DeepCheckResult<AnalysisResult> {
        let timestamp = iso_timestamp();
        let request = AnalyzeRequest {
            image: image.to_string(),
            timestamp: &timestamp,
        };
        self.post(&self.analyze_path, &request, ANALYZE_FAILED, &timestamp)
            .await
    }

    async fn verify_media(&self, media: &DataUri) -> DeepCheckResult<AnalysisResult> {
        let timestamp = iso_timestamp();
        let request = VerifyRequest {
            media: media.to_string(),
            media_type: media.mime(),
            timestamp: &timestamp,
        };
        self.post(&self.verify_path, &request, VERIFY_FAILED, &timestamp)
            .await
    }
}

/// Builder for [`AnalysisClient`]
#[derive(Debug, Clone)]
pub struct AnalysisClientBuilder {
    base_url: String,
    analyze_path: String,
    verify_path: String,
    timeout: Option<Duration>,
}

impl AnalysisClientBuilder {
    /// Override the still-image analysis path
    pub fn analyze_path(mut self, path: impl Into<String>) -> Self {
        self.analyze_path = path.into();
        self
    }

    /// Override the media verification path
    pub fn verify_path(mut self, path: impl Into<String>) -> Self {
        self.verify_path = path.into();
        self
    }

    /// Bound each request; `None` leaves requests unbounded
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the client
    pub fn build(self) -> DeepCheckResult<AnalysisClient> {
        let base_url = self.base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(DeepCheckError::Configuration {
                message: format!("analysis service URL must be http(s): {base_url}"),
            });
        }

        let mut http = Client::builder();
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }

        Ok(AnalysisClient {
            base_url,
            analyze_path: self.analyze_path,
            verify_path: self.verify_path,
            http: http.build()?,
        })
    }
}

fn iso_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(json: &str) -> ServiceResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_envelope_success() {
        let result = envelope(r#"{"success":true,"label":"Fake","confidence":87,"timestamp":"T"}"#)
            .into_result(ANALYZE_FAILED, "sent")
            .unwrap();
        assert_eq!(result.label, Label::Fake);
        assert_eq!(result.confidence, 87.0);
        assert_eq!(result.timestamp, "T");
    }

    #[test]
    fn test_envelope_tolerates_odd_descriptors() {
        let result = envelope(
            r#"{"success":true,"label":"Real","confidence":90,"timestamp":"T",
                "image_info":{"format":"JPEG","size":"320x240"}}"#,
        )
        .into_result(ANALYZE_FAILED, "sent")
        .unwrap();
        let info = result.image_info.unwrap();
        assert_eq!(info.format.as_deref(), Some("JPEG"));
        assert_eq!(info.size, Some([320, 240]));

        let result = envelope(
            r#"{"success":true,"label":"Real","confidence":90,
                "image_info":"JPEG","media_info":[1]}"#,
        )
        .into_result(ANALYZE_FAILED, "sent")
        .unwrap();
        assert_eq!(result.label, Label::Real);
        assert!(result.image_info.is_none());
        assert!(result.media_info.is_none());
    }

    #[test]
    fn test_envelope_failure_message() {
        let error = envelope(r#"{"success":false,"message":"bad image"}"#)
            .into_result(ANALYZE_FAILED, "sent")
            .unwrap_err();
        assert_eq!(error.to_string(), "bad image");

        let error = envelope(r#"{"success":false}"#)
            .into_result(VERIFY_FAILED, "sent")
            .unwrap_err();
        assert_eq!(error.to_string(), VERIFY_FAILED);
    }

    #[test]
    fn test_envelope_missing_fields() {
        let error = envelope(r#"{"success":true,"confidence":50}"#)
            .into_result(ANALYZE_FAILED, "sent")
            .unwrap_err();
        assert!(matches!(error, DeepCheckError::InvalidResponse { .. }));

        let result = envelope(r#"{"success":true,"label":"real","confidence":12.5}"#)
            .into_result(ANALYZE_FAILED, "sent")
            .unwrap();
        assert_eq!(result.timestamp, "sent");
    }

    #[test]
    fn test_verify_request_shape() {
        let media = DataUri::new("video/mp4", vec![0u8; 3]);
        let request = VerifyRequest {
            media: media.to_string(),
            media_type: media.mime(),
            timestamp: "T",
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["type"], "video/mp4");
        assert_eq!(value["media"], "data:video/mp4;base64,AAAA");
        assert_eq!(value["timestamp"], "T");
    }

    #[test]
    fn test_builder_rejects_bad_url() {
        assert!(AnalysisClient::new("ftp://example.com").is_err());
        let client = AnalysisClient::new("http://localhost:5000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000");
        assert_eq!(
            client.endpoint(ANALYZE_PATH),
            "http://localhost:5000/api/analyze"
        );
    }
}
