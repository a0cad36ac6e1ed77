//! Data-URI transport encoding
//!
//! The analysis backend only accepts JSON, so every piece of media travels
//! as `data:<mime>;base64,<payload>`.

use crate::error::{DeepCheckError, DeepCheckResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Fallback MIME type for unrecognised files
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Media payload together with its declared MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    mime: String,
    data: Bytes,
}

impl DataUri {
    /// Wrap raw bytes with a MIME type
    pub fn new(mime: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            mime: mime.into(),
            data: data.into(),
        }
    }

    /// Read a file and infer its MIME type from the extension
    pub async fn from_file(path: impl AsRef<Path>) -> DeepCheckResult<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let mime = mime_for_path(path);
        tracing::debug!(
            path = %path.display(),
            mime,
            bytes = data.len(),
            "Loaded media file"
        );
        Ok(Self::new(mime, data))
    }

    /// Declared MIME type
    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// Raw payload
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Payload size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether the payload is an image
    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.mime, STANDARD.encode(&self.data))
    }
}

impl FromStr for DataUri {
    type Err = DeepCheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix("data:")
            .ok_or_else(|| DeepCheckError::InvalidDataUri {
                reason: "missing data: scheme".to_string(),
            })?;
        let (header, payload) =
            rest.split_once(',')
                .ok_or_else(|| DeepCheckError::InvalidDataUri {
                    reason: "missing payload separator".to_string(),
                })?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or_else(|| DeepCheckError::InvalidDataUri {
                reason: "only base64 payloads are supported".to_string(),
            })?;
        let data = STANDARD
            .decode(payload)
            .map_err(|e| DeepCheckError::InvalidDataUri {
                reason: e.to_string(),
            })?;
        let mime = if mime.is_empty() { OCTET_STREAM } else { mime };
        Ok(Self::new(mime, data))
    }
}

/// Infer a MIME type from a file extension
pub fn mime_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mov") => "video/quicktime",
        Some("avi") => "video/x-msvideo",
        Some("mkv") => "video/x-matroska",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("ogg") => "audio/ogg",
        _ => OCTET_STREAM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_format() {
        let uri = DataUri::new("image/png", vec![1u8, 2, 3]);
        assert_eq!(uri.to_string(), "data:image/png;base64,AQID");
        assert!(uri.is_image());
        assert_eq!(uri.len(), 3);
    }

    #[test]
    fn test_parse() {
        let uri: DataUri = "data:video/mp4;base64,AQID".parse().unwrap();
        assert_eq!(uri.mime(), "video/mp4");
        assert_eq!(uri.data().as_ref(), &[1u8, 2, 3]);
        assert!(!uri.is_image());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("image/png;base64,AQID".parse::<DataUri>().is_err());
        assert!("data:image/png;base64".parse::<DataUri>().is_err());
        assert!("data:text/plain,hello".parse::<DataUri>().is_err());
        assert!("data:image/png;base64,***".parse::<DataUri>().is_err());
    }

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path(Path::new("face.JPG")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("clip.webm")), "video/webm");
        assert_eq!(mime_for_path(Path::new("noext")), OCTET_STREAM);
    }

    #[tokio::test]
    async fn test_from_file_missing() {
        let result = DataUri::from_file("/definitely/not/here.png").await;
        assert!(matches!(result, Err(DeepCheckError::Io { .. })));
    }
}
