//! Classification results and permission state

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Classification label returned by the analysis backend
///
/// Parsing is case-insensitive: `"REAL"`, `"real"` and `"Real"` are the same
/// label. Anything outside the three known labels is kept verbatim so the
/// caller can still show it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Label {
    /// Media judged authentic
    Real,
    /// Media judged manipulated or synthetic
    Fake,
    /// The backend could not decide either way
    Suspicious,
    /// A label this client does not know about
    Unknown(String),
}

impl Label {
    /// Parse a label, ignoring case and surrounding whitespace
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "real" => Label::Real,
            "fake" => Label::Fake,
            "suspicious" => Label::Suspicious,
            _ => Label::Unknown(trimmed.to_string()),
        }
    }

    /// Canonical display spelling
    pub fn as_str(&self) -> &str {
        match self {
            Label::Real => "Real",
            Label::Fake => "Fake",
            Label::Suspicious => "Suspicious",
            Label::Unknown(raw) => raw,
        }
    }

    /// Whether this is one of the three labels the backend is specified to return
    pub fn is_known(&self) -> bool {
        !matches!(self, Label::Unknown(_))
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Label {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Label {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Label::parse(&raw))
    }
}

/// Still-image descriptor attached to analysis responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    /// Image format as detected by the backend (e.g. `JPEG`)
    #[serde(default)]
    pub format: Option<String>,
    /// Image dimensions as `[width, height]`
    ///
    /// Also read from `"WxH"` strings, `{width, height}` objects and
    /// fractional numbers; any other shape becomes `None`.
    #[serde(default, deserialize_with = "lenient_size")]
    pub size: Option<[u32; 2]>,
}

fn lenient_size<'de, D>(deserializer: D) -> Result<Option<[u32; 2]>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_size))
}

fn parse_size(value: &Value) -> Option<[u32; 2]> {
    fn dimension(value: &Value) -> Option<u32> {
        let n = match value {
            Value::String(text) => text.trim().parse::<f64>().ok()?,
            other => other.as_f64()?,
        };
        (n.is_finite() && n >= 0.0 && n <= u32::MAX as f64).then(|| n.round() as u32)
    }

    match value {
        Value::Array(items) if items.len() == 2 => {
            Some([dimension(&items[0])?, dimension(&items[1])?])
        }
        Value::Object(map) => {
            Some([dimension(map.get("width")?)?, dimension(map.get("height")?)?])
        }
        Value::String(text) => {
            let (width, height) = text.split_once(|c| c == 'x' || c == 'X')?;
            Some([
                dimension(&Value::String(width.to_string()))?,
                dimension(&Value::String(height.to_string()))?,
            ])
        }
        _ => None,
    }
}

/// Arbitrary media descriptor attached to verification responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Declared media type (e.g. `video/mp4`)
    #[serde(rename = "type", default)]
    pub media_type: Option<String>,
    /// Container or image format
    #[serde(default)]
    pub format: Option<String>,
    /// Dimensions or byte size, whichever the backend reports
    #[serde(default)]
    pub size: Option<serde_json::Value>,
}

/// Normalized result of one analysis or verification call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Classification label
    pub label: Label,
    /// Confidence, 0-100 by convention (not validated)
    pub confidence: f64,
    /// Timestamp reported by the backend
    pub timestamp: String,
    /// Present for still-image analysis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_info: Option<ImageInfo>,
    /// Present for media verification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_info: Option<MediaInfo>,
}

/// Camera permission as tracked by the capture controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    /// Nothing known yet, or reset after the camera was stopped
    #[default]
    Unknown,
    /// An acquisition attempt is negotiating permission
    Requesting,
    /// Camera access was granted
    Granted,
    /// Camera access was refused
    Denied,
}

impl PermissionState {
    /// Map a relay or device verdict to a settled state
    pub fn from_granted(granted: bool) -> Self {
        if granted {
            PermissionState::Granted
        } else {
            PermissionState::Denied
        }
    }

    /// Whether the state is a final verdict
    pub fn is_settled(&self) -> bool {
        matches!(self, PermissionState::Granted | PermissionState::Denied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_parsing_ignores_case() {
        for raw in ["REAL", "real", "Real", " rEaL "] {
            assert_eq!(Label::parse(raw), Label::Real);
        }
        assert_eq!(Label::parse("FAKE"), Label::Fake);
        assert_eq!(Label::parse("suspicious"), Label::Suspicious);
        assert_eq!(
            Label::parse("Uncertain"),
            Label::Unknown("Uncertain".to_string())
        );
        assert!(!Label::parse("Uncertain").is_known());
    }

    #[test]
    fn test_result_deserialization() {
        let json = r#"{
            "label": "fake",
            "confidence": 87,
            "timestamp": "T",
            "image_info": {"format": "JPEG", "size": [320, 240]}
        }"#;
        let result: AnalysisResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.label, Label::Fake);
        assert_eq!(result.confidence, 87.0);
        assert_eq!(result.image_info.unwrap().size, Some([320, 240]));
        assert!(result.media_info.is_none());
    }

    #[test]
    fn test_image_size_shapes() {
        let size = |json: &str| serde_json::from_str::<ImageInfo>(json).unwrap().size;

        assert_eq!(size(r#"{"size": "320x240"}"#), Some([320, 240]));
        assert_eq!(size(r#"{"size": [319.6, 240.2]}"#), Some([320, 240]));
        assert_eq!(
            size(r#"{"size": {"width": 640, "height": 480}}"#),
            Some([640, 480])
        );
        assert_eq!(size(r#"{"size": "large"}"#), None);
        assert_eq!(size(r#"{"size": [1, 2, 3]}"#), None);
        assert_eq!(size(r#"{"size": null}"#), None);
        assert_eq!(size(r#"{"format": "PNG"}"#), None);
    }

    #[test]
    fn test_media_info_type_field() {
        let json = r#"{"type": "video/mp4", "format": "mp4", "size": 1024}"#;
        let info: MediaInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.media_type.as_deref(), Some("video/mp4"));
        assert_eq!(info.size, Some(serde_json::json!(1024)));
    }

    #[test]
    fn test_permission_state() {
        assert_eq!(PermissionState::default(), PermissionState::Unknown);
        assert_eq!(PermissionState::from_granted(true), PermissionState::Granted);
        assert_eq!(PermissionState::from_granted(false), PermissionState::Denied);
        assert!(!PermissionState::Requesting.is_settled());
        assert_eq!(
            serde_json::to_string(&PermissionState::Granted).unwrap(),
            "\"granted\""
        );
    }
}
