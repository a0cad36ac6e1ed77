//! Display mapping for analysis verdicts

use crate::{AnalysisResult, Label};
use serde::Serialize;

/// How one label is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelStyle {
    /// Icon shown next to the label
    pub icon: &'static str,
    /// Hex color for the label and confidence bar
    pub color: &'static str,
    /// CSS class applied to the result card
    pub css_class: &'static str,
}

impl LabelStyle {
    /// Style for a label; unrecognised labels get a neutral treatment
    pub fn for_label(label: &Label) -> Self {
        match label {
            Label::Real => Self {
                icon: "✅",
                color: "#22c55e",
                css_class: "result-real",
            },
            Label::Fake => Self {
                icon: "❌",
                color: "#ef4444",
                css_class: "result-fake",
            },
            Label::Suspicious => Self {
                icon: "⚠️",
                color: "#f59e0b",
                css_class: "result-suspicious",
            },
            Label::Unknown(_) => Self {
                icon: "❓",
                color: "#6b7280",
                css_class: "result-unknown",
            },
        }
    }
}

/// Render-ready view of an [`AnalysisResult`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    /// Upper-cased label text
    pub label_text: String,
    /// Icon for the label
    pub icon: &'static str,
    /// Hex color for the label
    pub color: &'static str,
    /// CSS class for the result card
    pub css_class: &'static str,
    /// Confidence bar width in percent, clamped to 0..=100
    pub bar_width: f64,
    /// Confidence as text, e.g. `87.0%`
    pub confidence_text: String,
    /// Extra lines describing the analysed media
    pub details: Vec<String>,
}

impl ResultView {
    /// Build the view for a result
    pub fn from_result(result: &AnalysisResult) -> Self {
        let style = LabelStyle::for_label(&result.label);
        let bar_width = if result.confidence.is_nan() {
            0.0
        } else {
            result.confidence.clamp(0.0, 100.0)
        };

        let mut details = Vec::new();
        if let Some(info) = &result.image_info {
            if let Some(format) = &info.format {
                details.push(format!("Format: {format}"));
            }
            if let Some([width, height]) = info.size {
                details.push(format!("Size: {width}x{height}"));
            }
        }
        if let Some(info) = &result.media_info {
            if let Some(media_type) = &info.media_type {
                details.push(format!("Type: {media_type}"));
            }
            if let Some(format) = &info.format {
                details.push(format!("Format: {format}"));
            }
            if let Some(size) = &info.size {
                details.push(format!("Size: {size}"));
            }
        }
        if !result.timestamp.is_empty() {
            details.push(format!("Analyzed: {}", result.timestamp));
        }

        Self {
            label_text: result.label.as_str().to_uppercase(),
            icon: style.icon,
            color: style.color,
            css_class: style.css_class,
            bar_width,
            confidence_text: format!("{:.1}%", result.confidence),
            details,
        }
    }
}

impl From<&AnalysisResult> for ResultView {
    fn from(result: &AnalysisResult) -> Self {
        Self::from_result(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ImageInfo;

    fn result(label: &str, confidence: f64) -> AnalysisResult {
        AnalysisResult {
            label: Label::parse(label),
            confidence,
            timestamp: "2024-05-01T12:00:00.000Z".to_string(),
            image_info: Some(ImageInfo {
                format: Some("JPEG".to_string()),
                size: Some([320, 240]),
            }),
            media_info: None,
        }
    }

    #[test]
    fn test_fake_view() {
        let view = ResultView::from_result(&result("fake", 87.0));
        assert_eq!(view.label_text, "FAKE");
        assert_eq!(view.icon, "❌");
        assert_eq!(view.color, "#ef4444");
        assert_eq!(view.css_class, "result-fake");
        assert_eq!(view.bar_width, 87.0);
        assert_eq!(view.confidence_text, "87.0%");
        assert!(view.details.contains(&"Size: 320x240".to_string()));
    }

    #[test]
    fn test_casing_does_not_change_treatment() {
        for (a, b) in [("real", "REAL"), ("Suspicious", "suspicious"), ("FAKE", "Fake")] {
            let lower = ResultView::from_result(&result(a, 50.0));
            let upper = ResultView::from_result(&result(b, 50.0));
            assert_eq!(lower, upper);
        }
    }

    #[test]
    fn test_unknown_label_is_neutral() {
        let view = ResultView::from_result(&result("deepfake-ish", 40.0));
        assert_eq!(view.icon, "❓");
        assert_eq!(view.color, "#6b7280");
        assert_eq!(view.label_text, "DEEPFAKE-ISH");
    }

    #[test]
    fn test_bar_width_clamped() {
        assert_eq!(ResultView::from_result(&result("real", 140.0)).bar_width, 100.0);
        assert_eq!(ResultView::from_result(&result("real", -3.0)).bar_width, 0.0);
        assert_eq!(ResultView::from_result(&result("real", f64::NAN)).bar_width, 0.0);
    }
}
