//! Camera capture constraints
//!
//! Mirrors the `MediaStreamConstraints` shape browsers accept, so a
//! web-backed [`CameraDevice`](crate::capture::CameraDevice) can forward
//! [`CaptureConstraints::to_media_constraints`] verbatim.

use crate::error::{AcquisitionErrorKind, MediaError, MediaResult};
use crate::tracks::VideoResolution;
use serde::{Deserialize, Serialize};

/// A preferred value with a hard ceiling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstraintRange<T> {
    /// Value the device should aim for
    pub ideal: T,
    /// Value the device must not exceed
    pub max: T,
}

impl<T> ConstraintRange<T> {
    /// Create a range
    pub const fn new(ideal: T, max: T) -> Self {
        Self { ideal, max }
    }
}

/// Which way the camera should point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Front-facing (towards the user)
    #[default]
    User,
    /// Rear-facing
    Environment,
}

/// Requested capture parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureConstraints {
    /// Frame width in pixels
    pub width: ConstraintRange<u32>,
    /// Frame height in pixels
    pub height: ConstraintRange<u32>,
    /// Frames per second
    pub frame_rate: ConstraintRange<f64>,
    /// Camera direction
    pub facing_mode: FacingMode,
    /// Whether to capture audio as well
    pub audio: bool,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            width: ConstraintRange::new(320, 640),
            height: ConstraintRange::new(240, 480),
            frame_rate: ConstraintRange::new(15.0, 30.0),
            facing_mode: FacingMode::User,
            audio: false,
        }
    }
}

impl CaptureConstraints {
    /// Validate configuration
    pub fn validate(&self) -> MediaResult<()> {
        if self.width.ideal == 0 || self.height.ideal == 0 {
            return Err(MediaError::InvalidConfiguration {
                message: "Invalid resolution".to_string(),
            });
        }

        if self.width.ideal > self.width.max || self.height.ideal > self.height.max {
            return Err(MediaError::InvalidConfiguration {
                message: "Ideal resolution exceeds maximum".to_string(),
            });
        }

        if self.frame_rate.ideal <= 0.0 || self.frame_rate.ideal > self.frame_rate.max {
            return Err(MediaError::InvalidConfiguration {
                message: "Invalid framerate".to_string(),
            });
        }

        Ok(())
    }

    /// Resolution the device should aim for
    pub fn ideal_resolution(&self) -> VideoResolution {
        VideoResolution::new(self.width.ideal, self.height.ideal)
    }

    /// Largest acceptable resolution
    pub fn max_resolution(&self) -> VideoResolution {
        VideoResolution::new(self.width.max, self.height.max)
    }

    /// Pick the mode closest to the ideal resolution among those within the
    /// maximum, or `None` if every mode is too large
    pub fn select_resolution(&self, modes: &[VideoResolution]) -> Option<VideoResolution> {
        let ideal = self.ideal_resolution();
        let max = self.max_resolution();
        modes
            .iter()
            .copied()
            .filter(|mode| mode.is_valid() && mode.fits_within(max))
            .min_by_key(|mode| {
                (mode.width as i64 - ideal.width as i64).abs()
                    + (mode.height as i64 - ideal.height as i64).abs()
            })
    }

    /// Whether a device running at `fps` honours the frame rate cap
    pub fn accepts_frame_rate(&self, fps: f64) -> bool {
        fps > 0.0 && fps <= self.frame_rate.max
    }

    /// Reject a negotiated frame rate above the cap
    pub fn check_frame_rate(&self, fps: f64) -> MediaResult<()> {
        if self.accepts_frame_rate(fps) {
            Ok(())
        } else {
            Err(MediaError::acquisition(
                AcquisitionErrorKind::ConstraintsUnsatisfiable,
                format!("camera runs at {fps} fps, above {}", self.frame_rate.max),
            ))
        }
    }

    /// Browser `getUserMedia` constraint object
    pub fn to_media_constraints(&self) -> serde_json::Value {
        serde_json::json!({
            "video": {
                "width": self.width,
                "height": self.height,
                "facingMode": self.facing_mode,
                "frameRate": self.frame_rate,
            },
            "audio": self.audio,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let constraints = CaptureConstraints::default();
        assert!(constraints.validate().is_ok());
        assert_eq!(constraints.ideal_resolution(), VideoResolution::QVGA);
        assert_eq!(constraints.max_resolution(), VideoResolution::VGA);
        assert_eq!(constraints.frame_rate.ideal, 15.0);
        assert_eq!(constraints.frame_rate.max, 30.0);
        assert!(!constraints.audio);
    }

    #[test]
    fn test_media_constraints_shape() {
        let value = CaptureConstraints::default().to_media_constraints();
        assert_eq!(value["video"]["width"]["ideal"], 320);
        assert_eq!(value["video"]["height"]["max"], 480);
        assert_eq!(value["video"]["facingMode"], "user");
        assert_eq!(value["video"]["frameRate"]["max"], 30.0);
        assert_eq!(value["audio"], false);
    }

    #[test]
    fn test_select_resolution() {
        let constraints = CaptureConstraints::default();
        let modes = [
            VideoResolution::HD,
            VideoResolution::VGA,
            VideoResolution::new(352, 288),
        ];
        assert_eq!(
            constraints.select_resolution(&modes),
            Some(VideoResolution::new(352, 288))
        );
        assert_eq!(constraints.select_resolution(&[VideoResolution::HD]), None);
    }

    #[test]
    fn test_frame_rate_cap() {
        let constraints = CaptureConstraints::default();
        assert!(constraints.accepts_frame_rate(15.0));
        assert!(constraints.accepts_frame_rate(30.0));
        assert!(!constraints.accepts_frame_rate(60.0));
        assert!(!constraints.accepts_frame_rate(0.0));

        let error = constraints.check_frame_rate(60.0).unwrap_err();
        assert_eq!(
            error.acquisition_kind(),
            Some(AcquisitionErrorKind::ConstraintsUnsatisfiable)
        );
    }

    #[test]
    fn test_invalid_constraints() {
        let mut constraints = CaptureConstraints::default();
        constraints.width.ideal = 800;
        assert!(constraints.validate().is_err());

        let mut constraints = CaptureConstraints::default();
        constraints.frame_rate.ideal = 0.0;
        assert!(constraints.validate().is_err());
    }
}
