//! Still-frame encoding

use crate::error::{MediaError, MediaResult};
use crate::tracks::{VideoFrame, VideoPixelFormat};
use deepcheck_core::DataUri;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbImage, RgbaImage};

/// JPEG quality used for captured frames (0.8 on a 0-1 scale)
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Encode a frame as JPEG at its native dimensions
pub fn encode_jpeg(frame: &VideoFrame, quality: u8) -> MediaResult<Vec<u8>> {
    if !(1..=100).contains(&quality) {
        return Err(MediaError::InvalidConfiguration {
            message: format!("JPEG quality must be 1-100, got {quality}"),
        });
    }

    let rgb = match frame.format {
        VideoPixelFormat::Rgb24 => {
            RgbImage::from_raw(frame.width, frame.height, frame.data.to_vec())
        }
        VideoPixelFormat::Rgba32 => {
            RgbaImage::from_raw(frame.width, frame.height, frame.data.to_vec())
                .map(|rgba| DynamicImage::ImageRgba8(rgba).to_rgb8())
        }
    }
    .ok_or_else(|| MediaError::EncodingFailed {
        reason: "frame buffer does not match its dimensions".to_string(),
    })?;

    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, quality)
        .encode_image(&rgb)
        .map_err(|e| MediaError::EncodingFailed {
            reason: e.to_string(),
        })?;
    Ok(encoded)
}

/// Encode a frame as a JPEG data-URI ready for the analysis service
pub fn frame_to_data_uri(frame: &VideoFrame, quality: u8) -> MediaResult<DataUri> {
    let jpeg = encode_jpeg(frame, quality)?;
    Ok(DataUri::new("image/jpeg", jpeg))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_frame(format: VideoPixelFormat) -> VideoFrame {
        let len = 8 * 6 * format.bytes_per_pixel();
        VideoFrame::new(8, 6, format, vec![128u8; len], 0).unwrap()
    }

    #[test]
    fn test_jpeg_keeps_native_dimensions() {
        let jpeg = encode_jpeg(&gray_frame(VideoPixelFormat::Rgb24), DEFAULT_JPEG_QUALITY).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 6));
    }

    #[test]
    fn test_rgba_frames_are_flattened() {
        let uri = frame_to_data_uri(&gray_frame(VideoPixelFormat::Rgba32), 80).unwrap();
        assert_eq!(uri.mime(), "image/jpeg");
        assert!(uri.to_string().starts_with("data:image/jpeg;base64,/9j/"));
    }

    #[test]
    fn test_quality_bounds() {
        let frame = gray_frame(VideoPixelFormat::Rgb24);
        assert!(encode_jpeg(&frame, 0).is_err());
        assert!(encode_jpeg(&frame, 101).is_err());
    }
}
