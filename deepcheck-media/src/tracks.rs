//! Frame and resolution types

use crate::error::{MediaError, MediaResult};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Raw pixel layouts a camera stream can hand out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoPixelFormat {
    /// 8-bit RGB, 3 bytes per pixel
    Rgb24,
    /// 8-bit RGBA, 4 bytes per pixel
    Rgba32,
}

impl VideoPixelFormat {
    /// Bytes per pixel
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            VideoPixelFormat::Rgb24 => 3,
            VideoPixelFormat::Rgba32 => 4,
        }
    }
}

/// Video resolution information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoResolution {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl VideoResolution {
    /// Create a resolution
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// 320x240
    pub const QVGA: Self = Self::new(320, 240);
    /// 640x480
    pub const VGA: Self = Self::new(640, 480);
    /// 1280x720
    pub const HD: Self = Self::new(1280, 720);

    /// Total pixel count
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Whether both sides are non-zero
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Whether this fits inside `bound` on both axes
    pub fn fits_within(&self, bound: VideoResolution) -> bool {
        self.width <= bound.width && self.height <= bound.height
    }
}

/// Video frame representation
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Pixel layout of `data`
    pub format: VideoPixelFormat,
    /// Raw pixel data, row-major, no padding
    pub data: Bytes,
    /// Timestamp in milliseconds since the stream started
    pub timestamp: u64,
}

impl VideoFrame {
    /// Build a frame, checking that `data` matches the declared geometry
    pub fn new(
        width: u32,
        height: u32,
        format: VideoPixelFormat,
        data: impl Into<Bytes>,
        timestamp: u64,
    ) -> MediaResult<Self> {
        let data = data.into();
        let expected = width as usize * height as usize * format.bytes_per_pixel();
        if data.len() != expected {
            return Err(MediaError::InvalidFrameData {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            format,
            data,
            timestamp,
        })
    }

    /// Frame dimensions
    pub fn resolution(&self) -> VideoResolution {
        VideoResolution::new(self.width, self.height)
    }
}
