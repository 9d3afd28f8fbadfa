//! Frame types flowing through the detection loop.
//!
//! - `RawFrame`: RGB24 frame as delivered by a `FrameSource`, already resized to the
//!   canonical width.
//! - `Frame`: immutable grayscale grid of intensity samples. Baselines, comparison
//!   frames, and everything the detector touches are `Frame`s.
//!
//! Both types are immutable once built. Stages hand them along by value or by shared
//! reference; nothing in the pipeline edits samples in place.

use anyhow::{anyhow, Result};
use image::{GrayImage, RgbImage};

/// Canonical width every frame is resized to before leaving the source.
pub const CANONICAL_WIDTH: u32 = 500;

// ----------------------------------------------------------------------------
// RawFrame: normalized color frame
// ----------------------------------------------------------------------------

/// RGB24 frame, row-major, three bytes per pixel.
pub struct RawFrame {
    image: RgbImage,
    /// Position of this frame in its source's stream (1-based).
    pub seq: u64,
}

impl RawFrame {
    /// Build a frame from packed RGB24 bytes.
    pub fn from_rgb(pixels: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let expected = rgb_len(width, height)?;
        if pixels.len() != expected {
            return Err(anyhow!(
                "RGB frame length mismatch: expected {}, got {}",
                expected,
                pixels.len()
            ));
        }
        let image = RgbImage::from_raw(width, height, pixels)
            .ok_or_else(|| anyhow!("RGB buffer does not fit {}x{}", width, height))?;
        Ok(Self { image, seq: 0 })
    }

    /// Build a frame by evaluating `f` at every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [u8; 3]) -> Self {
        let image = RgbImage::from_fn(width, height, |x, y| image::Rgb(f(x, y)));
        Self { image, seq: 0 }
    }

    pub(crate) fn from_image(image: RgbImage, seq: u64) -> Self {
        Self { image, seq }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Packed RGB24 bytes.
    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub(crate) fn as_image(&self) -> &RgbImage {
        &self.image
    }
}

fn rgb_len(width: u32, height: u32) -> Result<usize> {
    width
        .checked_mul(height)
        .and_then(|v| v.checked_mul(3))
        .map(|v| v as usize)
        .ok_or_else(|| anyhow!("RGB frame dimensions overflow"))
}

// ----------------------------------------------------------------------------
// Frame: grayscale intensity grid
// ----------------------------------------------------------------------------

/// Immutable 2-D grid of 8-bit intensity samples.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    image: GrayImage,
}

impl Frame {
    pub fn from_gray(image: GrayImage) -> Self {
        Self { image }
    }

    /// Build a frame from row-major samples.
    pub fn from_samples(width: u32, height: u32, samples: Vec<u8>) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if samples.len() != expected {
            return Err(anyhow!(
                "frame length mismatch: expected {}, got {}",
                expected,
                samples.len()
            ));
        }
        let image = GrayImage::from_raw(width, height, samples)
            .ok_or_else(|| anyhow!("sample buffer does not fit {}x{}", width, height))?;
        Ok(Self { image })
    }

    /// Frame with every sample set to `value`.
    pub fn filled(width: u32, height: u32, value: u8) -> Self {
        Self {
            image: GrayImage::from_pixel(width, height, image::Luma([value])),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Row-major samples.
    pub fn samples(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        self.image.get_pixel_checked(x, y).map(|p| p.0[0])
    }

    pub(crate) fn as_image(&self) -> &GrayImage {
        &self.image
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_frame_validates_length() {
        assert!(RawFrame::from_rgb(vec![0u8; 11], 2, 2).is_err());
        let frame = RawFrame::from_rgb(vec![7u8; 12], 2, 2).unwrap();
        assert_eq!(frame.dimensions(), (2, 2));
        assert_eq!(frame.pixels().len(), 12);
    }

    #[test]
    fn frame_from_samples_round_trips_lookup() -> Result<()> {
        let frame = Frame::from_samples(3, 2, vec![0, 1, 2, 3, 4, 5])?;
        assert_eq!(frame.get(2, 1), Some(5));
        assert_eq!(frame.get(3, 0), None);
        assert!(Frame::from_samples(3, 2, vec![0; 5]).is_err());
        Ok(())
    }

    #[test]
    fn from_fn_places_pixels_row_major() {
        let frame = RawFrame::from_fn(2, 1, |x, _| [x as u8, 0, 0]);
        assert_eq!(frame.pixels(), &[0, 0, 0, 1, 0, 0]);
    }
}
