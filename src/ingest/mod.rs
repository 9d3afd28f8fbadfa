//! Frame acquisition.
//!
//! A `CaptureDevice` delivers raw captures in whatever pixel layout the hardware
//! speaks. `FrameSource` wraps a device, normalizes every capture to RGB24 and resizes
//! it to the canonical width before handing a `RawFrame` to the pipeline.
//!
//! Devices:
//! - Synthetic scene generator (`stub://` URLs, always available)
//! - USB/V4L2 devices (feature: ingest-v4l2)
//!
//! A source is a one-shot stream: once closed it cannot be reopened.

mod normalize;
pub mod synthetic;
#[cfg(feature = "ingest-v4l2")]
pub mod v4l2;

pub use normalize::PixelFormat;
pub use synthetic::{Scene, SceneScript, SyntheticConfig, SyntheticDevice};
#[cfg(feature = "ingest-v4l2")]
pub use v4l2::{V4l2Config, V4l2Device};

use image::RgbImage;

use crate::frame::{RawFrame, CANONICAL_WIDTH};

// ----------------------------------------------------------------------------
// CaptureError
// ----------------------------------------------------------------------------

/// Failure to obtain a frame from a capture device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureError {
    /// The device could not be opened.
    Open { device: String, reason: String },
    /// The device was open but did not deliver a frame.
    Read { device: String, reason: String },
    /// `next_frame` was called before `open`.
    NotOpen,
    /// The source was closed; streams are not restartable.
    Closed,
    /// The capture could not be normalized (bad length, unsupported layout).
    Format(String),
}

impl std::fmt::Display for CaptureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureError::Open { device, reason } => {
                write!(f, "failed to open capture device {}: {}", device, reason)
            }
            CaptureError::Read { device, reason } => {
                write!(f, "failed to read frame from {}: {}", device, reason)
            }
            CaptureError::NotOpen => write!(f, "capture source not opened; call open() first"),
            CaptureError::Closed => write!(f, "capture source already closed"),
            CaptureError::Format(reason) => write!(f, "unusable capture: {}", reason),
        }
    }
}

impl std::error::Error for CaptureError {}

// ----------------------------------------------------------------------------
// CaptureDevice
// ----------------------------------------------------------------------------

/// One capture as delivered by a device, before normalization.
#[derive(Clone, Debug)]
pub struct RawCapture {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

/// Hardware (or simulated hardware) that produces captures.
pub trait CaptureDevice: Send {
    /// Device identifier used in logs.
    fn name(&self) -> &str;

    fn open(&mut self) -> Result<(), CaptureError>;

    /// Block until the next capture is available.
    fn read(&mut self) -> Result<RawCapture, CaptureError>;

    fn close(&mut self);
}

impl CaptureDevice for Box<dyn CaptureDevice> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn open(&mut self) -> Result<(), CaptureError> {
        (**self).open()
    }

    fn read(&mut self) -> Result<RawCapture, CaptureError> {
        (**self).read()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// Select a device from a source URL.
///
/// - `stub://<name>`: synthetic scene at the requested size
/// - `/dev/videoN` or `v4l2:///dev/videoN`: V4L2 device (feature: ingest-v4l2)
pub fn open_device(
    url: &str,
    width: u32,
    height: u32,
) -> Result<Box<dyn CaptureDevice>, CaptureError> {
    if let Some(name) = url.strip_prefix("stub://") {
        let config = SyntheticConfig {
            name: name.to_string(),
            width,
            height,
            ..SyntheticConfig::default()
        };
        return Ok(Box::new(SyntheticDevice::new(config)));
    }

    let device_path = url.strip_prefix("v4l2://").unwrap_or(url);
    if device_path.starts_with("/dev/") {
        #[cfg(feature = "ingest-v4l2")]
        {
            return Ok(Box::new(V4l2Device::new(V4l2Config {
                device: device_path.to_string(),
                width,
                height,
                ..V4l2Config::default()
            })));
        }
        #[cfg(not(feature = "ingest-v4l2"))]
        {
            return Err(CaptureError::Open {
                device: url.to_string(),
                reason: "V4L2 capture requires the ingest-v4l2 feature".to_string(),
            });
        }
    }

    Err(CaptureError::Open {
        device: url.to_string(),
        reason: "unsupported source URL; expected stub://<name> or /dev/videoN".to_string(),
    })
}

// ----------------------------------------------------------------------------
// FrameSource
// ----------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SourceState {
    Created,
    Open,
    Closed,
}

/// Statistics for a frame source.
#[derive(Clone, Debug)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub device: String,
}

/// Lazy, non-restartable sequence of canonical-width frames.
pub struct FrameSource<D: CaptureDevice> {
    device: D,
    canonical_width: u32,
    state: SourceState,
    frames_captured: u64,
}

impl<D: CaptureDevice> FrameSource<D> {
    pub fn new(device: D) -> Self {
        Self::with_canonical_width(device, CANONICAL_WIDTH)
    }

    pub fn with_canonical_width(device: D, canonical_width: u32) -> Self {
        Self {
            device,
            canonical_width,
            state: SourceState::Created,
            frames_captured: 0,
        }
    }

    pub fn open(&mut self) -> Result<(), CaptureError> {
        match self.state {
            SourceState::Open => return Ok(()),
            SourceState::Closed => return Err(CaptureError::Closed),
            SourceState::Created => {}
        }
        self.device.open()?;
        self.state = SourceState::Open;
        log::info!(
            "FrameSource: opened {} (canonical width {})",
            self.device.name(),
            self.canonical_width
        );
        Ok(())
    }

    /// Acquire, normalize and resize the next frame.
    pub fn next_frame(&mut self) -> Result<RawFrame, CaptureError> {
        match self.state {
            SourceState::Created => return Err(CaptureError::NotOpen),
            SourceState::Closed => return Err(CaptureError::Closed),
            SourceState::Open => {}
        }

        let capture = self.device.read()?;
        let rgb = normalize::normalize_to_rgb(
            &capture.pixels,
            capture.width,
            capture.height,
            capture.format,
        )
        .map_err(|e| CaptureError::Format(e.to_string()))?;
        let image = RgbImage::from_raw(capture.width, capture.height, rgb).ok_or_else(|| {
            CaptureError::Format(format!(
                "buffer does not fit {}x{}",
                capture.width, capture.height
            ))
        })?;
        let image = normalize::resize_to_width(image, self.canonical_width);

        self.frames_captured += 1;
        Ok(RawFrame::from_image(image, self.frames_captured))
    }

    pub fn close(&mut self) {
        if self.state == SourceState::Open {
            self.device.close();
            log::info!(
                "FrameSource: closed {} after {} frames",
                self.device.name(),
                self.frames_captured
            );
        }
        self.state = SourceState::Closed;
    }

    pub fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frames_captured,
            device: self.device.name().to_string(),
        }
    }
}

impl<D: CaptureDevice> Drop for FrameSource<D> {
    fn drop(&mut self) {
        self.close();
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedDevice {
        capture: RawCapture,
        reads: u32,
        fail_open: bool,
    }

    impl FixedDevice {
        fn new(width: u32, height: u32, format: PixelFormat) -> Self {
            let len = match format {
                PixelFormat::Gray8 => width * height,
                PixelFormat::Nv12 => width * height + width.div_ceil(2) * 2 * height.div_ceil(2),
                _ => width * height * 3,
            };
            Self {
                capture: RawCapture {
                    pixels: vec![100u8; len as usize],
                    width,
                    height,
                    format,
                },
                reads: 0,
                fail_open: false,
            }
        }
    }

    impl CaptureDevice for FixedDevice {
        fn name(&self) -> &str {
            "fixed"
        }

        fn open(&mut self) -> Result<(), CaptureError> {
            if self.fail_open {
                return Err(CaptureError::Open {
                    device: "fixed".to_string(),
                    reason: "unplugged".to_string(),
                });
            }
            Ok(())
        }

        fn read(&mut self) -> Result<RawCapture, CaptureError> {
            self.reads += 1;
            Ok(self.capture.clone())
        }

        fn close(&mut self) {}
    }

    #[test]
    fn frames_are_resized_to_canonical_width() -> Result<(), CaptureError> {
        let mut source = FrameSource::new(FixedDevice::new(640, 480, PixelFormat::Bgr24));
        source.open()?;
        let frame = source.next_frame()?;
        assert_eq!(frame.dimensions(), (500, 375));
        assert_eq!(frame.seq, 1);
        assert_eq!(source.next_frame()?.seq, 2);
        Ok(())
    }

    #[test]
    fn gray_captures_are_normalized() -> Result<(), CaptureError> {
        let mut source =
            FrameSource::with_canonical_width(FixedDevice::new(4, 2, PixelFormat::Gray8), 4);
        source.open()?;
        let frame = source.next_frame()?;
        assert_eq!(frame.pixels(), &[100u8; 24][..]);
        Ok(())
    }

    #[test]
    fn reading_before_open_fails() {
        let mut source = FrameSource::new(FixedDevice::new(4, 4, PixelFormat::Rgb24));
        assert_eq!(source.next_frame().err(), Some(CaptureError::NotOpen));
    }

    #[test]
    fn closed_source_cannot_restart() -> Result<(), CaptureError> {
        let mut source = FrameSource::new(FixedDevice::new(4, 4, PixelFormat::Rgb24));
        source.open()?;
        source.close();
        assert_eq!(source.next_frame().err(), Some(CaptureError::Closed));
        assert_eq!(source.open().err(), Some(CaptureError::Closed));
        Ok(())
    }

    #[test]
    fn open_failure_is_reported() {
        let mut device = FixedDevice::new(4, 4, PixelFormat::Rgb24);
        device.fail_open = true;
        let mut source = FrameSource::new(device);
        assert!(matches!(source.open(), Err(CaptureError::Open { .. })));
    }

    #[test]
    fn short_capture_is_a_format_error() -> Result<(), CaptureError> {
        let mut device = FixedDevice::new(4, 4, PixelFormat::Rgb24);
        device.capture.pixels.truncate(10);
        let mut source = FrameSource::new(device);
        source.open()?;
        assert!(matches!(source.next_frame(), Err(CaptureError::Format(_))));
        Ok(())
    }

    #[test]
    fn odd_sized_nv12_is_normalized_or_rejected() -> Result<(), CaptureError> {
        let mut source =
            FrameSource::with_canonical_width(FixedDevice::new(3, 3, PixelFormat::Nv12), 3);
        source.open()?;
        assert_eq!(source.next_frame()?.dimensions(), (3, 3));

        let mut device = FixedDevice::new(3, 3, PixelFormat::Nv12);
        device.capture.pixels.truncate(13);
        let mut source = FrameSource::with_canonical_width(device, 3);
        source.open()?;
        assert!(matches!(source.next_frame(), Err(CaptureError::Format(_))));
        Ok(())
    }

    #[test]
    fn open_device_rejects_unknown_schemes() {
        assert!(matches!(
            open_device("rtsp://camera", 640, 480),
            Err(CaptureError::Open { .. })
        ));
        assert!(open_device("stub://camera", 64, 48).is_ok());
    }
}
