//! V4L2 capture device.
//!
//! Opens a local device node (e.g., /dev/video0), requests RGB24 at the preferred
//! size, and streams captures through an mmap buffer queue. If the driver refuses
//! RGB24 the negotiated format is inspected and GRAY8/NV12 are accepted; anything
//! else fails at open time.

use anyhow::Context;
use ouroboros::self_referencing;

use super::{CaptureDevice, CaptureError, PixelFormat, RawCapture};

/// Configuration for a V4L2 device.
#[derive(Clone, Debug)]
pub struct V4l2Config {
    /// Device path (e.g., "/dev/video0")
    pub device: String,
    /// Requested frame rate. Drivers may ignore it.
    pub target_fps: u32,
    /// Preferred frame width.
    pub width: u32,
    /// Preferred frame height.
    pub height: u32,
}

impl Default for V4l2Config {
    fn default() -> Self {
        Self {
            device: "/dev/video0".to_string(),
            target_fps: 30,
            width: 640,
            height: 480,
        }
    }
}

pub struct V4l2Device {
    config: V4l2Config,
    state: Option<V4l2StreamState>,
    active_width: u32,
    active_height: u32,
    format: PixelFormat,
}

#[self_referencing]
struct V4l2StreamState {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

impl V4l2Device {
    pub fn new(config: V4l2Config) -> Self {
        Self {
            active_width: config.width,
            active_height: config.height,
            config,
            state: None,
            format: PixelFormat::Rgb24,
        }
    }

    fn open_error(&self, err: impl std::fmt::Display) -> CaptureError {
        CaptureError::Open {
            device: self.config.device.clone(),
            reason: err.to_string(),
        }
    }

    fn connect(&mut self) -> anyhow::Result<()> {
        use v4l::buffer::Type;
        use v4l::video::Capture;

        let mut device = v4l::Device::with_path(&self.config.device)
            .with_context(|| format!("open v4l2 device {}", self.config.device))?;
        let mut format = device.format().context("read v4l2 format")?;
        format.width = self.config.width;
        format.height = self.config.height;
        format.fourcc = v4l::FourCC::new(b"RGB3");

        let format = match device.set_format(&format) {
            Ok(format) => format,
            Err(err) => {
                log::warn!(
                    "V4l2Device: failed to set format on {}: {}",
                    self.config.device,
                    err
                );
                device
                    .format()
                    .context("read v4l2 format after set failure")?
            }
        };

        self.format = match &format.fourcc.repr {
            b"RGB3" => PixelFormat::Rgb24,
            b"BGR3" => PixelFormat::Bgr24,
            b"GREY" => PixelFormat::Gray8,
            b"NV12" => PixelFormat::Nv12,
            other => {
                anyhow::bail!(
                    "unsupported v4l2 pixel format {}",
                    String::from_utf8_lossy(other)
                )
            }
        };

        if self.config.target_fps > 0 {
            let params = v4l::video::capture::Parameters::with_fps(self.config.target_fps);
            if let Err(err) = device.set_params(&params) {
                log::warn!(
                    "V4l2Device: failed to set fps on {}: {}",
                    self.config.device,
                    err
                );
            }
        }

        self.active_width = format.width;
        self.active_height = format.height;

        let state = V4l2StreamStateBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, 4)
                    .map_err(|err| anyhow::Error::new(err).context("create v4l2 buffer stream"))
            },
        }
        .try_build()?;
        self.state = Some(state);
        Ok(())
    }
}

impl CaptureDevice for V4l2Device {
    fn name(&self) -> &str {
        &self.config.device
    }

    fn open(&mut self) -> Result<(), CaptureError> {
        self.connect().map_err(|err| self.open_error(format!("{:#}", err)))?;
        log::info!(
            "V4l2Device: connected to {} ({}x{}, {:?})",
            self.config.device,
            self.active_width,
            self.active_height,
            self.format
        );
        Ok(())
    }

    fn read(&mut self) -> Result<RawCapture, CaptureError> {
        use v4l::io::traits::CaptureStream;

        let device = self.config.device.clone();
        let state = self.state.as_mut().ok_or(CaptureError::NotOpen)?;
        let pixels = state
            .with_mut(|fields| fields.stream.next().map(|(buf, _meta)| buf.to_vec()))
            .map_err(|err| CaptureError::Read {
                device,
                reason: err.to_string(),
            })?;

        Ok(RawCapture {
            pixels,
            width: self.active_width,
            height: self.active_height,
            format: self.format,
        })
    }

    fn close(&mut self) {
        self.state = None;
    }
}
