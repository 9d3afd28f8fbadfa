//! Synthetic capture device (`stub://` URLs).
//!
//! Renders a static textured background with low-amplitude sensor noise. A
//! `SceneScript` decides, frame by frame, whether a bright block moves across the
//! scene. Used by tests, the demo binary, and as a stand-in camera when no hardware
//! is attached.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{CaptureDevice, CaptureError, PixelFormat, RawCapture};

/// What the synthetic camera is looking at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scene {
    /// Background only.
    Still,
    /// A square block of `size` pixels sliding right by `speed` pixels per frame.
    Moving { size: u32, speed: u32 },
}

/// Ordered `(frames, scene)` segments. After the last segment the final scene holds.
#[derive(Clone, Debug, Default)]
pub struct SceneScript {
    segments: Vec<(u64, Scene)>,
}

impl SceneScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, frames: u64, scene: Scene) -> Self {
        self.segments.push((frames, scene));
        self
    }

    /// Scene for the 1-based frame number `n`.
    pub fn scene_at(&self, n: u64) -> Scene {
        let mut start = 0u64;
        for (frames, scene) in &self.segments {
            start = start.saturating_add(*frames);
            if n <= start {
                return *scene;
            }
        }
        self.segments
            .last()
            .map(|(_, scene)| *scene)
            .unwrap_or(Scene::Still)
    }
}

/// Configuration for a synthetic device.
#[derive(Clone, Debug)]
pub struct SyntheticConfig {
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Maximum per-sample noise amplitude, in intensity levels.
    pub noise: u8,
    pub seed: u64,
    pub script: SceneScript,
    /// Fail every read after this many frames (simulates an unplugged camera).
    pub fail_after: Option<u64>,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            name: "camera".to_string(),
            width: 640,
            height: 480,
            noise: 2,
            seed: 0x5e_47_12,
            script: SceneScript::default(),
            fail_after: None,
        }
    }
}

pub struct SyntheticDevice {
    config: SyntheticConfig,
    label: String,
    rng: StdRng,
    frame_count: u64,
    block_x: u32,
    open: bool,
}

impl SyntheticDevice {
    pub fn new(config: SyntheticConfig) -> Self {
        Self {
            label: format!("stub://{}", config.name),
            rng: StdRng::seed_from_u64(config.seed),
            config,
            frame_count: 0,
            block_x: 0,
            open: false,
        }
    }

    fn render(&mut self, scene: Scene) -> Vec<u8> {
        let w = self.config.width;
        let h = self.config.height;
        let noise = self.config.noise as i16;

        let block = match scene {
            Scene::Still => None,
            Scene::Moving { size, speed } => {
                self.block_x = (self.block_x + speed) % w.max(1);
                let top = h.saturating_sub(size) / 2;
                Some((self.block_x, top, size))
            }
        };

        let mut pixels = Vec::with_capacity((w * h * 3) as usize);
        for y in 0..h {
            for x in 0..w {
                let inside = block.is_some_and(|(bx, by, size)| {
                    let dx = (x + w - bx) % w;
                    dx < size && y >= by && y < by + size
                });
                let base: i16 = if inside {
                    230
                } else {
                    60 + ((x / 8 + y / 8) % 4) as i16 * 10
                };
                let jitter = if noise > 0 {
                    self.rng.gen_range(-noise..=noise)
                } else {
                    0
                };
                let value = (base + jitter).clamp(0, 255) as u8;
                pixels.extend_from_slice(&[value, value, value]);
            }
        }
        pixels
    }
}

impl CaptureDevice for SyntheticDevice {
    fn name(&self) -> &str {
        &self.label
    }

    fn open(&mut self) -> Result<(), CaptureError> {
        if self.config.width == 0 || self.config.height == 0 {
            return Err(CaptureError::Open {
                device: self.label.clone(),
                reason: "synthetic frame size must be non-zero".to_string(),
            });
        }
        self.open = true;
        log::info!(
            "SyntheticDevice: connected to {} ({}x{})",
            self.label,
            self.config.width,
            self.config.height
        );
        Ok(())
    }

    fn read(&mut self) -> Result<RawCapture, CaptureError> {
        if !self.open {
            return Err(CaptureError::NotOpen);
        }
        if let Some(limit) = self.config.fail_after {
            if self.frame_count >= limit {
                return Err(CaptureError::Read {
                    device: self.label.clone(),
                    reason: format!("device stopped after {} frames", limit),
                });
            }
        }

        self.frame_count += 1;
        let scene = self.config.script.scene_at(self.frame_count);
        let pixels = self.render(scene);
        Ok(RawCapture {
            pixels,
            width: self.config.width,
            height: self.config.height,
            format: PixelFormat::Rgb24,
        })
    }

    fn close(&mut self) {
        self.open = false;
    }
}
