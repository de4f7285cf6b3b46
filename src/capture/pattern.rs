//! Synthetic capture device for builds without the `camera` feature.

use std::thread;
use std::time::{Duration, Instant};

use image::{Rgb, RgbImage};

use super::CaptureDevice;
use crate::config::CameraConfig;
use crate::error::CaptureError;

/// Scrolling colour gradient delivered at the requested frame rate
pub struct TestPatternDevice {
    width: u32,
    height: u32,
    frame_interval: Duration,
    next_due: Instant,
    tick: u32,
}

impl TestPatternDevice {
    pub fn open(settings: &CameraConfig) -> Result<Self, CaptureError> {
        if settings.width == 0 || settings.height == 0 {
            return Err(CaptureError::EmptyFrame {
                width: settings.width,
                height: settings.height,
            });
        }
        Ok(Self {
            width: settings.width,
            height: settings.height,
            frame_interval: Duration::from_secs(1) / settings.fps.max(1),
            next_due: Instant::now(),
            tick: 0,
        })
    }

    fn render(&self) -> RgbImage {
        let shift = self.tick.wrapping_mul(4);
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let r = ((x + shift) * 255 / self.width.max(1)) as u8;
            let g = (y * 255 / self.height.max(1)) as u8;
            Rgb([r, g, 96])
        })
    }
}

impl CaptureDevice for TestPatternDevice {
    fn read_frame(&mut self) -> Result<RgbImage, CaptureError> {
        // Pace like a real device: block until the next frame is due
        let now = Instant::now();
        if self.next_due > now {
            thread::sleep(self.next_due - now);
        }
        self.next_due = Instant::now() + self.frame_interval;

        let image = self.render();
        self.tick = (self.tick + 1) % self.width.max(1);
        Ok(image)
    }

    fn name(&self) -> String {
        format!("test pattern {}x{}", self.width, self.height)
    }
}
