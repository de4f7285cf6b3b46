//! Threaded frame source.
//!
//! A dedicated capture thread owns the device, performs the blocking reads
//! and publishes the latest `(success, frame)` pair into a lock-guarded
//! [`FrameBuffer`]. Readers copy the pair out under the same lock and never
//! wait on device I/O. The lock is only held for the assignment or the
//! copy, so neither side stalls the other.
//!
//! # Device ownership
//! The device is opened on the capture thread (some camera backends are not
//! `Send`) and released there exactly once, after the loop observes the
//! stop flag. [`FrameSource::stop`] joins the thread, so no device read
//! happens after it returns.

pub mod pattern;
#[cfg(feature = "camera")]
pub mod webcam;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use image::RgbImage;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::CameraConfig;
use crate::error::CaptureError;

/// Back-off after a failed device read, so a broken device doesn't spin a core
const READ_RETRY_DELAY: Duration = Duration::from_millis(100);

/// A captured RGB frame
#[derive(Debug, Clone)]
pub struct Frame {
    image: RgbImage,
    sequence: u64,
}

impl Frame {
    /// Wrap a captured image. Zero-sized images are rejected.
    pub fn new(image: RgbImage, sequence: u64) -> Result<Self, CaptureError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(CaptureError::EmptyFrame {
                width: image.width(),
                height: image.height(),
            });
        }
        Ok(Self { image, sequence })
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Monotonic capture counter, starting at 1
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// Latest capture result.
///
/// `success` is true exactly when a frame is present; both are replaced
/// together under the source's lock.
#[derive(Debug, Clone, Default)]
pub struct FrameBuffer {
    success: bool,
    frame: Option<Arc<Frame>>,
}

impl FrameBuffer {
    pub fn captured(frame: Arc<Frame>) -> Self {
        Self {
            success: true,
            frame: Some(frame),
        }
    }

    pub fn failed() -> Self {
        Self::default()
    }

    pub fn success(&self) -> bool {
        self.success
    }

    /// The frame, if the last read succeeded
    pub fn frame(&self) -> Option<&Arc<Frame>> {
        self.frame.as_ref().filter(|_| self.success)
    }
}

/// A physical (or simulated) capture device.
///
/// `read_frame` may block for as long as the device needs to deliver the
/// next frame.
pub trait CaptureDevice {
    fn read_frame(&mut self) -> Result<RgbImage, CaptureError>;

    /// Release the underlying device. Called once, on the capture thread.
    fn release(&mut self) {}

    /// Device name (for logging)
    fn name(&self) -> String;
}

/// Background camera reader exposing the most recent frame
pub struct FrameSource {
    buffer: Arc<Mutex<FrameBuffer>>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl FrameSource {
    /// Spawn the capture thread.
    ///
    /// `open` runs on the capture thread with the requested settings. If it
    /// fails, the thread exits and every subsequent [`read`](Self::read)
    /// reports `success == false`.
    pub fn start<F, D>(settings: CameraConfig, open: F) -> std::io::Result<Self>
    where
        F: FnOnce(&CameraConfig) -> Result<D, CaptureError> + Send + 'static,
        D: CaptureDevice,
    {
        let buffer = Arc::new(Mutex::new(FrameBuffer::failed()));
        let running = Arc::new(AtomicBool::new(true));

        let thread_buffer = Arc::clone(&buffer);
        let thread_running = Arc::clone(&running);
        let handle = thread::Builder::new()
            .name("frame-capture".to_string())
            .spawn(move || {
                let device = match open(&settings) {
                    Ok(device) => device,
                    Err(err) => {
                        error!("Failed to open capture device: {err}");
                        return;
                    }
                };
                info!(
                    "Capture device ready: {} (requested {}x{} @ {} fps)",
                    device.name(),
                    settings.width,
                    settings.height,
                    settings.fps
                );
                capture_loop(device, &thread_buffer, &thread_running);
            })?;

        Ok(Self {
            buffer,
            running,
            handle: Some(handle),
        })
    }

    /// Copy out the latest capture result. Never blocks on device I/O; the
    /// frame may be one or more capture cycles old.
    pub fn read(&self) -> FrameBuffer {
        self.buffer.lock().clone()
    }

    /// Poll until the first successful frame arrives or `timeout` elapses
    pub fn wait_for_first_frame(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.read().success() {
                return true;
            }
            if Instant::now() >= deadline || self.handle.as_ref().map_or(true, |h| h.is_finished()) {
                return self.read().success();
            }
            thread::sleep(Duration::from_millis(5));
        }
    }

    /// Whether the capture thread is still alive
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal the capture thread to exit after its current read and wait for
    /// it to release the device. Safe to call more than once.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Capture thread panicked");
            }
            debug!("Frame source stopped");
        }
    }
}

impl Drop for FrameSource {
    fn drop(&mut self) {
        self.stop();
    }
}

fn capture_loop<D: CaptureDevice>(mut device: D, buffer: &Mutex<FrameBuffer>, running: &AtomicBool) {
    let mut sequence = 0u64;
    let mut consecutive_failures = 0u32;

    while running.load(Ordering::Acquire) {
        // Build the frame outside the lock; only the assignment is guarded
        let published = device
            .read_frame()
            .and_then(|image| Frame::new(image, sequence + 1));

        match published {
            Ok(frame) => {
                sequence = frame.sequence();
                publish(buffer, FrameBuffer::captured(Arc::new(frame)));
                if consecutive_failures > 0 {
                    info!("Capture recovered after {consecutive_failures} failed reads");
                }
                consecutive_failures = 0;
            }
            Err(err) => {
                publish(buffer, FrameBuffer::failed());
                if consecutive_failures == 0 {
                    warn!("Capture read failed: {err}");
                }
                consecutive_failures = consecutive_failures.saturating_add(1);
                thread::sleep(READ_RETRY_DELAY);
            }
        }
    }

    device.release();
    debug!("Capture device released after {sequence} frames");
}

/// Swap in the new pair; the previous frame is dropped after the lock is released
fn publish(buffer: &Mutex<FrameBuffer>, next: FrameBuffer) {
    let previous = std::mem::replace(&mut *buffer.lock(), next);
    drop(previous);
}
