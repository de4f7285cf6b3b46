//! Webcam capture via `nokhwa`.
//!
//! The requested resolution and frame rate are hints: the backend picks the
//! closest mode the camera supports.

use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
};
use nokhwa::Camera;
use tracing::{info, warn};

use super::CaptureDevice;
use crate::config::CameraConfig;
use crate::error::CaptureError;

pub struct WebcamDevice {
    camera: Camera,
    index: u32,
}

impl WebcamDevice {
    /// Open the camera and start streaming
    pub fn open(settings: &CameraConfig) -> Result<Self, CaptureError> {
        let unavailable = |e: nokhwa::NokhwaError| CaptureError::DeviceUnavailable {
            index: settings.device_index,
            source: Box::new(e),
        };

        let wanted = CameraFormat::new(
            Resolution::new(settings.width, settings.height),
            FrameFormat::MJPEG,
            settings.fps,
        );
        let format = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(wanted));

        let mut camera =
            Camera::new(CameraIndex::Index(settings.device_index), format).map_err(unavailable)?;
        camera.open_stream().map_err(unavailable)?;

        let actual = camera.camera_format();
        info!(
            "Webcam {} streaming at {}x{} @ {} fps ({:?})",
            settings.device_index,
            actual.width(),
            actual.height(),
            actual.frame_rate(),
            actual.format()
        );

        Ok(Self {
            camera,
            index: settings.device_index,
        })
    }
}

impl CaptureDevice for WebcamDevice {
    fn read_frame(&mut self) -> Result<RgbImage, CaptureError> {
        let buffer = self
            .camera
            .frame()
            .map_err(|e| CaptureError::ReadFailed(Box::new(e)))?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CaptureError::ReadFailed(Box::new(e)))?;

        // Rebuild on our own `image` version; only the raw bytes cross over
        let (width, height) = (decoded.width(), decoded.height());
        RgbImage::from_raw(width, height, decoded.into_raw())
            .ok_or(CaptureError::EmptyFrame { width, height })
    }

    fn release(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            warn!("Failed to stop webcam stream: {e}");
        }
    }

    fn name(&self) -> String {
        format!("webcam {} ({})", self.index, self.camera.info().human_name())
    }
}
