/// Hand detector trait and landmark types
///
/// Defines the interface to the external hand-landmark model.
use image::RgbImage;

use crate::error::DetectionError;

/// Hand landmark indices (MediaPipe hand landmark model convention)
#[allow(dead_code)]
pub mod landmarks {
    pub const WRIST: usize = 0;
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_FINGER_MCP: usize = 5;
    pub const INDEX_FINGER_PIP: usize = 6;
    pub const INDEX_FINGER_DIP: usize = 7;
    pub const INDEX_FINGER_TIP: usize = 8;
    pub const MIDDLE_FINGER_MCP: usize = 9;
    pub const MIDDLE_FINGER_PIP: usize = 10;
    pub const MIDDLE_FINGER_DIP: usize = 11;
    pub const MIDDLE_FINGER_TIP: usize = 12;
    pub const RING_FINGER_MCP: usize = 13;
    pub const RING_FINGER_PIP: usize = 14;
    pub const RING_FINGER_DIP: usize = 15;
    pub const RING_FINGER_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_DIP: usize = 19;
    pub const PINKY_TIP: usize = 20;

    pub const COUNT: usize = 21;
}

/// Bones drawn between landmarks
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (0, 1), (1, 2), (2, 3), (3, 4),
    (0, 5), (5, 6), (6, 7), (7, 8),
    (5, 9), (9, 10), (10, 11), (11, 12),
    (9, 13), (13, 14), (14, 15), (15, 16),
    (13, 17), (17, 18), (18, 19), (19, 20),
    (0, 17),
];

/// A single hand landmark
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    /// X coordinate (0.0 to 1.0, normalized to image width)
    pub x: f32,
    /// Y coordinate (0.0 to 1.0, normalized to image height; smaller is higher)
    pub y: f32,
    /// Depth relative to the wrist
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// One detected hand with all 21 landmarks
#[derive(Clone, Debug, PartialEq)]
pub struct HandLandmarks {
    pub landmarks: [Landmark; landmarks::COUNT],
    /// Detection confidence (0.0 to 1.0)
    pub score: f32,
    /// "Left" or "Right" as reported by the model
    pub handedness: String,
}

impl HandLandmarks {
    pub fn new(landmarks: [Landmark; landmarks::COUNT]) -> Self {
        Self {
            landmarks,
            score: 1.0,
            handedness: String::new(),
        }
    }

    /// Build from a landmark list, which must hold exactly 21 points
    pub fn from_points(points: &[Landmark]) -> Result<Self, DetectionError> {
        let landmarks: [Landmark; landmarks::COUNT] = points
            .try_into()
            .map_err(|_| DetectionError::MalformedHand(points.len()))?;
        Ok(Self::new(landmarks))
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = score;
        self
    }

    pub fn with_handedness(mut self, handedness: impl Into<String>) -> Self {
        self.handedness = handedness.into();
        self
    }

    pub fn get(&self, index: usize) -> &Landmark {
        &self.landmarks[index]
    }

    /// All landmarks in pixel coordinates
    pub fn to_pixels(&self, width: u32, height: u32) -> Vec<(f32, f32)> {
        self.landmarks
            .iter()
            .map(|lm| (lm.x * width as f32, lm.y * height as f32))
            .collect()
    }
}

/// Hand landmark detector
///
/// An empty result means no hand is in the frame; that is the normal
/// "hand left" signal, not an error.
pub trait HandDetector {
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<HandLandmarks>, DetectionError>;

    /// Get detector name (for logging)
    fn name(&self) -> &'static str;
}

/// Detector that never sees a hand. Used when the real detector can't start.
#[derive(Debug, Default)]
pub struct NullDetector;

impl HandDetector for NullDetector {
    fn detect(&mut self, _image: &RgbImage) -> Result<Vec<HandLandmarks>, DetectionError> {
        Ok(Vec::new())
    }

    fn name(&self) -> &'static str {
        "NullDetector"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points_requires_21() {
        let points = vec![Landmark::default(); 20];
        assert!(matches!(
            HandLandmarks::from_points(&points),
            Err(DetectionError::MalformedHand(20))
        ));

        let points = vec![Landmark::new(0.5, 0.5, 0.0); 21];
        let hand = HandLandmarks::from_points(&points).unwrap();
        assert_eq!(hand.get(landmarks::PINKY_TIP).x, 0.5);
    }

    #[test]
    fn test_to_pixels() {
        let mut points = [Landmark::default(); landmarks::COUNT];
        points[landmarks::WRIST] = Landmark::new(0.5, 1.0, 0.0);
        let hand = HandLandmarks::new(points);

        let pixels = hand.to_pixels(320, 240);
        assert_eq!(pixels.len(), 21);
        assert_eq!(pixels[landmarks::WRIST], (160.0, 240.0));
    }

    #[test]
    fn test_connections_reference_valid_landmarks() {
        assert!(HAND_CONNECTIONS
            .iter()
            .all(|&(a, b)| a < landmarks::COUNT && b < landmarks::COUNT));
    }

    #[test]
    fn test_null_detector_sees_nothing() {
        let mut detector = NullDetector;
        let image = RgbImage::new(4, 4);
        assert!(detector.detect(&image).unwrap().is_empty());
    }
}
