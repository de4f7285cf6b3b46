/// Detection module
///
/// Hand landmark detection and gesture classification.
///
/// ## Architecture
///
/// ```text
/// Frame (RGB)
///   └── HandDetector (external model)
///       ├── MediaPipeDetector (helper subprocess)
///       └── NullDetector (fallback)
///           └── HandLandmarks -> classify_hand_shape -> Gesture
/// ```

pub mod classifier;
pub mod detector;
pub mod mediapipe;

// Re-export commonly used types
pub use classifier::classify_hand_shape;
pub use detector::{landmarks, HandDetector, HandLandmarks, Landmark, NullDetector, HAND_CONNECTIONS};
pub use mediapipe::MediaPipeDetector;
