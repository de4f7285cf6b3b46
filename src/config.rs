use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Capture device request. Resolution and frame rate are hints; the
/// device may pick the closest mode it supports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub device_index: u32,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Flip frames horizontally before detection and display (selfie view)
    pub mirror: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            width: 320,  // Lower resolution for performance
            height: 240,
            fps: 15,     // Reduce FPS to reduce load
            mirror: true,
        }
    }
}

/// Pacing of the game loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Gestures are evaluated only on every Nth processed frame
    pub ai_interval_frames: u64,
    /// Minimum spacing between two announced rounds, in seconds
    pub game_delay_secs: f64,
    /// Dwell time after a hand enters the frame before it can be evaluated
    pub hand_entry_buffer_secs: f64,
    /// Bounded wait for a key event at the end of each iteration
    pub key_wait_ms: u64,
    pub quit_key: char,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            ai_interval_frames: 30,
            game_delay_secs: 5.0,
            hand_entry_buffer_secs: 2.0,
            key_wait_ms: 10,
            quit_key: 'q',
        }
    }
}

impl GameConfig {
    pub fn game_delay(&self) -> Duration {
        Duration::from_secs_f64(self.game_delay_secs)
    }

    pub fn hand_entry_buffer(&self) -> Duration {
        Duration::from_secs_f64(self.hand_entry_buffer_secs)
    }

    pub fn key_wait(&self) -> Duration {
        Duration::from_millis(self.key_wait_ms)
    }
}

/// Hand landmark detector settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
    pub max_num_hands: u32,
    /// Interpreter used to run the helper script
    pub python: String,
    pub script: String,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
            max_num_hands: 2,
            python: "python3".to_string(),
            script: "scripts/hand_detect.py".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub enabled: bool,
    pub language: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            language: "en".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub camera: CameraConfig,
    pub game: GameConfig,
    pub detector: DetectorConfig,
    pub speech: SpeechConfig,
}

impl Config {
    /// Load configuration from `config/config.json` next to the executable.
    /// Never fails: a missing file means defaults, and an unreadable or
    /// invalid one is logged and replaced by the defaults too.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_or_default(&path),
            _ => Self::default(),
        }
    }

    /// Load from `path`, falling back to the defaults on any error
    pub fn load_or_default(path: &std::path::Path) -> Self {
        Self::load_from(path).unwrap_or_else(|e| {
            tracing::warn!("{:#}; using default configuration", anyhow::Error::new(e));
            Self::default()
        })
    }

    /// Load and validate configuration from an explicit path
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        let load_failed = |source: Box<dyn std::error::Error + Send + Sync>| {
            ConfigError::LoadFailed {
                path: path.display().to_string(),
                source,
            }
        };

        let content = fs::read_to_string(path).map_err(|e| load_failed(Box::new(e)))?;
        let config: Config = serde_json::from_str(&content).map_err(|e| load_failed(Box::new(e)))?;
        config.validate()?;

        tracing::info!("Loaded config from: {}", path.display());
        Ok(config)
    }

    /// Reject values the game loop cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.camera.width == 0 || self.camera.height == 0 {
            return invalid("camera resolution must be non-zero");
        }
        if self.camera.fps == 0 {
            return invalid("camera fps must be positive");
        }
        if self.game.ai_interval_frames == 0 {
            return invalid("ai_interval_frames must be at least 1");
        }
        for (name, secs) in [
            ("game_delay_secs", self.game.game_delay_secs),
            ("hand_entry_buffer_secs", self.game.hand_entry_buffer_secs),
        ] {
            // Rejects NaN, negatives and values too large for a Duration
            if Duration::try_from_secs_f64(secs).is_err() {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative, representable number of seconds"
                )));
            }
        }
        for (name, confidence) in [
            ("min_detection_confidence", self.detector.min_detection_confidence),
            ("min_tracking_confidence", self.detector.min_tracking_confidence),
        ] {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(ConfigError::Invalid(format!("{name} must be within [0, 1]")));
            }
        }
        Ok(())
    }

    /// Get the config file path (in app's base directory)
    fn config_path() -> Option<PathBuf> {
        let exe_path = env::current_exe().ok()?;
        Some(exe_path.parent()?.join("config").join("config.json"))
    }

    /// Get the config file path (for display purposes)
    pub fn config_path_display() -> String {
        Self::config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}
