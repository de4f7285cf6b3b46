/// MediaPipe hand landmarker via a helper subprocess
///
/// The helper (`scripts/hand_detect.py`) loads the MediaPipe Hands model
/// with the configured detection/tracking confidences and answers one JSON
/// line per frame.
///
/// ## Protocol
///
/// ```text
/// helper -> READY\n                                   (once, at startup)
/// rust   -> width:u32le height:u32le channels:u32le <raw RGB bytes>
/// helper -> {"hands":[{"handedness":..,"score":..,"landmarks":[{x,y,z} x21]}],"error":null}\n
/// ```
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use image::RgbImage;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::detector::{HandDetector, HandLandmarks, Landmark};
use crate::config::DetectorConfig;
use crate::error::DetectionError;

const READY_SIGNAL: &str = "READY";

#[derive(Deserialize, Debug)]
struct LandmarkJson {
    x: f32,
    y: f32,
    #[serde(default)]
    z: f32,
}

#[derive(Deserialize, Debug)]
struct HandJson {
    #[serde(default)]
    handedness: String,
    #[serde(default)]
    score: f32,
    landmarks: Vec<LandmarkJson>,
}

#[derive(Deserialize, Debug)]
struct DetectionResponse {
    #[serde(default)]
    hands: Vec<HandJson>,
    #[serde(default)]
    error: Option<String>,
}

/// Parse one response line into hands. Hands without 21 landmarks are skipped.
fn parse_response(line: &str) -> Result<Vec<HandLandmarks>, DetectionError> {
    let response: DetectionResponse =
        serde_json::from_str(line.trim()).map_err(|source| DetectionError::Protocol {
            response: line.trim().to_string(),
            source,
        })?;

    if let Some(error) = response.error {
        return Err(DetectionError::Helper(error));
    }

    let mut hands = Vec::with_capacity(response.hands.len());
    for hand in response.hands {
        let points: Vec<Landmark> = hand
            .landmarks
            .iter()
            .map(|lm| Landmark::new(lm.x, lm.y, lm.z))
            .collect();
        match HandLandmarks::from_points(&points) {
            Ok(landmarks) => hands.push(
                landmarks
                    .with_score(hand.score)
                    .with_handedness(hand.handedness),
            ),
            Err(err) => warn!("Skipping hand: {err}"),
        }
    }
    Ok(hands)
}

/// Hand detector backed by the MediaPipe helper process
pub struct MediaPipeDetector {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl MediaPipeDetector {
    /// Start the helper and wait for its ready signal
    pub fn spawn(config: &DetectorConfig) -> Result<Self, DetectionError> {
        let command_line = format!("{} {}", config.python, config.script);
        info!("Starting MediaPipe hand detector: {}", command_line);

        let mut process = Command::new(&config.python)
            .arg(&config.script)
            .arg("--min-detection-confidence")
            .arg(config.min_detection_confidence.to_string())
            .arg("--min-tracking-confidence")
            .arg(config.min_tracking_confidence.to_string())
            .arg("--max-num-hands")
            .arg(config.max_num_hands.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| DetectionError::Spawn {
                command: command_line.clone(),
                source,
            })?;

        let (Some(stdin), Some(stdout)) = (process.stdin.take(), process.stdout.take()) else {
            let _ = process.kill();
            return Err(DetectionError::NotReady("helper pipes unavailable".to_string()));
        };
        let mut stdout = BufReader::new(stdout);

        let mut ready_line = String::new();
        stdout.read_line(&mut ready_line)?;
        if ready_line.trim() != READY_SIGNAL {
            let _ = process.kill();
            return Err(DetectionError::NotReady(ready_line.trim().to_string()));
        }

        info!("MediaPipe hand detector ready");
        Ok(Self {
            process,
            stdin,
            stdout,
        })
    }
}

impl HandDetector for MediaPipeDetector {
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<HandLandmarks>, DetectionError> {
        let (width, height) = image.dimensions();

        self.stdin.write_all(&width.to_le_bytes())?;
        self.stdin.write_all(&height.to_le_bytes())?;
        self.stdin.write_all(&3u32.to_le_bytes())?;
        self.stdin.write_all(image.as_raw())?;
        self.stdin.flush()?;

        let mut response = String::new();
        if self.stdout.read_line(&mut response)? == 0 {
            return Err(DetectionError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "hand detector helper exited",
            )));
        }

        let hands = parse_response(&response)?;
        if let Some(hand) = hands.first() {
            debug!(
                "Hand detected: {} (score={:.2}), {} total",
                hand.handedness,
                hand.score,
                hands.len()
            );
        }
        Ok(hands)
    }

    fn name(&self) -> &'static str {
        "MediaPipeDetector"
    }
}

impl Drop for MediaPipeDetector {
    fn drop(&mut self) {
        // Kill the helper when the detector is dropped
        let _ = self.process.kill();
        let _ = self.process.wait();
    }
}
