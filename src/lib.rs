//! Webcam rock-paper-scissors.
//!
//! A capture thread keeps the latest camera frame; the game loop runs hand
//! detection on it, waits for the hand to settle, classifies its shape and
//! plays a round against a random opponent, reading the result aloud.

pub mod capture;
pub mod config;
pub mod detection;
pub mod display;
pub mod error;
pub mod game;
pub mod speech;
pub mod utils;
