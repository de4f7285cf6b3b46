use thiserror::Error;

/// Domain errors using thiserror for structured error handling.
///
/// None of these terminate the game loop: each collaborator reports its
/// failure and the loop logs it and carries on. They can be chained with
/// anyhow at startup.

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Capture device {index} is unavailable")]
    DeviceUnavailable {
        index: u32,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to read a frame from the capture device")]
    ReadFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Capture device returned an empty {width}x{height} frame")]
    EmptyFrame { width: u32, height: u32 },

    #[error("Capture backend error: {0}")]
    Backend(String),
}

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("Failed to start hand detector helper: {command}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Hand detector helper did not signal ready, got: {0:?}")]
    NotReady(String),

    #[error("Hand detector I/O failed")]
    Io(#[from] std::io::Error),

    #[error("Malformed hand detector response: {response}")]
    Protocol {
        response: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Hand detector helper reported: {0}")]
    Helper(String),

    #[error("Expected 21 landmarks, got {0}")]
    MalformedHand(usize),
}

#[derive(Error, Debug)]
pub enum AnnounceError {
    #[error("Speech synthesis failed")]
    Synthesis(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Speech playback failed")]
    Playback(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("No audio output device available")]
    OutputUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),
}

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("Failed to open display window")]
    Init(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Failed to update display window")]
    Update(#[source] Box<dyn std::error::Error + Send + Sync>),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Type alias for application Results using anyhow for context chaining
pub type AppResult<T> = anyhow::Result<T>;
