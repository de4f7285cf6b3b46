use anyhow::Context;
use sysinfo::System;
use tracing::{error, info, warn};

use hand_rps::capture::FrameSource;
use hand_rps::config::Config;
use hand_rps::detection::{HandDetector, MediaPipeDetector, NullDetector};
use hand_rps::display::{HeadlessSurface, RenderSurface};
use hand_rps::error::AppResult;
use hand_rps::game::GameLoop;
use hand_rps::speech::{Announcer, LogAnnouncer};
use hand_rps::utils::ShutdownSignal;

const LOG_TARGET_STARTUP: &str = "hand_rps::startup";
const WINDOW_TITLE: &str = "Hand Tracking with AI - Hand Entry Buffer";

/// Initialize tracing with file rotation
///
/// Logs are written to `<config dir>/HandRps/logs/hand-rps.YYYY-MM-DD.log`.
/// Debug builds also log to the console.
fn initialize_tracing() {
    use tracing_appender::rolling;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_dir = dirs::config_dir()
        .map(|dir| dir.join("HandRps").join("logs"))
        .unwrap_or_else(|| std::path::PathBuf::from("logs"));

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Failed to create log directory: {}", e);
    }

    let file_appender = rolling::daily(&log_dir, "hand-rps.log");

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true);

    #[cfg(debug_assertions)]
    {
        let console_layer = fmt::layer()
            .with_writer(std::io::stdout)
            .with_ansi(true)
            .with_target(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(console_layer)
            .init();
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();
    }

    info!("Log directory: {}", log_dir.display());
}

fn log_runtime_environment() {
    let version = env!("CARGO_PKG_VERSION");
    let os_name = System::long_os_version()
        .or_else(System::name)
        .unwrap_or_else(|| "Unknown OS".to_string());
    let kernel = System::kernel_version().unwrap_or_else(|| "Unknown Kernel".to_string());
    let architecture = std::env::consts::ARCH;

    info!(target: LOG_TARGET_STARTUP, "Starting Hand RPS v{} on ({})", version, architecture);
    info!(target: LOG_TARGET_STARTUP, "Operating System: {} (kernel {})", os_name, kernel);
    info!(
        target: LOG_TARGET_STARTUP,
        "Backends: camera={} speech={} window={}",
        cfg!(feature = "camera"),
        cfg!(feature = "speech"),
        cfg!(feature = "window")
    );
}

fn start_capture(config: &Config) -> AppResult<FrameSource> {
    #[cfg(feature = "camera")]
    let source = FrameSource::start(config.camera.clone(), hand_rps::capture::webcam::WebcamDevice::open);
    #[cfg(not(feature = "camera"))]
    let source = {
        warn!("Built without the camera feature, using a test pattern");
        FrameSource::start(config.camera.clone(), hand_rps::capture::pattern::TestPatternDevice::open)
    };

    source.context("Failed to start capture thread")
}

fn create_detector(config: &Config) -> Box<dyn HandDetector> {
    match MediaPipeDetector::spawn(&config.detector) {
        Ok(detector) => Box::new(detector),
        Err(e) => {
            error!("✗ Hand detector unavailable: {}", e);
            warn!("  Install the helper with: pip install mediapipe numpy");
            Box::new(NullDetector)
        }
    }
}

fn create_announcer(config: &Config) -> Box<dyn Announcer> {
    if !config.speech.enabled {
        info!("Speech disabled, results are logged only");
        return Box::new(LogAnnouncer);
    }

    #[cfg(feature = "speech")]
    match hand_rps::speech::GoogleTtsAnnouncer::new(&config.speech) {
        Ok(announcer) => return Box::new(announcer),
        Err(e) => warn!("Speech output unavailable ({}), results are logged only", e),
    }

    Box::new(LogAnnouncer)
}

fn create_surface(config: &Config) -> Box<dyn RenderSurface> {
    #[cfg(feature = "window")]
    match hand_rps::display::WindowSurface::open(WINDOW_TITLE, config.camera.width, config.camera.height) {
        Ok(surface) => return Box::new(surface),
        Err(e) => warn!("Failed to open window ({}), running headless", e),
    }

    #[cfg(not(feature = "window"))]
    let _ = config;
    info!("No window for '{}', press Ctrl+C to quit", WINDOW_TITLE);
    Box::new(HeadlessSurface)
}

fn main() -> AppResult<()> {
    initialize_tracing();
    log_runtime_environment();

    info!("Config file: {}", Config::config_path_display());
    let config = Config::load();
    info!(
        "✓ Configuration loaded: {}x{}@{}fps, game delay {}s, entry buffer {}s",
        config.camera.width,
        config.camera.height,
        config.camera.fps,
        config.game.game_delay_secs,
        config.game.hand_entry_buffer_secs
    );

    let shutdown = ShutdownSignal::new();
    if let Err(e) = shutdown.install_ctrlc_handler() {
        warn!("Failed to install Ctrl+C handler: {}", e);
    }

    let source = start_capture(&config)?;
    let detector = create_detector(&config);
    let announcer = create_announcer(&config);
    let surface = create_surface(&config);

    let stats = GameLoop::new(&config, source, detector, announcer, surface)
        .with_shutdown(shutdown)
        .run();

    info!("Played {} rounds", stats.rounds);
    Ok(())
}
