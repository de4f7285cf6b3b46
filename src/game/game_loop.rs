/// Game loop
///
/// Single-threaded cooperative loop: read the latest frame, detect hands,
/// run the gate, play and announce a round when the gate fires, present the
/// frame and check for quit.
use std::sync::Arc;
use std::time::Instant;

use image::imageops;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use super::gating::{FireDecision, GatingState, Phase};
use super::selector::MoveSelector;
use super::{Outcome, Round};
use crate::capture::{Frame, FrameSource};
use crate::config::{Config, GameConfig};
use crate::detection::{classify_hand_shape, HandDetector, HandLandmarks};
use crate::display::{draw_landmarks, RenderSurface, SurfaceEvent};
use crate::speech::Announcer;
use crate::utils::{FrameRateMeter, ShutdownSignal, WarnThrottle};

/// Frames between frame-rate log lines
const STATUS_EVERY_FRAMES: u64 = 100;
/// Repeats of the same failure between warnings
const WARN_EVERY: u64 = 500;

/// Time source for the gate
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Counters for one session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub frames_processed: u64,
    pub frames_skipped: u64,
    pub rounds: u64,
    pub player_wins: u64,
    pub ai_wins: u64,
    pub ties: u64,
    pub announce_failures: u64,
    pub detector_errors: u64,
}

impl SessionStats {
    fn record(&mut self, round: &Round) {
        self.rounds += 1;
        match round.outcome {
            Outcome::PlayerWin => self.player_wins += 1,
            Outcome::AiWin => self.ai_wins += 1,
            Outcome::Tie => self.ties += 1,
        }
    }
}

/// Whether the loop should keep going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Quit,
}

pub struct GameLoop<C: Clock = SystemClock> {
    config: GameConfig,
    mirror: bool,
    source: FrameSource,
    detector: Box<dyn HandDetector>,
    announcer: Box<dyn Announcer>,
    surface: Box<dyn RenderSurface>,
    selector: MoveSelector<StdRng>,
    clock: C,
    gate: GatingState,
    shutdown: ShutdownSignal,
    frame_count: u64,
    skip_warnings: WarnThrottle,
    detector_warnings: WarnThrottle,
    meter: FrameRateMeter,
    stats: SessionStats,
    last_round: Option<Round>,
}

impl GameLoop<SystemClock> {
    pub fn new(
        config: &Config,
        source: FrameSource,
        detector: Box<dyn HandDetector>,
        announcer: Box<dyn Announcer>,
        surface: Box<dyn RenderSurface>,
    ) -> Self {
        Self::with_clock(config, source, detector, announcer, surface, SystemClock)
    }
}

impl<C: Clock> GameLoop<C> {
    /// Build the loop on a specific clock. The game timer starts now, so the
    /// first round can't fire before one game delay has passed.
    pub fn with_clock(
        config: &Config,
        source: FrameSource,
        detector: Box<dyn HandDetector>,
        announcer: Box<dyn Announcer>,
        surface: Box<dyn RenderSurface>,
        clock: C,
    ) -> Self {
        let start = clock.now();
        info!(
            "Game loop using {}, {} and {}",
            detector.name(),
            announcer.name(),
            surface.name()
        );

        Self {
            config: config.game.clone(),
            mirror: config.camera.mirror,
            source,
            detector,
            announcer,
            surface,
            selector: MoveSelector::with_rng(StdRng::from_entropy()),
            clock,
            gate: GatingState::new(&config.game, start),
            shutdown: ShutdownSignal::new(),
            frame_count: 0,
            skip_warnings: WarnThrottle::new(WARN_EVERY),
            detector_warnings: WarnThrottle::new(WARN_EVERY),
            meter: FrameRateMeter::new(STATUS_EVERY_FRAMES, start),
            stats: SessionStats::default(),
            last_round: None,
        }
    }

    pub fn with_selector(mut self, selector: MoveSelector<StdRng>) -> Self {
        self.selector = selector;
        self
    }

    /// Quit when `signal` is triggered (e.g. from Ctrl+C)
    pub fn with_shutdown(mut self, signal: ShutdownSignal) -> Self {
        self.shutdown = signal;
        self
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn last_round(&self) -> Option<&Round> {
        self.last_round.as_ref()
    }

    pub fn gate(&self) -> &GatingState {
        &self.gate
    }

    /// Run until quit, then release the camera and the window
    pub fn run(mut self) -> SessionStats {
        info!("Game loop started (press '{}' to quit)", self.config.quit_key);
        while self.step() == Step::Continue {}
        self.finish()
    }

    /// One iteration
    pub fn step(&mut self) -> Step {
        if self.shutdown.is_triggered() {
            info!("Exiting the game...");
            return Step::Quit;
        }

        let buffer = self.source.read();
        match buffer.frame() {
            Some(frame) => {
                self.skip_warnings.reset();
                self.process_frame(Arc::clone(frame));
            }
            None => self.skip_frame(),
        }

        self.poll_quit()
    }

    fn skip_frame(&mut self) {
        self.stats.frames_skipped += 1;
        if self.skip_warnings.hit() {
            if self.source.is_running() {
                warn!("No frame available from camera, waiting...");
            } else {
                warn!("Camera unavailable; press '{}' to quit", self.config.quit_key);
            }
        }
    }

    fn process_frame(&mut self, frame: Arc<Frame>) {
        self.frame_count += 1;
        self.stats.frames_processed += 1;

        let mut image = frame.image().clone();
        if self.mirror {
            imageops::flip_horizontal_in_place(&mut image);
        }

        match self.detector.detect(&image) {
            Ok(hands) => {
                let failures = self.detector_warnings.reset();
                if failures > 0 {
                    info!("Hand detection recovered after {failures} failed frames");
                }
                self.update_game(&mut image, &hands);
            }
            Err(err) => {
                // No gating change on a detector failure
                self.stats.detector_errors += 1;
                if self.detector_warnings.hit() {
                    warn!(
                        "Hand detection failed ({} failures so far): {err}",
                        self.stats.detector_errors
                    );
                }
            }
        }

        if let Err(err) = self.surface.present(&image) {
            warn!("Failed to present frame: {err}");
        }

        if let Some(fps) = self.meter.tick(self.clock.now()) {
            info!(
                "Frame {}: {:.1} FPS | Rounds: {} | Skipped: {}",
                self.frame_count, fps, self.stats.rounds, self.stats.frames_skipped
            );
        }
    }

    fn update_game(&mut self, image: &mut image::RgbImage, hands: &[HandLandmarks]) {
        let now = self.clock.now();
        if self.gate.observe(!hands.is_empty(), now) != Phase::Ready {
            return;
        }

        for hand in hands {
            draw_landmarks(image, hand);
            if self.gate.is_evaluation_frame(self.frame_count) {
                self.evaluate(hand);
            }
        }
    }

    fn evaluate(&mut self, hand: &HandLandmarks) {
        match self.gate.try_fire(self.clock.now()) {
            FireDecision::RateLimited { wait } => {
                debug!("Round rate-limited, {:.1}s until next game", wait.as_secs_f64());
            }
            FireDecision::Fired => {
                let player = classify_hand_shape(hand);
                let ai = self.selector.next_move();
                let round = Round::play(player, ai);
                let response = round.announcement();
                info!("{}", response);

                // Blocks until playback ends
                if let Err(err) = self.announcer.announce(&response) {
                    self.stats.announce_failures += 1;
                    warn!("Failed to announce result: {err}");
                }

                self.stats.record(&round);
                self.last_round = Some(round);
            }
        }
    }

    fn poll_quit(&mut self) -> Step {
        match self.surface.wait_event(self.config.key_wait()) {
            Some(SurfaceEvent::Key(key)) if key.eq_ignore_ascii_case(&self.config.quit_key) => {
                info!("Exiting the game...");
                Step::Quit
            }
            Some(SurfaceEvent::Closed) => {
                info!("Window closed, exiting the game...");
                Step::Quit
            }
            _ if self.shutdown.is_triggered() => {
                info!("Exiting the game...");
                Step::Quit
            }
            _ => Step::Continue,
        }
    }

    fn finish(mut self) -> SessionStats {
        self.source.stop();
        self.surface.close();

        let stats = self.stats;
        info!("===========================================");
        info!("  Game over");
        info!("  Frames processed: {}", stats.frames_processed);
        info!("  Frames skipped: {}", stats.frames_skipped);
        info!(
            "  Rounds: {} (you {}, AI {}, ties {})",
            stats.rounds, stats.player_wins, stats.ai_wins, stats.ties
        );
        info!("===========================================");
        stats
    }
}
