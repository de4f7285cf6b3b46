// Integration tests for Hand RPS
// These drive the full game loop with a manual clock and scripted collaborators

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use hand_rps::capture::{CaptureDevice, FrameSource};
use hand_rps::config::{CameraConfig, Config};
use hand_rps::detection::{landmarks, HandDetector, HandLandmarks, Landmark};
use hand_rps::display::{RenderSurface, SurfaceEvent};
use hand_rps::error::{AnnounceError, CaptureError, DetectionError, DisplayError};
use hand_rps::game::{Clock, GameLoop, Gesture, MoveSelector, Step};
use hand_rps::speech::Announcer;
use hand_rps::utils::ShutdownSignal;
use image::{Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Clone)]
struct ManualClock(Rc<Cell<Instant>>);

impl ManualClock {
    fn new() -> Self {
        Self(Rc::new(Cell::new(Instant::now())))
    }

    fn advance(&self, millis: u64) {
        self.0.set(self.0.get() + Duration::from_millis(millis));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.0.get()
    }
}

/// Device that always delivers the same grey frame
struct StaticDevice;

impl CaptureDevice for StaticDevice {
    fn read_frame(&mut self) -> Result<RgbImage, CaptureError> {
        thread::sleep(Duration::from_millis(1));
        Ok(RgbImage::from_pixel(32, 24, Rgb([128, 128, 128])))
    }

    fn name(&self) -> String {
        "StaticDevice".to_string()
    }
}

/// Detector reporting one open hand while `visible` is set, or the
/// helper's in-band error while `fail` is set
struct ScriptedDetector {
    visible: Rc<Cell<bool>>,
    fail: Rc<Cell<bool>>,
}

impl HandDetector for ScriptedDetector {
    fn detect(&mut self, _image: &RgbImage) -> Result<Vec<HandLandmarks>, DetectionError> {
        if self.fail.get() {
            return Err(DetectionError::Helper("scripted failure".to_string()));
        }
        if self.visible.get() {
            Ok(vec![open_hand()])
        } else {
            Ok(Vec::new())
        }
    }

    fn name(&self) -> &'static str {
        "ScriptedDetector"
    }
}

struct RecordingAnnouncer {
    spoken: Rc<RefCell<Vec<String>>>,
    fail: bool,
}

impl Announcer for RecordingAnnouncer {
    fn announce(&mut self, text: &str) -> Result<(), AnnounceError> {
        self.spoken.borrow_mut().push(text.to_string());
        if self.fail {
            return Err(AnnounceError::Synthesis("scripted failure".into()));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "RecordingAnnouncer"
    }
}

/// Surface that presses `key` on its `press_at`-th wait
struct ScriptedSurface {
    presented: Rc<Cell<usize>>,
    waits: usize,
    press_at: Option<(usize, SurfaceEvent)>,
}

impl RenderSurface for ScriptedSurface {
    fn present(&mut self, _image: &RgbImage) -> Result<(), DisplayError> {
        self.presented.set(self.presented.get() + 1);
        Ok(())
    }

    fn wait_event(&mut self, _timeout: Duration) -> Option<SurfaceEvent> {
        self.waits += 1;
        match self.press_at {
            Some((at, event)) if at == self.waits => Some(event),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        "ScriptedSurface"
    }
}

/// Index through pinky tips above the thumb tip
fn open_hand() -> HandLandmarks {
    let mut points = [Landmark::new(0.5, 0.8, 0.0); landmarks::COUNT];
    points[landmarks::THUMB_TIP].y = 0.7;
    for tip in [
        landmarks::INDEX_FINGER_TIP,
        landmarks::MIDDLE_FINGER_TIP,
        landmarks::RING_FINGER_TIP,
        landmarks::PINKY_TIP,
    ] {
        points[tip].y = 0.2;
    }
    HandLandmarks::new(points)
}

struct Harness {
    game: GameLoop<ManualClock>,
    clock: ManualClock,
    visible: Rc<Cell<bool>>,
    detector_fails: Rc<Cell<bool>>,
    spoken: Rc<RefCell<Vec<String>>>,
    presented: Rc<Cell<usize>>,
}

impl Harness {
    /// One loop iteration, `millis` after the previous one
    fn step_after(&mut self, millis: u64) -> Step {
        self.clock.advance(millis);
        self.game.step()
    }

    fn spoken(&self) -> Vec<String> {
        self.spoken.borrow().clone()
    }
}

struct Options {
    config: Config,
    detector_fails: bool,
    announcer_fails: bool,
    press_at: Option<(usize, SurfaceEvent)>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            config: Config::default(),
            detector_fails: false,
            announcer_fails: false,
            press_at: None,
        }
    }
}

fn every_frame_config() -> Config {
    let mut config = Config::default();
    config.game.ai_interval_frames = 1;
    config
}

fn start_source(camera: &CameraConfig) -> FrameSource {
    let source = FrameSource::start(camera.clone(), |_| Ok(StaticDevice)).unwrap();
    assert!(source.wait_for_first_frame(Duration::from_secs(5)));
    source
}

fn harness(options: Options) -> Harness {
    let clock = ManualClock::new();
    let visible = Rc::new(Cell::new(true));
    let detector_fails = Rc::new(Cell::new(options.detector_fails));
    let spoken = Rc::new(RefCell::new(Vec::new()));
    let presented = Rc::new(Cell::new(0));

    let source = start_source(&options.config.camera);
    let game = GameLoop::with_clock(
        &options.config,
        source,
        Box::new(ScriptedDetector {
            visible: Rc::clone(&visible),
            fail: Rc::clone(&detector_fails),
        }),
        Box::new(RecordingAnnouncer {
            spoken: Rc::clone(&spoken),
            fail: options.announcer_fails,
        }),
        Box::new(ScriptedSurface {
            presented: Rc::clone(&presented),
            waits: 0,
            press_at: options.press_at,
        }),
        clock.clone(),
    )
    .with_selector(MoveSelector::with_rng(StdRng::seed_from_u64(42)));

    Harness {
        game,
        clock,
        visible,
        detector_fails,
        spoken,
        presented,
    }
}

#[test]
fn test_steady_hand_fires_after_game_delay() {
    let mut h = harness(Options {
        config: every_frame_config(),
        ..Options::default()
    });

    // Ready after 2s, but the first round waits for 5s since startup
    for step in 1..=50 {
        assert_eq!(h.step_after(100), Step::Continue);
        assert!(h.spoken().is_empty(), "fired early at step {step}");
    }

    h.step_after(100);
    let spoken = h.spoken();
    assert_eq!(spoken.len(), 1);
    assert!(spoken[0].starts_with("AI chose "));
    assert!(spoken[0].contains("You chose Paper."));

    let round = *h.game.last_round().unwrap();
    assert_eq!(round.player, Gesture::Paper);
    assert_eq!(spoken[0], round.announcement());
    assert_eq!(h.game.gate().hand_entry_time(), None);
}

#[test]
fn test_rounds_are_spaced_by_game_delay() {
    let mut h = harness(Options {
        config: every_frame_config(),
        ..Options::default()
    });

    for _ in 0..101 {
        h.step_after(100);
    }
    assert_eq!(h.spoken().len(), 1);

    // 5.1s after the first round
    h.step_after(100);
    assert_eq!(h.spoken().len(), 2);
    assert_eq!(h.game.stats().rounds, 2);
}

#[test]
fn test_flickering_hand_never_fires() {
    let mut h = harness(Options {
        config: every_frame_config(),
        ..Options::default()
    });

    for step in 1..=300u64 {
        // Hand drops out for one frame every 1.5s
        h.visible.set(step % 15 != 0);
        h.step_after(100);
    }

    assert!(h.spoken().is_empty());
    assert_eq!(h.game.stats().rounds, 0);
}

#[test]
fn test_rounds_only_fire_on_evaluation_frames() {
    let mut h = harness(Options::default());

    // 200ms per frame: ready at frame 11, game delay passed at frame 26,
    // but evaluation only happens on frame 30
    for _ in 1..30 {
        h.step_after(200);
    }
    assert!(h.spoken().is_empty());

    h.step_after(200);
    assert_eq!(h.spoken().len(), 1);
}

#[test]
fn test_failed_announcement_is_not_fatal() {
    let mut h = harness(Options {
        config: every_frame_config(),
        announcer_fails: true,
        ..Options::default()
    });

    for _ in 0..51 {
        assert_eq!(h.step_after(100), Step::Continue);
    }
    assert_eq!(h.spoken().len(), 1);
    assert_eq!(h.game.stats().rounds, 1);
    assert_eq!(h.game.stats().announce_failures, 1);

    assert_eq!(h.step_after(100), Step::Continue);
}

#[test]
fn test_detector_errors_leave_gate_untouched() {
    let mut h = harness(Options {
        config: every_frame_config(),
        detector_fails: true,
        ..Options::default()
    });

    for _ in 0..100 {
        assert_eq!(h.step_after(100), Step::Continue);
    }
    assert_eq!(h.game.stats().detector_errors, 100);
    assert_eq!(h.game.gate().hand_entry_time(), None);
    assert!(h.spoken().is_empty());
    // Frames are still shown
    assert_eq!(h.presented.get(), 100);
}

#[test]
fn test_detector_error_mid_buffer_keeps_entry_time() {
    let mut h = harness(Options {
        config: every_frame_config(),
        ..Options::default()
    });

    h.step_after(100);
    let entered = h.game.gate().hand_entry_time();
    assert!(entered.is_some());
    for _ in 0..18 {
        h.step_after(100);
    }

    // One failed frame 1.9s into the buffer
    h.detector_fails.set(true);
    h.step_after(100);
    h.detector_fails.set(false);
    assert_eq!(h.game.gate().hand_entry_time(), entered);
    assert_eq!(h.game.stats().detector_errors, 1);

    // Buffer still timed from the original entry
    h.step_after(100);
    assert_eq!(h.game.gate().hand_entry_time(), entered);
}

#[test]
fn test_quit_key_is_case_insensitive() {
    let h = harness(Options {
        press_at: Some((5, SurfaceEvent::Key('Q'))),
        ..Options::default()
    });

    let stats = h.game.run();
    assert_eq!(stats.frames_processed + stats.frames_skipped, 5);
}

#[test]
fn test_other_keys_do_not_quit() {
    let mut h = harness(Options {
        press_at: Some((1, SurfaceEvent::Key('w'))),
        ..Options::default()
    });
    assert_eq!(h.step_after(10), Step::Continue);
    assert_eq!(h.step_after(10), Step::Continue);
}

#[test]
fn test_closing_window_quits() {
    let mut h = harness(Options {
        press_at: Some((2, SurfaceEvent::Closed)),
        ..Options::default()
    });
    assert_eq!(h.step_after(10), Step::Continue);
    assert_eq!(h.step_after(10), Step::Quit);
}

#[test]
fn test_shutdown_signal_stops_the_loop() {
    let h = harness(Options::default());
    let signal = ShutdownSignal::new();
    let mut game = h.game.with_shutdown(signal.clone());

    assert_eq!(game.step(), Step::Continue);
    signal.trigger();
    assert_eq!(game.step(), Step::Quit);
}

#[test]
fn test_unavailable_camera_only_skips_iterations() {
    let config = Config::default();
    let source = FrameSource::start(config.camera.clone(), |settings| {
        Err::<StaticDevice, _>(CaptureError::DeviceUnavailable {
            index: settings.device_index,
            source: "no such device".into(),
        })
    })
    .unwrap();
    let presented = Rc::new(Cell::new(0));

    let mut game = GameLoop::with_clock(
        &config,
        source,
        Box::new(ScriptedDetector {
            visible: Rc::new(Cell::new(true)),
            fail: Rc::new(Cell::new(false)),
        }),
        Box::new(RecordingAnnouncer {
            spoken: Rc::new(RefCell::new(Vec::new())),
            fail: false,
        }),
        Box::new(ScriptedSurface {
            presented: Rc::clone(&presented),
            waits: 0,
            press_at: None,
        }),
        ManualClock::new(),
    );

    for _ in 0..20 {
        assert_eq!(game.step(), Step::Continue);
    }
    assert_eq!(game.stats().frames_skipped, 20);
    assert_eq!(game.stats().frames_processed, 0);
    assert_eq!(presented.get(), 0);
}
