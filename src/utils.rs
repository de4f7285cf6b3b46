use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Process-wide quit flag, set from the Ctrl+C handler
#[derive(Clone, Debug, Default)]
pub struct ShutdownSignal {
    triggered: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a Ctrl+C handler that triggers this signal
    pub fn install_ctrlc_handler(&self) -> Result<(), ctrlc::Error> {
        let signal = self.clone();
        ctrlc::set_handler(move || {
            tracing::info!("Ctrl+C received, shutting down...");
            signal.trigger();
        })
    }

    pub fn trigger(&self) {
        self.triggered.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }
}

/// Rate limit for a warning that repeats every loop iteration while a
/// failure persists. Logs the first occurrence and then every `every`th.
#[derive(Debug)]
pub struct WarnThrottle {
    every: u64,
    streak: u64,
}

impl WarnThrottle {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            streak: 0,
        }
    }

    /// Record one occurrence. Returns true when it should be logged.
    pub fn hit(&mut self) -> bool {
        self.streak += 1;
        self.streak == 1 || self.streak % self.every == 0
    }

    /// End the current streak, returning how long it was
    pub fn reset(&mut self) -> u64 {
        std::mem::take(&mut self.streak)
    }
}

/// Frame-rate meter reporting once every `report_every` frames
pub struct FrameRateMeter {
    report_every: u64,
    frames: u64,
    window_start: Instant,
}

impl FrameRateMeter {
    pub fn new(report_every: u64, now: Instant) -> Self {
        Self {
            report_every: report_every.max(1),
            frames: 0,
            window_start: now,
        }
    }

    /// Count a frame. Returns the average FPS when a report is due.
    pub fn tick(&mut self, now: Instant) -> Option<f64> {
        self.frames += 1;
        if self.frames < self.report_every {
            return None;
        }

        let elapsed = now.saturating_duration_since(self.window_start);
        let fps = if elapsed > Duration::ZERO {
            self.frames as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };
        self.frames = 0;
        self.window_start = now;
        Some(fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shutdown_signal_is_shared() {
        let signal = ShutdownSignal::new();
        let clone = signal.clone();
        assert!(!signal.is_triggered());

        clone.trigger();
        assert!(signal.is_triggered());
    }

    #[test]
    fn test_warn_throttle_logs_first_then_every_nth() {
        let mut throttle = WarnThrottle::new(500);
        let logged: Vec<u64> = (1..=1200u64).filter(|_| throttle.hit()).collect();
        assert_eq!(logged, vec![1, 500, 1000]);
    }

    #[test]
    fn test_warn_throttle_reset_starts_new_streak() {
        let mut throttle = WarnThrottle::new(10);
        assert!(throttle.hit());
        assert!(!throttle.hit());
        assert_eq!(throttle.reset(), 2);
        assert!(throttle.hit());
    }

    #[test]
    fn test_frame_rate_meter_reports_every_n_frames() {
        let start = Instant::now();
        let mut meter = FrameRateMeter::new(100, start);

        for i in 1..100 {
            assert!(meter.tick(start + Duration::from_millis(i * 10)).is_none());
        }
        // 100 frames over one second
        let fps = meter.tick(start + Duration::from_secs(1)).unwrap();
        assert!((fps - 100.0).abs() < 1e-9);

        // Window restarts
        assert!(meter.tick(start + Duration::from_millis(1010)).is_none());
    }

    #[test]
    fn test_frame_rate_meter_zero_elapsed() {
        let start = Instant::now();
        let mut meter = FrameRateMeter::new(1, start);
        assert_eq!(meter.tick(start), Some(0.0));
    }
}
