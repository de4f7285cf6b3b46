/// Gating state machine
///
/// Debounces a hand entering the frame and throttles rounds:
///
/// ```text
/// NoHand --hand seen--> Buffering --entry buffer elapsed--> Ready
///   ^                       |                                 |
///   +------hand gone--------+---------------------------------+
///
/// Ready --evaluation frame--> RateLimited (game delay not passed, no change)
///                         \-> Fired (round played, entry time cleared)
/// ```
///
/// The entry buffer is inclusive (`elapsed >= buffer`) while the game delay
/// is exclusive (`elapsed > delay`).
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::config::GameConfig;

/// Where the current visibility episode stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No hand in this frame
    NoHand,
    /// Hand visible, entry buffer still running
    Buffering { remaining: Duration },
    /// Hand visible long enough to be evaluated
    Ready,
}

/// Result of an evaluation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireDecision {
    /// Too soon after the previous round; nothing changes
    RateLimited { wait: Duration },
    /// A round should be played now
    Fired,
}

pub struct GatingState {
    hand_entry_time: Option<Instant>,
    last_game_time: Instant,
    entry_buffer: Duration,
    game_delay: Duration,
    ai_interval: u64,
}

impl GatingState {
    /// Create the gate. `start` counts as the previous round, so nothing
    /// fires within one game delay of it.
    pub fn new(config: &GameConfig, start: Instant) -> Self {
        Self {
            hand_entry_time: None,
            last_game_time: start,
            entry_buffer: config.hand_entry_buffer(),
            game_delay: config.game_delay(),
            ai_interval: config.ai_interval_frames.max(1),
        }
    }

    /// Feed one processed frame's detection result
    pub fn observe(&mut self, hand_visible: bool, now: Instant) -> Phase {
        if !hand_visible {
            if self.hand_entry_time.take().is_some() {
                debug!("Hand left frame, entry buffer reset");
            }
            return Phase::NoHand;
        }

        let entry = *self.hand_entry_time.get_or_insert_with(|| {
            info!("Hand entered frame, starting buffer...");
            now
        });

        let elapsed = now.saturating_duration_since(entry);
        if elapsed >= self.entry_buffer {
            Phase::Ready
        } else {
            Phase::Buffering {
                remaining: self.entry_buffer - elapsed,
            }
        }
    }

    /// Gestures are only evaluated on every Nth processed frame
    pub fn is_evaluation_frame(&self, frame_count: u64) -> bool {
        frame_count % self.ai_interval == 0
    }

    /// Attempt a round. On success the game timer restarts and the episode
    /// ends, so a hand that stays in view goes through the entry buffer again.
    pub fn try_fire(&mut self, now: Instant) -> FireDecision {
        let since_last = now.saturating_duration_since(self.last_game_time);
        if since_last > self.game_delay {
            self.last_game_time = now;
            self.hand_entry_time = None;
            FireDecision::Fired
        } else {
            FireDecision::RateLimited {
                wait: self.game_delay - since_last,
            }
        }
    }

    pub fn hand_entry_time(&self) -> Option<Instant> {
        self.hand_entry_time
    }

    pub fn last_game_time(&self) -> Instant {
        self.last_game_time
    }
}
