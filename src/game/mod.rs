/// Game module
///
/// Rock-paper-scissors rules plus the loop that drives a session.
///
/// ## Architecture
///
/// ```text
/// GameLoop
///   ├── FrameSource (latest frame)
///   ├── HandDetector -> classify_hand_shape
///   ├── GatingState (entry buffer, frame interval, game delay)
///   ├── MoveSelector -> judge -> Round
///   ├── Announcer (speech)
///   └── RenderSurface (window + quit key)
/// ```

pub mod game_loop;
pub mod gating;
pub mod selector;

use std::fmt;

pub use game_loop::{Clock, GameLoop, SessionStats, Step, SystemClock};
pub use gating::{FireDecision, GatingState, Phase};
pub use selector::MoveSelector;

/// A hand shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gesture {
    Rock,
    Paper,
    Scissors,
}

impl Gesture {
    pub const ALL: [Gesture; 3] = [Gesture::Rock, Gesture::Paper, Gesture::Scissors];

    /// The gesture this one defeats
    pub fn beats(self) -> Gesture {
        match self {
            Gesture::Rock => Gesture::Scissors,
            Gesture::Paper => Gesture::Rock,
            Gesture::Scissors => Gesture::Paper,
        }
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Gesture::Rock => "Rock",
            Gesture::Paper => "Paper",
            Gesture::Scissors => "Scissors",
        };
        f.write_str(name)
    }
}

/// Result of one round, from the player's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    PlayerWin,
    AiWin,
    Tie,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Outcome::PlayerWin => "You win!",
            Outcome::AiWin => "AI wins!",
            Outcome::Tie => "It's a tie!",
        };
        f.write_str(text)
    }
}

/// Decide a round
pub fn judge(player: Gesture, ai: Gesture) -> Outcome {
    if player == ai {
        Outcome::Tie
    } else if player.beats() == ai {
        Outcome::PlayerWin
    } else {
        Outcome::AiWin
    }
}

/// One played round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Round {
    pub player: Gesture,
    pub ai: Gesture,
    pub outcome: Outcome,
}

impl Round {
    pub fn play(player: Gesture, ai: Gesture) -> Self {
        Self {
            player,
            ai,
            outcome: judge(player, ai),
        }
    }

    /// Text spoken after the round
    pub fn announcement(&self) -> String {
        format!("AI chose {}. You chose {}. {}", self.ai, self.player, self.outcome)
    }
}
