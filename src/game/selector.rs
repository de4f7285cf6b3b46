/// Opponent move selection
use rand::distributions::{Distribution, Standard};
use rand::rngs::ThreadRng;
use rand::Rng;

use super::Gesture;

impl Distribution<Gesture> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Gesture {
        Gesture::ALL[rng.gen_range(0..Gesture::ALL.len())]
    }
}

/// Picks the AI's move uniformly at random
pub struct MoveSelector<R: Rng = ThreadRng> {
    rng: R,
}

impl MoveSelector<ThreadRng> {
    pub fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }
}

impl Default for MoveSelector<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> MoveSelector<R> {
    /// Use a specific generator (seeded generators make tests repeatable)
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    pub fn next_move(&mut self) -> Gesture {
        self.rng.gen()
    }
}
