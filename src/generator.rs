//! Move generation behind `genmove`.
//!
//! The engine has no playing strength of its own. Whatever answers `genmove`
//! implements [`MoveGenerator`] and is handed to the engine at construction.

use crate::board::{Board, Color};
use crate::constants::FIXED_MOVE;
use crate::vertex::Vertex;

pub trait MoveGenerator: Send {
    /// Choose a move for `color` on `board`.
    fn generate(&mut self, color: Color, board: &Board) -> Vertex;
}

/// Placeholder that always answers Q16, whatever the position.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedGenerator;

impl MoveGenerator for FixedGenerator {
    fn generate(&mut self, _color: Color, _board: &Board) -> Vertex {
        Vertex::point(FIXED_MOVE.0, FIXED_MOVE.1)
    }
}

/// Always passes.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassGenerator;

impl MoveGenerator for PassGenerator {
    fn generate(&mut self, _color: Color, _board: &Board) -> Vertex {
        Vertex::Pass
    }
}

/// Picks a uniformly random empty point, or passes on a full board.
pub struct RandomGenerator {
    rng: fastrand::Rng,
}

impl RandomGenerator {
    pub fn new() -> Self {
        Self {
            rng: fastrand::Rng::new(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MoveGenerator for RandomGenerator {
    fn generate(&mut self, _color: Color, board: &Board) -> Vertex {
        let empty: Vec<(usize, usize)> = board.empty_points().collect();
        if empty.is_empty() {
            return Vertex::Pass;
        }
        let (x, y) = empty[self.rng.usize(..empty.len())];
        Vertex::point(x, y)
    }
}
