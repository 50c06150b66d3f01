//! 7-bag randomizer for piece generation
//!
//! All 7 piece types go into the bag and are drawn out at random without
//! replacement. When the bag runs dry it is refilled, so every run of 7
//! draws from a fresh bag holds each type exactly once.

use crate::tetromino::PieceKind;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// The 7-bag piece randomizer
#[derive(Debug, Clone)]
pub struct Bag {
    /// Types not yet drawn from the current bag
    remaining: Vec<PieceKind>,
    rng: ChaCha8Rng,
}

impl Default for Bag {
    fn default() -> Self {
        Self::new()
    }
}

impl Bag {
    /// Create a new bag seeded from entropy
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// Create a bag with a fixed seed, for reproducible piece sequences
    pub fn with_seed(seed: u64) -> Self {
        let mut bag = Self {
            remaining: Vec::with_capacity(7),
            rng: ChaCha8Rng::seed_from_u64(seed),
        };
        bag.refill();
        bag
    }

    /// Draw the next piece
    pub fn next(&mut self) -> PieceKind {
        if self.remaining.is_empty() {
            self.refill();
        }
        let index = self.rng.gen_range(0..self.remaining.len());
        self.remaining.remove(index)
    }

    /// Pieces still in the current bag
    #[allow(dead_code)]
    pub fn remaining(&self) -> &[PieceKind] {
        &self.remaining
    }

    /// Put all 7 types back in the bag
    pub fn refill(&mut self) {
        self.remaining.clear();
        self.remaining.extend(PieceKind::all());
    }
}
