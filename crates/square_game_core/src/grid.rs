//! Card grid generation.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, instrument};

use crate::error::GridError;
use crate::palette::ColorPalette;
use crate::types::{Card, CardId};

/// Source of the permutations used when dealing and reshuffling cards.
///
/// Production code uses [`RandomShuffler`]; tests substitute a deterministic
/// implementation so layouts are known in advance.
pub trait CardShuffler {
    /// Permutes `items` in place.
    fn shuffle_slice<T>(&mut self, items: &mut [T]);
}

/// Uniform shuffling backed by a [`rand`] generator.
#[derive(Debug, Clone)]
pub struct RandomShuffler<R = StdRng> {
    rng: R,
}

impl RandomShuffler<StdRng> {
    /// Seeds from the operating system.
    pub fn from_os_rng() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic shuffler for reproducible games.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: rand::Rng> RandomShuffler<R> {
    /// Wraps an existing generator.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: rand::Rng> CardShuffler for RandomShuffler<R> {
    fn shuffle_slice<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }
}

/// Deals a shuffled `grid_size` x `grid_size` grid of paired cards.
///
/// Pair `i` gets color index `i mod palette.len()`. When the cell count is odd
/// a pre-solved bonus card is inserted at the middle index after shuffling, so
/// the center cell is always the complete one.
///
/// # Errors
///
/// Returns [`GridError::TooSmall`] for grids below 2x2.
#[instrument(skip(palette, shuffler), fields(palette_len = palette.len()))]
pub fn generate_cards<S: CardShuffler>(
    grid_size: usize,
    palette: &ColorPalette,
    shuffler: &mut S,
) -> Result<Vec<Card>, GridError> {
    if grid_size < 2 {
        return Err(GridError::TooSmall(grid_size));
    }

    let total = grid_size * grid_size;
    let pair_count = total / 2;
    let palette_len = palette.len().max(1);

    let mut cards = Vec::with_capacity(total);
    for pair in 0..pair_count {
        let color_index = (pair % palette_len) as i32;
        for _ in 0..2 {
            let id = CardId(cards.len() as u32);
            cards.push(Card::new(id, color_index));
        }
    }

    shuffler.shuffle_slice(&mut cards);

    if total % 2 == 1 {
        let bonus = Card::bonus(CardId(cards.len() as u32));
        cards.insert(total / 2, bonus);
    }

    debug!(total, pair_count, "Dealt card grid");
    Ok(cards)
}
