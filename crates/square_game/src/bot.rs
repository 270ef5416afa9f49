//! Headless players.
//!
//! A player only sees what a person at the screen would see: the colors of
//! face-up cards. [`MemoryBot`] remembers a bounded number of them.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use square_game_core::{CardShuffler, GameState, RoundOutcome, Selection, Snapshot, TapOutcome};
use tracing::{debug, instrument};

use crate::driver::{DriverError, SessionHandle};

/// Something that picks cards.
#[async_trait]
pub trait Player: Send {
    /// Picks the next card to tap, or `None` to wait for the board to change.
    async fn choose_card(&mut self, snapshot: &Snapshot) -> Option<usize>;

    /// Display name.
    fn name(&self) -> &str;
}

/// Simulated player with a limited memory of card colors.
#[derive(Debug, Clone)]
pub struct MemoryBot {
    name: String,
    memory_slots: usize,
    think_time: Duration,
    rng: StdRng,
    known: VecDeque<(usize, i32)>,
    seen_generation: u64,
    seen_shuffles: u32,
}

impl MemoryBot {
    /// Creates a bot remembering up to `memory_slots` cards.
    pub fn new(memory_slots: usize) -> Self {
        Self::with_rng(memory_slots, StdRng::from_os_rng())
    }

    /// Creates a bot whose guesses are reproducible.
    pub fn seeded(memory_slots: usize, seed: u64) -> Self {
        Self::with_rng(memory_slots, StdRng::seed_from_u64(seed))
    }

    fn with_rng(memory_slots: usize, rng: StdRng) -> Self {
        Self {
            name: "MemoryBot".to_string(),
            memory_slots,
            think_time: Duration::from_millis(300),
            rng,
            known: VecDeque::new(),
            seen_generation: 0,
            seen_shuffles: 0,
        }
    }

    /// Sets the pause before every tap.
    pub fn with_think_time(mut self, think_time: Duration) -> Self {
        self.think_time = think_time;
        self
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Number of cards currently remembered.
    pub fn remembered(&self) -> usize {
        self.known.len()
    }

    /// Updates memory from the face-up cards of `snapshot`.
    ///
    /// A new round or a color reshuffle invalidates everything remembered.
    pub fn observe(&mut self, snapshot: &Snapshot) {
        if snapshot.generation != self.seen_generation
            || snapshot.stats.color_shuffles != self.seen_shuffles
        {
            self.known.clear();
            self.seen_generation = snapshot.generation;
            self.seen_shuffles = snapshot.stats.color_shuffles;
        }

        self.known.retain(|(index, _)| {
            snapshot
                .cards
                .get(*index)
                .is_some_and(|card| !card.is_matched)
        });

        for (index, card) in snapshot.cards.iter().enumerate() {
            if card.is_flipped && !card.is_matched && !card.is_bonus {
                self.remember(index, card.color_index);
            }
        }
    }

    fn remember(&mut self, index: usize, color: i32) {
        if self.memory_slots == 0 {
            return;
        }
        self.known.retain(|(known, _)| *known != index);
        self.known.push_back((index, color));
        while self.known.len() > self.memory_slots {
            self.known.pop_front();
        }
    }

    /// Decides the next tap without waiting.
    #[instrument(skip(self, snapshot), fields(state = %snapshot.state, remembered = self.known.len()))]
    pub fn choose(&mut self, snapshot: &Snapshot) -> Option<usize> {
        self.observe(snapshot);
        if snapshot.state != GameState::Playing || snapshot.is_resolving() {
            return None;
        }

        let selectable: Vec<usize> = snapshot
            .cards
            .iter()
            .enumerate()
            .filter(|(_, card)| card.is_selectable())
            .map(|(index, _)| index)
            .collect();

        let known_partner = |known: &VecDeque<(usize, i32)>, index: usize, color: i32| {
            known
                .iter()
                .find(|(other, c)| *other != index && *c == color && selectable.contains(other))
                .map(|(other, _)| *other)
        };

        let choice = match snapshot.selection {
            Selection::AwaitingFirst => self
                .known
                .iter()
                .filter(|(index, _)| selectable.contains(index))
                .find(|(index, color)| known_partner(&self.known, *index, *color).is_some())
                .map(|(index, _)| *index),
            Selection::AwaitingSecond { first } => snapshot
                .cards
                .get(first)
                .and_then(|card| known_partner(&self.known, first, card.color_index)),
            Selection::Resolving { .. } => return None,
        };

        let choice = choice.or_else(|| self.probe(&selectable));
        debug!(?choice, "Bot decided");
        choice
    }

    /// A face-down card not in memory, or any face-down card.
    fn probe(&mut self, selectable: &[usize]) -> Option<usize> {
        let unknown: Vec<usize> = selectable
            .iter()
            .copied()
            .filter(|index| !self.known.iter().any(|(known, _)| known == index))
            .collect();
        if unknown.is_empty() {
            selectable.choose(&mut self.rng).copied()
        } else {
            unknown.choose(&mut self.rng).copied()
        }
    }
}

#[async_trait]
impl Player for MemoryBot {
    async fn choose_card(&mut self, snapshot: &Snapshot) -> Option<usize> {
        let choice = self.choose(snapshot);
        if choice.is_some() && !self.think_time.is_zero() {
            tokio::time::sleep(self.think_time).await;
        }
        choice
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Lets `player` play the round in progress until it ends.
///
/// # Errors
///
/// Fails if the driver stops or the round is abandoned to the menu.
#[instrument(skip_all, fields(player = %player.name()))]
pub async fn play_round<P, S>(player: &mut P, handle: &SessionHandle<S>) -> Result<RoundOutcome, DriverError>
where
    P: Player + ?Sized,
    S: CardShuffler,
{
    let mut snapshots = handle.subscribe();
    loop {
        let snapshot = snapshots.borrow_and_update().clone();
        if snapshot.state.is_round_over() {
            return snapshot
                .last_outcome
                .ok_or_else(|| DriverError::new("Round ended without an outcome"));
        }
        if snapshot.state == GameState::Menu {
            return Err(DriverError::new("Round was abandoned"));
        }

        if let Some(index) = player.choose_card(&snapshot).await {
            let outcome = handle.select_card(index).await?;
            if !matches!(outcome, TapOutcome::Ignored(_)) {
                continue;
            }
            debug!(index, ?outcome, "Tap ignored, waiting for the board");
        }

        snapshots
            .changed()
            .await
            .map_err(|_| DriverError::new("Session driver stopped publishing"))?;
    }
}
